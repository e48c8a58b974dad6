//! Tournament scheduling and standings.
//!
//! Supports round-robin (all pairs, both colors) and gauntlet (one
//! engine against a field) formats. Games run strictly sequentially;
//! each game owns its two engine processes for its duration. A failed
//! game is logged, scored from its record like any other, and never
//! aborts the run.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shakmaty::Color;
use tracing::{error, info, warn};

use crate::game::{Match, MatchRecord, TimeControl, Winner};
use crate::openings::OpeningBook;
use crate::pgn;

/// Outcome of one game from a single engine's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Win,
    Loss,
    Draw,
}

/// Accumulated results for one engine across a tournament.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub engine: String,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Win = 1, draw = 0.5, loss = 0.
    pub points: f64,
    pub wins_as_white: u32,
    pub wins_as_black: u32,
    pub total_nodes: u64,
}

impl EngineStats {
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            games: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            points: 0.0,
            wins_as_white: 0,
            wins_as_black: 0,
            total_nodes: 0,
        }
    }

    /// Fold one game into the totals.
    pub fn add_result(&mut self, outcome: GameOutcome, color: Color, nodes: u64) {
        self.games += 1;
        self.total_nodes += nodes;
        match outcome {
            GameOutcome::Win => {
                self.wins += 1;
                self.points += 1.0;
                match color {
                    Color::White => self.wins_as_white += 1,
                    Color::Black => self.wins_as_black += 1,
                }
            }
            GameOutcome::Loss => self.losses += 1,
            GameOutcome::Draw => {
                self.draws += 1;
                self.points += 0.5;
            }
        }
    }

    /// Points as a percentage of games played; zero before the first game.
    pub fn score_percentage(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.points / self.games as f64 * 100.0
        }
    }
}

/// One line of tournament history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSummary {
    pub game_number: usize,
    pub white: String,
    pub black: String,
    pub result: Winner,
    pub reason: String,
    pub moves: usize,
    pub pgn: String,
}

/// Full results of a finished tournament.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentReport {
    pub tournament: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
    pub time_control: String,
    pub rounds: u32,
    pub games_played: usize,
    pub games_total: usize,
    pub standings: Vec<EngineStats>,
    pub games: Vec<GameSummary>,
}

/// Observer invoked after every game with its summary and a fresh
/// standings snapshot.
pub type ProgressObserver = Box<dyn FnMut(&GameSummary, &[EngineStats]) + Send>;

#[derive(Debug, Clone)]
struct RegisteredEngine {
    path: PathBuf,
    options: Vec<(String, String)>,
}

/// A tournament in progress.
pub struct Tournament {
    name: String,
    time_control: TimeControl,
    rounds: u32,
    book: OpeningBook,
    output_dir: Option<PathBuf>,
    engines: HashMap<String, RegisteredEngine>,
    stats: HashMap<String, EngineStats>,
    games: Vec<GameSummary>,
    current_game: usize,
    total_games: usize,
    observer: Option<ProgressObserver>,
}

impl Tournament {
    pub fn new(name: impl Into<String>, time_control: TimeControl, rounds: u32) -> Self {
        let name = name.into();
        info!("Tournament created: {}", name);
        Self {
            name,
            time_control,
            rounds,
            book: OpeningBook::default(),
            output_dir: None,
            engines: HashMap::new(),
            stats: HashMap::new(),
            games: Vec::new(),
            current_game: 0,
            total_games: 0,
            observer: None,
        }
    }

    /// Draw game openings from this book.
    pub fn with_book(mut self, book: OpeningBook) -> Self {
        self.book = book;
        self
    }

    /// Persist each game's PGN under this directory, keyed by game number.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Install a per-game progress observer. Observer panics are caught
    /// and logged; they never abort the tournament.
    pub fn with_observer(mut self, observer: ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Register an engine the pairings can refer to by name.
    pub fn add_engine(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.add_engine_with_options(name, path, Vec::new());
    }

    /// Register an engine together with UCI options applied before each
    /// of its games.
    pub fn add_engine_with_options(
        &mut self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        options: Vec<(String, String)>,
    ) {
        self.engines.insert(
            name.into(),
            RegisteredEngine {
                path: path.into(),
                options,
            },
        );
    }

    /// Run a round-robin: every unordered pair of `names` plays twice per
    /// round, once with each color assignment.
    pub async fn run_round_robin(&mut self, names: &[String]) -> TournamentReport {
        info!("Starting round-robin tournament: {}", self.name);
        info!("Engines: {}", names.join(", "));
        let started = Utc::now();

        for name in names {
            self.stats
                .insert(name.clone(), EngineStats::new(name.clone()));
        }

        let mut pairings = Vec::new();
        for i in 0..names.len() {
            for j in i + 1..names.len() {
                pairings.push((names[i].clone(), names[j].clone()));
            }
        }
        self.total_games = pairings.len() * self.rounds as usize * 2;
        info!("Total games to play: {}", self.total_games);

        for round in 0..self.rounds {
            info!("Round {}/{}", round + 1, self.rounds);
            for (a, b) in &pairings {
                let opening = self.draw_opening();
                self.play_pair(a.clone(), b.clone(), opening).await;
            }
        }

        self.results(started, Utc::now())
    }

    /// Run a gauntlet: `test` plays every opponent twice per round, once
    /// with each color.
    pub async fn run_gauntlet(&mut self, test: &str, opponents: &[String]) -> TournamentReport {
        info!("Starting gauntlet tournament: {}", self.name);
        info!("Test engine: {}", test);
        info!("Opponents: {}", opponents.join(", "));
        let started = Utc::now();

        self.stats
            .insert(test.to_string(), EngineStats::new(test.to_string()));
        for name in opponents {
            self.stats
                .insert(name.clone(), EngineStats::new(name.clone()));
        }

        self.total_games = opponents.len() * self.rounds as usize * 2;
        info!("Total games to play: {}", self.total_games);

        for round in 0..self.rounds {
            info!("Round {}/{}", round + 1, self.rounds);
            for opponent in opponents {
                let opening = self.draw_opening();
                self.play_pair(test.to_string(), opponent.clone(), opening)
                    .await;
            }
        }

        self.results(started, Utc::now())
    }

    /// Current standings, sorted by points then wins, both descending.
    pub fn standings(&self) -> Vec<EngineStats> {
        let mut standings: Vec<EngineStats> = self.stats.values().cloned().collect();
        standings.sort_by(|a, b| {
            b.points
                .total_cmp(&a.points)
                .then_with(|| b.wins.cmp(&a.wins))
        });
        standings
    }

    /// One opening shared by both games of a pairing, so neither side
    /// faces a line the other never saw.
    fn draw_opening(&self) -> Vec<String> {
        self.book
            .choose()
            .map(|o| o.moves.clone())
            .unwrap_or_default()
    }

    /// Play both color assignments of one pairing.
    async fn play_pair(&mut self, a: String, b: String, opening: Vec<String>) {
        self.play_game(&a, &b, opening.clone()).await;
        self.play_game(&b, &a, opening).await;
    }

    async fn play_game(&mut self, white: &str, black: &str, opening: Vec<String>) {
        let (white_engine, black_engine) = match (self.engines.get(white), self.engines.get(black))
        {
            (Some(w), Some(b)) => (w.clone(), b.clone()),
            _ => {
                error!("Engine not found: {} or {}", white, black);
                // The slot still counts toward completed games.
                self.current_game += 1;
                return;
            }
        };

        info!(
            "Game {}/{}: {} (White) vs {} (Black)",
            self.current_game + 1,
            self.total_games,
            white,
            black
        );

        let record = Match::new(&white_engine.path, &black_engine.path, self.time_control)
            .with_names(white, black)
            .with_opening(opening)
            .with_options(white_engine.options, black_engine.options)
            .play()
            .await;

        self.record_game(white, black, record);
    }

    fn record_game(&mut self, white: &str, black: &str, record: MatchRecord) {
        let (white_outcome, black_outcome) = match record.winner {
            Winner::White => (GameOutcome::Win, GameOutcome::Loss),
            Winner::Black => (GameOutcome::Loss, GameOutcome::Win),
            Winner::Draw | Winner::Error => (GameOutcome::Draw, GameOutcome::Draw),
        };
        if let Some(stats) = self.stats.get_mut(white) {
            stats.add_result(white_outcome, Color::White, record.nodes_white);
        }
        if let Some(stats) = self.stats.get_mut(black) {
            stats.add_result(black_outcome, Color::Black, record.nodes_black);
        }

        let summary = GameSummary {
            game_number: self.current_game + 1,
            white: white.to_string(),
            black: black.to_string(),
            result: record.winner,
            reason: record.reason,
            moves: record.moves.len(),
            pgn: record.pgn,
        };

        if let Some(dir) = &self.output_dir {
            let path = dir.join(format!("game_{}.pgn", summary.game_number));
            let write = std::fs::create_dir_all(dir)
                .and_then(|_| pgn::write_pgn(&path, &summary.pgn));
            if let Err(err) = write {
                error!("Failed to save PGN {}: {}", path.display(), err);
            }
        }

        self.games.push(summary);
        self.current_game += 1;

        if let Some(observer) = self.observer.as_mut() {
            let standings: Vec<EngineStats> = {
                let mut s: Vec<EngineStats> = self.stats.values().cloned().collect();
                s.sort_by(|a, b| {
                    b.points
                        .total_cmp(&a.points)
                        .then_with(|| b.wins.cmp(&a.wins))
                });
                s
            };
            let summary = self.games.last().cloned();
            if let Some(summary) = summary {
                let call = catch_unwind(AssertUnwindSafe(|| observer(&summary, &standings)));
                if call.is_err() {
                    warn!("Progress observer panicked; continuing tournament");
                }
            }
        }
    }

    fn results(&self, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> TournamentReport {
        TournamentReport {
            tournament: self.name.clone(),
            start_time,
            end_time,
            duration_seconds: (end_time - start_time).num_milliseconds() as f64 / 1000.0,
            time_control: self.time_control.to_string(),
            rounds: self.rounds,
            games_played: self.current_game,
            games_total: self.total_games,
            standings: self.standings(),
            games: self.games.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_fold_results() {
        let mut stats = EngineStats::new("alpha");
        stats.add_result(GameOutcome::Win, Color::White, 1000);
        stats.add_result(GameOutcome::Win, Color::Black, 2000);
        stats.add_result(GameOutcome::Draw, Color::White, 500);
        stats.add_result(GameOutcome::Loss, Color::Black, 0);

        assert_eq!(stats.games, 4);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.draws, 1);
        assert_eq!(stats.points, 2.5);
        assert_eq!(stats.wins_as_white, 1);
        assert_eq!(stats.wins_as_black, 1);
        assert_eq!(stats.total_nodes, 3500);
        assert_eq!(stats.score_percentage(), 62.5);
    }

    #[test]
    fn score_percentage_is_zero_before_any_game() {
        assert_eq!(EngineStats::new("fresh").score_percentage(), 0.0);
    }

    #[test]
    fn standings_sort_by_points_then_wins() {
        let mut t = Tournament::new("t", TimeControl::new(1000, 0), 1);
        let mut a = EngineStats::new("a");
        a.points = 2.0;
        a.wins = 2;
        let mut b = EngineStats::new("b");
        b.points = 2.0;
        b.wins = 1;
        b.draws = 2;
        let mut c = EngineStats::new("c");
        c.points = 3.0;
        c.wins = 3;
        t.stats.insert("a".into(), a);
        t.stats.insert("b".into(), b);
        t.stats.insert("c".into(), c);

        let standings = t.standings();
        let names: Vec<&str> = standings.iter().map(|s| s.engine.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    fn failing_field(t: &mut Tournament, names: &[&str]) -> Vec<String> {
        // Unspawnable paths: every game finishes as an error record,
        // which scores as a draw for both sides.
        for name in names {
            t.add_engine(*name, format!("/nonexistent/{}", name));
        }
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn round_robin_plays_every_pair_both_colors() {
        let mut t = Tournament::new("rr", TimeControl::new(100, 0), 1);
        let names = failing_field(&mut t, &["a", "b", "c"]);

        let report = t.run_round_robin(&names).await;

        assert_eq!(report.games_total, 6);
        assert_eq!(report.games_played, 6);
        assert_eq!(report.standings.len(), 3);
        for stats in &report.standings {
            assert_eq!(stats.games, 4);
            assert_eq!(stats.points, 2.0);
        }
        // Each engine appears as White and as Black against each opponent.
        let whites: Vec<&str> = report.games.iter().map(|g| g.white.as_str()).collect();
        assert_eq!(whites.iter().filter(|w| **w == "a").count(), 2);
    }

    #[tokio::test]
    async fn round_robin_scales_with_rounds() {
        let mut t = Tournament::new("rr2", TimeControl::new(100, 0), 2);
        let names = failing_field(&mut t, &["a", "b"]);

        let report = t.run_round_robin(&names).await;
        assert_eq!(report.games_total, 4);
        assert_eq!(report.games_played, 4);
    }

    #[tokio::test]
    async fn gauntlet_plays_each_opponent_twice_per_round() {
        let mut t = Tournament::new("g", TimeControl::new(100, 0), 1);
        let names = failing_field(&mut t, &["target", "a", "b"]);
        let opponents = names[1..].to_vec();

        let report = t.run_gauntlet("target", &opponents).await;

        assert_eq!(report.games_total, 4);
        assert_eq!(report.games_played, 4);
        let target = report
            .standings
            .iter()
            .find(|s| s.engine == "target")
            .unwrap();
        assert_eq!(target.games, 4);
        for opponent in &opponents {
            let stats = report
                .standings
                .iter()
                .find(|s| &s.engine == opponent)
                .unwrap();
            assert_eq!(stats.games, 2);
        }
    }

    #[tokio::test]
    async fn unresolved_pairing_counts_its_slots() {
        let mut t = Tournament::new("missing", TimeControl::new(100, 0), 1);
        t.add_engine("a", "/nonexistent/a");
        // "ghost" never registered; both of the pairing's games are
        // skipped but their slots still count as completed.
        let names = vec!["a".to_string(), "ghost".to_string()];

        let report = t.run_round_robin(&names).await;
        assert_eq!(report.games_total, 2);
        assert_eq!(report.games_played, 2);
        assert!(report.games.is_empty());
        let a = report.standings.iter().find(|s| s.engine == "a").unwrap();
        assert_eq!(a.games, 0);
    }

    #[tokio::test]
    async fn pgn_files_written_per_game_number() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = Tournament::new("persist", TimeControl::new(100, 0), 1)
            .with_output_dir(dir.path());
        let names = failing_field(&mut t, &["a", "b"]);

        let report = t.run_round_robin(&names).await;
        assert_eq!(report.games_played, 2);
        assert!(dir.path().join("game_1.pgn").exists());
        assert!(dir.path().join("game_2.pgn").exists());
    }

    #[tokio::test]
    async fn observer_sees_every_game_and_panics_are_contained() {
        use std::sync::{Arc, Mutex};

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut t = Tournament::new("obs", TimeControl::new(100, 0), 1).with_observer(Box::new(
            move |summary, standings| {
                sink.lock().unwrap().push(summary.game_number);
                assert!(!standings.is_empty());
                panic!("observer bug");
            },
        ));
        let names = failing_field(&mut t, &["a", "b"]);

        let report = t.run_round_robin(&names).await;
        assert_eq!(report.games_played, 2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
}
