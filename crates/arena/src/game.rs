//! Single-game execution between two UCI engines.
//!
//! [`Match`] owns both engine processes for the duration of one game,
//! enforces the time control, validates every move through the rules
//! collaborator, and guarantees teardown of both engines on every exit
//! path. It never panics its way out of a game: internal failures become
//! a [`MatchRecord`] with [`Winner::Error`].

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use shakmaty::Color;
use thiserror::Error;
use tracing::{info, warn};
use uci::GoOptions;

use crate::client::{ClientError, SearchResult, UciClient};
use crate::pgn::{self, PgnMeta};
use crate::rules::{Board, Termination};

/// Default ply ceiling before a game is adjudicated as drawn.
pub const DEFAULT_MAX_PLIES: usize = 200;

/// Who won a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    White,
    Black,
    Draw,
    /// The game could not be completed (startup or I/O failure).
    Error,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Winner::White => "white",
            Winner::Black => "black",
            Winner::Draw => "draw",
            Winner::Error => "error",
        };
        f.write_str(s)
    }
}

/// Per-side base time and increment, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    pub base_ms: u64,
    pub increment_ms: u64,
}

impl TimeControl {
    pub fn new(base_ms: u64, increment_ms: u64) -> Self {
        Self {
            base_ms,
            increment_ms,
        }
    }
}

impl fmt::Display for TimeControl {
    /// Seconds-based `base+increment` form, e.g. `60+1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.base_ms / 1000, self.increment_ms / 1000)
    }
}

/// The immutable result of one finished game.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRecord {
    pub white: String,
    pub black: String,
    pub winner: Winner,
    /// Why the game ended; never empty.
    pub reason: String,
    /// Full move list in UCI notation.
    pub moves: Vec<String>,
    /// Remaining clock per side at the end, milliseconds.
    pub time_white_ms: u64,
    pub time_black_ms: u64,
    /// Accumulated node counts per side (last info record per move).
    pub nodes_white: u64,
    pub nodes_black: u64,
    /// The finished game in PGN.
    pub pgn: String,
}

/// Observer invoked after every ply with the position reached, the move
/// just played, and the full search result that produced it.
pub type MoveObserver = Box<dyn FnMut(&Board, &str, &SearchResult) + Send>;

#[derive(Error, Debug)]
enum MatchError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("Failed to initialize engine: {0}")]
    Init(String),
}

/// Mutable state of a game in progress.
struct GameState {
    board: Board,
    time_white_ms: u64,
    time_black_ms: u64,
    nodes_white: u64,
    nodes_black: u64,
    outcome: Option<(Winner, String)>,
}

/// A single game between two engines.
pub struct Match {
    white_path: PathBuf,
    black_path: PathBuf,
    white_name: String,
    black_name: String,
    time_control: TimeControl,
    opening: Vec<String>,
    max_plies: usize,
    white_options: Vec<(String, String)>,
    black_options: Vec<(String, String)>,
    observer: Option<MoveObserver>,
}

impl Match {
    /// Create a match between two engine executables.
    ///
    /// Display names default to the executable file stems; the scheduler
    /// overrides them with registry names via [`with_names`](Self::with_names).
    pub fn new<W: AsRef<Path>, B: AsRef<Path>>(
        white: W,
        black: B,
        time_control: TimeControl,
    ) -> Self {
        let white = white.as_ref().to_path_buf();
        let black = black.as_ref().to_path_buf();
        Self {
            white_name: file_stem(&white),
            black_name: file_stem(&black),
            white_path: white,
            black_path: black,
            time_control,
            opening: Vec::new(),
            max_plies: DEFAULT_MAX_PLIES,
            white_options: Vec::new(),
            black_options: Vec::new(),
            observer: None,
        }
    }

    /// Set the display names used in results and PGN headers.
    pub fn with_names(mut self, white: impl Into<String>, black: impl Into<String>) -> Self {
        self.white_name = white.into();
        self.black_name = black.into();
        self
    }

    /// Play a fixed opening prefix before the engines start searching.
    pub fn with_opening(mut self, moves: Vec<String>) -> Self {
        self.opening = moves;
        self
    }

    /// Override the ply ceiling.
    pub fn with_max_plies(mut self, max_plies: usize) -> Self {
        self.max_plies = max_plies;
        self
    }

    /// UCI options sent to each side after initialization.
    pub fn with_options(
        mut self,
        white: Vec<(String, String)>,
        black: Vec<(String, String)>,
    ) -> Self {
        self.white_options = white;
        self.black_options = black;
        self
    }

    /// Install a per-ply observer. Observer panics are caught and logged;
    /// they never abort the game.
    pub fn with_observer(mut self, observer: MoveObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Play the game to completion.
    ///
    /// Both engines receive `quit` on every exit path. This method does not
    /// fail: any internal error is converted into a record with
    /// `winner == Error` and the error message as reason.
    pub async fn play(&mut self) -> MatchRecord {
        info!("Match: {} vs {}", self.white_name, self.black_name);

        let mut white = UciClient::new(&self.white_path);
        let mut black = UciClient::new(&self.black_path);

        let mut state = GameState {
            board: Board::startpos(),
            time_white_ms: self.time_control.base_ms,
            time_black_ms: self.time_control.base_ms,
            nodes_white: 0,
            nodes_black: 0,
            outcome: None,
        };

        let run = self.run(&mut white, &mut black, &mut state).await;

        // Unconditional teardown, including after internal errors.
        white.quit().await;
        black.quit().await;

        let (winner, reason) = match (state.outcome.take(), run) {
            (Some(outcome), _) => outcome,
            (None, Err(err)) => (Winner::Error, err.to_string()),
            // The loop only exits without an outcome on an error.
            (None, Ok(())) => (Winner::Error, "Game ended without outcome".to_string()),
        };

        info!("Match finished: {} - {}", winner, reason);

        let pgn = pgn::render(
            &PgnMeta {
                event: "Arena match",
                white: &self.white_name,
                black: &self.black_name,
                winner,
                reason: &reason,
                time_control: self.time_control,
            },
            state.board.san_moves(),
        );

        MatchRecord {
            white: self.white_name.clone(),
            black: self.black_name.clone(),
            winner,
            reason,
            moves: state.board.moves().to_vec(),
            time_white_ms: state.time_white_ms,
            time_black_ms: state.time_black_ms,
            nodes_white: state.nodes_white,
            nodes_black: state.nodes_black,
            pgn,
        }
    }

    async fn run(
        &mut self,
        white: &mut UciClient,
        black: &mut UciClient,
        state: &mut GameState,
    ) -> Result<(), MatchError> {
        white.start().await?;
        black.start().await?;

        if !white.initialize().await? {
            return Err(MatchError::Init(self.white_name.clone()));
        }
        if !black.initialize().await? {
            return Err(MatchError::Init(self.black_name.clone()));
        }

        for (name, value) in &self.white_options {
            white.set_option(name, value).await?;
        }
        for (name, value) in &self.black_options {
            black.set_option(name, value).await?;
        }

        white.new_game().await?;
        black.new_game().await?;

        self.play_opening(state);

        while state.outcome.is_none() {
            if let Some(termination) = state.board.termination() {
                state.outcome = Some(outcome_of(termination));
                break;
            }
            if state.board.ply() >= self.max_plies {
                state.outcome = Some((
                    Winner::Draw,
                    format!("Maximum moves ({}) reached", self.max_plies),
                ));
                break;
            }

            let mover = state.board.side_to_move();
            let engine = match mover {
                Color::White => &mut *white,
                Color::Black => &mut *black,
            };

            engine.set_position(None, state.board.moves()).await?;

            let limits = GoOptions::clocks(
                state.time_white_ms,
                state.time_black_ms,
                self.time_control.increment_ms,
                self.time_control.increment_ms,
            );
            let started = Instant::now();
            let result = engine.go(&limits).await?;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let best = match result.best_move.clone() {
                Some(best) => best,
                None => {
                    warn!("{:?} engine returned no move", mover);
                    state.outcome = Some((loser_of(mover), "Engine failure".to_string()));
                    break;
                }
            };

            if let Err(err) = state.board.try_push_uci(&best) {
                warn!("{:?} engine played {}: {}", mover, best, err);
                state.outcome = Some((loser_of(mover), "Illegal move".to_string()));
                break;
            }

            // Clock bookkeeping: charge elapsed wall time, credit the
            // increment, floor at zero.
            let increment = self.time_control.increment_ms as i64;
            let clock = match mover {
                Color::White => &mut state.time_white_ms,
                Color::Black => &mut state.time_black_ms,
            };
            *clock = (*clock as i64 - elapsed_ms as i64 + increment).max(0) as u64;
            let remaining = *clock;

            if let Some(nodes) = result.last_nodes() {
                match mover {
                    Color::White => state.nodes_white += nodes,
                    Color::Black => state.nodes_black += nodes,
                }
            }

            info!(
                "Move {}: {:?} plays {} ({} ms, {} ms remaining)",
                state.board.ply(),
                mover,
                best,
                elapsed_ms,
                remaining
            );

            if let Some(observer) = self.observer.as_mut() {
                let call = catch_unwind(AssertUnwindSafe(|| {
                    observer(&state.board, &best, &result);
                }));
                if call.is_err() {
                    warn!("Move observer panicked; continuing game");
                }
            }

            if remaining == 0 {
                state.outcome = Some((loser_of(mover), "Time forfeit".to_string()));
                break;
            }
        }

        Ok(())
    }

    /// Apply the fixed opening prefix, validating each move like an
    /// in-game move. An invalid prefix move abandons the rest of the
    /// prefix but never the game.
    fn play_opening(&self, state: &mut GameState) {
        for mv in &self.opening {
            match state.board.try_push_uci(mv) {
                Ok(()) => info!("Opening move: {}", mv),
                Err(err) => {
                    warn!("Abandoning opening prefix: {}", err);
                    break;
                }
            }
        }
    }
}

fn outcome_of(termination: Termination) -> (Winner, String) {
    let winner = match termination {
        Termination::Checkmate {
            winner: Color::White,
        } => Winner::White,
        Termination::Checkmate {
            winner: Color::Black,
        } => Winner::Black,
        _ => Winner::Draw,
    };
    (winner, termination.reason().to_string())
}

/// The winner when `mover` loses the game.
fn loser_of(mover: Color) -> Winner {
    match mover {
        Color::White => Winner::Black,
        Color::Black => Winner::White,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
