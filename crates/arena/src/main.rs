use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use arena::game::{Match, TimeControl};
use arena::openings::OpeningBook;
use arena::pgn;
use arena::registry::Registry;
use arena::report;
use arena::tournament::{Tournament, TournamentReport};
use arena::validator::Validator;

#[derive(Parser)]
#[command(name = "arena")]
#[command(about = "UCI chess engine benchmarking arena")]
struct Cli {
    /// Path to the engine registry
    #[arg(long, default_value = "engines.toml")]
    registry: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single game between two engines
    Match {
        /// White engine, registry name or executable path
        white: String,
        /// Black engine, registry name or executable path
        black: String,
        /// Base time per side in seconds
        #[arg(short, long)]
        time: Option<u64>,
        /// Increment per move in seconds
        #[arg(short, long)]
        increment: Option<u64>,
        /// Opening book TOML; one line is drawn at random
        #[arg(long)]
        book: Option<PathBuf>,
        /// Write the game PGN here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a round-robin tournament
    RoundRobin {
        /// Engines to include; defaults to every enabled registry engine
        engines: Vec<String>,
        /// Number of rounds
        #[arg(short, long)]
        rounds: Option<u32>,
        #[arg(short, long)]
        time: Option<u64>,
        #[arg(short, long)]
        increment: Option<u64>,
        /// Opening book TOML; defaults to the built-in book
        #[arg(long)]
        book: Option<PathBuf>,
        /// Directory for PGN files and the JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a gauntlet: one engine against a field
    Gauntlet {
        /// Engine under test
        engine: String,
        /// Opponents; defaults to every other enabled registry engine
        opponents: Vec<String>,
        #[arg(short, long)]
        rounds: Option<u32>,
        #[arg(short, long)]
        time: Option<u64>,
        #[arg(short, long)]
        increment: Option<u64>,
        #[arg(long)]
        book: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the UCI compliance battery against an engine
    Validate {
        /// Engine, registry name or executable path
        engine: String,
        /// Write the JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List engines in the registry
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let registry = Registry::load(&cli.registry)
        .with_context(|| format!("loading registry {}", cli.registry.display()))?;

    match cli.command {
        Commands::Match {
            white,
            black,
            time,
            increment,
            book,
            output,
        } => {
            let tc = time_control(&registry, time, increment);
            let (white_path, white_options) = resolve(&registry, &white);
            let (black_path, black_options) = resolve(&registry, &black);

            let opening = match book {
                Some(path) => OpeningBook::load(&path)
                    .with_context(|| format!("loading opening book {}", path.display()))?
                    .choose()
                    .map(|o| o.moves.clone())
                    .unwrap_or_default(),
                None => Vec::new(),
            };

            let record = Match::new(&white_path, &black_path, tc)
                .with_names(&white, &black)
                .with_opening(opening)
                .with_options(white_options, black_options)
                .play()
                .await;

            println!(
                "{} vs {}: {} ({}) in {} moves",
                record.white,
                record.black,
                record.winner,
                record.reason,
                record.moves.len()
            );
            if let Some(path) = output {
                pgn::write_pgn(&path, &record.pgn)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("PGN saved to {}", path.display());
            } else {
                println!("\n{}", record.pgn);
            }
        }
        Commands::RoundRobin {
            engines,
            rounds,
            time,
            increment,
            book,
            output,
        } => {
            let names = if engines.is_empty() {
                registry.enabled().iter().map(|s| s.to_string()).collect()
            } else {
                engines
            };
            anyhow::ensure!(names.len() >= 2, "a round-robin needs at least two engines");

            let dir = output.unwrap_or_else(|| registry.defaults.output_dir.clone());
            let mut tournament = Tournament::new(
                "round_robin",
                time_control(&registry, time, increment),
                rounds.unwrap_or(registry.defaults.rounds),
            )
            .with_book(load_book(book)?)
            .with_output_dir(dir.join("games"));
            register(&mut tournament, &registry, &names);

            let report = tournament.run_round_robin(&names).await;
            finish_tournament(&dir, &report);
        }
        Commands::Gauntlet {
            engine,
            opponents,
            rounds,
            time,
            increment,
            book,
            output,
        } => {
            let opponents: Vec<String> = if opponents.is_empty() {
                registry
                    .enabled()
                    .iter()
                    .filter(|n| **n != engine)
                    .map(|s| s.to_string())
                    .collect()
            } else {
                opponents
            };
            anyhow::ensure!(!opponents.is_empty(), "a gauntlet needs at least one opponent");

            let dir = output.unwrap_or_else(|| registry.defaults.output_dir.clone());
            let mut tournament = Tournament::new(
                format!("gauntlet_{}", engine),
                time_control(&registry, time, increment),
                rounds.unwrap_or(registry.defaults.rounds),
            )
            .with_book(load_book(book)?)
            .with_output_dir(dir.join("games"));
            let mut all = opponents.clone();
            all.push(engine.clone());
            register(&mut tournament, &registry, &all);

            let report = tournament.run_gauntlet(&engine, &opponents).await;
            finish_tournament(&dir, &report);
        }
        Commands::Validate { engine, output } => {
            let (path, _) = resolve(&registry, &engine);
            let report = Validator::new(&path).validate().await;

            let status = if report.compatible {
                "COMPATIBLE"
            } else {
                "ISSUES FOUND"
            };
            println!(
                "{}: {} - score {:.1}% ({}/{} probes passed)",
                report.engine, status, report.score, report.passed, report.total
            );
            for probe in &report.results {
                let mark = if probe.passed { "pass" } else { "FAIL" };
                println!("  [{}] {}", mark, probe.name);
            }
            if !report.issues.is_empty() {
                println!("Issues:");
                for issue in &report.issues {
                    println!("  - {}", issue);
                }
            }
            if !report.warnings.is_empty() {
                println!("Warnings:");
                for warning in &report.warnings {
                    println!("  - {}", warning);
                }
            }
            if let Some(path) = output {
                if let Err(err) = report::save_validation(&path, &report) {
                    error!("Failed to save validation report: {}", err);
                }
            }
        }
        Commands::List => {
            let mut names: Vec<&String> = registry.engines.keys().collect();
            names.sort();
            if names.is_empty() {
                println!("No engines in {}", cli.registry.display());
            }
            for name in names {
                let entry = &registry.engines[name];
                let state = if entry.enabled { " " } else { "(disabled) " };
                println!("{}{} -> {}", state, name, entry.path.display());
            }
        }
    }

    Ok(())
}

/// Resolve a CLI engine argument: a registry name if it matches one,
/// otherwise a raw executable path.
fn resolve(registry: &Registry, name: &str) -> (PathBuf, Vec<(String, String)>) {
    match registry.get(name) {
        Ok(entry) => {
            let mut options: Vec<(String, String)> = entry
                .options
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            options.sort();
            (entry.path.clone(), options)
        }
        Err(_) => (PathBuf::from(name), Vec::new()),
    }
}

fn register(tournament: &mut Tournament, registry: &Registry, names: &[String]) {
    for name in names {
        let (path, options) = resolve(registry, name);
        tournament.add_engine_with_options(name.clone(), path, options);
    }
}

fn time_control(registry: &Registry, time_secs: Option<u64>, inc_secs: Option<u64>) -> TimeControl {
    TimeControl::new(
        time_secs
            .map(|s| s * 1000)
            .unwrap_or(registry.defaults.base_time_ms),
        inc_secs
            .map(|s| s * 1000)
            .unwrap_or(registry.defaults.increment_ms),
    )
}

fn load_book(path: Option<PathBuf>) -> anyhow::Result<OpeningBook> {
    match path {
        Some(path) => OpeningBook::load(&path)
            .with_context(|| format!("loading opening book {}", path.display())),
        None => Ok(OpeningBook::builtin()),
    }
}

fn finish_tournament(dir: &std::path::Path, report: &TournamentReport) {
    println!(
        "\n{}: {}/{} games in {:.1}s",
        report.tournament, report.games_played, report.games_total, report.duration_seconds
    );
    println!(
        "{:<4} {:<20} {:>5} {:>4} {:>4} {:>4} {:>7} {:>7}",
        "Rank", "Engine", "Games", "W", "L", "D", "Points", "Score"
    );
    for (rank, stats) in report.standings.iter().enumerate() {
        println!(
            "{:<4} {:<20} {:>5} {:>4} {:>4} {:>4} {:>7.1} {:>6.1}%",
            rank + 1,
            stats.engine,
            stats.games,
            stats.wins,
            stats.losses,
            stats.draws,
            stats.points,
            stats.score_percentage()
        );
    }

    let path = report::default_path(dir, &report.tournament);
    if let Err(err) = report::save_tournament(&path, report) {
        error!("Failed to save tournament report: {}", err);
    } else {
        println!("Report saved to {}", path.display());
    }
}
