//! UCI Arena - a benchmarking arena for UCI chess engines.
//!
//! This crate runs matches and tournaments between UCI-compatible chess
//! engines, scores protocol compliance, and exports game records and
//! reports.
//!
//! # Modules
//!
//! - [`client`] - asynchronous UCI protocol client with a background reader
//! - [`rules`] - board state, move legality, and game termination
//! - [`game`] - single-game orchestration with clocks and teardown
//! - [`tournament`] - round-robin and gauntlet scheduling with standings
//! - [`validator`] - six-probe UCI compliance battery
//! - [`registry`] - TOML engine registry
//! - [`openings`] - opening book support
//! - [`pgn`] - PGN rendering and file output
//! - [`report`] - JSON report persistence

pub mod client;
pub mod game;
pub mod openings;
pub mod pgn;
pub mod registry;
pub mod report;
pub mod rules;
pub mod tournament;
pub mod validator;
