//! UCI (Universal Chess Interface) protocol library, GUI side.
//!
//! This crate provides types for driving UCI chess engines: building the
//! commands a GUI sends over the engine's stdin, and parsing the
//! line-oriented messages the engine sends back.
//!
//! # Commands sent
//!
//! - `uci` - Initialize engine, get id and options
//! - `isready` / `ucinewgame` - Synchronization and game reset
//! - `position [fen <fen>|startpos] [moves <move>...]` - Set position
//! - `go [wtime][btime][winc][binc][movestogo][depth][nodes][movetime][infinite]`
//! - `stop` / `quit`
//!
//! # Messages parsed
//!
//! - `id name ...` / `id author ...`
//! - `option name ... type ... default ... [min ...] [max ...]`
//! - `uciok` / `readyok`
//! - `info ...`
//! - `bestmove <move> [ponder <move>]`

mod command;
mod info;
mod option;

pub use command::{position_command, GoOptions};
pub use info::{EngineInfo, Score};
pub use option::{EngineOption, OptionKind};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UciError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Engine identification (`id name ...` or `id author ...`).
    Id {
        name: Option<String>,
        author: Option<String>,
    },
    /// Declared engine option.
    Option_(EngineOption),
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// Search information.
    Info(EngineInfo),
    /// Best move found.
    BestMove { mv: String, ponder: Option<String> },
    /// Unknown line (for forward compatibility).
    Unknown(String),
}

impl EngineMessage {
    /// Parse a single line of engine output.
    ///
    /// Unrecognized lines become [`EngineMessage::Unknown`] rather than an
    /// error; real engines chatter freely on stdout.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let mut parts = line.split_whitespace();

        match parts.next().unwrap_or("") {
            "uciok" => EngineMessage::UciOk,
            "readyok" => EngineMessage::ReadyOk,
            "id" => Self::parse_id(line),
            "option" => match EngineOption::parse(line) {
                Some(opt) => EngineMessage::Option_(opt),
                None => EngineMessage::Unknown(line.to_string()),
            },
            "info" => match EngineInfo::parse(line) {
                Some(info) => EngineMessage::Info(info),
                None => EngineMessage::Unknown(line.to_string()),
            },
            "bestmove" => Self::parse_bestmove(line),
            _ => EngineMessage::Unknown(line.to_string()),
        }
    }

    fn parse_id(line: &str) -> Self {
        if let Some(name) = line.strip_prefix("id name ") {
            EngineMessage::Id {
                name: Some(name.trim().to_string()),
                author: None,
            }
        } else if let Some(author) = line.strip_prefix("id author ") {
            EngineMessage::Id {
                name: None,
                author: Some(author.trim().to_string()),
            }
        } else {
            EngineMessage::Unknown(line.to_string())
        }
    }

    fn parse_bestmove(line: &str) -> Self {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.get(1) {
            Some(mv) => {
                let ponder = if parts.get(2) == Some(&"ponder") {
                    parts.get(3).map(|p| p.to_string())
                } else {
                    None
                };
                EngineMessage::BestMove {
                    mv: mv.to_string(),
                    ponder,
                }
            }
            // `bestmove` with no move token; some engines emit this on stop.
            None => EngineMessage::BestMove {
                mv: String::new(),
                ponder: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_uciok() {
        assert_eq!(EngineMessage::parse("uciok"), EngineMessage::UciOk);
        assert_eq!(EngineMessage::parse("  readyok "), EngineMessage::ReadyOk);
    }

    #[test]
    fn parse_id_name() {
        let msg = EngineMessage::parse("id name Stockfish 16");
        assert_eq!(
            msg,
            EngineMessage::Id {
                name: Some("Stockfish 16".to_string()),
                author: None,
            }
        );
    }

    #[test]
    fn parse_id_author() {
        let msg = EngineMessage::parse("id author the Stockfish developers");
        assert_eq!(
            msg,
            EngineMessage::Id {
                name: None,
                author: Some("the Stockfish developers".to_string()),
            }
        );
    }

    #[test]
    fn parse_bestmove_plain() {
        let msg = EngineMessage::parse("bestmove e2e4");
        assert_eq!(
            msg,
            EngineMessage::BestMove {
                mv: "e2e4".to_string(),
                ponder: None,
            }
        );
    }

    #[test]
    fn parse_bestmove_with_ponder() {
        let msg = EngineMessage::parse("bestmove e2e4 ponder e7e5");
        assert_eq!(
            msg,
            EngineMessage::BestMove {
                mv: "e2e4".to_string(),
                ponder: Some("e7e5".to_string()),
            }
        );
    }

    #[test]
    fn parse_bestmove_without_move() {
        let msg = EngineMessage::parse("bestmove");
        assert_eq!(
            msg,
            EngineMessage::BestMove {
                mv: String::new(),
                ponder: None,
            }
        );
    }

    #[test]
    fn parse_option_line() {
        let msg = EngineMessage::parse("option name Hash type spin default 16 min 1 max 65536");
        match msg {
            EngineMessage::Option_(opt) => {
                assert_eq!(opt.name, "Hash");
                assert_eq!(opt.kind, Some(OptionKind::Spin));
            }
            other => panic!("Expected Option_, got {:?}", other),
        }
    }

    #[test]
    fn parse_unknown_line() {
        let msg = EngineMessage::parse("Fancy Engine booting up...");
        assert_eq!(
            msg,
            EngineMessage::Unknown("Fancy Engine booting up...".to_string())
        );
    }

    #[test]
    fn parse_info_line() {
        let msg = EngineMessage::parse("info depth 8 score cp 12 nodes 4096");
        match msg {
            EngineMessage::Info(info) => {
                assert_eq!(info.depth, Some(8));
                assert_eq!(info.nodes, Some(4096));
            }
            other => panic!("Expected Info, got {:?}", other),
        }
    }
}
