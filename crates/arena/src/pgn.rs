//! PGN (Portable Game Notation) rendering for finished games.
//!
//! Games are rendered with the Seven Tag Roster plus `Termination` and
//! `TimeControl` headers, SAN move text wrapped at 80 columns, and the
//! result terminator. Writing to disk is a thin helper over the renderer
//! so tournament code can also embed the PGN text in JSON reports.

use std::io::Write;
use std::path::Path;

use chrono::Utc;

use crate::game::{TimeControl, Winner};

/// Maximum width of a move-text line.
const WRAP_COLUMNS: usize = 80;

/// Header metadata for one rendered game.
pub struct PgnMeta<'a> {
    pub event: &'a str,
    pub white: &'a str,
    pub black: &'a str,
    pub winner: Winner,
    pub reason: &'a str,
    pub time_control: TimeControl,
}

/// Map a winner to the PGN result code. Games that could not be completed
/// score as drawn; the Termination header carries the failure reason.
pub fn result_code(winner: Winner) -> &'static str {
    match winner {
        Winner::White => "1-0",
        Winner::Black => "0-1",
        Winner::Draw | Winner::Error => "1/2-1/2",
    }
}

/// Render a finished game as a PGN string.
pub fn render(meta: &PgnMeta<'_>, san_moves: &[String]) -> String {
    let result = result_code(meta.winner);

    let mut out = String::new();
    out.push_str(&format!("[Event \"{}\"]\n", meta.event));
    out.push_str("[Site \"local\"]\n");
    out.push_str(&format!("[Date \"{}\"]\n", Utc::now().format("%Y.%m.%d")));
    out.push_str(&format!("[White \"{}\"]\n", meta.white));
    out.push_str(&format!("[Black \"{}\"]\n", meta.black));
    out.push_str(&format!("[Result \"{}\"]\n", result));
    out.push_str(&format!("[Termination \"{}\"]\n", meta.reason));
    out.push_str(&format!("[TimeControl \"{}\"]\n", meta.time_control));
    out.push('\n');

    let mut tokens = Vec::with_capacity(san_moves.len() + san_moves.len() / 2 + 1);
    for (i, mv) in san_moves.iter().enumerate() {
        if i % 2 == 0 {
            tokens.push(format!("{}.", i / 2 + 1));
        }
        tokens.push(mv.clone());
    }
    tokens.push(result.to_string());

    out.push_str(&wrap(&tokens, WRAP_COLUMNS));
    out.push('\n');
    out
}

/// Write a rendered PGN to a file.
pub fn write_pgn<P: AsRef<Path>>(path: P, pgn: &str) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(pgn.as_bytes())
}

/// Join tokens into lines no wider than `columns`, breaking only at token
/// boundaries. A token wider than the limit gets a line of its own.
fn wrap(tokens: &[String], columns: usize) -> String {
    let mut out = String::new();
    let mut line = String::new();
    for token in tokens {
        if !line.is_empty() && line.len() + 1 + token.len() > columns {
            out.push_str(&line);
            out.push('\n');
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(token);
    }
    out.push_str(&line);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(winner: Winner) -> PgnMeta<'static> {
        PgnMeta {
            event: "Test match",
            white: "Alpha",
            black: "Beta",
            winner,
            reason: "Checkmate",
            time_control: TimeControl::new(60_000, 1_000),
        }
    }

    fn sans(moves: &[&str]) -> Vec<String> {
        moves.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn render_includes_all_headers() {
        let pgn = render(&meta(Winner::White), &sans(&["e4", "e5", "Qh5"]));
        assert!(pgn.contains("[Event \"Test match\"]"));
        assert!(pgn.contains("[Site \"local\"]"));
        assert!(pgn.contains("[Date \""));
        assert!(pgn.contains("[White \"Alpha\"]"));
        assert!(pgn.contains("[Black \"Beta\"]"));
        assert!(pgn.contains("[Result \"1-0\"]"));
        assert!(pgn.contains("[Termination \"Checkmate\"]"));
        assert!(pgn.contains("[TimeControl \"60+1\"]"));
    }

    #[test]
    fn render_numbers_move_pairs() {
        let pgn = render(
            &meta(Winner::Draw),
            &sans(&["e4", "e5", "Nf3", "Nc6", "Bb5"]),
        );
        assert!(pgn.contains("1. e4 e5 2. Nf3 Nc6 3. Bb5 1/2-1/2"));
    }

    #[test]
    fn result_codes() {
        assert_eq!(result_code(Winner::White), "1-0");
        assert_eq!(result_code(Winner::Black), "0-1");
        assert_eq!(result_code(Winner::Draw), "1/2-1/2");
        assert_eq!(result_code(Winner::Error), "1/2-1/2");
    }

    #[test]
    fn wrap_breaks_at_token_boundaries() {
        let tokens: Vec<String> = (0..40).map(|i| format!("{}.", i + 1)).collect();
        let wrapped = wrap(&tokens, 20);
        for line in wrapped.lines() {
            assert!(line.len() <= 20, "line too long: {:?}", line);
            assert!(!line.starts_with(' '));
            assert!(!line.ends_with(' '));
        }
    }

    #[test]
    fn write_pgn_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.pgn");
        let pgn = render(&meta(Winner::Black), &sans(&["f3", "e5", "g4", "Qh4#"]));
        write_pgn(&path, &pgn).unwrap();
        let read = std::fs::read_to_string(&path).unwrap();
        assert_eq!(read, pgn);
        assert!(read.contains("1. f3 e5 2. g4 Qh4# 0-1"));
    }
}
