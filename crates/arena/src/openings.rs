//! Opening book support.
//!
//! An opening is a short named prefix of UCI moves played before the
//! engines take over. Tournaments draw one opening uniformly at random
//! per pairing and reuse it for both color-swapped games, so neither
//! side gets a line the other never faced. A small built-in book covers
//! the common case; a TOML file can replace it.

use std::path::Path;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading an opening book.
#[derive(Error, Debug)]
pub enum OpeningError {
    #[error("Failed to read opening book: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse opening book: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A named opening line in UCI notation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Opening {
    pub name: String,
    pub moves: Vec<String>,
}

/// A collection of openings to draw from.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OpeningBook {
    #[serde(default)]
    pub openings: Vec<Opening>,
}

impl OpeningBook {
    /// The built-in book of common opening lines.
    pub fn builtin() -> Self {
        let lines: &[(&str, &[&str])] = &[
            ("Italian Game", &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4"]),
            ("Ruy Lopez", &["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"]),
            ("Sicilian Defense", &["e2e4", "c7c5"]),
            ("French Defense", &["e2e4", "e7e6", "d2d4", "d7d5"]),
            ("Caro-Kann Defense", &["e2e4", "c7c6", "d2d4", "d7d5"]),
            ("Queen's Gambit", &["d2d4", "d7d5", "c2c4"]),
            ("King's Indian Defense", &["d2d4", "g8f6", "c2c4", "g7g6"]),
            ("English Opening", &["c2c4", "e7e5"]),
            ("Scandinavian Defense", &["e2e4", "d7d5"]),
            ("London System", &["d2d4", "d7d5", "c1f4"]),
        ];
        Self {
            openings: lines
                .iter()
                .map(|(name, moves)| Opening {
                    name: name.to_string(),
                    moves: moves.iter().map(|m| m.to_string()).collect(),
                })
                .collect(),
        }
    }

    /// Load a book from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, OpeningError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn is_empty(&self) -> bool {
        self.openings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.openings.len()
    }

    /// Draw one opening uniformly at random. Returns `None` on an empty
    /// book, in which case games start from the initial position.
    pub fn choose(&self) -> Option<&Opening> {
        self.openings.choose(&mut rand::thread_rng())
    }
}
