//! Chess rules collaborator.
//!
//! Wraps `shakmaty` to provide the three things the orchestrator needs:
//! legality checking, move application, and terminal-state classification.
//! The arena itself never reasons about chess; everything rules-shaped
//! goes through here.

use shakmaty::{
    fen::Fen,
    san::SanPlus,
    uci::UciMove,
    zobrist::{Zobrist64, ZobristHash},
    CastlingMode, Chess, Color, EnPassantMode, Position,
};
use thiserror::Error;

/// Errors from parsing or applying moves and positions.
#[derive(Error, Debug)]
pub enum RulesError {
    /// The FEN string could not be parsed into a legal position.
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),
    /// The move token is not syntactically valid UCI.
    #[error("Invalid move format: {0}")]
    InvalidMoveFormat(String),
    /// The move is well-formed but not legal in the current position.
    #[error("Illegal move: {0}")]
    IllegalMove(String),
}

/// Why a game position is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The side to move is checkmated; the winner is recorded.
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    Repetition,
}

impl Termination {
    /// Human-readable reason string, as recorded in match results.
    pub fn reason(&self) -> &'static str {
        match self {
            Termination::Checkmate { .. } => "Checkmate",
            Termination::Stalemate => "Stalemate",
            Termination::InsufficientMaterial => "Insufficient material",
            Termination::FiftyMoveRule => "Fifty-move rule",
            Termination::Repetition => "Threefold repetition",
        }
    }
}

/// A chess position plus the history needed for repetition detection.
///
/// Keeps the UCI and SAN form of every move played, and the Zobrist hash
/// of every position reached (real hashing via shakmaty, not an
/// approximation).
#[derive(Debug, Clone)]
pub struct Board {
    pos: Chess,
    moves: Vec<String>,
    san: Vec<String>,
    hashes: Vec<Zobrist64>,
}

impl Board {
    /// The standard starting position.
    pub fn startpos() -> Self {
        Self::from_position(Chess::default())
    }

    /// A position from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let parsed: Fen = fen
            .parse()
            .map_err(|_| RulesError::InvalidFen(fen.to_string()))?;
        let pos: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|_| RulesError::InvalidFen(fen.to_string()))?;
        Ok(Self::from_position(pos))
    }

    fn from_position(pos: Chess) -> Self {
        let hash = pos.zobrist_hash::<Zobrist64>(EnPassantMode::Legal);
        Self {
            pos,
            moves: Vec::new(),
            san: Vec::new(),
            hashes: vec![hash],
        }
    }

    /// Parse, validate and apply one UCI move.
    ///
    /// Distinguishes a malformed token from a well-formed but illegal move;
    /// the orchestrator reports those differently. On error the position is
    /// unchanged.
    pub fn try_push_uci(&mut self, mv: &str) -> Result<(), RulesError> {
        let uci: UciMove = mv
            .parse()
            .map_err(|_| RulesError::InvalidMoveFormat(mv.to_string()))?;
        let m = uci
            .to_move(&self.pos)
            .map_err(|_| RulesError::IllegalMove(mv.to_string()))?;

        let san = SanPlus::from_move_and_play_unchecked(&mut self.pos, &m);
        self.moves.push(mv.to_string());
        self.san.push(san.to_string());
        self.hashes
            .push(self.pos.zobrist_hash::<Zobrist64>(EnPassantMode::Legal));
        Ok(())
    }

    /// The side to move.
    pub fn side_to_move(&self) -> Color {
        self.pos.turn()
    }

    /// Moves played so far, in UCI notation.
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    /// Moves played so far, in SAN.
    pub fn san_moves(&self) -> &[String] {
        &self.san
    }

    /// Number of half-moves played from the initial position.
    pub fn ply(&self) -> usize {
        self.moves.len()
    }

    /// The current position as a FEN string.
    pub fn fen(&self) -> String {
        Fen(self.pos.clone().into_setup(EnPassantMode::Legal)).to_string()
    }

    /// Classify the current position if it is terminal.
    ///
    /// Checked in result precedence order: checkmate, stalemate,
    /// insufficient material, fifty-move rule, threefold repetition.
    pub fn termination(&self) -> Option<Termination> {
        if self.pos.is_checkmate() {
            return Some(Termination::Checkmate {
                winner: !self.pos.turn(),
            });
        }
        if self.pos.is_stalemate() {
            return Some(Termination::Stalemate);
        }
        if self.pos.is_insufficient_material() {
            return Some(Termination::InsufficientMaterial);
        }
        if self.pos.halfmoves() >= 100 {
            return Some(Termination::FiftyMoveRule);
        }
        if self.is_repetition() {
            return Some(Termination::Repetition);
        }
        None
    }

    /// Whether the current position has occurred at least three times.
    fn is_repetition(&self) -> bool {
        let current = match self.hashes.last() {
            Some(hash) => *hash,
            None => return false,
        };
        self.hashes.iter().filter(|h| **h == current).count() >= 3
    }
}
