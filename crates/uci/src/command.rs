//! Building GUI-to-engine commands.

/// Search limits for the `go` command.
///
/// Only the fields that are set end up in the command text, so callers can
/// combine clock-based, depth-based and node-based limits freely.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoOptions {
    /// White time remaining in milliseconds.
    pub wtime: Option<u64>,
    /// Black time remaining in milliseconds.
    pub btime: Option<u64>,
    /// White increment per move in milliseconds.
    pub winc: Option<u64>,
    /// Black increment per move in milliseconds.
    pub binc: Option<u64>,
    /// Moves to go until next time control.
    pub movestogo: Option<u32>,
    /// Search to this depth.
    pub depth: Option<u32>,
    /// Search this many nodes.
    pub nodes: Option<u64>,
    /// Search for exactly this time in milliseconds.
    pub movetime: Option<u64>,
    /// Search indefinitely until `stop`.
    pub infinite: bool,
}

impl GoOptions {
    /// Fixed time per move.
    pub fn movetime(ms: u64) -> Self {
        Self {
            movetime: Some(ms),
            ..Self::default()
        }
    }

    /// Fixed depth limit.
    pub fn depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            ..Self::default()
        }
    }

    /// Infinite search, stopped with `stop`.
    pub fn infinite() -> Self {
        Self {
            infinite: true,
            ..Self::default()
        }
    }

    /// Clock-based limits for both sides.
    pub fn clocks(wtime: u64, btime: u64, winc: u64, binc: u64) -> Self {
        Self {
            wtime: Some(wtime),
            btime: Some(btime),
            winc: Some(winc),
            binc: Some(binc),
            ..Self::default()
        }
    }

    /// Build the `go` command line.
    ///
    /// `infinite` suppresses every other limit; engines are not required to
    /// handle the combination.
    pub fn to_command(&self) -> String {
        let mut parts = vec!["go".to_string()];

        if self.infinite {
            parts.push("infinite".to_string());
            return parts.join(" ");
        }

        if let Some(t) = self.wtime {
            parts.push(format!("wtime {}", t));
        }
        if let Some(t) = self.btime {
            parts.push(format!("btime {}", t));
        }
        if let Some(t) = self.winc {
            parts.push(format!("winc {}", t));
        }
        if let Some(t) = self.binc {
            parts.push(format!("binc {}", t));
        }
        if let Some(n) = self.movestogo {
            parts.push(format!("movestogo {}", n));
        }
        if let Some(d) = self.depth {
            parts.push(format!("depth {}", d));
        }
        if let Some(n) = self.nodes {
            parts.push(format!("nodes {}", n));
        }
        if let Some(t) = self.movetime {
            parts.push(format!("movetime {}", t));
        }

        parts.join(" ")
    }
}

/// Build a `position` command.
///
/// With a FEN the command is `position fen <fen>`, otherwise
/// `position startpos`; a non-empty move list appends `moves ...` in
/// either case.
pub fn position_command(fen: Option<&str>, moves: &[String]) -> String {
    let mut cmd = match fen {
        Some(fen) => format!("position fen {}", fen),
        None => "position startpos".to_string(),
    };
    if !moves.is_empty() {
        cmd.push_str(" moves ");
        cmd.push_str(&moves.join(" "));
    }
    cmd
}
