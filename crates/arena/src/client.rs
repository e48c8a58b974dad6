//! UCI protocol client for communicating with chess engines.
//!
//! This module spawns UCI-compatible engines as subprocesses and drives the
//! protocol over their stdin/stdout. A dedicated reader task per process
//! pushes every output line onto a channel for the lifetime of the process,
//! so protocol waits never block on a silent or misbehaving engine: every
//! wait is bounded by a deadline and returns whatever lines arrived.
//!
//! # Lifecycle
//!
//! 1. Create the client with [`UciClient::new`]
//! 2. Spawn the process with [`UciClient::start`]
//! 3. Handshake with [`UciClient::initialize`]
//! 4. Set positions and search with [`UciClient::set_position`] and [`UciClient::go`]
//! 5. Clean up with [`UciClient::quit`] (idempotent, kills on failure)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};
use uci::{position_command, EngineInfo, EngineMessage, EngineOption, GoOptions};

/// Deadline for `uciok` during the handshake. Generous for slow engines.
const INIT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default deadline for `readyok`.
const READY_TIMEOUT: Duration = Duration::from_secs(5);
/// Floor for the `bestmove` deadline during a search.
const GO_TIMEOUT_FLOOR: Duration = Duration::from_secs(60);
/// Granularity of bounded waits on the output channel.
const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Settle delay after `ucinewgame` and `stop`; some engines need it.
const SETTLE_DELAY: Duration = Duration::from_millis(100);
/// How long to wait for a clean exit after `quit` before killing.
const QUIT_TIMEOUT: Duration = Duration::from_secs(5);
/// Output channel capacity, sized above the worst-case info burst of a
/// single search so the reader task never applies backpressure in practice.
const LINE_BUFFER: usize = 4096;

/// Errors from communicating with a UCI engine.
///
/// Protocol timeouts are deliberately not represented here: a missed
/// sentinel is reported as a partial or empty result, and the caller
/// decides whether that is a protocol violation.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The engine executable could not be spawned.
    #[error("Failed to start engine {path}: {source}")]
    Startup {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A command could not be written to the engine's stdin.
    #[error("Failed to send '{command}': {source}")]
    Command {
        command: String,
        source: std::io::Error,
    },
    /// The engine process is not running.
    #[error("Engine process is not running")]
    NotRunning,
}

/// The outcome of one `go` command.
///
/// `best_move` is `None` when the engine never produced a `bestmove` line
/// before the deadline, or produced one without a move token.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// The move the engine chose, in UCI notation.
    pub best_move: Option<String>,
    /// The move the engine would ponder on.
    pub ponder: Option<String>,
    /// Every `info` record seen before `bestmove`, in arrival order.
    pub info: Vec<EngineInfo>,
    /// Raw output lines, for diagnostics.
    pub raw: Vec<String>,
}

impl SearchResult {
    /// Node count from the most recent info record that reported one.
    pub fn last_nodes(&self) -> Option<u64> {
        self.info.iter().rev().find_map(|i| i.nodes)
    }
}

/// A client owning one UCI engine process.
///
/// All operations are issued from a single owner; the only concurrent piece
/// is the background reader task, which is the sole reader of the process's
/// stdout for its whole lifetime.
pub struct UciClient {
    path: PathBuf,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    lines: Option<mpsc::Receiver<String>>,
    reader: Option<JoinHandle<()>>,
    command_timeout: Duration,
    /// Engine name from `id name`, set during [`initialize`](Self::initialize).
    pub name: String,
    /// Engine author from `id author`.
    pub author: String,
    /// Options declared during the handshake, keyed by option name.
    pub options: HashMap<String, EngineOption>,
    /// Best-effort heuristic: true iff any option name contains "mate".
    pub supports_mate_search: bool,
}

impl UciClient {
    /// Create a client for the given executable. Does not spawn anything.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            child: None,
            stdin: None,
            lines: None,
            reader: None,
            command_timeout: Duration::from_secs(30),
            name: "Unknown".to_string(),
            author: "Unknown".to_string(),
            options: HashMap::new(),
            supports_mate_search: false,
        }
    }

    /// Override the default per-command timeout (also raises the `go`
    /// deadline when larger than the 60 second floor).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// The executable path this client was created for.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the engine process is currently alive.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Spawn the engine process and start the background reader.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Startup`] if the executable is missing or
    /// cannot be spawned.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        if self.child.is_some() {
            return Ok(());
        }

        let mut child = Command::new(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ClientError::Startup {
                path: self.path.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(ClientError::NotRunning)?;
        let stdout = child.stdout.take().ok_or(ClientError::NotRunning)?;

        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if tx.send(line.to_string()).await.is_err() {
                    break;
                }
            }
        });

        debug!("Engine process started: {}", self.path.display());

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.lines = Some(rx);
        self.reader = Some(reader);
        Ok(())
    }

    /// Send a single command line to the engine.
    pub async fn send(&mut self, command: &str) -> Result<(), ClientError> {
        let stdin = self.stdin.as_mut().ok_or(ClientError::NotRunning)?;
        debug!(">> {}", command);
        let write = async {
            stdin.write_all(command.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await
        };
        write.await.map_err(|source| ClientError::Command {
            command: command.to_string(),
            source,
        })
    }

    /// Collect output lines until one contains `needle` or the deadline
    /// expires. Never fails: on timeout the partial line list is returned
    /// and the caller decides what a missing sentinel means.
    pub async fn read_until(&mut self, needle: &str, deadline: Duration) -> Vec<String> {
        let mut collected = Vec::new();
        let Some(rx) = self.lines.as_mut() else {
            return collected;
        };

        let end = Instant::now() + deadline;
        loop {
            let now = Instant::now();
            if now >= end {
                break;
            }
            let slice = POLL_INTERVAL.min(end - now);
            match timeout(slice, rx.recv()).await {
                Ok(Some(line)) => {
                    debug!("<< {}", line);
                    let found = line.contains(needle);
                    collected.push(line);
                    if found {
                        return collected;
                    }
                }
                // Reader task ended: the process closed its stdout.
                Ok(None) => break,
                Err(_) => continue,
            }
        }

        warn!(
            "Timeout waiting for '{}'; got {} lines",
            needle,
            collected.len()
        );
        collected
    }

    /// Perform the UCI handshake.
    ///
    /// Sends `uci`, collects lines until `uciok` (10 second deadline),
    /// parses `id` and `option` declarations, then probes readiness.
    /// Returns `Ok(false)` - not an error - if `uciok` never arrives or
    /// the readiness probe fails; that is a protocol violation report,
    /// not an I/O failure.
    pub async fn initialize(&mut self) -> Result<bool, ClientError> {
        self.send("uci").await?;
        let lines = self.read_until("uciok", INIT_TIMEOUT).await;

        if !lines.iter().any(|l| l.contains("uciok")) {
            warn!("Engine did not respond with 'uciok' ({} lines)", lines.len());
            return Ok(false);
        }

        for line in &lines {
            match EngineMessage::parse(line) {
                EngineMessage::Id { name, author } => {
                    if let Some(name) = name {
                        self.name = name;
                    }
                    if let Some(author) = author {
                        self.author = author;
                    }
                }
                EngineMessage::Option_(opt) => {
                    self.options.insert(opt.name.clone(), opt);
                }
                _ => {}
            }
        }

        // Weak capability signal, kept best-effort on purpose: an option
        // name containing "mate" usually means a mate-search mode exists.
        self.supports_mate_search = self
            .options
            .keys()
            .any(|name| name.to_lowercase().contains("mate"));

        info!(
            "Engine initialized: {} by {} ({} options)",
            self.name,
            self.author,
            self.options.len()
        );

        if !self.is_ready(READY_TIMEOUT).await? {
            warn!("Engine not ready after initialization");
            return Ok(false);
        }

        Ok(true)
    }

    /// Probe readiness: send `isready`, wait for `readyok`.
    pub async fn is_ready(&mut self, deadline: Duration) -> Result<bool, ClientError> {
        self.send("isready").await?;
        let lines = self.read_until("readyok", deadline).await;
        Ok(lines.iter().any(|l| l.contains("readyok")))
    }

    /// Reset the engine for a new game.
    ///
    /// Non-conforming engines need time after `ucinewgame`, so this settles
    /// briefly and re-probes readiness before returning.
    pub async fn new_game(&mut self) -> Result<bool, ClientError> {
        self.send("ucinewgame").await?;
        sleep(SETTLE_DELAY).await;
        self.is_ready(READY_TIMEOUT).await
    }

    /// Set a UCI option. Engines silently ignore names they do not
    /// recognize, so this cannot verify the option took effect.
    pub async fn set_option(&mut self, name: &str, value: &str) -> Result<(), ClientError> {
        self.send(&format!("setoption name {} value {}", name, value))
            .await
    }

    /// Set the board position from an optional FEN and a move list.
    pub async fn set_position(
        &mut self,
        fen: Option<&str>,
        moves: &[String],
    ) -> Result<(), ClientError> {
        let cmd = position_command(fen, moves);
        self.send(&cmd).await
    }

    /// Start a search and wait for `bestmove`.
    ///
    /// The deadline is never shorter than 60 seconds. On deadline expiry
    /// the result is returned with whatever was collected and
    /// `best_move == None`; it is the caller's job to treat that as an
    /// engine failure.
    pub async fn go(&mut self, limits: &GoOptions) -> Result<SearchResult, ClientError> {
        self.send(&limits.to_command()).await?;

        let deadline = GO_TIMEOUT_FLOOR.max(self.command_timeout);
        let lines = self.read_until("bestmove", deadline).await;

        let mut result = SearchResult::default();
        for line in &lines {
            match EngineMessage::parse(line) {
                EngineMessage::Info(info) => result.info.push(info),
                EngineMessage::BestMove { mv, ponder } => {
                    result.best_move = if mv.is_empty() { None } else { Some(mv) };
                    result.ponder = ponder;
                }
                _ => {}
            }
        }
        result.raw = lines;

        Ok(result)
    }

    /// Ask the engine to stop the current search. Advisory only; callers
    /// must re-probe readiness before issuing further commands.
    pub async fn stop(&mut self) -> Result<(), ClientError> {
        self.send("stop").await?;
        sleep(SETTLE_DELAY).await;
        Ok(())
    }

    /// Shut the engine down.
    ///
    /// Sends `quit`, waits briefly for a clean exit, and kills the process
    /// if it lingers. Idempotent: calling it on a terminated (or never
    /// started) client does nothing and never fails.
    pub async fn quit(&mut self) {
        // Best effort; the process may already be gone.
        let _ = self.send("quit").await;

        self.stdin = None;
        self.lines = None;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }

        if let Some(mut child) = self.child.take() {
            match timeout(QUIT_TIMEOUT, child.wait()).await {
                Ok(Ok(status)) => debug!("Engine exited: {}", status),
                _ => {
                    warn!("Engine did not exit after quit; killing");
                    let _ = child.kill().await;
                }
            }
        }
    }
}
