//! UCI compliance validation.
//!
//! Runs a fixed battery of six probes against an engine executable and
//! scores the result. Probes are independent: a failure records an issue
//! (or warning) and the battery keeps going, so an engine always gets a
//! complete report. An engine is compatible when it has no issues and
//! scores at least [`COMPATIBLE_SCORE`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info};
use uci::GoOptions;

use crate::client::UciClient;

/// Minimum score for a compatible verdict.
pub const COMPATIBLE_SCORE: f64 = 70.0;

/// Readiness deadline used between probes.
const READY_DEADLINE: Duration = Duration::from_secs(5);
/// How long the stop probe lets an infinite search run.
const INFINITE_SEARCH_WINDOW: Duration = Duration::from_millis(500);

/// Outcome of one probe, in battery order.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub name: &'static str,
    pub passed: bool,
}

/// Full validation report for one engine.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub engine: String,
    pub score: f64,
    pub passed: usize,
    pub total: usize,
    pub results: Vec<ProbeResult>,
    /// Disqualifying problems.
    pub issues: Vec<String>,
    /// Non-fatal observations.
    pub warnings: Vec<String>,
    pub compatible: bool,
}

/// Runs the compliance battery against one executable.
pub struct Validator {
    path: PathBuf,
    results: Vec<ProbeResult>,
    issues: Vec<String>,
    warnings: Vec<String>,
}

impl Validator {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            results: Vec::new(),
            issues: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Run the full battery and produce a report. Never fails: probe
    /// errors become issues in the report.
    pub async fn validate(mut self) -> ValidationReport {
        info!("Starting UCI validation for: {}", self.path.display());

        let mut engine = UciClient::new(&self.path);

        self.probe_startup(&mut engine).await;
        self.probe_initialization(&mut engine).await;
        self.probe_position(&mut engine).await;
        self.probe_search(&mut engine).await;
        self.probe_time_management(&mut engine).await;
        self.probe_stop(&mut engine).await;

        engine.quit().await;

        let passed = self.results.iter().filter(|r| r.passed).count();
        let total = self.results.len();
        let score = if total > 0 {
            passed as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        let compatible = self.issues.is_empty() && score >= COMPATIBLE_SCORE;

        ValidationReport {
            engine: self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string()),
            score,
            passed,
            total,
            results: self.results,
            issues: self.issues,
            warnings: self.warnings,
            compatible,
        }
    }

    fn record(&mut self, name: &'static str, passed: bool) {
        if passed {
            info!("Probe passed: {}", name);
        } else {
            error!("Probe failed: {}", name);
        }
        self.results.push(ProbeResult { name, passed });
    }

    async fn probe_startup(&mut self, engine: &mut UciClient) {
        let name = "Engine Startup";
        match engine.start().await {
            Ok(()) => {
                let running = engine.is_running();
                if !running {
                    self.issues.push("Engine failed to start".to_string());
                }
                self.record(name, running);
            }
            Err(err) => {
                self.issues.push(format!("Startup error: {}", err));
                self.record(name, false);
            }
        }
    }

    async fn probe_initialization(&mut self, engine: &mut UciClient) {
        let name = "UCI Initialization";
        match engine.initialize().await {
            Ok(true) => {
                info!("Engine: {} by {}", engine.name, engine.author);
                if !engine.options.contains_key("Hash") {
                    self.warnings.push("No Hash option found".to_string());
                }
                if !engine.options.contains_key("Threads") {
                    self.warnings.push("No Threads option found".to_string());
                }
                if !engine.supports_mate_search {
                    self.warnings
                        .push("No mate search support detected".to_string());
                }
                self.record(name, true);
            }
            Ok(false) => {
                self.issues
                    .push("Engine did not respond with 'uciok'".to_string());
                self.record(name, false);
            }
            Err(err) => {
                self.issues.push(format!("Initialization error: {}", err));
                self.record(name, false);
            }
        }
    }

    /// Position in all three forms: default, with moves, raw FEN. The
    /// engine must stay ready after each.
    async fn probe_position(&mut self, engine: &mut UciClient) {
        let name = "Position Command";
        let outcome = async {
            engine.set_position(None, &[]).await?;
            let ready_default = engine.is_ready(READY_DEADLINE).await?;

            let moves = ["e2e4".to_string(), "e7e5".to_string()];
            engine.set_position(None, &moves).await?;
            let ready_moves = engine.is_ready(READY_DEADLINE).await?;

            let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
            engine.set_position(Some(fen), &[]).await?;
            let ready_fen = engine.is_ready(READY_DEADLINE).await?;

            Ok::<bool, crate::client::ClientError>(ready_default && ready_moves && ready_fen)
        }
        .await;

        match outcome {
            Ok(true) => self.record(name, true),
            Ok(false) => {
                self.issues
                    .push("Position command failed or engine not ready".to_string());
                self.record(name, false);
            }
            Err(err) => {
                self.issues.push(format!("Position test error: {}", err));
                self.record(name, false);
            }
        }
    }

    async fn probe_search(&mut self, engine: &mut UciClient) {
        let name = "Search Functionality";
        let outcome = async {
            engine.new_game().await?;
            engine.set_position(None, &[]).await?;
            engine.go(&GoOptions::depth(5)).await
        }
        .await;

        match outcome {
            Ok(result) => {
                // A UCI move is at least four characters (e.g. e2e4).
                let valid = result
                    .best_move
                    .as_deref()
                    .map(|mv| mv.len() >= 4)
                    .unwrap_or(false);
                if valid {
                    if result.info.is_empty() {
                        self.warnings
                            .push("No info lines during search".to_string());
                    }
                } else {
                    self.issues
                        .push("Search failed or no bestmove returned".to_string());
                }
                self.record(name, valid);
            }
            Err(err) => {
                self.issues.push(format!("Search test error: {}", err));
                self.record(name, false);
            }
        }
    }

    async fn probe_time_management(&mut self, engine: &mut UciClient) {
        let name = "Time Management";
        let outcome = async {
            engine.new_game().await?;
            engine.set_position(None, &[]).await?;
            engine.go(&GoOptions::clocks(1000, 1000, 0, 0)).await
        }
        .await;

        match outcome {
            Ok(result) => {
                let moved = result.best_move.is_some();
                if !moved {
                    self.issues
                        .push("Time-controlled search failed".to_string());
                }
                self.record(name, moved);
            }
            Err(err) => {
                self.issues
                    .push(format!("Time management test error: {}", err));
                self.record(name, false);
            }
        }
    }

    /// A misbehaving stop is a warning rather than an issue: engines that
    /// ignore `stop` are usable in matches with finite time controls.
    async fn probe_stop(&mut self, engine: &mut UciClient) {
        let name = "Stop Command";
        let outcome = async {
            engine.new_game().await?;
            engine.set_position(None, &[]).await?;
            engine.send(&GoOptions::infinite().to_command()).await?;
            tokio::time::sleep(INFINITE_SEARCH_WINDOW).await;
            engine.stop().await?;
            engine.is_ready(READY_DEADLINE).await
        }
        .await;

        match outcome {
            Ok(ready) => {
                if !ready {
                    self.warnings
                        .push("Stop command may not work properly".to_string());
                }
                self.record(name, ready);
            }
            Err(err) => {
                self.warnings.push(format!("Stop command test issue: {}", err));
                self.record(name, false);
            }
        }
    }
}

/// Validate a single engine executable.
pub async fn validate_engine<P: AsRef<Path>>(path: P) -> ValidationReport {
    Validator::new(path).validate().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unspawnable_engine_gets_a_complete_report() {
        let report = validate_engine("/nonexistent/engine").await;

        // Every probe still runs and records an outcome.
        assert_eq!(report.total, 6);
        assert_eq!(report.passed, 0);
        assert_eq!(report.score, 0.0);
        assert!(!report.compatible);
        assert!(report
            .issues
            .iter()
            .any(|i| i.starts_with("Startup error")));
    }

    #[tokio::test]
    async fn probe_order_is_stable() {
        let report = validate_engine("/nonexistent/engine").await;
        let names: Vec<&str> = report.results.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "Engine Startup",
                "UCI Initialization",
                "Position Command",
                "Search Functionality",
                "Time Management",
                "Stop Command",
            ]
        );
    }

    #[tokio::test]
    async fn stop_probe_failure_is_a_warning_not_an_issue() {
        let report = validate_engine("/nonexistent/engine").await;
        assert!(report
            .warnings
            .iter()
            .any(|w| w.starts_with("Stop command test issue")));
        assert!(!report
            .issues
            .iter()
            .any(|i| i.contains("Stop command")));
    }

    #[test]
    fn compatible_requires_no_issues_and_high_score() {
        let mut report = ValidationReport {
            engine: "e".into(),
            score: 100.0,
            passed: 6,
            total: 6,
            results: Vec::new(),
            issues: Vec::new(),
            warnings: Vec::new(),
            compatible: true,
        };
        assert!(report.compatible);

        report.issues.push("something".into());
        // The verdict is computed at validation time; this mirrors the rule.
        let verdict = report.issues.is_empty() && report.score >= COMPATIBLE_SCORE;
        assert!(!verdict);
    }
}
