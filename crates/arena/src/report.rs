//! JSON persistence for tournament and validation reports.
//!
//! Write failures are surfaced as [`ReportError`] so callers can log
//! them; a failed report write never unwinds a finished run.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::info;

use crate::tournament::TournamentReport;
use crate::validator::ValidationReport;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Timestamped default location for a report, `<dir>/<name>_<stamp>.json`.
pub fn default_path<P: AsRef<Path>>(dir: P, name: &str) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    dir.as_ref().join(format!("{}_{}.json", name, stamp))
}

/// Save a tournament report as pretty-printed JSON, creating parent
/// directories as needed.
pub fn save_tournament<P: AsRef<Path>>(
    path: P,
    report: &TournamentReport,
) -> Result<(), ReportError> {
    save_json(path.as_ref(), report)
}

/// Load a tournament report back from disk.
pub fn load_tournament<P: AsRef<Path>>(path: P) -> Result<TournamentReport, ReportError> {
    load_json(path.as_ref())
}

/// Save a validation report as pretty-printed JSON.
pub fn save_validation<P: AsRef<Path>>(
    path: P,
    report: &ValidationReport,
) -> Result<(), ReportError> {
    save_json(path.as_ref(), report)
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    info!("Report saved to {}", path.display());
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ReportError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
