//! Engine registry loading.
//!
//! The registry is a TOML file mapping engine names to executables,
//! plus arena-wide defaults for time control and output locations.
//! Tournament commands resolve engine names through the registry so the
//! CLI never needs raw paths.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or querying the registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Failed to read the registry file from disk.
    #[error("Failed to read registry file: {0}")]
    Read(#[from] std::io::Error),
    /// Failed to parse the registry file as valid TOML.
    #[error("Failed to parse registry: {0}")]
    Parse(#[from] toml::de::Error),
    /// Requested engine was not found in the registry.
    #[error("Engine not found: {0}")]
    EngineNotFound(String),
}

/// One registered engine.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineEntry {
    /// Path to the engine executable.
    pub path: PathBuf,
    /// Disabled engines stay in the file but are skipped by listings
    /// and tournament scheduling.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// UCI options to set after initialization, name to value.
    #[serde(default)]
    pub options: HashMap<String, String>,
}

fn default_enabled() -> bool {
    true
}

/// Arena-wide defaults applied when the CLI does not override them.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ArenaDefaults {
    /// Base time per side in milliseconds.
    #[serde(default = "default_base_time_ms")]
    pub base_time_ms: u64,
    /// Increment per move in milliseconds.
    #[serde(default)]
    pub increment_ms: u64,
    /// Tournament rounds.
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    /// Directory for PGN files and JSON reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_base_time_ms() -> u64 {
    60_000
}

fn default_rounds() -> u32 {
    1
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("arena_output")
}

impl Default for ArenaDefaults {
    fn default() -> Self {
        Self {
            base_time_ms: default_base_time_ms(),
            increment_ms: 0,
            rounds: default_rounds(),
            output_dir: default_output_dir(),
        }
    }
}

/// The full engine registry.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Registry {
    /// Map of engine names to their entries.
    #[serde(default)]
    pub engines: HashMap<String, EngineEntry>,
    /// Arena-wide defaults.
    #[serde(default)]
    pub defaults: ArenaDefaults,
}

impl Registry {
    /// Load a registry from a TOML file. A missing file yields an empty
    /// registry rather than an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// The default registry location, `engines.toml` in the working
    /// directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from("engines.toml")
    }

    /// Look up an engine by name.
    pub fn get(&self, name: &str) -> Result<&EngineEntry, RegistryError> {
        self.engines
            .get(name)
            .ok_or_else(|| RegistryError::EngineNotFound(name.to_string()))
    }

    /// Names of all enabled engines, sorted for stable output.
    pub fn enabled(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .engines
            .iter()
            .filter(|(_, e)| e.enabled)
            .map(|(n, _)| n.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}
