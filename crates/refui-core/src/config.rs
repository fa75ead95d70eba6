//! Persistent configuration for refui.
//!
//! Settings live in `~/.refui/config.json`; `REFUI_HOME` points at a
//! different directory. Every field is optional in the file and falls back to
//! the reference app's defaults. Command-line flags override what is loaded
//! here.
//!
//! # Example
//!
//! ```no_run
//! use refui_core::config::RefuiConfig;
//!
//! // Load (returns defaults if the file doesn't exist)
//! let config = RefuiConfig::load();
//! println!("testing {}", config.bundle_id);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::driver::{DriverConfig, WaitBudget, DEFAULT_BUNDLE_ID};
use crate::runner::RunnerConfig;
use crate::scenario::AppExpectations;

const CONFIG_FILENAME: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("cannot write config: {0}")]
    Write(#[from] std::io::Error),
}

/// Returns the refui directory (`$REFUI_HOME`, else `~/.refui/`).
pub fn refui_dir() -> PathBuf {
    if let Some(home) = std::env::var_os("REFUI_HOME") {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".refui")
}

/// Path of the default config file.
pub fn config_path() -> PathBuf {
    refui_dir().join(CONFIG_FILENAME)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefuiConfig {
    /// Bundle identifier of the app under test.
    pub bundle_id: String,
    /// Simulator UDID; unset means the first booted simulator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udid: Option<String>,
    pub wait_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub continue_after_failure: bool,
    pub terminate_on_teardown: bool,
    /// Directory for `failures.jsonl` and screenshots. Unset disables it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_dir: Option<PathBuf>,
    pub expectations: AppExpectations,
}

impl Default for RefuiConfig {
    fn default() -> Self {
        let runner = RunnerConfig::default();
        Self {
            bundle_id: DEFAULT_BUNDLE_ID.to_string(),
            udid: None,
            wait_timeout_ms: WaitBudget::DEFAULT_TIMEOUT_MS,
            poll_interval_ms: WaitBudget::DEFAULT_POLL_INTERVAL_MS,
            continue_after_failure: runner.continue_after_failure,
            terminate_on_teardown: runner.terminate_on_teardown,
            report_dir: None,
            expectations: AppExpectations::default(),
        }
    }
}

impl RefuiConfig {
    /// Load config from the default location.
    ///
    /// Returns [`Default`] if the file does not exist or cannot be parsed.
    pub fn load() -> Self {
        std::fs::read_to_string(config_path())
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Load config from an explicit path, reporting any problem.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save config to the default location, creating the directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn wait_budget(&self) -> WaitBudget {
        WaitBudget::from_millis(self.wait_timeout_ms, self.poll_interval_ms)
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            udid: self.udid.clone(),
            bundle_id: self.bundle_id.clone(),
            wait: self.wait_budget(),
        }
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            continue_after_failure: self.continue_after_failure,
            terminate_on_teardown: self.terminate_on_teardown,
        }
    }
}
