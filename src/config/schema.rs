//! Configuration schema definitions for autodep.
//!
//! This module contains all the struct definitions that map to
//! the YAML configuration file format.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::installer::{Backoff, DEFAULT_MAX_ATTEMPTS};
use crate::package::PackageName;

/// Root configuration structure for `.autodep/config.yml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutodepConfig {
    /// Names to ensure, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<PackageName>,

    /// Global settings
    pub settings: Settings,

    /// Isolated environment fallback
    pub isolation: IsolationConfig,
}

/// Global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Interpreter used for probing and installing
    pub python: PathBuf,

    /// Install attempts per package
    pub max_attempts: u32,

    /// Backoff unit in milliseconds; attempt k waits unit * 2^(k-1)
    pub backoff_unit_ms: u64,

    /// Directory for lock files (defaults to the OS temp dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_dir: Option<PathBuf>,

    /// Give up waiting for a held lock after this many seconds; 0 waits forever
    pub lock_timeout_secs: u64,

    /// Append to a log file
    pub logging: bool,

    /// Log file path (relative to project root)
    pub log_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            python: PathBuf::from("python3"),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit_ms: 1000,
            lock_dir: None,
            lock_timeout_secs: 600,
            logging: true,
            log_path: PathBuf::from("autodep.log"),
        }
    }
}

impl Settings {
    /// The backoff schedule.
    pub fn backoff(&self) -> Backoff {
        Backoff::new(Duration::from_millis(self.backoff_unit_ms))
    }

    /// The lock staleness ceiling, `None` to wait forever.
    pub fn lock_timeout(&self) -> Option<Duration> {
        (self.lock_timeout_secs > 0).then(|| Duration::from_secs(self.lock_timeout_secs))
    }

    /// The lock directory, defaulting to the OS temp dir.
    pub fn lock_dir(&self) -> PathBuf {
        self.lock_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Log file location resolved against the project root.
    pub fn log_path_in(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.log_path)
    }
}

/// Isolated environment fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationConfig {
    /// Environment root (relative to project root)
    pub venv_dir: PathBuf,

    /// Extra names installed into a freshly created environment
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<PackageName>,

    /// Offer isolation when installs are exhausted
    pub prompt: bool,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            venv_dir: PathBuf::from("venv"),
            dependencies: Vec::new(),
            prompt: true,
        }
    }
}

impl IsolationConfig {
    /// Environment root resolved against the project root.
    pub fn venv_dir_in(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.venv_dir)
    }
}
