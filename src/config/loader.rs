//! Configuration file discovery and loading.
//!
//! This module handles finding and loading configuration files from
//! various locations in the correct priority order.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::config::merger::merge_configs;
use crate::config::schema::AutodepConfig;
use crate::error::{AutodepError, Result};

/// Project-level configuration directory name.
pub const CONFIG_DIR: &str = ".autodep";

/// Paths to configuration files in priority order (later overrides earlier).
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// User's global config: ~/.autodep/config.yml
    pub user_global: Option<PathBuf>,

    /// Project config: .autodep/config.yml
    pub project: Option<PathBuf>,

    /// Local overrides: .autodep/config.local.yml
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            user_global: dirs::home_dir()
                .map(|home| home.join(CONFIG_DIR).join("config.yml"))
                .filter(|p| p.exists()),
            project: existing(Self::project_config_path(project_root)),
            project_local: existing(project_root.join(CONFIG_DIR).join("config.local.yml")),
        }
    }

    /// Where the project config lives, whether or not it exists.
    pub fn project_config_path(project_root: &Path) -> PathBuf {
        project_root.join(CONFIG_DIR).join("config.yml")
    }

    /// Returns all existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        [&self.user_global, &self.project, &self.project_local]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Check if any project config exists.
    pub fn has_project_config(&self) -> bool {
        self.project.is_some()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.exists().then_some(path)
}

/// Find the project root by walking up from `start`.
///
/// Looks for a `.autodep` directory first, then `.git`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(CONFIG_DIR).is_dir() {
            return Some(current);
        }

        if current.join(".git").exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AutodepError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            AutodepError::Io(e)
        }
    })
}

/// Load a single config file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<AutodepConfig> {
    parse_config(&read(path)?, path)
}

/// Parse YAML content. An empty document yields the defaults.
pub fn parse_config(content: &str, source_path: &Path) -> Result<AutodepConfig> {
    if content.trim().is_empty() {
        return Ok(AutodepConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| AutodepError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a config file as a raw YAML value for merging.
pub fn load_config_value(path: &Path) -> Result<Value> {
    serde_yaml::from_str(&read(path)?).map_err(|e| AutodepError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn merge_paths(paths: &ConfigPaths, project_root: &Path) -> Result<AutodepConfig> {
    let mut layers = Vec::new();
    for path in paths.all_existing() {
        tracing::debug!("Loading config layer {}", path.display());
        layers.push(load_config_value(path)?);
    }

    let merged = merge_configs(&layers);
    serde_yaml::from_value(merged).map_err(|e| AutodepError::ConfigParseError {
        path: ConfigPaths::project_config_path(project_root),
        message: format!("Failed to parse merged config: {}", e),
    })
}

/// Load and merge all config files for a project.
///
/// # Errors
///
/// Returns `ConfigNotFound` if no project config exists.
/// Returns `ConfigParseError` if any config file is invalid.
pub fn load_merged_config(project_root: &Path) -> Result<AutodepConfig> {
    let paths = ConfigPaths::discover(project_root);

    if !paths.has_project_config() {
        return Err(AutodepError::ConfigNotFound {
            path: ConfigPaths::project_config_path(project_root),
        });
    }

    merge_paths(&paths, project_root)
}

/// Load and merge whatever config layers exist, falling back to defaults
/// when there are none.
pub fn load_optional_config(project_root: &Path) -> Result<AutodepConfig> {
    merge_paths(&ConfigPaths::discover(project_root), project_root)
}

/// Load config with optional path override.
///
/// If `config_override` is provided, loads only that file without merging.
/// Otherwise merges the discovered layers; `require_project` makes a missing
/// project config an error.
pub fn load_config(
    project_root: &Path,
    config_override: Option<&Path>,
    require_project: bool,
) -> Result<AutodepConfig> {
    match config_override {
        Some(path) => load_config_file(path),
        None if require_project => load_merged_config(project_root),
        None => load_optional_config(project_root),
    }
}
