//! Configuration loading, parsing, and validation for autodep.
//!
//! This module handles all aspects of configuration:
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use autodep::config::{load_merged_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let config_dir = temp.path().join(".autodep");
//! fs::create_dir_all(&config_dir).unwrap();
//! fs::write(config_dir.join("config.yml"), "packages: [numpy]").unwrap();
//!
//! let config = load_merged_config(temp.path()).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.packages[0].as_str(), "numpy");
//! ```
//!
//! # Configuration File Locations
//!
//! autodep discovers and merges configuration in this order:
//! 1. User global config (`~/.autodep/config.yml`)
//! 2. Project config (`.autodep/config.yml`)
//! 3. Local overrides (`.autodep/config.local.yml`)

pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use loader::{
    find_project_root, load_config, load_config_file, load_config_value, load_merged_config,
    load_optional_config, parse_config, ConfigPaths, CONFIG_DIR,
};
pub use merger::{deep_merge, merge_configs};
pub use schema::{AutodepConfig, IsolationConfig, Settings};
pub use validator::{validate, validate_config, ValidationError};
