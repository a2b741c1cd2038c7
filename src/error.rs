//! Error types for autodep operations.
//!
//! This module defines [`AutodepError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Remediation failures (`Unresolvable`, `InstallerFailure`,
//!   `ActivationScriptMissing`, `LockAcquisitionStalled`) are scoped to one
//!   package name; the coordinator records them and moves on
//! - Use `anyhow::Error` (via `AutodepError::Other`) for unexpected errors
//! - All errors should provide actionable messages for users

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for autodep operations.
#[derive(Debug, Error)]
pub enum AutodepError {
    /// The name never became importable after all remediation.
    #[error("Unable to resolve '{package}' after remediation")]
    Unresolvable { package: String },

    /// The package manager failed on every attempt.
    #[error(
        "Installing '{package}' failed after {attempts} attempt(s) (last exit code {exit_code:?})"
    )]
    InstallerFailure {
        package: String,
        exit_code: Option<i32>,
        attempts: u32,
    },

    /// The isolated environment was created but has no activation script.
    #[error("Activation script not found: {path}")]
    ActivationScriptMissing { path: PathBuf },

    /// The install lock for a package was held for longer than the staleness ceiling.
    #[error("Timed out after {waited_secs}s waiting for install lock on '{package}' ({lock_path})")]
    LockAcquisitionStalled {
        package: String,
        lock_path: PathBuf,
        waited_secs: u64,
    },

    /// A subprocess could not be spawned or exited unsuccessfully.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// Manifest file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse manifest file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid manifest structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AutodepError {
    /// Whether this error belongs to the remediation taxonomy, as opposed to
    /// an unexpected failure.
    pub fn is_remediation_failure(&self) -> bool {
        matches!(
            self,
            Self::Unresolvable { .. }
                | Self::InstallerFailure { .. }
                | Self::ActivationScriptMissing { .. }
                | Self::LockAcquisitionStalled { .. }
        )
    }
}

/// Result type alias for autodep operations.
pub type Result<T> = std::result::Result<T, AutodepError>;
