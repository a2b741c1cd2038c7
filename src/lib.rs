//! autodep - best-effort remediation of missing Python dependencies.
//!
//! autodep checks whether each declared package name is importable and, if
//! not, installs it with bounded retries. Installs of the same name are
//! serialized across processes on the host by a file lock. When retries run
//! out it can offer to create a virtual environment and reinstall everything
//! still pending there.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, parsing, and validation
//! - [`coordinator`] - The per-name remediation state machine
//! - [`error`] - Error types and result aliases
//! - [`installer`] - Package manager invocation with retries and backoff
//! - [`isolation`] - Virtual environment creation
//! - [`lock`] - Cross-process install locks
//! - [`package`] - Package names and the pending set
//! - [`probe`] - Availability checks
//! - [`shell`] - Subprocess execution and platform detection
//! - [`toolchain`] - Interpreter-specific collaborators
//! - [`ui`] - Prompts, spinners, notifications and terminal output
//!
//! # Example
//!
//! ```
//! use autodep::installer::{Backoff, FailureClass};
//! use std::time::Duration;
//!
//! let backoff = Backoff::new(Duration::from_millis(500));
//! assert_eq!(backoff.delay_for(3), Duration::from_secs(2));
//! assert_eq!(FailureClass::from_exit_code(3), FailureClass::DependencyConflict);
//! ```
//!
//! For end-to-end remediation, see the integration tests.

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod installer;
pub mod isolation;
pub mod lock;
pub mod package;
pub mod probe;
pub mod shell;
pub mod toolchain;
pub mod ui;

pub use error::{AutodepError, Result};
