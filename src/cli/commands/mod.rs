//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results. Commands share a
//! [`ProjectContext`] carrying the project root, the config override and the
//! interpreter toolchain.
//!
//! # Exit codes
//!
//! - `0` every name resolved
//! - `1` some name did not resolve
//! - `2` configuration error

pub mod check;
pub mod completions;
pub mod context;
pub mod dispatcher;
pub mod display;
pub mod ensure;
pub mod locks;
pub mod sync;
pub mod venv;

pub use context::{ProjectContext, EXIT_CONFIG_ERROR, EXIT_UNRESOLVED};
pub use dispatcher::{Command, CommandDispatcher, CommandResult};
