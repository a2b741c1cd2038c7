//! Subprocess execution and platform detection.

pub mod command;
pub mod platform;

pub use command::{display_command, execute, CommandOptions, CommandResult};
pub use platform::{in_virtual_env, in_virtual_env_with, is_ci, process_alive, OsFamily};
