//! Command-line interface for autodep.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{
    CheckArgs, Cli, Commands, CompletionsArgs, EnsureArgs, LocksAction, LocksArgs,
    RemediationArgs, SyncArgs, VenvArgs,
};
pub use commands::{Command, CommandDispatcher, CommandResult, ProjectContext};
