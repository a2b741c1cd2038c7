//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::package::PackageName;

/// autodep - Install missing Python dependencies, safely and with retries.
#[derive(Debug, Parser)]
#[command(name = "autodep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides default .autodep/config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Never prompt; answers come from AUTODEP_PROMPT_<KEY> or defaults
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Append the postmortem log to this file
    #[arg(long, global = true, value_name = "FILE", conflicts_with = "no_log_file")]
    pub log_file: Option<PathBuf>,

    /// Do not write a log file
    #[arg(long, global = true)]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Make sure the given packages are importable, installing as needed
    Ensure(EnsureArgs),

    /// Ensure every package listed in the project config
    Sync(SyncArgs),

    /// Report whether packages are importable without installing anything
    Check(CheckArgs),

    /// Create the isolated environment and install its dependencies
    Venv(VenvArgs),

    /// Inspect or clear install lock files
    Locks(LocksArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Commands {
    /// Whether the command prints JSON on stdout, which keeps every other
    /// message off it.
    pub fn json_output(&self) -> bool {
        match self {
            Self::Ensure(args) => args.remediation.json,
            Self::Sync(args) => args.remediation.json,
            Self::Check(args) => args.json,
            Self::Locks(LocksArgs {
                action: LocksAction::List { json },
            }) => *json,
            Self::Venv(_) | Self::Locks(_) | Self::Completions(_) => false,
        }
    }
}

/// Options shared by commands that run remediation.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RemediationArgs {
    /// Install attempts per package (overrides settings.max_attempts)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Install into the isolated environment from the start, never prompting
    #[arg(long)]
    pub isolated: bool,

    /// Isolated environment root (overrides isolation.venv_dir)
    #[arg(long, value_name = "DIR")]
    pub venv_dir: Option<PathBuf>,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `ensure` command.
#[derive(Debug, Clone, clap::Args)]
pub struct EnsureArgs {
    /// Package names, exactly as passed to the package manager
    #[arg(required = true, value_name = "NAME")]
    pub packages: Vec<PackageName>,

    #[command(flatten)]
    pub remediation: RemediationArgs,
}

/// Arguments for the `sync` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub remediation: RemediationArgs,
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CheckArgs {
    /// Package names (defaults to the configured packages)
    #[arg(value_name = "NAME")]
    pub packages: Vec<PackageName>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `venv` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct VenvArgs {
    /// Environment root (overrides isolation.venv_dir)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Extra dependency to install (repeatable)
    #[arg(long = "with", value_name = "NAME")]
    pub with: Vec<PackageName>,
}

/// Arguments for the `locks` command.
#[derive(Debug, Clone, clap::Args)]
pub struct LocksArgs {
    #[command(subcommand)]
    pub action: LocksAction,
}

/// Lock maintenance actions.
#[derive(Debug, Clone, Subcommand)]
pub enum LocksAction {
    /// List lock files and their recorded holders
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a lock file that no process holds
    Clear {
        /// Package whose lock to clear
        name: PackageName,
    },
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
