//! Sync command implementation.
//!
//! The `autodep sync` command ensures every package listed in the project
//! config.

use crate::cli::args::SyncArgs;
use crate::error::Result;
use crate::ui::UserInterface;

use super::context::{config_failure, ProjectContext};
use super::dispatcher::{Command, CommandResult};
use super::ensure::remediate;

/// The sync command implementation.
pub struct SyncCommand {
    ctx: ProjectContext,
    args: SyncArgs,
}

impl SyncCommand {
    /// Create a new sync command.
    pub fn new(ctx: ProjectContext, args: SyncArgs) -> Self {
        Self { ctx, args }
    }
}

impl Command for SyncCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = match self.ctx.load_config(true) {
            Ok(c) => c,
            Err(e) => return config_failure(ui, e),
        };

        if config.packages.is_empty() {
            ui.warning("No packages listed in config; nothing to do.");
            return Ok(CommandResult::success());
        }

        remediate(
            &self.ctx,
            &config,
            &config.packages,
            &self.args.remediation,
            ui,
        )
    }
}
