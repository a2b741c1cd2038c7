//! Ensure command implementation.
//!
//! The `autodep ensure <NAME>...` command runs the coordinator for the given
//! names. `sync` shares [`remediate`] with it.

use crate::cli::args::{EnsureArgs, RemediationArgs};
use crate::config::AutodepConfig;
use crate::coordinator::RemediationSession;
use crate::error::Result;
use crate::package::PackageName;
use crate::ui::UserInterface;

use super::context::{config_failure, print_json, ProjectContext, EXIT_UNRESOLVED};
use super::dispatcher::{Command, CommandResult};
use super::display;

/// The ensure command implementation.
pub struct EnsureCommand {
    ctx: ProjectContext,
    args: EnsureArgs,
}

impl EnsureCommand {
    /// Create a new ensure command.
    pub fn new(ctx: ProjectContext, args: EnsureArgs) -> Self {
        Self { ctx, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &EnsureArgs {
        &self.args
    }
}

impl Command for EnsureCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = match self.ctx.load_config(false) {
            Ok(c) => c,
            Err(e) => return config_failure(ui, e),
        };

        remediate(
            &self.ctx,
            &config,
            &self.args.packages,
            &self.args.remediation,
            ui,
        )
    }
}

/// Run the coordinator over `names` and report the outcome.
pub fn remediate(
    ctx: &ProjectContext,
    config: &AutodepConfig,
    names: &[PackageName],
    args: &RemediationArgs,
    ui: &mut dyn UserInterface,
) -> Result<CommandResult> {
    let mut coordinator = ctx.coordinator(config, args);

    let mut session = if args.isolated || ctx.inside_virtual_env() {
        RemediationSession::isolated()
    } else {
        RemediationSession::new()
    };

    if ctx.inside_virtual_env() && !args.isolated {
        tracing::info!("Running inside a virtual environment; isolation will not be offered");
    }

    if args.isolated {
        if let Err(e) = coordinator.enter_environment(ui) {
            tracing::error!("Could not enter isolated environment: {}", e);
            ui.error(&format!("Could not enter isolated environment: {}", e));
            return Ok(CommandResult::failure(EXIT_UNRESOLVED));
        }
    }

    if !args.json {
        ui.show_header(&format!("Ensuring {} package(s)", names.len()));
    }

    let report = coordinator.ensure_all(names, &mut session, ui);

    if args.json {
        print_json(&report)?;
    } else {
        display::show_report(ui, &report);
    }

    if report.all_resolved() {
        Ok(CommandResult::success())
    } else {
        Ok(CommandResult::failure(EXIT_UNRESOLVED))
    }
}
