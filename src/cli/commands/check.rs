//! Check command implementation.
//!
//! The `autodep check [NAME]...` command probes names without installing
//! anything.

use serde::Serialize;

use crate::cli::args::CheckArgs;
use crate::error::Result;
use crate::package::PackageName;
use crate::probe::Availability;
use crate::ui::UserInterface;

use super::context::{config_failure, print_json, ProjectContext, EXIT_UNRESOLVED};
use super::dispatcher::{Command, CommandResult};
use super::display;

/// Probe result for one name, as printed by `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckEntry {
    pub package: PackageName,
    pub availability: Availability,
}

/// The check command implementation.
pub struct CheckCommand {
    ctx: ProjectContext,
    args: CheckArgs,
}

impl CheckCommand {
    /// Create a new check command.
    pub fn new(ctx: ProjectContext, args: CheckArgs) -> Self {
        Self { ctx, args }
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = match self.ctx.load_config(false) {
            Ok(c) => c,
            Err(e) => return config_failure(ui, e),
        };

        let names = if self.args.packages.is_empty() {
            &config.packages
        } else {
            &self.args.packages
        };

        if names.is_empty() {
            ui.warning("No packages given and none listed in config.");
            return Ok(CommandResult::success());
        }

        let probe = self.ctx.toolchain().probe(&config.settings.python);
        let entries: Vec<CheckEntry> = names
            .iter()
            .map(|name| CheckEntry {
                package: name.clone(),
                availability: probe.probe(name),
            })
            .collect();

        if self.args.json {
            print_json(&entries)?;
        } else {
            for entry in &entries {
                display::show_availability(ui, &entry.package, entry.availability);
            }
        }

        if entries.iter().all(|e| e.availability.is_available()) {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(EXIT_UNRESOLVED))
        }
    }
}
