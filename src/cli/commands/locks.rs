//! Locks command implementation.
//!
//! `autodep locks list` shows lock files and their recorded holders;
//! `autodep locks clear <NAME>` removes a lock file nobody holds.

use crate::cli::args::{LocksAction, LocksArgs};
use crate::error::Result;
use crate::package::PackageName;
use crate::ui::UserInterface;

use super::context::{config_failure, print_json, ProjectContext};
use super::dispatcher::{Command, CommandResult};
use super::display;

/// The locks command implementation.
pub struct LocksCommand {
    ctx: ProjectContext,
    args: LocksArgs,
}

impl LocksCommand {
    /// Create a new locks command.
    pub fn new(ctx: ProjectContext, args: LocksArgs) -> Self {
        Self { ctx, args }
    }
}

impl Command for LocksCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = match self.ctx.load_config(false) {
            Ok(c) => c,
            Err(e) => return config_failure(ui, e),
        };
        let locks = self.ctx.lock_manager(&config);

        match &self.args.action {
            LocksAction::List { json } => {
                let infos = locks.list()?;
                if *json {
                    print_json(&infos)?;
                } else if infos.is_empty() {
                    ui.message(&format!("No lock files in {}", locks.dir().display()));
                } else {
                    for info in &infos {
                        let line = display::lock_line(info);
                        if info.held {
                            ui.warning(&line);
                        } else {
                            ui.message(&line);
                        }
                    }
                }
                Ok(CommandResult::success())
            }
            LocksAction::Clear { name } => clear(&locks, name, ui),
        }
    }
}

fn clear(
    locks: &crate::lock::LockManager,
    name: &PackageName,
    ui: &mut dyn UserInterface,
) -> Result<CommandResult> {
    let path = locks.lock_path(name);
    if !path.exists() {
        ui.message(&format!("No lock file for {}", name));
        return Ok(CommandResult::success());
    }

    if locks.clear(name)? {
        ui.success(&format!("Cleared lock for {}", name));
        Ok(CommandResult::success())
    } else {
        ui.error(&format!(
            "Lock for {} is held by a running install; not clearing {}",
            name,
            path.display()
        ));
        Ok(CommandResult::failure(1))
    }
}
