//! Venv command implementation.
//!
//! The `autodep venv` command creates the isolated environment (if missing)
//! and installs the configured and requested dependencies into it.

use std::sync::Arc;

use crate::cli::args::VenvArgs;
use crate::error::Result;
use crate::isolation::EnvironmentIsolator;
use crate::package::PendingSet;
use crate::ui::UserInterface;

use super::context::{config_failure, ProjectContext, EXIT_UNRESOLVED};
use super::dispatcher::{Command, CommandResult};

/// The venv command implementation.
pub struct VenvCommand {
    ctx: ProjectContext,
    args: VenvArgs,
}

impl VenvCommand {
    /// Create a new venv command.
    pub fn new(ctx: ProjectContext, args: VenvArgs) -> Self {
        Self { ctx, args }
    }
}

impl Command for VenvCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = match self.ctx.load_config(false) {
            Ok(c) => c,
            Err(e) => return config_failure(ui, e),
        };

        let root = match &self.args.dir {
            Some(dir) => self.ctx.resolve_dir(dir),
            None => config.isolation.venv_dir_in(self.ctx.project_root()),
        };

        let mut deps = PendingSet::new();
        for name in config.isolation.dependencies.iter().chain(&self.args.with) {
            deps.insert(name.clone());
        }
        let deps = deps.drain();

        let mut isolator = EnvironmentIsolator::new(
            Arc::clone(self.ctx.toolchain()),
            config.settings.python.clone(),
        );
        let installer = self.ctx.installer(&config, None);
        let locks = self.ctx.lock_manager(&config);

        let (env, results) =
            match isolator.ensure_environment(&root, &deps, &installer, &locks, ui) {
                Ok(r) => r,
                Err(e) => {
                    ui.error(&e.to_string());
                    return Ok(CommandResult::failure(EXIT_UNRESOLVED));
                }
            };

        ui.success(&format!("Virtual environment ready at {}", env.root.display()));
        ui.message(&format!("Activate it with: {}", env.activation_command()));

        let failed: Vec<String> = results
            .iter()
            .filter(|r| !r.succeeded)
            .map(|r| r.package.to_string())
            .collect();
        if failed.is_empty() {
            Ok(CommandResult::success())
        } else {
            ui.warning(&format!("Not installed: {}", failed.join(", ")));
            Ok(CommandResult::failure(EXIT_UNRESOLVED))
        }
    }
}
