//! Environment creation and dependency installation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{AutodepError, Result};
use crate::installer::{InstallAttemptResult, Installer};
use crate::lock::LockManager;
use crate::package::PackageName;
use crate::shell::OsFamily;
use crate::toolchain::Toolchain;
use crate::ui::{Notification, UserInterface};

use super::environment::VirtualEnvironment;

/// Title of the notification that explains how to activate an environment.
pub const SETUP_NOTIFICATION_TITLE: &str = "Virtual Environment Setup";

/// Creates isolated environments on demand and installs into them.
pub struct EnvironmentIsolator {
    toolchain: Arc<dyn Toolchain>,
    base_python: PathBuf,
    os: OsFamily,
    created: HashSet<PathBuf>,
}

impl EnvironmentIsolator {
    /// Create an isolator that builds environments with `base_python`.
    pub fn new(toolchain: Arc<dyn Toolchain>, base_python: impl Into<PathBuf>) -> Self {
        Self {
            toolchain,
            base_python: base_python.into(),
            os: OsFamily::current(),
            created: HashSet::new(),
        }
    }

    /// Override the path conventions (tests exercise both families).
    pub fn with_os_family(mut self, os: OsFamily) -> Self {
        self.os = os;
        self
    }

    /// The path conventions in use.
    pub fn os_family(&self) -> OsFamily {
        self.os
    }

    /// Roots this isolator created during the process lifetime.
    pub fn created_roots(&self) -> impl Iterator<Item = &Path> {
        self.created.iter().map(PathBuf::as_path)
    }

    /// Make sure an environment exists at `root`, then install `dependencies`
    /// into it.
    ///
    /// Creation is skipped when `root` already exists. A missing activation
    /// script afterwards fails with [`AutodepError::ActivationScriptMissing`]
    /// before any dependency is installed. Each dependency installs under its
    /// own lock through `installer` retargeted at the environment; failures
    /// are reported and do not stop the remaining dependencies.
    pub fn ensure_environment(
        &mut self,
        root: &Path,
        dependencies: &[PackageName],
        installer: &Installer,
        locks: &LockManager,
        ui: &mut dyn UserInterface,
    ) -> Result<(VirtualEnvironment, Vec<InstallAttemptResult>)> {
        let env = VirtualEnvironment::at(root, self.os);

        if root.exists() {
            tracing::info!("Virtual environment already exists at {}", root.display());
        } else {
            tracing::info!(
                "Virtual environment not found. Creating one at {}...",
                root.display()
            );
            ui.message(&format!("Creating virtual environment at {}...", root.display()));
            self.toolchain.create_environment(&self.base_python, root)?;
            self.created.insert(root.to_path_buf());
            tracing::info!("Created virtual environment at {}", root.display());
        }

        if !env.is_activatable() {
            tracing::error!(
                "Activation script not found: {}",
                env.activation_script.display()
            );
            return Err(AutodepError::ActivationScriptMissing {
                path: env.activation_script.clone(),
            });
        }

        let results = self.install_dependencies(&env, dependencies, installer, locks, ui);

        ui.notify(&Notification::new(
            SETUP_NOTIFICATION_TITLE,
            format!(
                "To activate the virtual environment, run:\n\n{}",
                env.activation_command()
            ),
        ));

        Ok((env, results))
    }

    /// Installer targeting the environment's interpreter.
    pub fn installer_for(&self, env: &VirtualEnvironment, template: &Installer) -> Installer {
        template.with_backend(self.toolchain.backend(&env.interpreter))
    }

    fn install_dependencies(
        &self,
        env: &VirtualEnvironment,
        dependencies: &[PackageName],
        installer: &Installer,
        locks: &LockManager,
        ui: &mut dyn UserInterface,
    ) -> Vec<InstallAttemptResult> {
        if dependencies.is_empty() {
            return Vec::new();
        }

        let names: Vec<&str> = dependencies.iter().map(PackageName::as_str).collect();
        tracing::info!("Installing dependencies: {}...", names.join(", "));

        let env_installer = self.installer_for(env, installer);
        let mut results = Vec::with_capacity(dependencies.len());

        for dep in dependencies {
            match locks.with_lock(dep, || env_installer.install(dep, ui)) {
                Ok(result) => {
                    if !result.succeeded {
                        ui.warning(&format!(
                            "Error installing dependency {} into {}",
                            dep,
                            env.root.display()
                        ));
                    }
                    results.push(result);
                }
                Err(e) => {
                    tracing::error!(package = %dep, "Failed to install dependency: {}", e);
                    ui.error(&format!("Error installing dependency {}: {}", dep, e));
                }
            }
        }

        if results.iter().all(|r| r.succeeded) && results.len() == dependencies.len() {
            tracing::info!("Dependencies installed successfully.");
        }
        results
    }
}
