//! State shared by every command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::args::RemediationArgs;
use crate::config::{load_config, validate, AutodepConfig};
use crate::coordinator::{Coordinator, CoordinatorSettings};
use crate::error::{AutodepError, Result};
use crate::installer::Installer;
use crate::lock::LockManager;
use crate::shell::in_virtual_env;
use crate::toolchain::{PythonToolchain, Toolchain};
use crate::ui::UserInterface;

use super::dispatcher::CommandResult;

/// Exit code when some name did not resolve.
pub const EXIT_UNRESOLVED: i32 = 1;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Project root, config override and toolchain for one invocation.
#[derive(Clone)]
pub struct ProjectContext {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
    toolchain: Arc<dyn Toolchain>,
    inside_virtual_env: bool,
}

impl ProjectContext {
    /// Context for a project, using the system Python toolchain.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            config_path: None,
            toolchain: Arc::new(PythonToolchain),
            inside_virtual_env: in_virtual_env(),
        }
    }

    /// Load only this config file instead of merging layers.
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Replace the toolchain.
    pub fn with_toolchain(mut self, toolchain: Arc<dyn Toolchain>) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// Override virtual-environment detection.
    pub fn with_inside_virtual_env(mut self, inside: bool) -> Self {
        self.inside_virtual_env = inside;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn toolchain(&self) -> &Arc<dyn Toolchain> {
        &self.toolchain
    }

    /// Whether the process already runs inside an isolated environment.
    pub fn inside_virtual_env(&self) -> bool {
        self.inside_virtual_env
    }

    /// Load and validate configuration.
    pub fn load_config(&self, require_project: bool) -> Result<AutodepConfig> {
        let config = load_config(
            &self.project_root,
            self.config_path.as_deref(),
            require_project,
        )?;
        validate(&config)?;
        Ok(config)
    }

    /// Lock manager for the configured directory and staleness ceiling.
    pub fn lock_manager(&self, config: &AutodepConfig) -> LockManager {
        LockManager::with_timeout(config.settings.lock_dir(), config.settings.lock_timeout())
    }

    /// Installer for the configured interpreter.
    pub fn installer(&self, config: &AutodepConfig, max_attempts: Option<u32>) -> Installer {
        Installer::new(self.toolchain.backend(&config.settings.python))
            .with_max_attempts(max_attempts.unwrap_or(config.settings.max_attempts))
            .with_backoff(config.settings.backoff())
    }

    /// Resolve a directory argument against the project root.
    pub fn resolve_dir(&self, dir: &Path) -> PathBuf {
        self.project_root.join(dir)
    }

    /// Coordinator configured from `config` with command-line overrides.
    pub fn coordinator(&self, config: &AutodepConfig, args: &RemediationArgs) -> Coordinator {
        let venv_dir = match &args.venv_dir {
            Some(dir) => self.resolve_dir(dir),
            None => config.isolation.venv_dir_in(&self.project_root),
        };
        let settings = CoordinatorSettings {
            python: config.settings.python.clone(),
            max_attempts: args.max_attempts.unwrap_or(config.settings.max_attempts),
            backoff: config.settings.backoff(),
            venv_dir,
            isolation_dependencies: config.isolation.dependencies.clone(),
            prompt_isolation: config.isolation.prompt,
        };
        Coordinator::new(Arc::clone(&self.toolchain), settings, self.lock_manager(config))
    }
}

/// Whether an error comes from loading or validating configuration.
pub fn is_config_error(err: &AutodepError) -> bool {
    matches!(
        err,
        AutodepError::ConfigNotFound { .. }
            | AutodepError::ConfigParseError { .. }
            | AutodepError::ConfigValidationError { .. }
    )
}

/// Report a configuration error and map it to exit code 2; pass anything
/// else through.
pub fn config_failure(ui: &mut dyn UserInterface, err: AutodepError) -> Result<CommandResult> {
    if is_config_error(&err) {
        if let AutodepError::ConfigNotFound { path } = &err {
            ui.error(&format!(
                "No configuration found at {}. Create it with a `packages:` list.",
                path.display()
            ));
        } else {
            ui.error(&err.to_string());
        }
        Ok(CommandResult::failure(EXIT_CONFIG_ERROR))
    } else {
        Err(err)
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(anyhow::Error::from)?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::isolation::isolator::tests::FakeToolchain;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    /// A project directory with the given config and a context backed by
    /// a fake toolchain. Backoff is shortened and locks live in the project.
    pub(crate) fn setup_project(
        config: &str,
        write_activation: bool,
    ) -> (TempDir, ProjectContext, Arc<FakeToolchain>) {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".autodep");
        fs::create_dir_all(&dir).unwrap();
        let lock_dir = temp.path().join("locks");
        let full = format!(
            "{}\nsettings:\n  backoff_unit_ms: 1\n  lock_dir: {}\n",
            config,
            lock_dir.display()
        );
        fs::write(dir.join("config.yml"), full).unwrap();

        let toolchain = Arc::new(FakeToolchain::new(write_activation));
        let ctx = ProjectContext::new(temp.path())
            .with_toolchain(toolchain.clone())
            .with_inside_virtual_env(false);
        (temp, ctx, toolchain)
    }

    #[test]
    fn coordinator_uses_overrides() {
        let (temp, ctx, _) = setup_project("packages: [numpy]", true);
        let config = ctx.load_config(true).unwrap();
        let args = RemediationArgs {
            max_attempts: Some(7),
            venv_dir: Some(PathBuf::from(".venv")),
            ..Default::default()
        };

        let coordinator = ctx.coordinator(&config, &args);

        assert_eq!(coordinator.settings().max_attempts, 7);
        assert_eq!(coordinator.settings().venv_dir, temp.path().join(".venv"));
        assert_eq!(coordinator.locks().dir(), temp.path().join("locks"));
    }

    #[test]
    fn config_errors_map_to_exit_two() {
        let mut ui = MockUI::new();
        let result = config_failure(
            &mut ui,
            AutodepError::ConfigValidationError {
                message: "bad".into(),
            },
        )
        .unwrap();
        assert_eq!(result.exit_code, EXIT_CONFIG_ERROR);
        assert!(ui.has_error("bad"));

        let passthrough = config_failure(&mut ui, AutodepError::Other(anyhow::anyhow!("boom")));
        assert!(passthrough.is_err());
    }

    #[test]
    fn invalid_config_fails_validation() {
        let (_temp, ctx, _) = setup_project("packages: [numpy, numpy]", true);
        let err = ctx.load_config(true).unwrap_err();
        assert!(is_config_error(&err));
    }
}
