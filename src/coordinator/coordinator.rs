//! The remediation state machine.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::AutodepError;
use crate::installer::{Backoff, Installer, Sleeper, DEFAULT_MAX_ATTEMPTS};
use crate::isolation::{EnvironmentIsolator, VirtualEnvironment};
use crate::lock::LockManager;
use crate::package::PackageName;
use crate::probe::AvailabilityProbe;
use crate::shell::OsFamily;
use crate::toolchain::Toolchain;
use crate::ui::{Prompt, UserInterface};

use super::report::{EnsureOutcome, PackageState, RemediationReport};
use super::session::RemediationSession;

/// Prompt key for the isolation fallback question.
pub const ISOLATION_PROMPT_KEY: &str = "create_venv";

/// Knobs for a [`Coordinator`].
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Interpreter used for probing and installing outside isolation.
    pub python: PathBuf,
    /// Install attempts per name.
    pub max_attempts: u32,
    /// Delay schedule between attempts.
    pub backoff: Backoff,
    /// Root of the isolated environment.
    pub venv_dir: PathBuf,
    /// Extra names installed into a freshly entered environment.
    pub isolation_dependencies: Vec<PackageName>,
    /// Whether to offer isolation once retries are exhausted.
    pub prompt_isolation: bool,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            python: PathBuf::from("python3"),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::default(),
            venv_dir: PathBuf::from("venv"),
            isolation_dependencies: Vec::new(),
            prompt_isolation: true,
        }
    }
}

/// Probe and installer for one interpreter.
struct Target {
    probe: Arc<dyn AvailabilityProbe>,
    installer: Installer,
}

/// Ensures package names resolve, installing and isolating as needed.
pub struct Coordinator {
    toolchain: Arc<dyn Toolchain>,
    settings: CoordinatorSettings,
    locks: LockManager,
    base: Target,
    isolated: Option<Target>,
    isolator: EnvironmentIsolator,
    environment: Option<VirtualEnvironment>,
    isolation_broken: bool,
}

impl Coordinator {
    /// Create a coordinator targeting `settings.python`.
    pub fn new(
        toolchain: Arc<dyn Toolchain>,
        settings: CoordinatorSettings,
        locks: LockManager,
    ) -> Self {
        let base = Target {
            probe: toolchain.probe(&settings.python),
            installer: Installer::new(toolchain.backend(&settings.python))
                .with_max_attempts(settings.max_attempts)
                .with_backoff(settings.backoff),
        };
        let isolator = EnvironmentIsolator::new(Arc::clone(&toolchain), settings.python.clone());

        Self {
            toolchain,
            settings,
            locks,
            base,
            isolated: None,
            isolator,
            environment: None,
            isolation_broken: false,
        }
    }

    /// Replace the backoff sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.base.installer = self.base.installer.with_sleeper(sleeper);
        self
    }

    /// Override the environment path conventions.
    pub fn with_os_family(mut self, os: OsFamily) -> Self {
        self.isolator = EnvironmentIsolator::new(
            Arc::clone(&self.toolchain),
            self.settings.python.clone(),
        )
        .with_os_family(os);
        self
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    /// The isolated environment, once entered.
    pub fn environment(&self) -> Option<&VirtualEnvironment> {
        self.environment.as_ref()
    }

    /// Create (if needed) and enter the isolated environment.
    ///
    /// Configured isolation dependencies are installed on first entry. Later
    /// sessions marked isolated probe and install through the environment's
    /// interpreter.
    pub fn enter_environment(
        &mut self,
        ui: &mut dyn UserInterface,
    ) -> crate::Result<VirtualEnvironment> {
        if let Some(env) = &self.environment {
            return Ok(env.clone());
        }

        let root = self.settings.venv_dir.clone();
        let (env, results) = self.isolator.ensure_environment(
            &root,
            &self.settings.isolation_dependencies,
            &self.base.installer,
            &self.locks,
            ui,
        )?;

        let failed = results.iter().filter(|r| !r.succeeded).count();
        if failed > 0 {
            tracing::warn!("{} isolation dependencies failed to install", failed);
        }

        self.isolated = Some(Target {
            probe: self.toolchain.probe(&env.interpreter),
            installer: self.isolator.installer_for(&env, &self.base.installer),
        });
        self.environment = Some(env.clone());
        tracing::info!("Entered isolated environment at {}", env.root.display());
        Ok(env)
    }

    /// Ensure one name resolves.
    ///
    /// Names already handled in `session` return their recorded outcome
    /// without probing again.
    pub fn ensure(
        &mut self,
        name: &PackageName,
        session: &mut RemediationSession,
        ui: &mut dyn UserInterface,
    ) -> EnsureOutcome {
        if let Some(outcome) = session.outcome(name) {
            tracing::debug!(
                package = %name,
                "Already handled this session: {}",
                outcome.state.label()
            );
            return outcome;
        }

        let state = self.resolve(name, session, ui);
        session.record(name, state.clone());
        EnsureOutcome {
            package: name.clone(),
            state,
            install: session.install_result(name).cloned(),
        }
    }

    /// Ensure every name, then report outcomes in request order.
    ///
    /// A failure for one name never stops the others. Outcomes reflect the
    /// final state, so names re-run inside an isolated environment report
    /// that result.
    pub fn ensure_all(
        &mut self,
        names: &[PackageName],
        session: &mut RemediationSession,
        ui: &mut dyn UserInterface,
    ) -> RemediationReport {
        let mut seen = HashSet::new();
        let unique: Vec<&PackageName> = names.iter().filter(|n| seen.insert(*n)).collect();

        for name in &unique {
            self.ensure(name, session, ui);
        }

        let report = RemediationReport {
            outcomes: unique
                .iter()
                .filter_map(|name| session.outcome(name))
                .collect(),
            environment: self.environment.clone(),
        };

        for err in report.unresolved() {
            tracing::warn!("{}", err);
        }
        report
    }

    fn target(&self, session: &RemediationSession) -> &Target {
        if session.is_isolated() {
            self.isolated.as_ref().unwrap_or(&self.base)
        } else {
            &self.base
        }
    }

    fn resolve(
        &mut self,
        name: &PackageName,
        session: &mut RemediationSession,
        ui: &mut dyn UserInterface,
    ) -> PackageState {
        let isolated = session.is_isolated();
        let target = self.target(session);

        let availability = target.probe.probe(name);
        if availability.is_available() {
            tracing::info!(package = %name, "{} is available ({})", name, availability.label());
            return PackageState::Available { availability };
        }

        session.mark_pending(name);
        tracing::info!(package = %name, isolated, "{} not found. Installing...", name);

        // Another process may have installed the name while we waited.
        let locked = self.locks.with_lock(name, || {
            let now = target.probe.probe(name);
            if now.is_available() {
                Err(now)
            } else {
                Ok(target.installer.install(name, ui))
            }
        });
        let result = match locked {
            Ok(Ok(result)) => result,
            Ok(Err(availability)) => {
                tracing::info!(
                    package = %name,
                    "{} became available while waiting for the lock",
                    name
                );
                return PackageState::Available { availability };
            }
            Err(e) => return report_failure(name, e, ui),
        };
        session.record_install(result.clone());

        if result.succeeded {
            return PackageState::Installed {
                attempts: result.attempts,
                isolated,
            };
        }

        if isolated {
            let err = AutodepError::InstallerFailure {
                package: name.to_string(),
                exit_code: result.last_exit_code,
                attempts: result.attempts,
            };
            return report_failure(name, err, ui);
        }

        let manual = PackageState::ManualInterventionRequired {
            attempts: result.attempts,
            exit_code: result.last_exit_code,
        };

        if !self.settings.prompt_isolation || self.isolation_broken {
            tracing::info!(package = %name, "Isolation fallback not offered");
            ui.warning(&format!("Please install {} manually.", name));
            return manual;
        }

        let prompt = Prompt::new(
            ISOLATION_PROMPT_KEY,
            format!(
                "Installation of {} failed. Create a virtual environment and try again?",
                name
            ),
        );
        match ui.confirm(&prompt) {
            Ok(true) => self.isolate_and_retry(name, session, ui),
            Ok(false) => {
                tracing::info!(package = %name, "Isolation declined");
                ui.warning(&format!(
                    "Installation of {} failed. Please install it manually.",
                    name
                ));
                manual
            }
            Err(e) => {
                tracing::warn!(package = %name, "Could not ask about isolation: {}", e);
                ui.warning(&format!("Please install {} manually.", name));
                manual
            }
        }
    }

    fn isolate_and_retry(
        &mut self,
        trigger: &PackageName,
        session: &mut RemediationSession,
        ui: &mut dyn UserInterface,
    ) -> PackageState {
        if let Err(e) = self.enter_environment(ui) {
            self.isolation_broken = true;
            return report_failure(trigger, e, ui);
        }

        let names = session.enter_isolation();
        tracing::info!(
            "Retrying {} pending package(s) in the isolated environment",
            names.len()
        );
        for name in &names {
            self.ensure(name, session, ui);
        }

        session
            .state(trigger)
            .cloned()
            .unwrap_or_else(|| PackageState::Failed {
                reason: format!("{} was not retried in the isolated environment", trigger),
            })
    }
}

fn report_failure(
    name: &PackageName,
    err: AutodepError,
    ui: &mut dyn UserInterface,
) -> PackageState {
    if err.is_remediation_failure() {
        tracing::error!(package = %name, "{}", err);
        ui.error(&err.to_string());
    } else {
        tracing::error!(package = %name, "Unexpected error with {}: {}", name, err);
        ui.error(&format!("Unexpected error with {}: {}", name, err));
    }
    PackageState::Failed {
        reason: err.to_string(),
    }
}
