//! The install retry loop.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{AutodepError, Result};
use crate::package::PackageName;
use crate::ui::UserInterface;

use super::backend::InstallBackend;
use super::backoff::{Backoff, Sleeper, ThreadSleeper};
use super::classify::FailureClass;

/// Attempts made per install unless configured otherwise.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Number of trailing stderr lines shown to the user in verbose mode.
const STDERR_TAIL_LINES: usize = 5;

/// Outcome of one [`Installer::install`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallAttemptResult {
    /// The package that was installed.
    pub package: PackageName,
    /// Whether any attempt succeeded.
    pub succeeded: bool,
    /// Attempts made, at least 1.
    pub attempts: u32,
    /// Exit code of the last failed attempt.
    pub last_exit_code: Option<i32>,
}

impl InstallAttemptResult {
    /// Convert a failed result into [`AutodepError::InstallerFailure`].
    pub fn into_result(self) -> Result<Self> {
        if self.succeeded {
            Ok(self)
        } else {
            Err(AutodepError::InstallerFailure {
                package: self.package.to_string(),
                exit_code: self.last_exit_code,
                attempts: self.attempts,
            })
        }
    }
}

/// Runs the package manager with bounded retries and exponential backoff.
pub struct Installer {
    backend: Arc<dyn InstallBackend>,
    max_attempts: u32,
    backoff: Backoff,
    sleeper: Arc<dyn Sleeper>,
}

impl Installer {
    /// Create an installer with the default attempt count and backoff.
    pub fn new(backend: Arc<dyn InstallBackend>) -> Self {
        Self {
            backend,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::default(),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Set the number of attempts (clamped to at least 1).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the backoff schedule.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace the sleeper (tests use a recording one).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Same settings, different backend. Used to retarget installs into an
    /// isolated environment.
    pub fn with_backend(&self, backend: Arc<dyn InstallBackend>) -> Self {
        Self {
            backend,
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            sleeper: Arc::clone(&self.sleeper),
        }
    }

    /// Configured attempt count.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Configured backoff schedule.
    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Install one package.
    ///
    /// Returns on the first successful attempt. Failed attempts are
    /// classified, reported and followed by a backoff sleep, except the last.
    pub fn install(&self, name: &PackageName, ui: &mut dyn UserInterface) -> InstallAttemptResult {
        let mut last_exit_code = None;

        for attempt in 1..=self.max_attempts {
            tracing::info!(
                package = %name,
                attempt,
                max_attempts = self.max_attempts,
                "Running {}",
                self.backend.describe(name)
            );

            let mut spinner = ui.start_spinner(&format!(
                "Installing {} (attempt {}/{})",
                name, attempt, self.max_attempts
            ));

            let outcome = self.backend.run_install(name);

            match outcome {
                Ok(result) if result.success => {
                    spinner.finish_success(&format!("{} installed successfully.", name));
                    tracing::info!(package = %name, attempt, "Successfully installed {}", name);
                    return InstallAttemptResult {
                        package: name.clone(),
                        succeeded: true,
                        attempts: attempt,
                        last_exit_code: None,
                    };
                }
                Ok(result) => {
                    spinner.finish_error(&format!(
                        "Attempt {} failed for {} (exit code {})",
                        attempt,
                        name,
                        result
                            .exit_code
                            .map_or_else(|| "none".to_string(), |c| c.to_string())
                    ));
                    last_exit_code = result.exit_code;
                    if !result.stderr.is_empty() {
                        tracing::debug!(
                            package = %name,
                            "pip stderr:\n{}",
                            result.stderr.trim_end()
                        );
                        if ui.output_mode().shows_command_output() {
                            for line in tail(&result.stderr, STDERR_TAIL_LINES) {
                                ui.message(&format!("  {}", line));
                            }
                        }
                    }
                }
                Err(e) => {
                    spinner.finish_error(&format!("Attempt {} failed for {}", attempt, name));
                    tracing::error!(
                        package = %name,
                        attempt,
                        "Package manager could not start: {}",
                        e
                    );
                    last_exit_code = None;
                }
            }

            let class = FailureClass::from_status(last_exit_code);
            let message = class.message(name.as_str());
            tracing::error!(
                package = %name,
                attempt,
                exit_code = ?last_exit_code,
                class = class.label(),
                "{}",
                message
            );
            ui.error(&format!("Error: {}", message));

            if attempt < self.max_attempts {
                let delay = self.backoff.delay_for(attempt);
                tracing::debug!(package = %name, "Backing off {}ms", delay.as_millis());
                self.sleeper.sleep(delay);
            }
        }

        tracing::error!(
            package = %name,
            "Failed to install {} after {} attempts.",
            name,
            self.max_attempts
        );
        ui.error(&format!(
            "Failed to install {} after {} attempts.",
            name, self.max_attempts
        ));

        InstallAttemptResult {
            package: name.clone(),
            succeeded: false,
            attempts: self.max_attempts,
            last_exit_code,
        }
    }
}

fn tail(text: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].to_vec()
}
