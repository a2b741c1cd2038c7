//! Interpreter-specific collaborators.
//!
//! Probing, installing and environment creation all depend on which
//! interpreter is targeted. A [`Toolchain`] builds them for a given
//! interpreter so the coordinator can retarget itself into an isolated
//! environment.

use std::path::Path;
use std::sync::Arc;

use crate::error::{AutodepError, Result};
use crate::installer::{InstallBackend, PipBackend};
use crate::probe::{AvailabilityProbe, InterpreterProbe};
use crate::shell::{display_command, execute, CommandOptions};

/// Builds probes, install backends and environments for an interpreter.
pub trait Toolchain: Send + Sync {
    /// Availability probe resolving names in `python`'s environment.
    fn probe(&self, python: &Path) -> Arc<dyn AvailabilityProbe>;

    /// Install backend targeting `python`'s environment.
    fn backend(&self, python: &Path) -> Arc<dyn InstallBackend>;

    /// Create a fresh isolated environment at `root` using `python`.
    fn create_environment(&self, python: &Path, root: &Path) -> Result<()>;
}

/// CPython with pip and the `venv` module.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonToolchain;

impl Toolchain for PythonToolchain {
    fn probe(&self, python: &Path) -> Arc<dyn AvailabilityProbe> {
        Arc::new(InterpreterProbe::new(python))
    }

    fn backend(&self, python: &Path) -> Arc<dyn InstallBackend> {
        Arc::new(PipBackend::new(python))
    }

    fn create_environment(&self, python: &Path, root: &Path) -> Result<()> {
        let root_arg = root.as_os_str();
        let args = [std::ffi::OsStr::new("-m"), std::ffi::OsStr::new("venv"), root_arg];
        let result = execute(python, &args, &CommandOptions::captured())?;
        if result.success {
            Ok(())
        } else {
            tracing::error!("venv creation failed: {}", result.stderr.trim_end());
            Err(AutodepError::CommandFailed {
                command: display_command(python, &args),
                code: result.exit_code,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_interpreter_fails_creation() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = PythonToolchain
            .create_environment(Path::new("/definitely/not/python"), &temp.path().join("venv"))
            .unwrap_err();
        assert!(matches!(err, AutodepError::CommandFailed { code: None, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_reports_command() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let fake = temp.path().join("python");
        std::fs::write(&fake, "#!/bin/sh\nexit 4\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = PythonToolchain
            .create_environment(&fake, &temp.path().join("venv"))
            .unwrap_err();
        match err {
            AutodepError::CommandFailed { command, code } => {
                assert!(command.contains("-m venv"));
                assert_eq!(code, Some(4));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
