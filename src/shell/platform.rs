//! Platform and environment detection.

use std::path::{Path, PathBuf};

/// Path and script conventions for isolated environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    /// `Scripts\activate.bat`, `Scripts\python.exe`.
    Windows,
    /// `bin/activate`, `bin/python`.
    Posix,
}

impl OsFamily {
    /// The family of the running platform.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    /// Directory holding executables inside an environment root.
    pub fn bin_dir(&self, root: &Path) -> PathBuf {
        match self {
            Self::Windows => root.join("Scripts"),
            Self::Posix => root.join("bin"),
        }
    }

    /// Activation script inside an environment root.
    pub fn activation_script(&self, root: &Path) -> PathBuf {
        match self {
            Self::Windows => self.bin_dir(root).join("activate.bat"),
            Self::Posix => self.bin_dir(root).join("activate"),
        }
    }

    /// Interpreter inside an environment root.
    pub fn interpreter(&self, root: &Path) -> PathBuf {
        match self {
            Self::Windows => self.bin_dir(root).join("python.exe"),
            Self::Posix => self.bin_dir(root).join("python"),
        }
    }
}

/// Check if running in a CI environment.
///
/// Used to auto-detect CI and force non-interactive mode in `main()`.
/// Checks common CI environment variables: `CI`, `GITHUB_ACTIONS`,
/// `GITLAB_CI`, `CIRCLECI`, `TRAVIS`, `JENKINS_URL`.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
}

/// Check if an isolated environment is already active.
///
/// Activation scripts export `VIRTUAL_ENV`; conda exports `CONDA_PREFIX`
/// for non-base environments.
pub fn in_virtual_env() -> bool {
    in_virtual_env_with(|key| std::env::var(key))
}

/// Testable form of [`in_virtual_env`].
pub fn in_virtual_env_with<F>(env: F) -> bool
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    if env("VIRTUAL_ENV").is_ok_and(|v| !v.is_empty()) {
        return true;
    }
    match env("CONDA_DEFAULT_ENV") {
        Ok(name) => !name.is_empty() && name != "base",
        Err(_) => false,
    }
}

/// Check whether a process id refers to a live process.
///
/// Always `true` on platforms without a cheap liveness probe.
pub fn process_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            return false;
        };
        // SAFETY: kill with signal 0 performs permission and existence checks only
        let rc = unsafe { libc::kill(pid, 0) };
        rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }
    #[cfg(not(unix))]
    {
        let _ = pid;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::VarError;

    #[test]
    fn posix_paths() {
        let root = Path::new("/work/venv");
        assert_eq!(
            OsFamily::Posix.activation_script(root),
            PathBuf::from("/work/venv/bin/activate")
        );
        assert_eq!(
            OsFamily::Posix.interpreter(root),
            PathBuf::from("/work/venv/bin/python")
        );
    }

    #[test]
    fn windows_paths() {
        let root = Path::new("venv");
        assert_eq!(
            OsFamily::Windows.activation_script(root),
            Path::new("venv").join("Scripts").join("activate.bat")
        );
        assert_eq!(
            OsFamily::Windows.interpreter(root),
            Path::new("venv").join("Scripts").join("python.exe")
        );
    }

    #[test]
    fn virtual_env_detected_from_env_var() {
        assert!(in_virtual_env_with(|k| match k {
            "VIRTUAL_ENV" => Ok("/work/venv".to_string()),
            _ => Err(VarError::NotPresent),
        }));
        assert!(!in_virtual_env_with(|_| Err(VarError::NotPresent)));
    }

    #[test]
    fn conda_base_is_not_isolated() {
        assert!(!in_virtual_env_with(|k| match k {
            "CONDA_DEFAULT_ENV" => Ok("base".to_string()),
            _ => Err(VarError::NotPresent),
        }));
        assert!(in_virtual_env_with(|k| match k {
            "CONDA_DEFAULT_ENV" => Ok("science".to_string()),
            _ => Err(VarError::NotPresent),
        }));
    }

    #[test]
    fn current_process_is_alive() {
        assert!(process_alive(std::process::id()));
    }

    #[test]
    fn is_ci_detects_environment() {
        // Just ensure function doesn't panic
        let _ = is_ci();
    }
}
