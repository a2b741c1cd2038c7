//! Package-manager invocation.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::package::PackageName;
use crate::shell::{display_command, execute, CommandOptions, CommandResult};

/// One package-manager invocation for a single package.
pub trait InstallBackend: Send + Sync {
    /// Human-readable form of the command, for logs.
    fn describe(&self, name: &PackageName) -> String;

    /// Run the install once.
    ///
    /// `Err` means the package manager could not be started at all.
    fn run_install(&self, name: &PackageName) -> Result<CommandResult>;
}

/// Installs with `<python> -m pip install <name>`.
#[derive(Debug, Clone)]
pub struct PipBackend {
    python: PathBuf,
}

impl PipBackend {
    /// Create a backend for the given interpreter.
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// The interpreter pip runs under.
    pub fn python(&self) -> &Path {
        &self.python
    }

    fn args<'a>(&self, name: &'a PackageName) -> [&'a str; 4] {
        ["-m", "pip", "install", name.as_str()]
    }
}

impl InstallBackend for PipBackend {
    fn describe(&self, name: &PackageName) -> String {
        display_command(&self.python, &self.args(name))
    }

    fn run_install(&self, name: &PackageName) -> Result<CommandResult> {
        execute(&self.python, &self.args(name), &CommandOptions::captured())
    }
}
