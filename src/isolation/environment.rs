//! Environment paths.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::shell::OsFamily;

/// An isolated environment rooted at a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualEnvironment {
    /// Environment root.
    pub root: PathBuf,
    /// Script that activates the environment in a shell.
    pub activation_script: PathBuf,
    /// Interpreter inside the environment.
    pub interpreter: PathBuf,
    #[serde(skip)]
    os: OsFamily,
}

impl VirtualEnvironment {
    /// Compute the platform paths for an environment root.
    pub fn at(root: impl Into<PathBuf>, os: OsFamily) -> Self {
        let root = root.into();
        Self {
            activation_script: os.activation_script(&root),
            interpreter: os.interpreter(&root),
            root,
            os,
        }
    }

    /// Whether the activation script exists on disk.
    pub fn is_activatable(&self) -> bool {
        self.activation_script.is_file()
    }

    /// Shell command a user runs to activate the environment.
    pub fn activation_command(&self) -> String {
        match self.os {
            OsFamily::Windows => self.activation_script.display().to_string(),
            OsFamily::Posix => format!("source {}", self.activation_script.display()),
        }
    }

    /// Environment root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
