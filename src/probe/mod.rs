//! Availability probing.
//!
//! A probe answers one question per name: does it already resolve as an
//! importable unit? Every resolution failure (absent, broken, partially
//! installed) reads as [`Availability::Missing`]. Probing never returns an
//! error, so callers branch on a value instead of catching failures.
//!
//! # Example
//!
//! ```no_run
//! use autodep::package::PackageName;
//! use autodep::probe::{AvailabilityProbe, InterpreterProbe};
//!
//! let probe = InterpreterProbe::new("python3");
//! let name = PackageName::new("json").unwrap();
//! assert!(probe.is_available(&name));
//! ```

use std::path::{Path, PathBuf};

use crate::package::PackageName;
use crate::shell::{execute, CommandOptions};

/// Exit status the check script uses for standard-library members.
const STDLIB_EXIT_CODE: i32 = 10;

/// Locates a module in the target interpreter without importing it. Exits 10
/// for standard-library members, 0 when a finder locates the top-level
/// module, nonzero otherwise. Only the top-level name is looked up, so no
/// package code runs.
const CHECK_SCRIPT: &str = "\
import importlib.util, sys
top = sys.argv[1].split('.')[0]
if top in getattr(sys, 'stdlib_module_names', ()) or top in sys.builtin_module_names:
    sys.exit(10)
try:
    found = importlib.util.find_spec(top) is not None
except BaseException:
    found = False
sys.exit(0 if found else 1)
";

/// Result of probing one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Ships with the interpreter; never installed.
    StandardLibrary,
    /// Importable from the target environment.
    Installed,
    /// Not importable, for whatever reason.
    Missing,
}

impl Availability {
    /// Whether the name resolves without installation.
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Missing)
    }

    /// Short label for status output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::StandardLibrary => "stdlib",
            Self::Installed => "installed",
            Self::Missing => "missing",
        }
    }
}

/// Read-only availability check, safe to call concurrently.
pub trait AvailabilityProbe: Send + Sync {
    /// Probe a name.
    fn probe(&self, name: &PackageName) -> Availability;

    /// Whether the name resolves without installation.
    fn is_available(&self, name: &PackageName) -> bool {
        self.probe(name).is_available()
    }
}

/// Probes by asking an interpreter to locate the module.
#[derive(Debug, Clone)]
pub struct InterpreterProbe {
    python: PathBuf,
}

impl InterpreterProbe {
    /// Create a probe for the given interpreter.
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// The interpreter this probe runs.
    pub fn python(&self) -> &Path {
        &self.python
    }
}

impl AvailabilityProbe for InterpreterProbe {
    fn probe(&self, name: &PackageName) -> Availability {
        let module = name.import_name();
        let result = execute(
            &self.python,
            &["-c", CHECK_SCRIPT, module.as_str()],
            &CommandOptions::captured(),
        );

        let availability = match result {
            Ok(r) if r.success => Availability::Installed,
            Ok(r) if r.exit_code == Some(STDLIB_EXIT_CODE) => Availability::StandardLibrary,
            Ok(_) => Availability::Missing,
            Err(e) => {
                tracing::debug!("Probe for '{}' could not run: {}", name, e);
                Availability::Missing
            }
        };

        tracing::debug!(
            package = %name,
            module = %module,
            "Probed availability: {}",
            availability.label()
        );
        availability
    }
}
