//! Package names.
//!
//! A [`PackageName`] is compared by exact string match. Case and extras
//! (`name[extra]`) are significant, so `Flask` and `flask` lock and install
//! independently.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AutodepError, Result};

/// Characters that end the importable part of a requirement string.
const REQUIREMENT_DELIMITERS: &[char] = &['[', '=', '<', '>', '!', '~', ';', '@'];

/// An opaque package identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Create a package name, rejecting empty names and names with whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(AutodepError::ConfigValidationError {
                message: "Package name cannot be empty".to_string(),
            });
        }
        if name.chars().any(char::is_whitespace) {
            return Err(AutodepError::ConfigValidationError {
                message: format!("Package name '{}' contains whitespace", name),
            });
        }
        Ok(Self(name))
    }

    /// The name exactly as given, which is what the package manager receives.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The module name to probe for importability.
    ///
    /// Strips extras and version pins and maps `-` to `_`, so
    /// `python-dateutil[tz]>=2` probes `python_dateutil`.
    pub fn import_name(&self) -> String {
        let base = self
            .0
            .split(REQUIREMENT_DELIMITERS)
            .next()
            .unwrap_or(&self.0);
        base.replace('-', "_")
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PackageName {
    type Err = AutodepError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for PackageName {
    type Error = AutodepError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PackageName> for String {
    fn from(name: PackageName) -> Self {
        name.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
