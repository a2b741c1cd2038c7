//! Configuration validation rules.
//!
//! - `max_attempts` must be at least 1
//! - the interpreter and environment directory must be non-empty
//! - no package may be listed twice

use std::collections::HashSet;

use crate::config::schema::AutodepConfig;
use crate::error::{AutodepError, Result};
use crate::package::PackageName;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Package name if the error is package-specific
    pub package: Option<String>,
}

impl ValidationError {
    fn new(rule: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            package: None,
        }
    }
}

/// Validate a configuration and return all errors.
///
/// Collects every error rather than stopping at the first one.
pub fn validate_config(config: &AutodepConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_settings(config));
    errors.extend(duplicates("packages", &config.packages));
    errors.extend(duplicates(
        "isolation.dependencies",
        &config.isolation.dependencies,
    ));

    errors
}

fn validate_settings(config: &AutodepConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.settings.max_attempts < 1 {
        errors.push(ValidationError::new(
            "max-attempts",
            "settings.max_attempts must be at least 1".to_string(),
        ));
    }

    if config.settings.python.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "empty-python",
            "settings.python must name an interpreter".to_string(),
        ));
    }

    if config.isolation.venv_dir.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "empty-venv-dir",
            "isolation.venv_dir must not be empty".to_string(),
        ));
    }

    errors
}

fn duplicates(field: &str, names: &[PackageName]) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut errors = Vec::new();

    for name in names {
        if !seen.insert(name) && reported.insert(name) {
            errors.push(ValidationError {
                rule: "duplicate-package".to_string(),
                message: format!("'{}' is listed more than once in {}", name, field),
                package: Some(name.to_string()),
            });
        }
    }

    errors
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(config: &AutodepConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(AutodepError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}
