//! Failure classification by package-manager exit status.

use serde::Serialize;

/// Broad cause of a failed install attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Exit 1: network trouble or a generic package-manager error.
    Generic,
    /// Exit 2: the package manager itself needs upgrading.
    ToolOutdated,
    /// Exit 3: conflicting dependency versions.
    DependencyConflict,
    /// Any other status, including death by signal.
    Unknown,
}

impl FailureClass {
    /// Classify an exit code.
    pub fn from_exit_code(code: i32) -> Self {
        match code {
            1 => Self::Generic,
            2 => Self::ToolOutdated,
            3 => Self::DependencyConflict,
            _ => Self::Unknown,
        }
    }

    /// Classify an optional exit code; `None` (killed or never started) is unknown.
    pub fn from_status(code: Option<i32>) -> Self {
        code.map_or(Self::Unknown, Self::from_exit_code)
    }

    /// What the user should try next.
    pub fn message(&self, package: &str) -> String {
        match self {
            Self::Generic => format!(
                "Failed to install {}. Please check your network connection or pip version.",
                package
            ),
            Self::ToolOutdated => concat!(
                "There seems to be an issue with pip. ",
                "Try upgrading pip using: pip install --upgrade pip"
            )
            .to_string(),
            Self::DependencyConflict => concat!(
                "There might be a conflict with dependencies. ",
                "Try using a virtual environment to resolve issues."
            )
            .to_string(),
            Self::Unknown => format!(
                "Unknown error occurred while installing {}. Please try again or check logs.",
                package
            ),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::ToolOutdated => "tool_outdated",
            Self::DependencyConflict => "dependency_conflict",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(FailureClass::from_exit_code(1), FailureClass::Generic);
        assert_eq!(FailureClass::from_exit_code(2), FailureClass::ToolOutdated);
        assert_eq!(
            FailureClass::from_exit_code(3),
            FailureClass::DependencyConflict
        );
    }

    #[test]
    fn other_codes_are_unknown() {
        for code in [-1, 4, 9, 127, 255] {
            assert_eq!(FailureClass::from_exit_code(code), FailureClass::Unknown);
        }
        assert_eq!(FailureClass::from_status(None), FailureClass::Unknown);
    }

    #[test]
    fn classification_is_stable() {
        for code in -5..300 {
            assert_eq!(
                FailureClass::from_exit_code(code),
                FailureClass::from_exit_code(code)
            );
        }
    }

    #[test]
    fn messages_point_at_remedies() {
        assert!(FailureClass::Generic.message("numpy").contains("network"));
        assert!(FailureClass::Generic.message("numpy").contains("numpy"));
        assert!(FailureClass::ToolOutdated
            .message("numpy")
            .contains("pip install --upgrade pip"));
        assert!(FailureClass::DependencyConflict
            .message("numpy")
            .contains("virtual environment"));
        assert!(FailureClass::Unknown.message("numpy").contains("Unknown error"));
    }
}
