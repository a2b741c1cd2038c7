//! Terminal states and run reports.

use serde::Serialize;

use crate::error::AutodepError;
use crate::installer::InstallAttemptResult;
use crate::isolation::VirtualEnvironment;
use crate::package::PackageName;
use crate::probe::Availability;

/// Where a name ended up after [`Coordinator::ensure`](super::Coordinator::ensure).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PackageState {
    /// Resolved without installing.
    Available { availability: Availability },
    /// Installed by this run.
    Installed { attempts: u32, isolated: bool },
    /// Retries exhausted and isolation declined or unavailable.
    ManualInterventionRequired {
        attempts: u32,
        exit_code: Option<i32>,
    },
    /// Remediation stopped with an error.
    Failed { reason: String },
}

impl PackageState {
    /// Whether the name is usable.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Available { .. } | Self::Installed { .. })
    }

    /// Short label for status output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Available { .. } => "available",
            Self::Installed { .. } => "installed",
            Self::ManualInterventionRequired { .. } => "manual",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Result of ensuring one name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnsureOutcome {
    pub package: PackageName,
    #[serde(flatten)]
    pub state: PackageState,
    /// The last install sequence run for the name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install: Option<InstallAttemptResult>,
}

impl EnsureOutcome {
    /// Whether the name is usable.
    pub fn is_resolved(&self) -> bool {
        self.state.is_resolved()
    }
}

/// Outcomes for every name in one run, in request order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RemediationReport {
    pub outcomes: Vec<EnsureOutcome>,
    /// The isolated environment entered during the run, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<VirtualEnvironment>,
}

impl RemediationReport {
    /// Whether every name resolved.
    pub fn all_resolved(&self) -> bool {
        self.outcomes.iter().all(EnsureOutcome::is_resolved)
    }

    /// Outcome for a name.
    pub fn get(&self, name: &PackageName) -> Option<&EnsureOutcome> {
        self.outcomes.iter().find(|o| &o.package == name)
    }

    /// One `Unresolvable` error per name that did not resolve.
    pub fn unresolved(&self) -> Vec<AutodepError> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_resolved())
            .map(|o| AutodepError::Unresolvable {
                package: o.package.to_string(),
            })
            .collect()
    }

    /// Count of names per label, in a fixed order.
    pub fn summary(&self) -> Vec<(&'static str, usize)> {
        ["available", "installed", "manual", "failed"]
            .into_iter()
            .map(|label| {
                let n = self
                    .outcomes
                    .iter()
                    .filter(|o| o.state.label() == label)
                    .count();
                (label, n)
            })
            .filter(|(_, n)| *n > 0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, state: PackageState) -> EnsureOutcome {
        EnsureOutcome {
            package: PackageName::new(name).unwrap(),
            state,
            install: None,
        }
    }

    #[test]
    fn resolved_states() {
        assert!(PackageState::Available {
            availability: Availability::Installed
        }
        .is_resolved());
        assert!(PackageState::Installed {
            attempts: 2,
            isolated: false
        }
        .is_resolved());
        assert!(!PackageState::Failed {
            reason: "x".into()
        }
        .is_resolved());
    }

    #[test]
    fn report_lists_unresolved_names() {
        let report = RemediationReport {
            outcomes: vec![
                outcome(
                    "json",
                    PackageState::Available {
                        availability: Availability::StandardLibrary,
                    },
                ),
                outcome(
                    "pkgA",
                    PackageState::ManualInterventionRequired {
                        attempts: 3,
                        exit_code: Some(3),
                    },
                ),
            ],
            environment: None,
        };

        assert!(!report.all_resolved());
        let errors = report.unresolved();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("pkgA"));
        assert_eq!(report.summary(), vec![("available", 1), ("manual", 1)]);
    }

    #[test]
    fn outcome_serializes_flat() {
        let json = serde_json::to_value(outcome(
            "numpy",
            PackageState::Installed {
                attempts: 2,
                isolated: false,
            },
        ))
        .unwrap();
        assert_eq!(json["package"], "numpy");
        assert_eq!(json["state"], "installed");
        assert_eq!(json["attempts"], 2);
    }
}
