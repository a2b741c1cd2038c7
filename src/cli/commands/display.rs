//! Shared display helpers for availability and remediation outcomes.

use crate::coordinator::{EnsureOutcome, PackageState, RemediationReport};
use crate::lock::LockInfo;
use crate::package::PackageName;
use crate::probe::Availability;
use crate::shell::process_alive;
use crate::ui::UserInterface;

/// Print one probe result.
pub fn show_availability(
    ui: &mut dyn UserInterface,
    name: &PackageName,
    availability: Availability,
) {
    match availability {
        Availability::StandardLibrary => ui.success(&format!("  ✓ {} (stdlib)", name)),
        Availability::Installed => ui.success(&format!("  ✓ {} (installed)", name)),
        Availability::Missing => ui.error(&format!("  ✗ {} (missing)", name)),
    }
}

/// One line describing an outcome.
pub fn outcome_line(outcome: &EnsureOutcome) -> String {
    let name = &outcome.package;
    match &outcome.state {
        PackageState::Available { availability } => {
            format!("✓ {} ({})", name, availability.label())
        }
        PackageState::Installed { attempts, isolated } => format!(
            "✓ {} installed after {} attempt(s){}",
            name,
            attempts,
            if *isolated {
                " in the isolated environment"
            } else {
                ""
            }
        ),
        PackageState::ManualInterventionRequired {
            attempts,
            exit_code,
        } => format!(
            "✗ {} needs manual installation ({} attempt(s), last exit code {})",
            name,
            attempts,
            exit_code.map_or_else(|| "none".to_string(), |c| c.to_string())
        ),
        PackageState::Failed { reason } => format!("✗ {}: {}", name, reason),
    }
}

/// Print a remediation report, styled by outcome.
pub fn show_report(ui: &mut dyn UserInterface, report: &RemediationReport) {
    for outcome in &report.outcomes {
        let line = format!("  {}", outcome_line(outcome));
        match outcome.state {
            PackageState::Available { .. } | PackageState::Installed { .. } => ui.success(&line),
            PackageState::ManualInterventionRequired { .. } => ui.warning(&line),
            PackageState::Failed { .. } => ui.error(&line),
        }
    }

    let summary: Vec<String> = report
        .summary()
        .into_iter()
        .map(|(label, n)| format!("{} {}", n, label))
        .collect();
    if !summary.is_empty() {
        ui.message("");
        ui.message(&format!(
            "{} package(s): {}",
            report.outcomes.len(),
            summary.join(", ")
        ));
    }

    if let Some(env) = &report.environment {
        ui.message(&format!(
            "Isolated environment at {}. Activate it with: {}",
            env.root.display(),
            env.activation_command()
        ));
    }
}

/// One line describing a lock file.
pub fn lock_line(info: &LockInfo) -> String {
    let holder = match &info.holder {
        Some(h) => format!(
            "pid {} since {} ({}s)",
            h.pid,
            h.acquired_at.format("%Y-%m-%d %H:%M:%S"),
            h.age_secs()
        ),
        None => "no holder record".to_string(),
    };
    let status = if info.held { "held" } else { "free" };
    let stale = match &info.holder {
        Some(h) if info.held && !process_alive(h.pid) => " [holder process gone]",
        _ => "",
    };
    format!("{} {}: last holder {}{}", info.package, status, holder, stale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;

    fn outcome(state: PackageState) -> EnsureOutcome {
        EnsureOutcome {
            package: PackageName::new("numpy").unwrap(),
            state,
            install: None,
        }
    }

    #[test]
    fn outcome_lines() {
        assert_eq!(
            outcome_line(&outcome(PackageState::Available {
                availability: Availability::StandardLibrary
            })),
            "✓ numpy (stdlib)"
        );
        assert!(outcome_line(&outcome(PackageState::Installed {
            attempts: 2,
            isolated: true
        }))
        .contains("after 2 attempt(s) in the isolated environment"));
        assert!(
            outcome_line(&outcome(PackageState::ManualInterventionRequired {
                attempts: 3,
                exit_code: None
            }))
            .contains("last exit code none")
        );
    }

    #[test]
    fn report_uses_matching_ui_methods() {
        let report = RemediationReport {
            outcomes: vec![
                outcome(PackageState::Installed {
                    attempts: 1,
                    isolated: false,
                }),
                EnsureOutcome {
                    package: PackageName::new("pkgA").unwrap(),
                    state: PackageState::Failed {
                        reason: "boom".into(),
                    },
                    install: None,
                },
            ],
            environment: None,
        };
        let mut ui = MockUI::new();

        show_report(&mut ui, &report);

        assert!(ui.has_success("numpy installed"));
        assert!(ui.has_error("pkgA: boom"));
        assert!(ui.has_message("2 package(s): 1 installed, 1 failed"));
    }

    #[test]
    fn availability_lines() {
        let mut ui = MockUI::new();
        let name = PackageName::new("json").unwrap();
        show_availability(&mut ui, &name, Availability::StandardLibrary);
        show_availability(&mut ui, &name, Availability::Missing);
        assert!(ui.has_success("json (stdlib)"));
        assert!(ui.has_error("json (missing)"));
    }
}
