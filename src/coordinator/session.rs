//! Per-run remediation context.

use std::collections::HashMap;

use crate::installer::InstallAttemptResult;
use crate::package::{PackageName, PendingSet};

use super::report::{EnsureOutcome, PackageState};

/// State for one remediation run.
///
/// Holds the names discovered as needing installation, whether installs
/// target an isolated environment, and the terminal state reached by each
/// name so far.
#[derive(Debug, Clone, Default)]
pub struct RemediationSession {
    pending: PendingSet,
    isolated: bool,
    states: HashMap<PackageName, PackageState>,
    installs: HashMap<PackageName, InstallAttemptResult>,
}

impl RemediationSession {
    /// A fresh session outside any isolated environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session already inside an isolated environment. It never prompts for
    /// isolation.
    pub fn isolated() -> Self {
        Self {
            isolated: true,
            ..Self::default()
        }
    }

    /// Whether installs target an isolated environment.
    pub fn is_isolated(&self) -> bool {
        self.isolated
    }

    /// Names that needed installation, in discovery order.
    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    /// Terminal state reached by a name, if it has been ensured.
    pub fn state(&self, name: &PackageName) -> Option<&PackageState> {
        self.states.get(name)
    }

    /// Latest install result for a name, if an install ran.
    pub fn install_result(&self, name: &PackageName) -> Option<&InstallAttemptResult> {
        self.installs.get(name)
    }

    /// The recorded outcome for a name.
    pub fn outcome(&self, name: &PackageName) -> Option<EnsureOutcome> {
        self.states.get(name).map(|state| EnsureOutcome {
            package: name.clone(),
            state: state.clone(),
            install: self.installs.get(name).cloned(),
        })
    }

    pub(crate) fn mark_pending(&mut self, name: &PackageName) {
        if self.pending.insert(name.clone()) {
            tracing::debug!(
                package = %name,
                "Added to pending set ({} pending)",
                self.pending.len()
            );
        }
    }

    pub(crate) fn record(&mut self, name: &PackageName, state: PackageState) {
        self.states.insert(name.clone(), state);
    }

    pub(crate) fn record_install(&mut self, result: InstallAttemptResult) {
        self.installs.insert(result.package.clone(), result);
    }

    /// Switch to isolation mode and hand back every pending name, forgetting
    /// their recorded states so they are ensured again.
    pub(crate) fn enter_isolation(&mut self) -> Vec<PackageName> {
        self.isolated = true;
        let names = self.pending.drain();
        for name in &names {
            self.states.remove(name);
        }
        names
    }
}
