//! The set of names awaiting installation in one remediation session.

use std::collections::HashSet;

use super::PackageName;

/// Names discovered as needing installation, in discovery order.
///
/// Membership is idempotent: inserting a name twice keeps one entry at its
/// first position.
#[derive(Debug, Clone, Default)]
pub struct PendingSet {
    order: Vec<PackageName>,
    members: HashSet<PackageName>,
}

impl PendingSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name. Returns `true` if it was not already present.
    pub fn insert(&mut self, name: PackageName) -> bool {
        if self.members.contains(&name) {
            return false;
        }
        self.members.insert(name.clone());
        self.order.push(name);
        true
    }

    /// Check membership.
    pub fn contains(&self, name: &PackageName) -> bool {
        self.members.contains(name)
    }

    /// Number of pending names.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no names are pending.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &PackageName> {
        self.order.iter()
    }

    /// Take every pending name, leaving the set empty.
    pub fn drain(&mut self) -> Vec<PackageName> {
        self.members.clear();
        std::mem::take(&mut self.order)
    }
}
