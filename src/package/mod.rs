//! Package identity and per-session bookkeeping.
//!
//! - [`PackageName`] - the unit of installation and locking
//! - [`PendingSet`] - names discovered as needing installation in one run

pub mod name;
pub mod pending;

pub use name::PackageName;
pub use pending::PendingSet;
