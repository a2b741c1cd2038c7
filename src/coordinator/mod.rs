//! Dependency-acquisition coordination.
//!
//! The [`Coordinator`] probes each name, installs missing ones under the
//! cross-process lock and, once retries are exhausted, offers an isolated
//! environment as a fallback. Per-run state lives in an explicit
//! [`RemediationSession`] rather than in the coordinator itself.
//!
//! ```text
//! Unchecked -> Available
//! Unchecked -> Installing -> Installed
//!                         -> (declined)  ManualInterventionRequired
//!                         -> (accepted)  isolated reinstall -> Installed | Failed
//! ```

pub mod coordinator;
pub mod report;
pub mod session;

pub use coordinator::{Coordinator, CoordinatorSettings, ISOLATION_PROMPT_KEY};
pub use report::{EnsureOutcome, PackageState, RemediationReport};
pub use session::RemediationSession;
