//! Package installation with bounded retries.
//!
//! The [`Installer`] runs one package-manager subprocess per attempt,
//! classifies each failure by exit status, and backs off exponentially
//! between attempts. It is not lock-aware: callers hold the
//! [`LockManager`](crate::lock::LockManager) handle for the name while it runs.
//!
//! # Modules
//!
//! - [`backend`] - the package-manager invocation (`pip install <name>`)
//! - [`backoff`] - delay schedule and the sleeping seam
//! - [`classify`] - exit status classification
//! - [`retry`] - the retry loop and its result type

pub mod backend;
pub mod backoff;
pub mod classify;
pub mod retry;

pub use backend::{InstallBackend, PipBackend};
pub use backoff::{Backoff, Sleeper, ThreadSleeper};
pub use classify::FailureClass;
pub use retry::{InstallAttemptResult, Installer, DEFAULT_MAX_ATTEMPTS};
