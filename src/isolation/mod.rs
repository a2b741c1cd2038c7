//! Isolated installation environments.
//!
//! - [`VirtualEnvironment`] - an environment root and its platform paths
//! - [`EnvironmentIsolator`] - idempotent creation, activation check and
//!   dependency installation

pub mod environment;
pub mod isolator;

pub use environment::VirtualEnvironment;
pub use isolator::EnvironmentIsolator;
