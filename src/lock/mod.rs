//! Cross-process install locks.
//!
//! One advisory file lock per package name, in a directory every process on
//! the host agrees on. Holding a [`LockHandle`] grants the exclusive right to
//! run the package manager for that name; different names never contend.
//!
//! # Example
//!
//! ```
//! use autodep::lock::LockManager;
//! use autodep::package::PackageName;
//!
//! let dir = tempfile::TempDir::new().unwrap();
//! let locks = LockManager::new(dir.path());
//! let name = PackageName::new("numpy").unwrap();
//!
//! let installed = locks.with_lock(&name, || true).unwrap();
//! assert!(installed);
//! assert!(locks.lock_path(&name).ends_with("numpy.lock"));
//! ```

pub mod holder;
pub mod manager;

pub use holder::{decode_lock_name, encode_lock_name, LockHolder, LockInfo};
pub use manager::{LockHandle, LockManager};
