//! Lock file naming and holder records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Extension of every lock file.
pub const LOCK_EXTENSION: &str = "lock";

/// Diagnostic record written into a lock file by its current holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
    /// Process id of the holder.
    pub pid: u32,
    /// Package the lock protects.
    pub package: String,
    /// When the lock was acquired.
    pub acquired_at: DateTime<Utc>,
}

impl LockHolder {
    /// A record for the current process.
    pub fn current(package: &str) -> Self {
        Self {
            pid: std::process::id(),
            package: package.to_string(),
            acquired_at: Utc::now(),
        }
    }

    /// Seconds since the lock was acquired.
    pub fn age_secs(&self) -> i64 {
        (Utc::now() - self.acquired_at).num_seconds().max(0)
    }
}

/// State of one lock file, as reported by `autodep locks list`.
#[derive(Debug, Clone, Serialize)]
pub struct LockInfo {
    /// Package name decoded from the file name.
    pub package: String,
    /// Path of the lock file.
    pub path: PathBuf,
    /// Whether some process currently holds the lock.
    pub held: bool,
    /// Last recorded holder, if the file carries one.
    pub holder: Option<LockHolder>,
}

fn is_plain(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '.' | '_' | '-' | '[' | ']' | '+' | ',' | '=' | '~' | '!'
        )
}

/// Map a package name to a lock file stem.
///
/// Characters that are unsafe in file names (path separators, `<`, `>`,
/// `%` and anything non-ASCII) are percent-encoded byte by byte, so the
/// mapping is injective and never leaves the lock directory.
pub fn encode_lock_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if is_plain(c) {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    out
}

/// Inverse of [`encode_lock_name`]. Returns `None` for malformed input.
pub fn decode_lock_name(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = stem.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
