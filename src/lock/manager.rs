//! Lock acquisition and release.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{AutodepError, Result};
use crate::package::PackageName;

use super::holder::{decode_lock_name, encode_lock_name, LockHolder, LockInfo, LOCK_EXTENSION};

/// Interval between non-blocking attempts when a timeout is set.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Hands out per-name exclusive locks backed by files in a shared directory.
#[derive(Debug, Clone)]
pub struct LockManager {
    dir: PathBuf,
    timeout: Option<Duration>,
}

impl LockManager {
    /// Create a manager that waits indefinitely for contended locks.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            timeout: None,
        }
    }

    /// Create a manager that gives up after `timeout` with
    /// [`AutodepError::LockAcquisitionStalled`].
    pub fn with_timeout(dir: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            dir: dir.into(),
            timeout,
        }
    }

    /// Manager rooted at the OS temporary directory, shared by every process
    /// on the host.
    pub fn in_temp_dir(timeout: Option<Duration>) -> Self {
        Self::with_timeout(std::env::temp_dir(), timeout)
    }

    /// The lock directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The staleness ceiling, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Lock file for a package name: `<dir>/<name>.lock`.
    pub fn lock_path(&self, name: &PackageName) -> PathBuf {
        self.dir
            .join(format!("{}.{}", encode_lock_name(name.as_str()), LOCK_EXTENSION))
    }

    /// Acquire the exclusive lock for a name.
    ///
    /// Blocks while another process holds it. With a timeout configured,
    /// returns `LockAcquisitionStalled` once the ceiling passes.
    pub fn acquire(&self, name: &PackageName) -> Result<LockHandle> {
        fs::create_dir_all(&self.dir)?;
        let path = self.lock_path(name);

        tracing::debug!(package = %name, "Waiting for install lock {}", path.display());
        let start = Instant::now();

        loop {
            let lock_file = open_lock_file(&path)?;
            if let Some(handle) = self.lock_opened(name, &path, lock_file, start)? {
                tracing::debug!(
                    package = %name,
                    "Acquired install lock after {}ms",
                    start.elapsed().as_millis()
                );
                return Ok(handle);
            }
            tracing::debug!(
                package = %name,
                "Lock file {} was removed while waiting, reopening",
                path.display()
            );
        }
    }

    /// Lock an already opened lock file.
    ///
    /// Returns `None` when the file was unlinked or replaced before the lock
    /// was granted; the lock taken on the stale inode is dropped.
    fn lock_opened(
        &self,
        name: &PackageName,
        path: &Path,
        lock_file: LockFile,
        start: Instant,
    ) -> Result<Option<LockHandle>> {
        let LockFile { file, writable } = lock_file;

        match self.timeout {
            None => file.lock_exclusive()?,
            Some(timeout) => loop {
                match file.try_lock_exclusive() {
                    Ok(()) => break,
                    Err(e) if is_contended(&e) => {
                        if start.elapsed() >= timeout {
                            let holder = read_holder(path);
                            tracing::warn!(
                                package = %name,
                                holder_pid = holder.as_ref().map(|h| h.pid),
                                "Install lock still held after {}s",
                                timeout.as_secs()
                            );
                            return Err(AutodepError::LockAcquisitionStalled {
                                package: name.to_string(),
                                lock_path: path.to_path_buf(),
                                waited_secs: start.elapsed().as_secs(),
                            });
                        }
                        std::thread::sleep(POLL_INTERVAL);
                    }
                    Err(e) => return Err(e.into()),
                }
            },
        }

        if !is_current_file(&file, path)? {
            return Ok(None);
        }

        let mut handle = LockHandle {
            file,
            path: path.to_path_buf(),
            package: name.clone(),
        };
        if writable {
            handle.record_holder()?;
        } else {
            tracing::debug!(package = %name, "Lock file is read-only; holder not recorded");
        }
        Ok(Some(handle))
    }

    /// Run `body` while holding the lock for `name`.
    ///
    /// The lock is released on every exit path of `body`, including unwinding.
    pub fn with_lock<T, F>(&self, name: &PackageName, body: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        let _handle = self.acquire(name)?;
        Ok(body())
    }

    /// Describe every lock file in the directory that carries a holder record.
    ///
    /// Files without a readable record belong to other tools sharing the
    /// directory and are skipped.
    pub fn list(&self) -> Result<Vec<LockInfo>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut infos = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LOCK_EXTENSION) {
                continue;
            }
            let Some(holder) = read_holder(&path) else {
                continue;
            };
            let Some(package) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(decode_lock_name)
            else {
                continue;
            };
            let held = is_held(&path);
            infos.push(LockInfo {
                package,
                path,
                held,
                holder: Some(holder),
            });
        }
        infos.sort_by(|a, b| a.package.cmp(&b.package));
        Ok(infos)
    }

    /// Remove the lock file for a name if no process holds it.
    ///
    /// Returns `Ok(false)` when the lock is held or the file does not exist.
    pub fn clear(&self, name: &PackageName) -> Result<bool> {
        let path = self.lock_path(name);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        match file.try_lock_exclusive() {
            Ok(()) => {
                fs::remove_file(&path)?;
                FileExt::unlock(&file)?;
                tracing::info!(package = %name, "Cleared lock file {}", path.display());
                Ok(true)
            }
            Err(e) if is_contended(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Exclusive ownership of the install right for one package name.
///
/// Released when dropped.
#[derive(Debug)]
pub struct LockHandle {
    file: File,
    path: PathBuf,
    package: PackageName,
}

impl LockHandle {
    /// Path of the held lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Package this handle protects.
    pub fn package(&self) -> &PackageName {
        &self.package
    }

    fn record_holder(&mut self) -> Result<()> {
        let holder = LockHolder::current(self.package.as_str());
        let bytes = serde_json::to_vec(&holder).map_err(anyhow::Error::from)?;
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&bytes)?;
        self.file.flush()?;
        Ok(())
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            // Closing the descriptor releases the lock regardless.
            tracing::debug!("Explicit unlock of {} failed: {}", self.path.display(), e);
        }
        tracing::debug!(package = %self.package, "Released install lock");
    }
}

/// An open lock file and whether the holder record can be written to it.
struct LockFile {
    file: File,
    writable: bool,
}

/// Open or create a lock file that every user on the host can lock.
///
/// A file created by another user may be read-only for us; advisory locks
/// work on a read-only descriptor, so that is used instead.
fn open_lock_file(path: &Path) -> Result<LockFile> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o666);
    }
    match options.open(path) {
        Ok(file) => {
            share_with_all_users(&file);
            Ok(LockFile {
                file,
                writable: true,
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            tracing::debug!("No write access to {}, locking read-only", path.display());
            Ok(LockFile {
                file: File::open(path)?,
                writable: false,
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Undo the umask so other users can open the file for writing.
#[cfg(unix)]
fn share_with_all_users(file: &File) {
    use std::os::unix::fs::PermissionsExt;

    let Ok(meta) = file.metadata() else {
        return;
    };
    if meta.permissions().mode() & 0o777 == 0o666 {
        return;
    }
    if let Err(e) = file.set_permissions(fs::Permissions::from_mode(0o666)) {
        tracing::debug!("Could not widen lock file permissions: {}", e);
    }
}

#[cfg(not(unix))]
fn share_with_all_users(_file: &File) {}

/// Whether `file` is still the file at `path`.
#[cfg(unix)]
fn is_current_file(file: &File, path: &Path) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let held = file.metadata()?;
    match fs::metadata(path) {
        Ok(on_disk) => Ok(held.dev() == on_disk.dev() && held.ino() == on_disk.ino()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Whether `file` is still the file at `path`.
///
/// Windows cannot delete a file another handle has open, so the path
/// existing is enough.
#[cfg(not(unix))]
fn is_current_file(_file: &File, path: &Path) -> Result<bool> {
    Ok(path.exists())
}

fn read_holder(path: &Path) -> Option<LockHolder> {
    let mut contents = String::new();
    File::open(path).ok()?.read_to_string(&mut contents).ok()?;
    serde_json::from_str(&contents).ok()
}

fn is_held(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    match file.try_lock_exclusive() {
        Ok(()) => {
            let _ = FileExt::unlock(&file);
            false
        }
        Err(_) => true,
    }
}

fn is_contended(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use tempfile::TempDir;

    fn name(s: &str) -> PackageName {
        PackageName::new(s).unwrap()
    }

    #[test]
    fn lock_path_is_deterministic() {
        let locks = LockManager::new("/tmp/shared");
        assert_eq!(
            locks.lock_path(&name("numpy")),
            PathBuf::from("/tmp/shared/numpy.lock")
        );
        assert_eq!(locks.lock_path(&name("numpy")), locks.lock_path(&name("numpy")));
        assert_ne!(locks.lock_path(&name("numpy")), locks.lock_path(&name("NumPy")));
    }

    #[test]
    fn acquire_records_holder() {
        let temp = TempDir::new().unwrap();
        let locks = LockManager::new(temp.path());
        let handle = locks.acquire(&name("numpy")).unwrap();

        let holder = read_holder(handle.path()).unwrap();
        assert_eq!(holder.pid, std::process::id());
        assert_eq!(holder.package, "numpy");
    }

    #[test]
    fn lock_is_released_on_drop() {
        let temp = TempDir::new().unwrap();
        let locks = LockManager::with_timeout(temp.path(), Some(Duration::from_millis(200)));
        let first = locks.acquire(&name("numpy")).unwrap();
        assert!(is_held(first.path()));
        drop(first);
        assert!(locks.acquire(&name("numpy")).is_ok());
    }

    #[test]
    fn contended_lock_times_out_as_stalled() {
        let temp = TempDir::new().unwrap();
        let locks = LockManager::with_timeout(temp.path(), Some(Duration::from_millis(250)));
        let _held = locks.acquire(&name("numpy")).unwrap();

        let err = locks.acquire(&name("numpy")).unwrap_err();
        match err {
            AutodepError::LockAcquisitionStalled {
                package, lock_path, ..
            } => {
                assert_eq!(package, "numpy");
                assert!(lock_path.ends_with("numpy.lock"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn different_names_do_not_block() {
        let temp = TempDir::new().unwrap();
        let locks = LockManager::with_timeout(temp.path(), Some(Duration::from_millis(100)));
        let _a = locks.acquire(&name("numpy")).unwrap();
        assert!(locks.acquire(&name("flask")).is_ok());
    }

    #[test]
    fn with_lock_releases_after_panic() {
        let temp = TempDir::new().unwrap();
        let locks = LockManager::with_timeout(temp.path(), Some(Duration::from_millis(200)));
        let pkg = name("numpy");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            locks.with_lock(&pkg, || panic!("install blew up")).ok();
        }));
        assert!(result.is_err());
        assert!(locks.acquire(&pkg).is_ok());
    }

    #[test]
    fn blocking_acquire_serializes_holders() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_path_buf();
        let active = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let dir = dir.clone();
                let active = Arc::clone(&active);
                let overlaps = Arc::clone(&overlaps);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    let locks = LockManager::new(dir);
                    barrier.wait();
                    locks
                        .with_lock(&name("numpy"), || {
                            if active.fetch_add(1, Ordering::SeqCst) > 0 {
                                overlaps.fetch_add(1, Ordering::SeqCst);
                            }
                            std::thread::sleep(Duration::from_millis(30));
                            active.fetch_sub(1, Ordering::SeqCst);
                        })
                        .unwrap();
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn list_reports_held_and_free_locks() {
        let temp = TempDir::new().unwrap();
        let locks = LockManager::new(temp.path());
        drop(locks.acquire(&name("flask")).unwrap());
        let _held = locks.acquire(&name("a/b")).unwrap();
        fs::write(temp.path().join("unrelated.lock"), "not ours").unwrap();

        let infos = locks.list().unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].package, "a/b");
        assert!(infos[0].held);
        assert_eq!(infos[1].package, "flask");
        assert!(!infos[1].held);
    }

    #[test]
    fn clear_while_waiting_does_not_split_the_lock() {
        let temp = TempDir::new().unwrap();
        let locks = LockManager::with_timeout(temp.path(), Some(Duration::from_millis(200)));
        let pkg = name("numpy");
        drop(locks.acquire(&pkg).unwrap());
        let path = locks.lock_path(&pkg);

        // A waiter opened the file but has not locked it yet.
        let waiter = open_lock_file(&path).unwrap();
        assert!(locks.clear(&pkg).unwrap());

        let stale = locks
            .lock_opened(&pkg, &path, waiter, Instant::now())
            .unwrap();
        assert!(stale.is_none());

        let holder = locks.acquire(&pkg).unwrap();
        assert!(is_held(&path));

        // A waiter that opened the replaced file before the new one existed
        // must not end up holding a second lock.
        let late = open_lock_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        drop(holder);
        let fresh = locks.acquire(&pkg).unwrap();
        assert!(locks
            .lock_opened(&pkg, &path, late, Instant::now())
            .unwrap()
            .is_none());
        assert!(matches!(
            locks.acquire(&pkg),
            Err(AutodepError::LockAcquisitionStalled { .. })
        ));
        drop(fresh);
    }

    #[cfg(unix)]
    #[test]
    fn lock_files_are_shared_with_all_users() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let locks = LockManager::new(temp.path());
        let created = locks.acquire(&name("numpy")).unwrap();
        let mode = fs::metadata(created.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o666);

        let path = locks.lock_path(&name("flask"));
        fs::write(&path, "").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
        drop(locks.acquire(&name("flask")).unwrap());
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o666);
    }

    #[test]
    fn read_only_lock_file_still_excludes() {
        let temp = TempDir::new().unwrap();
        let locks = LockManager::new(temp.path());
        let pkg = name("numpy");
        let path = locks.lock_path(&pkg);
        fs::write(&path, "").unwrap();

        let read_only = LockFile {
            file: File::open(&path).unwrap(),
            writable: false,
        };
        let handle = locks
            .lock_opened(&pkg, &path, read_only, Instant::now())
            .unwrap()
            .unwrap();

        assert!(is_held(&path));
        assert!(read_holder(&path).is_none());
        drop(handle);
        assert!(!is_held(&path));
    }

    #[test]
    fn list_of_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let locks = LockManager::new(temp.path().join("nope"));
        assert!(locks.list().unwrap().is_empty());
    }

    #[test]
    fn clear_removes_only_free_locks() {
        let temp = TempDir::new().unwrap();
        let locks = LockManager::new(temp.path());
        drop(locks.acquire(&name("flask")).unwrap());
        let held = locks.acquire(&name("numpy")).unwrap();

        assert!(locks.clear(&name("flask")).unwrap());
        assert!(!locks.lock_path(&name("flask")).exists());
        assert!(!locks.clear(&name("numpy")).unwrap());
        assert!(held.path().exists());
        assert!(!locks.clear(&name("never-locked")).unwrap());
    }
}
