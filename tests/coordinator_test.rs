//! Integration tests for the remediation coordinator, driven through the
//! public collaborator traits.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use autodep::coordinator::{
    Coordinator, CoordinatorSettings, PackageState, RemediationSession, ISOLATION_PROMPT_KEY,
};
use autodep::installer::{Backoff, InstallBackend, Sleeper};
use autodep::lock::LockManager;
use autodep::package::PackageName;
use autodep::probe::{Availability, AvailabilityProbe};
use autodep::shell::{CommandResult, OsFamily};
use autodep::toolchain::Toolchain;
use autodep::ui::MockUI;
use autodep::AutodepError;
use tempfile::TempDir;

fn pkg(s: &str) -> PackageName {
    PackageName::new(s).unwrap()
}

/// What one interpreter's environment has installed.
#[derive(Default)]
struct Site {
    installed: Mutex<HashSet<String>>,
    stdlib: HashSet<String>,
}

impl Site {
    fn with_stdlib(names: &[&str]) -> Self {
        Self {
            installed: Mutex::default(),
            stdlib: names.iter().map(|s| s.to_string()).collect(),
        }
    }
}

struct SiteProbe(Arc<Site>);

impl AvailabilityProbe for SiteProbe {
    fn probe(&self, name: &PackageName) -> Availability {
        if self.0.stdlib.contains(name.as_str()) {
            Availability::StandardLibrary
        } else if self.0.installed.lock().unwrap().contains(name.as_str()) {
            Availability::Installed
        } else {
            Availability::Missing
        }
    }
}

/// Installs into a [`Site`], tracking how many installs overlap.
struct SiteBackend {
    site: Arc<Site>,
    exit_code: i32,
    hold: Duration,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl SiteBackend {
    fn new(site: Arc<Site>, exit_code: i32, hold: Duration) -> Self {
        Self {
            site,
            exit_code,
            hold,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }
}

impl InstallBackend for SiteBackend {
    fn describe(&self, name: &PackageName) -> String {
        format!("fake install {}", name)
    }

    fn run_install(&self, name: &PackageName) -> autodep::Result<CommandResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        thread::sleep(self.hold);
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.exit_code == 0 {
            self.site
                .installed
                .lock()
                .unwrap()
                .insert(name.as_str().to_string());
            Ok(CommandResult::success(String::new(), String::new(), self.hold))
        } else {
            Ok(CommandResult::failure(
                Some(self.exit_code),
                String::new(),
                "conflict".into(),
                self.hold,
            ))
        }
    }
}

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

/// Base interpreter plus an optional isolated one.
struct TestToolchain {
    base: Arc<Site>,
    base_backend: Arc<SiteBackend>,
    env_site: Arc<Site>,
    env_backend: Arc<SiteBackend>,
    base_python: PathBuf,
    environments: AtomicUsize,
}

impl TestToolchain {
    fn new(base_exit: i32, hold: Duration) -> Self {
        let base = Arc::new(Site::with_stdlib(&["json", "os"]));
        let env_site = Arc::new(Site::with_stdlib(&["json", "os"]));
        Self {
            base_backend: Arc::new(SiteBackend::new(base.clone(), base_exit, hold)),
            env_backend: Arc::new(SiteBackend::new(env_site.clone(), 0, Duration::ZERO)),
            base,
            env_site,
            base_python: PathBuf::from("python3"),
            environments: AtomicUsize::new(0),
        }
    }
}

impl Toolchain for TestToolchain {
    fn probe(&self, python: &Path) -> Arc<dyn AvailabilityProbe> {
        if python == self.base_python {
            Arc::new(SiteProbe(self.base.clone()))
        } else {
            Arc::new(SiteProbe(self.env_site.clone()))
        }
    }

    fn backend(&self, python: &Path) -> Arc<dyn InstallBackend> {
        if python == self.base_python {
            self.base_backend.clone()
        } else {
            self.env_backend.clone()
        }
    }

    fn create_environment(&self, _python: &Path, root: &Path) -> autodep::Result<()> {
        self.environments.fetch_add(1, Ordering::SeqCst);
        let bin = root.join("bin");
        std::fs::create_dir_all(&bin)?;
        std::fs::write(bin.join("activate"), "# activate\n")?;
        Ok(())
    }
}

fn settings(root: &Path, prompt_isolation: bool) -> CoordinatorSettings {
    CoordinatorSettings {
        backoff: Backoff::new(Duration::from_millis(1)),
        venv_dir: root.join("venv"),
        prompt_isolation,
        ..CoordinatorSettings::default()
    }
}

fn coordinator(
    toolchain: &Arc<TestToolchain>,
    root: &Path,
    locks: &LockManager,
    prompt_isolation: bool,
) -> Coordinator {
    Coordinator::new(toolchain.clone(), settings(root, prompt_isolation), locks.clone())
        .with_sleeper(Arc::new(NoSleep))
        .with_os_family(OsFamily::Posix)
}

#[test]
fn stdlib_and_installed_names_need_no_install() {
    let temp = TempDir::new().unwrap();
    let toolchain = Arc::new(TestToolchain::new(0, Duration::ZERO));
    toolchain
        .base
        .installed
        .lock()
        .unwrap()
        .insert("requests".into());
    let locks = LockManager::new(temp.path().join("locks"));
    let mut coord = coordinator(&toolchain, temp.path(), &locks, true);

    let mut session = RemediationSession::new();
    let mut ui = MockUI::new();
    let report = coord.ensure_all(&[pkg("json"), pkg("requests")], &mut session, &mut ui);

    assert!(report.all_resolved());
    assert_eq!(
        report.get(&pkg("json")).unwrap().state,
        PackageState::Available {
            availability: Availability::StandardLibrary
        }
    );
    assert_eq!(toolchain.base_backend.calls.load(Ordering::SeqCst), 0);
    assert!(locks.list().unwrap().is_empty());
}

#[test]
fn concurrent_ensures_of_one_name_install_once() {
    let temp = TempDir::new().unwrap();
    let toolchain = Arc::new(TestToolchain::new(0, Duration::from_millis(100)));
    let locks = LockManager::new(temp.path().join("locks"));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let toolchain = toolchain.clone();
            let locks = locks.clone();
            let root = temp.path().to_path_buf();
            thread::spawn(move || {
                let mut coord = coordinator(&toolchain, &root, &locks, false);
                let mut session = RemediationSession::new();
                let mut ui = MockUI::new();
                coord.ensure(&pkg("numpy"), &mut session, &mut ui).state
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_resolved());
    }
    assert_eq!(toolchain.base_backend.max_active.load(Ordering::SeqCst), 1);
    // The waiter sees the first install once it holds the lock.
    assert_eq!(toolchain.base_backend.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn exhausted_retries_with_declined_isolation_need_manual_install() {
    let temp = TempDir::new().unwrap();
    let toolchain = Arc::new(TestToolchain::new(3, Duration::ZERO));
    let locks = LockManager::new(temp.path().join("locks"));
    let mut coord = coordinator(&toolchain, temp.path(), &locks, true);

    let mut session = RemediationSession::new();
    let mut ui = MockUI::new();
    ui.set_prompt_response(ISOLATION_PROMPT_KEY, false);
    let report = coord.ensure_all(&[pkg("pkgA")], &mut session, &mut ui);

    assert_eq!(
        report.get(&pkg("pkgA")).unwrap().state,
        PackageState::ManualInterventionRequired {
            attempts: 3,
            exit_code: Some(3)
        }
    );
    assert_eq!(toolchain.base_backend.calls.load(Ordering::SeqCst), 3);
    assert_eq!(toolchain.environments.load(Ordering::SeqCst), 0);
    assert_eq!(ui.prompts_shown(), [ISOLATION_PROMPT_KEY.to_string()]);

    let unresolved = report.unresolved();
    assert_eq!(unresolved.len(), 1);
    assert!(matches!(
        &unresolved[0],
        AutodepError::Unresolvable { package } if package == "pkgA"
    ));
}

#[test]
fn accepted_isolation_installs_into_new_environment() {
    let temp = TempDir::new().unwrap();
    let toolchain = Arc::new(TestToolchain::new(1, Duration::ZERO));
    let locks = LockManager::new(temp.path().join("locks"));
    let mut coord = coordinator(&toolchain, temp.path(), &locks, true);

    let mut session = RemediationSession::new();
    let mut ui = MockUI::new();
    ui.set_prompt_response(ISOLATION_PROMPT_KEY, true);
    let report = coord.ensure_all(&[pkg("flask")], &mut session, &mut ui);

    assert!(report.all_resolved());
    assert!(matches!(
        report.get(&pkg("flask")).unwrap().state,
        PackageState::Installed { isolated: true, .. }
    ));
    assert!(session.is_isolated());
    assert_eq!(toolchain.environments.load(Ordering::SeqCst), 1);

    let env = report.environment.as_ref().unwrap();
    assert_eq!(env.root, temp.path().join("venv"));
    assert!(env.activation_command().starts_with("source "));
    assert!(toolchain
        .env_site
        .installed
        .lock()
        .unwrap()
        .contains("flask"));
}

#[test]
fn held_lock_past_timeout_fails_the_name() {
    let temp = TempDir::new().unwrap();
    let toolchain = Arc::new(TestToolchain::new(0, Duration::ZERO));
    let locks = LockManager::with_timeout(
        temp.path().join("locks"),
        Some(Duration::from_millis(200)),
    );
    let _held = locks.acquire(&pkg("numpy")).unwrap();
    let mut coord = coordinator(&toolchain, temp.path(), &locks, true);

    let mut session = RemediationSession::new();
    let mut ui = MockUI::new();
    let outcome = coord.ensure(&pkg("numpy"), &mut session, &mut ui);

    match outcome.state {
        PackageState::Failed { reason } => assert!(reason.contains("numpy")),
        other => panic!("unexpected state: {other:?}"),
    }
    assert_eq!(toolchain.base_backend.calls.load(Ordering::SeqCst), 0);
    assert!(!ui.errors().is_empty());
}
