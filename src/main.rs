//! autodep CLI entry point.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use autodep::cli::{Cli, CommandDispatcher, Commands, ProjectContext};
use autodep::config::{find_project_root, load_config, Settings};
use autodep::shell::is_ci;
use autodep::ui::{create_ui, OutputMode};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber.
///
/// The console layer writes to stderr. Its level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is WARN
///
/// When a log file is given, every attempt and outcome is also appended to
/// it at INFO (DEBUG with `--debug`), without colors.
fn init_tracing(debug: bool, log_file: Option<File>) {
    let console_filter = if debug {
        EnvFilter::new("autodep=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("autodep=warn"))
    };

    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .with_filter(EnvFilter::new(if debug {
                "autodep=debug"
            } else {
                "autodep=info"
            }))
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();
}

/// Pick the log file: `--no-log-file` wins, then `--log-file`, then config.
fn log_file_path(cli: &Cli, project_root: &Path, settings: &Settings) -> Option<PathBuf> {
    if cli.no_log_file || matches!(cli.command, Commands::Completions(_)) {
        return None;
    }
    match &cli.log_file {
        Some(path) => Some(path.clone()),
        None if settings.logging => Some(settings.log_path_in(project_root)),
        None => None,
    }
}

fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).ok()?;
    }
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", path.display(), e);
            None
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Handle --no-color
    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    let cwd = std::env::current_dir().unwrap_or_default();
    let project_root = cli
        .project
        .clone()
        .or_else(|| find_project_root(&cwd))
        .unwrap_or(cwd);

    // Config errors are reported by the command itself; here we only need
    // the log settings.
    let settings = load_config(&project_root, cli.config.as_deref(), false)
        .map(|c| c.settings)
        .unwrap_or_default();
    let log_file = log_file_path(&cli, &project_root, &settings).and_then(|p| open_log_file(&p));
    init_tracing(cli.debug, log_file);

    tracing::debug!("autodep starting with args: {:?}", cli);

    let output_mode = if cli.command.json_output() {
        OutputMode::Silent
    } else if cli.quiet {
        OutputMode::Quiet
    } else if cli.verbose {
        OutputMode::Verbose
    } else {
        OutputMode::Normal
    };

    let is_interactive = !cli.non_interactive && !is_ci();
    let mut ui = create_ui(is_interactive, output_mode);

    let context = ProjectContext::new(project_root).with_config_path(cli.config.clone());
    let dispatcher = CommandDispatcher::new(context);

    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            tracing::error!("{}", e);
            ui.error(&format!("Error: {}", e));
            ExitCode::from(1)
        }
    }
}
