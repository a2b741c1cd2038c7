//! Interactive terminal UI.

use console::Term;
use std::io::Write;

use crate::error::Result;

use super::notify::send_desktop_notification;
use super::{
    prompt_confirm, should_use_colors, AutodepTheme, NonInteractiveUI, Notification, OutputMode,
    ProgressSpinner, Prompt, SpinnerHandle, UserInterface,
};

/// Interactive terminal UI implementation.
pub struct TerminalUI {
    term: Term,
    prompt_term: Term,
    theme: AutodepTheme,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode) -> Self {
        let theme = if should_use_colors() {
            AutodepTheme::new()
        } else {
            AutodepTheme::plain()
        };

        Self {
            term: Term::stdout(),
            prompt_term: Term::stderr(),
            theme,
            mode,
        }
    }

    /// Text printed when no desktop notifier is available. Nothing is
    /// printed in silent mode.
    fn notification_fallback(&self, notification: &Notification) -> Option<String> {
        self.mode.shows_status().then(|| {
            format!(
                "\n{}\n{}\n",
                self.theme.highlight.apply_to(&notification.title),
                notification.message
            )
        })
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        // Errors print in every mode, so keep them off stdout for --json.
        writeln!(Term::stderr(), "{}", self.theme.format_error(msg)).ok();
    }

    fn confirm(&mut self, prompt: &Prompt) -> Result<bool> {
        // Prompts go to stderr so stdout stays machine-readable.
        prompt_confirm(prompt, &self.prompt_term)
    }

    fn notify(&mut self, notification: &Notification) {
        if send_desktop_notification(notification) {
            return;
        }
        if let Some(text) = self.notification_fallback(notification) {
            writeln!(self.term, "{}", text).ok();
        }
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            Box::new(ProgressSpinner::new(message, self.theme.clone()))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Create the appropriate UI based on interactivity.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    if interactive && Term::stdout().is_term() {
        Box::new(TerminalUI::new(mode))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}
