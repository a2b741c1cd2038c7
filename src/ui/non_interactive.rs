//! Non-interactive UI for CI/headless environments.

use std::collections::HashMap;

use crate::error::{AutodepError, Result};

use super::notify::send_desktop_notification;
use super::theme::AutodepTheme;
use super::{parse_bool_answer, Notification, OutputMode, Prompt, SpinnerHandle, UserInterface};

/// Prefix of environment variables that answer prompts by key.
pub const PROMPT_ENV_PREFIX: &str = "AUTODEP_PROMPT_";

/// UI implementation for non-interactive mode.
///
/// Prompts are answered from `AUTODEP_PROMPT_<KEY>` environment variables,
/// then from the prompt default; a prompt with neither is an error.
pub struct NonInteractiveUI {
    mode: OutputMode,
    env_overrides: HashMap<String, String>,
    desktop: bool,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        let env_overrides: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with(PROMPT_ENV_PREFIX))
            .collect();

        Self {
            mode,
            env_overrides,
            desktop: !crate::shell::is_ci(),
        }
    }

    /// Create with explicit overrides and no desktop notifications (for testing).
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            env_overrides: overrides,
            desktop: false,
        }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn confirm(&mut self, prompt: &Prompt) -> Result<bool> {
        let env_key = format!("{}{}", PROMPT_ENV_PREFIX, prompt.key.to_uppercase());
        if let Some(value) = self.env_overrides.get(&env_key) {
            return parse_bool_answer(value).ok_or_else(|| AutodepError::ConfigValidationError {
                message: format!("{} must be yes or no, got '{}'", env_key, value),
            });
        }

        if let Some(default) = prompt.default {
            return Ok(default);
        }

        Err(AutodepError::ConfigValidationError {
            message: format!(
                "Cannot prompt for '{}' in non-interactive mode (set {} to answer)",
                prompt.key, env_key
            ),
        })
    }

    fn notify(&mut self, notification: &Notification) {
        if self.desktop && send_desktop_notification(notification) {
            return;
        }
        if self.mode.shows_status() {
            println!("{}: {}", notification.title, notification.message);
        }
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            println!("  {}", message);
        }
        Box::new(NoopSpinner {
            show: self.mode.shows_status(),
        })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("\n{}\n", title);
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner stand-in that prints only the final line, unless silent.
struct NoopSpinner {
    show: bool,
}

impl SpinnerHandle for NoopSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.show {
            println!("{}", AutodepTheme::plain().format_success(msg));
        }
    }

    fn finish_error(&mut self, msg: &str) {
        if self.show {
            println!("{}", AutodepTheme::plain().format_error(msg));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui_with(overrides: &[(&str, &str)]) -> NonInteractiveUI {
        let map = overrides
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NonInteractiveUI::with_overrides(OutputMode::Normal, map)
    }

    #[test]
    fn non_interactive_is_not_interactive() {
        let ui = NonInteractiveUI::new(OutputMode::Normal);
        assert!(!ui.is_interactive());
    }

    #[test]
    fn confirm_uses_default() {
        let mut ui = ui_with(&[]);
        let prompt = Prompt::new("create_venv", "Create?").with_default(true);
        assert!(ui.confirm(&prompt).unwrap());
    }

    #[test]
    fn confirm_fails_without_default() {
        let mut ui = ui_with(&[]);
        let prompt = Prompt::new("create_venv", "Create?");
        let err = ui.confirm(&prompt).unwrap_err();
        assert!(err.to_string().contains("AUTODEP_PROMPT_CREATE_VENV"));
    }

    #[test]
    fn confirm_uses_env_override() {
        let mut ui = ui_with(&[("AUTODEP_PROMPT_CREATE_VENV", "yes")]);
        let prompt = Prompt::new("create_venv", "Create?").with_default(false);
        assert!(ui.confirm(&prompt).unwrap());
    }

    #[test]
    fn confirm_rejects_garbage_override() {
        let mut ui = ui_with(&[("AUTODEP_PROMPT_CREATE_VENV", "perhaps")]);
        let prompt = Prompt::new("create_venv", "Create?");
        assert!(ui.confirm(&prompt).is_err());
    }

    #[test]
    fn output_mode_preserved() {
        let ui = NonInteractiveUI::new(OutputMode::Quiet);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }

    #[test]
    fn notify_without_desktop_prints() {
        let mut ui = ui_with(&[]);
        ui.notify(&Notification::new("Title", "Body"));
    }
}
