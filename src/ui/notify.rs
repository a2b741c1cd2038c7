//! Desktop notifications.
//!
//! Notifications are best effort: the platform notifier is invoked when it
//! exists, and callers fall back to printing when it does not.

use std::path::Path;
use std::time::Duration;

use crate::shell::{execute, CommandOptions};

/// How long a notification stays on screen.
pub const DEFAULT_NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

/// A titled desktop notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Notification title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Display duration.
    pub timeout: Duration,
}

impl Notification {
    /// Create a notification with the default display duration.
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            timeout: DEFAULT_NOTIFICATION_TIMEOUT,
        }
    }
}

/// Show a notification through the platform notifier.
///
/// Returns `false` when no notifier is available or it failed.
pub fn send_desktop_notification(notification: &Notification) -> bool {
    let Some((program, args)) = notifier_command(notification) else {
        return false;
    };
    match execute(Path::new(program), &args[..], &CommandOptions::captured()) {
        Ok(result) => result.success,
        Err(e) => {
            tracing::debug!("Desktop notification unavailable: {}", e);
            false
        }
    }
}

fn notifier_command(notification: &Notification) -> Option<(&'static str, Vec<String>)> {
    if cfg!(target_os = "macos") {
        let script = format!(
            "display notification {} with title {}",
            applescript_string(&notification.message),
            applescript_string(&notification.title)
        );
        Some(("osascript", vec!["-e".to_string(), script]))
    } else if cfg!(unix) {
        Some((
            "notify-send",
            vec![
                "--expire-time".to_string(),
                notification.timeout.as_millis().to_string(),
                notification.title.clone(),
                notification.message.clone(),
            ],
        ))
    } else {
        None
    }
}

fn applescript_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
