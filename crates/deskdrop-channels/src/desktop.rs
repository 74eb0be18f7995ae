//! Desktop notices.

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use deskdrop_core::config::{DesktopBackend, DesktopConfig};
use deskdrop_core::traits::{DesktopNotifier, NoticeLevel};

/// Writes notices to the log.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

#[async_trait]
impl DesktopNotifier for TracingNotifier {
    async fn notify(&self, title: &str, message: &str, level: NoticeLevel) {
        match level {
            NoticeLevel::Error => tracing::error!("[desktop] {title}: {message}"),
            NoticeLevel::Success | NoticeLevel::Info => tracing::info!("[desktop] {title}: {message}"),
        }
    }
}

/// How long a notifier command may run before it is killed.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Shells out to `notify-send` (Linux) or `osascript` (macOS). A failed or
/// stuck command falls back to a log line.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    timeout: Duration,
}

impl Default for CommandNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl CommandNotifier {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn command(title: &str, message: &str, level: NoticeLevel) -> Option<tokio::process::Command> {
        match std::env::consts::OS {
            "linux" => {
                let urgency = match level {
                    NoticeLevel::Error => "critical",
                    NoticeLevel::Success | NoticeLevel::Info => "normal",
                };
                let mut cmd = tokio::process::Command::new("notify-send");
                cmd.arg("-u").arg(urgency).arg(title).arg(message);
                Some(cmd)
            }
            "macos" => {
                let script = format!(
                    "display notification {} with title {}",
                    applescript_quote(message),
                    applescript_quote(title)
                );
                let mut cmd = tokio::process::Command::new("osascript");
                cmd.arg("-e").arg(script);
                Some(cmd)
            }
            _ => None,
        }
    }
}

#[async_trait]
impl DesktopNotifier for CommandNotifier {
    async fn notify(&self, title: &str, message: &str, level: NoticeLevel) {
        let shown = match Self::command(title, message, level) {
            Some(cmd) => run_bounded(cmd, self.timeout).await,
            None => false,
        };
        if shown {
            tracing::debug!("Desktop notice shown: {title}");
        } else {
            TracingNotifier.notify(title, message, level).await;
        }
    }
}

/// Run `cmd` to completion within `timeout`. The child is killed when the
/// deadline passes.
async fn run_bounded(mut cmd: tokio::process::Command, timeout: Duration) -> bool {
    cmd.stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, cmd.status()).await {
        Ok(Ok(status)) if status.success() => true,
        Ok(Ok(status)) => {
            tracing::debug!("Desktop notifier exited with {status}");
            false
        }
        Ok(Err(e)) => {
            tracing::debug!("Desktop notifier unavailable: {e}");
            false
        }
        Err(_) => {
            tracing::warn!("Desktop notifier timed out after {timeout:?}");
            false
        }
    }
}

/// Create the notifier selected by `desktop.backend`.
pub fn create_notifier(config: &DesktopConfig) -> Arc<dyn DesktopNotifier> {
    match config.backend {
        DesktopBackend::Log => Arc::new(TracingNotifier),
        DesktopBackend::Command => Arc::new(CommandNotifier::default()),
    }
}

fn applescript_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
