//! Push notification channel trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{ScheduleMode, UploadResult};

/// Body format understood by the push endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    #[default]
    Html,
    Txt,
    Json,
    Markdown,
}

impl MessageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageFormat::Html => "html",
            MessageFormat::Txt => "txt",
            MessageFormat::Json => "json",
            MessageFormat::Markdown => "markdown",
        }
    }
}

impl std::str::FromStr for MessageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "txt" | "text" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unknown message format: {other}")),
        }
    }
}

/// Service events reported independently of cycle outcomes. Stopping is
/// reported on the desktop only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleNotice {
    Started(ScheduleMode),
    Error(String),
}

/// An outbound push channel.
///
/// Sends return `true` only when the remote endpoint accepted the message.
/// Failures are logged and reported as `false`.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &str;

    /// `false` when the channel has no credentials and drops every send.
    fn is_configured(&self) -> bool;

    async fn send(&self, title: &str, content: &str, format: MessageFormat) -> bool;

    /// Render and send the summary for one cycle.
    async fn send_cycle_summary(&self, successes: &[UploadResult], failures: &[UploadResult]) -> bool;

    async fn send_lifecycle_notice(&self, notice: &LifecycleNotice) -> bool;
}
