//! Transient local desktop notices.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Shows a short notice to the operator. Never fails from the caller's view.
#[async_trait]
pub trait DesktopNotifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str, level: NoticeLevel);
}
