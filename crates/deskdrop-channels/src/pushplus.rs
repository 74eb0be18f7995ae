//! PushPlus channel: WeChat push through `http://www.pushplus.plus/send`.
//!
//! Without a token the channel still constructs; every send is skipped and
//! reports `false`.

use async_trait::async_trait;
use chrono::Local;
use std::time::Duration;

use deskdrop_core::config::PushPlusConfig;
use deskdrop_core::error::{DeskDropError, Result};
use deskdrop_core::traits::{LifecycleNotice, MessageFormat, NotificationChannel};
use deskdrop_core::types::UploadResult;

use crate::content;

/// PushPlus reports success with this value in the body's `code`.
const SUCCESS_CODE: i64 = 200;

pub struct PushPlusChannel {
    client: reqwest::Client,
    token: Option<String>,
    endpoint: String,
    /// Scan tag, mentioned in the empty-scan body.
    tag: String,
}

impl PushPlusChannel {
    pub fn new(config: &PushPlusConfig, tag: impl Into<String>) -> Self {
        let token = config
            .token
            .as_ref()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if token.is_none() {
            tracing::warn!("PushPlus token not configured, push notifications disabled");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("PushPlus client builder failed ({e}), using defaults");
                reqwest::Client::new()
            });

        Self {
            client,
            token,
            endpoint: config.endpoint.clone(),
            tag: tag.into(),
        }
    }

    async fn post(&self, token: &str, title: &str, content: &str, format: MessageFormat) -> Result<()> {
        let body = serde_json::json!({
            "token": token,
            "title": title,
            "content": content,
            "template": format.as_str(),
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DeskDropError::http(format!("PushPlus request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(DeskDropError::channel(format!("PushPlus HTTP {}", resp.status())));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| DeskDropError::http(e.to_string()))?;

        if json["code"].as_i64() == Some(SUCCESS_CODE) {
            Ok(())
        } else {
            let msg = json["msg"].as_str().unwrap_or("unknown error");
            Err(DeskDropError::channel(format!("PushPlus rejected message: {msg}")))
        }
    }
}

#[async_trait]
impl NotificationChannel for PushPlusChannel {
    fn name(&self) -> &str {
        "pushplus"
    }

    fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    async fn send(&self, title: &str, content: &str, format: MessageFormat) -> bool {
        let Some(token) = self.token.as_deref() else {
            tracing::info!("Skipping push '{title}': no token configured");
            return false;
        };

        // An empty title falls back to today's date, like cycle summaries.
        let title = if title.trim().is_empty() {
            content::summary_title(Local::now().date_naive())
        } else {
            title.to_string()
        };

        tracing::debug!("PushPlus send: title='{title}', {} bytes", content.len());
        match self.post(token, &title, content, format).await {
            Ok(()) => {
                tracing::info!("Push sent: {title}");
                true
            }
            Err(e) => {
                tracing::error!("Push failed: {e}");
                false
            }
        }
    }

    async fn send_cycle_summary(&self, successes: &[UploadResult], failures: &[UploadResult]) -> bool {
        let now = Local::now();
        let title = content::summary_title(now.date_naive());
        let body = content::render_summary(successes, failures, &now, &self.tag);
        self.send(&title, &body, MessageFormat::Html).await
    }

    async fn send_lifecycle_notice(&self, notice: &LifecycleNotice) -> bool {
        let (title, body) = content::render_lifecycle(notice, &Local::now());
        self.send(&title, &body, MessageFormat::Html).await
    }
}
