//! Bounded, newest-first upload history kept in memory by the front-end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of records kept before the oldest is evicted.
pub const MAX_HISTORY_RECORDS: usize = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Base64Upload,
    FileUpload,
    DesktopUpload,
    Delete,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    pub filename: String,
    pub original_filename: Option<String>,
    pub status: HistoryStatus,
    pub url: Option<String>,
    pub error: Option<String>,
    /// `manual` for single API uploads, `batch` for on-demand desktop cycles.
    pub method: String,
}

impl HistoryRecord {
    pub fn new(kind: HistoryKind, filename: impl Into<String>, status: HistoryStatus) -> Self {
        let timestamp = Utc::now();
        Self {
            id: timestamp.timestamp_millis().to_string(),
            timestamp,
            kind,
            filename: filename.into(),
            original_filename: None,
            status,
            url: None,
            error: None,
            method: "manual".into(),
        }
    }

    pub fn with_original(mut self, original: impl Into<String>) -> Self {
        self.original_filename = Some(original.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub last_upload: Option<DateTime<Utc>>,
}

/// Ring buffer of [`HistoryRecord`]s.
#[derive(Debug, Clone)]
pub struct History {
    records: VecDeque<HistoryRecord>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, record: HistoryRecord) {
        self.records.push_front(record);
        self.records.truncate(self.capacity);
    }

    /// Newest-first view, at most `limit` entries.
    pub fn recent(&self, limit: usize) -> Vec<HistoryRecord> {
        self.page(0, limit)
    }

    /// Newest-first window starting `offset` records in.
    pub fn page(&self, offset: usize, limit: usize) -> Vec<HistoryRecord> {
        self.records.iter().skip(offset).take(limit).cloned().collect()
    }

    pub fn stats(&self) -> HistoryStats {
        let successful = self
            .records
            .iter()
            .filter(|r| r.status == HistoryStatus::Success)
            .count();
        HistoryStats {
            total: self.records.len(),
            successful,
            failed: self.records.len() - successful,
            last_upload: self.records.front().map(|r| r.timestamp),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_HISTORY_RECORDS)
    }
}
