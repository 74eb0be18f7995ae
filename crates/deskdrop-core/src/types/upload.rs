//! Scan candidates, per-file upload results and the per-cycle report.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File extensions rendered as inline images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"];

/// Whether `name` ends in one of [`IMAGE_EXTENSIONS`] (case-insensitive).
pub fn is_image_name(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.iter().any(|i| i.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// A local file that matched the naming predicate during a scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

impl FileCandidate {
    pub fn size_kb(&self) -> f64 {
        self.size as f64 / 1024.0
    }
}

/// Outcome of uploading one candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadResult {
    pub source_name: String,
    pub remote_key: String,
    pub success: bool,
    pub url: Option<String>,
    pub moved_to_backup: bool,
}

impl UploadResult {
    pub fn succeeded(
        source_name: impl Into<String>,
        remote_key: impl Into<String>,
        url: impl Into<String>,
        moved_to_backup: bool,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            remote_key: remote_key.into(),
            success: true,
            url: Some(url.into()),
            moved_to_backup,
        }
    }

    pub fn failed(source_name: impl Into<String>, remote_key: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            remote_key: remote_key.into(),
            success: false,
            url: None,
            moved_to_backup: false,
        }
    }

    pub fn is_image(&self) -> bool {
        is_image_name(&self.source_name)
    }
}

/// Aggregated results of one cycle. Order inside each list is scan order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub successes: Vec<UploadResult>,
    pub failures: Vec<UploadResult>,
    pub timestamp: DateTime<Local>,
}

impl CycleReport {
    pub fn from_results(results: Vec<UploadResult>) -> Self {
        let (successes, failures) = results.into_iter().partition(|r| r.success);
        Self {
            successes,
            failures,
            timestamp: Local::now(),
        }
    }

    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn moved_count(&self) -> usize {
        self.successes.iter().filter(|r| r.moved_to_backup).count()
    }

    /// Successful uploads whose source was an image, with their URLs.
    pub fn image_urls(&self) -> Vec<&str> {
        image_urls(&self.successes)
    }
}

/// URLs of image-type successes, in order.
pub fn image_urls(results: &[UploadResult]) -> Vec<&str> {
    results
        .iter()
        .filter(|r| r.success && r.is_image())
        .filter_map(|r| r.url.as_deref())
        .collect()
}
