//! Per-day HTML page of uploaded images.
//!
//! One file per calendar day, `{dir}/{YYYY-MM-DD}.html`. Every call appends;
//! writing the same successes twice produces duplicate entries.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use deskdrop_channels::content::image_tags;
use deskdrop_core::error::Result;
use deskdrop_core::types::{UploadResult, image_urls};

#[derive(Debug, Clone)]
pub struct HtmlArtifact {
    dir: PathBuf,
}

impl HtmlArtifact {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.html", date.format("%Y-%m-%d")))
    }

    /// Append `<img>` lines for the image-type successes.
    ///
    /// Returns `Ok(None)` without touching the filesystem when there is no
    /// image to write.
    pub async fn append(&self, successes: &[UploadResult], date: NaiveDate) -> Result<Option<PathBuf>> {
        let urls = image_urls(successes);
        if urls.is_empty() {
            return Ok(None);
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(date);
        let existed = tokio::fs::try_exists(&path).await.unwrap_or(false);

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(image_tags(urls).as_bytes()).await?;
        file.flush().await?;

        if existed {
            tracing::info!("Appended to artifact {}", path.display());
        } else {
            tracing::info!("Created artifact {}", path.display());
        }
        Ok(Some(path))
    }
}
