//! # DeskDrop Storage
//!
//! Remote backends behind [`StorageProvider`]. The backend is chosen once,
//! at start-up, by [`create_storage`] and then held as an opaque
//! `Arc<dyn StorageProvider>` by everything downstream.

pub mod github;
pub mod inline;
pub mod qiniu;

use std::sync::Arc;

use deskdrop_core::config::{DeskDropConfig, ProviderKind};
use deskdrop_core::error::Result;
use deskdrop_core::traits::StorageProvider;

pub use github::GitHubStorage;
pub use qiniu::QiniuStorage;

/// Create the storage backend selected by `storage.provider`.
///
/// Credentials are validated here; a missing field fails construction.
pub fn create_storage(config: &DeskDropConfig) -> Result<Arc<dyn StorageProvider>> {
    let kind = config.resolve_provider()?;
    tracing::info!("Using storage provider: {kind}");
    match kind {
        ProviderKind::GitHub => Ok(Arc::new(GitHubStorage::new(&config.github)?)),
        ProviderKind::Qiniu => Ok(Arc::new(QiniuStorage::new(&config.qiniu)?)),
    }
}
