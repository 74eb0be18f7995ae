//! Storage provider trait: one contract over every remote backend.
//!
//! Every operation fails soft: transport, auth and validation problems are
//! logged by the implementation and surface as `None` or `false`, never as
//! an error crossing this boundary.

use async_trait::async_trait;
use std::path::Path;

use crate::types::{StorageInfo, StoredObject};

#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Backend identifier (`github`, `qiniu`, ...).
    fn name(&self) -> &str;

    /// Upload a local file under `remote_key`. Returns a URL that can be
    /// fetched without further authentication.
    async fn upload_file(&self, local_path: &Path, remote_key: &str) -> Option<String>;

    /// Upload base64 text (an optional `data:image/...;base64,` prefix is
    /// accepted) under `remote_key`.
    async fn upload_inline(&self, encoded: &str, remote_key: &str) -> Option<String>;

    /// `false` both for "not found" and for failed probes.
    async fn exists(&self, remote_key: &str) -> bool;

    async fn delete(&self, remote_key: &str) -> bool;

    /// List objects under a directory path or key prefix.
    async fn list(&self, prefix: &str) -> Option<Vec<StoredObject>>;

    async fn describe(&self) -> Option<StorageInfo>;

    /// Pure key generation, see [`crate::naming`].
    fn generate_unique_name(&self, original: &str, prefix: &str) -> String {
        crate::naming::unique_name(original, prefix)
    }
}
