//! GitHub repository as an image host. Objects are files committed through
//! the contents API, served back via `download_url`.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::path::Path;

use deskdrop_core::config::GitHubConfig;
use deskdrop_core::error::{DeskDropError, Result};
use deskdrop_core::traits::StorageProvider;
use deskdrop_core::types::{StorageInfo, StoredObject};

use crate::inline;

const USER_AGENT: &str = concat!("deskdrop/", env!("CARGO_PKG_VERSION"));

pub struct GitHubStorage {
    client: reqwest::Client,
    api_base: String,
    token: String,
    owner: String,
    repo: String,
    branch: String,
}

impl GitHubStorage {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let missing = config.missing();
        if !missing.is_empty() {
            return Err(DeskDropError::StorageNotConfigured(format!(
                "GitHub storage requires {}",
                missing.join(", ")
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| DeskDropError::http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            owner: config.username.clone(),
            repo: config.repository.clone(),
            branch: config.branch.clone(),
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            self.owner,
            self.repo,
            path.trim_start_matches('/')
        )
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.authorized(self.client.get(url))
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
    }

    /// Commit base64 `content` at `key` and return its download URL.
    async fn put_content(&self, content: String, key: &str) -> Result<String> {
        let body = serde_json::json!({
            "message": format!("Upload {key}"),
            "content": content,
            "branch": self.branch,
        });

        let resp = self
            .authorized(self.client.put(self.contents_url(key)))
            .json(&body)
            .send()
            .await
            .map_err(|e| DeskDropError::http(format!("GitHub upload request failed: {e}")))?;

        let status = resp.status();
        if status != StatusCode::CREATED && status != StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            return Err(DeskDropError::storage(format!("GitHub upload error {status}: {text}")));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| DeskDropError::http(e.to_string()))?;

        json["content"]["download_url"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| DeskDropError::storage("GitHub response has no download_url"))
    }

    /// `Ok(None)` when the path does not exist.
    async fn fetch_sha(&self, key: &str) -> Result<Option<String>> {
        let resp = self
            .get(&self.contents_url(key))
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await
            .map_err(|e| DeskDropError::http(format!("GitHub lookup failed: {e}")))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let json: serde_json::Value = resp
                    .json()
                    .await
                    .map_err(|e| DeskDropError::http(e.to_string()))?;
                Ok(json["sha"].as_str().map(String::from))
            }
            s => Err(DeskDropError::storage(format!("GitHub lookup error {s}"))),
        }
    }

    async fn try_delete(&self, key: &str) -> Result<bool> {
        let Some(sha) = self.fetch_sha(key).await? else {
            tracing::warn!("GitHub delete: {key} not found");
            return Ok(false);
        };

        let body = serde_json::json!({
            "message": format!("Delete {key}"),
            "sha": sha,
            "branch": self.branch,
        });

        let resp = self
            .authorized(self.client.delete(self.contents_url(key)))
            .json(&body)
            .send()
            .await
            .map_err(|e| DeskDropError::http(format!("GitHub delete failed: {e}")))?;

        Ok(resp.status().is_success())
    }

    async fn try_list(&self, path: &str) -> Result<Vec<StoredObject>> {
        let resp = self
            .get(&self.contents_url(path))
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await
            .map_err(|e| DeskDropError::http(format!("GitHub list failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(DeskDropError::storage(format!("GitHub list error {}", resp.status())));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| DeskDropError::http(e.to_string()))?;

        // A file path returns a single object instead of an array.
        let entries = match json {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };

        Ok(entries
            .iter()
            .filter_map(|e| {
                Some(StoredObject {
                    name: e["name"].as_str()?.to_string(),
                    path: e["path"].as_str()?.to_string(),
                    size: e["size"].as_u64().unwrap_or(0),
                    url: e["download_url"].as_str().map(String::from),
                    kind: e["type"].as_str().map(String::from),
                })
            })
            .collect())
    }

    async fn try_describe(&self) -> Result<StorageInfo> {
        let url = format!("{}/repos/{}/{}", self.api_base, self.owner, self.repo);
        let resp = self
            .get(&url)
            .send()
            .await
            .map_err(|e| DeskDropError::http(format!("GitHub repository lookup failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(DeskDropError::storage(format!("GitHub repository error {}", resp.status())));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| DeskDropError::http(e.to_string()))?;

        Ok(StorageInfo {
            name: json["full_name"]
                .as_str()
                .map(String::from)
                .unwrap_or_else(|| format!("{}/{}", self.owner, self.repo)),
            // GitHub reports repository size in KB.
            size: json["size"].as_u64().map(|kb| kb * 1024),
            metadata: serde_json::json!({
                "provider": "github",
                "description": json["description"],
                "private": json["private"],
                "defaultBranch": json["default_branch"],
                "branch": self.branch,
                "htmlUrl": json["html_url"],
                "updatedAt": json["updated_at"],
            }),
        })
    }
}

#[async_trait]
impl StorageProvider for GitHubStorage {
    fn name(&self) -> &str {
        "github"
    }

    async fn upload_file(&self, local_path: &Path, remote_key: &str) -> Option<String> {
        let bytes = match tokio::fs::read(local_path).await {
            Ok(b) => b,
            Err(e) => {
                tracing::error!("GitHub upload: cannot read {}: {e}", local_path.display());
                return None;
            }
        };

        match self.put_content(inline::encode(&bytes), remote_key).await {
            Ok(url) => {
                tracing::info!("GitHub upload ok: {remote_key}");
                Some(url)
            }
            Err(e) => {
                tracing::error!("GitHub upload failed for {remote_key}: {e}");
                None
            }
        }
    }

    async fn upload_inline(&self, encoded: &str, remote_key: &str) -> Option<String> {
        let result = match inline::decode(encoded) {
            // Re-encode so the API always sees canonical base64.
            Ok(bytes) => self.put_content(inline::encode(&bytes), remote_key).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::error!("GitHub inline upload failed for {remote_key}: {e}");
                None
            }
        }
    }

    async fn exists(&self, remote_key: &str) -> bool {
        match self.fetch_sha(remote_key).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::warn!("GitHub exists probe failed for {remote_key}: {e}");
                false
            }
        }
    }

    async fn delete(&self, remote_key: &str) -> bool {
        self.try_delete(remote_key).await.unwrap_or_else(|e| {
            tracing::error!("GitHub delete failed for {remote_key}: {e}");
            false
        })
    }

    async fn list(&self, prefix: &str) -> Option<Vec<StoredObject>> {
        self.try_list(prefix)
            .await
            .map_err(|e| tracing::error!("GitHub list failed for '{prefix}': {e}"))
            .ok()
    }

    async fn describe(&self) -> Option<StorageInfo> {
        self.try_describe()
            .await
            .map_err(|e| tracing::error!("GitHub describe failed: {e}"))
            .ok()
    }
}
