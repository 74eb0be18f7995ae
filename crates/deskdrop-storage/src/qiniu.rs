//! Qiniu Kodo object storage.
//!
//! Uploads use the form API with a short-lived upload token; management
//! calls (stat, delete, list, bucket info) are signed with `QBox` access
//! tokens. Both signatures are HMAC-SHA1 over URL-safe base64.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use sha1::Sha1;
use std::path::Path;

use deskdrop_core::config::QiniuConfig;
use deskdrop_core::error::{DeskDropError, Result};
use deskdrop_core::traits::StorageProvider;
use deskdrop_core::types::{StorageInfo, StoredObject};

use crate::inline;

/// Upload token lifetime.
const UPLOAD_TOKEN_TTL_SECS: i64 = 7200;
const LIST_LIMIT: u32 = 100;
/// Qiniu's "no such file or directory" status.
const STATUS_NOT_FOUND: u16 = 612;

type HmacSha1 = Hmac<Sha1>;

/// Hosts for one region.
#[derive(Debug, Clone)]
pub struct QiniuEndpoints {
    pub up: String,
    pub rs: String,
    pub rsf: String,
    pub uc: String,
}

impl QiniuEndpoints {
    pub fn for_region(region: &str) -> Self {
        let region = region.trim().to_ascii_lowercase();
        Self {
            up: format!("https://up-{region}.qiniup.com"),
            rs: format!("https://rs-{region}.qiniuapi.com"),
            rsf: format!("https://rsf-{region}.qiniuapi.com"),
            uc: "https://uc.qbox.me".into(),
        }
    }

    /// Route every call to one base URL.
    pub fn uniform(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            up: base.clone(),
            rs: base.clone(),
            rsf: base.clone(),
            uc: base,
        }
    }
}

pub struct QiniuStorage {
    client: reqwest::Client,
    access_key: String,
    secret_key: String,
    bucket: String,
    domain: String,
    endpoints: QiniuEndpoints,
}

impl QiniuStorage {
    pub fn new(config: &QiniuConfig) -> Result<Self> {
        Self::with_endpoints(config, QiniuEndpoints::for_region(&config.region))
    }

    pub fn with_endpoints(config: &QiniuConfig, endpoints: QiniuEndpoints) -> Result<Self> {
        let missing = config.missing();
        if !missing.is_empty() {
            return Err(DeskDropError::StorageNotConfigured(format!(
                "Qiniu storage requires {}",
                missing.join(", ")
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| DeskDropError::http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            bucket: config.bucket.clone(),
            domain: config.domain.trim_end_matches('/').to_string(),
            endpoints,
        })
    }

    /// Public URL for `key`; bare domains are served over https.
    pub fn public_url(&self, key: &str) -> String {
        if self.domain.starts_with("http://") || self.domain.starts_with("https://") {
            format!("{}/{key}", self.domain)
        } else {
            format!("https://{}/{key}", self.domain)
        }
    }

    fn sign(&self, data: &[u8]) -> Result<String> {
        hmac_sha1_b64(&self.secret_key, data)
    }

    /// `access_key:sign:encoded_policy`, scoped to one key.
    pub fn upload_token(&self, key: &str, now: i64) -> Result<String> {
        let policy = serde_json::json!({
            "scope": format!("{}:{key}", self.bucket),
            "deadline": now + UPLOAD_TOKEN_TTL_SECS,
        });
        let encoded = URL_SAFE.encode(policy.to_string());
        let sign = self.sign(encoded.as_bytes())?;
        Ok(format!("{}:{sign}:{encoded}", self.access_key))
    }

    /// `QBox` authorization for a management request.
    pub fn management_token(&self, path_and_query: &str, form_body: &[u8]) -> Result<String> {
        let mut data = Vec::with_capacity(path_and_query.len() + 1 + form_body.len());
        data.extend_from_slice(path_and_query.as_bytes());
        data.push(b'\n');
        data.extend_from_slice(form_body);
        Ok(format!("QBox {}:{}", self.access_key, self.sign(&data)?))
    }

    /// Build `req` and attach a `QBox` token over its path and query.
    fn signed(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Request> {
        let mut req = req
            .build()
            .map_err(|e| DeskDropError::http(format!("Invalid Qiniu request: {e}")))?;
        let url = req.url();
        let path_and_query = match url.query() {
            Some(q) => format!("{}?{q}", url.path()),
            None => url.path().to_string(),
        };
        let auth = self.management_token(&path_and_query, b"")?;
        let value = reqwest::header::HeaderValue::from_str(&auth)
            .map_err(|e| DeskDropError::storage(format!("Invalid Qiniu auth header: {e}")))?;
        req.headers_mut().insert(reqwest::header::AUTHORIZATION, value);
        Ok(req)
    }

    async fn execute(&self, req: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let req = self.signed(req)?;
        self.client
            .execute(req)
            .await
            .map_err(|e| DeskDropError::http(format!("Qiniu {what} failed: {e}")))
    }

    fn entry(&self, key: &str) -> String {
        URL_SAFE.encode(format!("{}:{key}", self.bucket))
    }

    async fn form_upload(&self, bytes: Vec<u8>, key: &str) -> Result<String> {
        let token = self.upload_token(key, chrono::Utc::now().timestamp())?;
        let file_name = key.rsplit('/').next().unwrap_or(key).to_string();

        let form = reqwest::multipart::Form::new()
            .text("token", token)
            .text("key", key.to_string())
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));

        let resp = self
            .client
            .post(format!("{}/", self.endpoints.up))
            .multipart(form)
            .send()
            .await
            .map_err(|e| DeskDropError::http(format!("Qiniu upload request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(DeskDropError::storage(format!("Qiniu upload error {status}: {text}")));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| DeskDropError::http(e.to_string()))?;
        let stored_key = json["key"].as_str().unwrap_or(key);
        Ok(self.public_url(stored_key))
    }

    async fn stat(&self, key: &str) -> Result<bool> {
        let url = format!("{}/stat/{}", self.endpoints.rs, self.entry(key));
        let resp = self.execute(self.client.get(url), "stat").await?;

        match resp.status() {
            s if s.is_success() => Ok(true),
            s if s.as_u16() == STATUS_NOT_FOUND || s == StatusCode::NOT_FOUND => Ok(false),
            s => Err(DeskDropError::storage(format!("Qiniu stat error {s}"))),
        }
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let url = format!("{}/delete/{}", self.endpoints.rs, self.entry(key));
        let req = self
            .client
            .post(url)
            .header("Content-Type", "application/x-www-form-urlencoded");
        let resp = self.execute(req, "delete").await?;

        match resp.status() {
            s if s.is_success() => Ok(true),
            s if s.as_u16() == STATUS_NOT_FOUND => {
                tracing::warn!("Qiniu delete: {key} not found");
                Ok(false)
            }
            s => Err(DeskDropError::storage(format!("Qiniu delete error {s}"))),
        }
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        let limit = LIST_LIMIT.to_string();
        let req = self.client.get(format!("{}/list", self.endpoints.rsf)).query(&[
            ("bucket", self.bucket.as_str()),
            ("prefix", prefix),
            ("limit", limit.as_str()),
        ]);
        let resp = self.execute(req, "list").await?;

        if !resp.status().is_success() {
            return Err(DeskDropError::storage(format!("Qiniu list error {}", resp.status())));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| DeskDropError::http(e.to_string()))?;

        Ok(json["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let key = item["key"].as_str()?;
                        Some(StoredObject {
                            name: key.rsplit('/').next().unwrap_or(key).to_string(),
                            path: key.to_string(),
                            size: item["fsize"].as_u64().unwrap_or(0),
                            url: Some(self.public_url(key)),
                            kind: item["mimeType"].as_str().map(String::from),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn bucket_info(&self) -> Result<StorageInfo> {
        let req = self
            .client
            .post(format!("{}/v2/bucketInfo", self.endpoints.uc))
            .query(&[("bucket", self.bucket.as_str())])
            .header("Content-Type", "application/x-www-form-urlencoded");
        let resp = self.execute(req, "bucket info").await?;

        if !resp.status().is_success() {
            return Err(DeskDropError::storage(format!("Qiniu bucket info error {}", resp.status())));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| DeskDropError::http(e.to_string()))?;

        Ok(StorageInfo {
            name: self.bucket.clone(),
            size: None,
            metadata: serde_json::json!({
                "provider": "qiniu",
                "domain": self.domain,
                "region": json["region"],
                "private": json["private"],
                "bucketInfo": json,
            }),
        })
    }
}

#[async_trait]
impl StorageProvider for QiniuStorage {
    fn name(&self) -> &str {
        "qiniu"
    }

    async fn upload_file(&self, local_path: &Path, remote_key: &str) -> Option<String> {
        let bytes = match tokio::fs::read(local_path).await {
            Ok(b) => b,
            Err(e) => {
                tracing::error!("Qiniu upload: cannot read {}: {e}", local_path.display());
                return None;
            }
        };

        match self.form_upload(bytes, remote_key).await {
            Ok(url) => {
                tracing::info!("Qiniu upload ok: {remote_key}");
                Some(url)
            }
            Err(e) => {
                tracing::error!("Qiniu upload failed for {remote_key}: {e}");
                None
            }
        }
    }

    async fn upload_inline(&self, encoded: &str, remote_key: &str) -> Option<String> {
        let result = match inline::decode(encoded) {
            Ok(bytes) => self.form_upload(bytes, remote_key).await,
            Err(e) => Err(e),
        };
        result
            .map_err(|e| tracing::error!("Qiniu inline upload failed for {remote_key}: {e}"))
            .ok()
    }

    async fn exists(&self, remote_key: &str) -> bool {
        self.stat(remote_key).await.unwrap_or_else(|e| {
            tracing::warn!("Qiniu exists probe failed for {remote_key}: {e}");
            false
        })
    }

    async fn delete(&self, remote_key: &str) -> bool {
        self.remove(remote_key).await.unwrap_or_else(|e| {
            tracing::error!("Qiniu delete failed for {remote_key}: {e}");
            false
        })
    }

    async fn list(&self, prefix: &str) -> Option<Vec<StoredObject>> {
        self.list_prefix(prefix)
            .await
            .map_err(|e| tracing::error!("Qiniu list failed for '{prefix}': {e}"))
            .ok()
    }

    async fn describe(&self) -> Option<StorageInfo> {
        self.bucket_info()
            .await
            .map_err(|e| tracing::error!("Qiniu describe failed: {e}"))
            .ok()
    }
}

fn hmac_sha1_b64(secret: &str, data: &[u8]) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| DeskDropError::storage(format!("invalid Qiniu secret key: {e}")))?;
    mac.update(data);
    Ok(URL_SAFE.encode(mac.finalize().into_bytes()))
}
