//! DeskDrop configuration: `~/.deskdrop/config.toml` plus environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DeskDropError, Result};

/// Which storage backend to construct.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderChoice {
    /// Qiniu when fully configured, otherwise GitHub.
    #[default]
    Auto,
    GitHub,
    Qiniu,
}

/// A concrete backend, after `auto` has been resolved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    GitHub,
    Qiniu,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::GitHub => write!(f, "github"),
            ProviderKind::Qiniu => write!(f, "qiniu"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub provider: ProviderChoice,
}

/// GitHub repository used as an image host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_github_api")]
    pub api_base: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            username: String::new(),
            repository: String::new(),
            branch: default_branch(),
            api_base: default_github_api(),
        }
    }
}

impl GitHubConfig {
    pub fn missing(&self) -> Vec<String> {
        [
            ("GITHUB_TOKEN", &self.token),
            ("GITHUB_USERNAME", &self.username),
            ("GITHUB_REPOSITORY", &self.repository),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k.to_string())
        .collect()
    }

    pub fn is_configured(&self) -> bool {
        self.missing().is_empty()
    }
}

/// Qiniu Kodo bucket used as an image host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QiniuConfig {
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub bucket: String,
    /// Public domain bound to the bucket, with or without scheme.
    #[serde(default)]
    pub domain: String,
    /// Zone id: z0, z1, z2, na0, as0.
    #[serde(default = "default_qiniu_region")]
    pub region: String,
}

impl Default for QiniuConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            secret_key: String::new(),
            bucket: String::new(),
            domain: String::new(),
            region: default_qiniu_region(),
        }
    }
}

impl QiniuConfig {
    /// Missing fields; template placeholders (`your_...`) count as missing.
    pub fn missing(&self) -> Vec<String> {
        [
            ("QINIU_ACCESS_KEY", &self.access_key),
            ("QINIU_SECRET_KEY", &self.secret_key),
            ("QINIU_BUCKET", &self.bucket),
            ("QINIU_DOMAIN", &self.domain),
        ]
        .into_iter()
        .filter_map(|(k, v)| {
            if v.trim().is_empty() {
                Some(k.to_string())
            } else if is_placeholder(v) {
                Some(format!("{k} (placeholder)"))
            } else {
                None
            }
        })
        .collect()
    }

    pub fn is_configured(&self) -> bool {
        self.missing().is_empty()
    }
}

/// PushPlus push endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushPlusConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_pushplus_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_push_timeout")]
    pub timeout_secs: u64,
}

impl Default for PushPlusConfig {
    fn default() -> Self {
        Self {
            token: None,
            endpoint: default_pushplus_endpoint(),
            timeout_secs: default_push_timeout(),
        }
    }
}

/// What to scan and how remote keys are prefixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_scan_dir")]
    pub directory: String,
    /// Literal every candidate name must start with.
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Key prefix for scheduler-driven uploads.
    #[serde(default = "default_batch_prefix")]
    pub batch_prefix: String,
    /// Key prefix for manual API uploads.
    #[serde(default = "default_manual_prefix")]
    pub manual_prefix: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            directory: default_scan_dir(),
            tag: default_tag(),
            batch_prefix: default_batch_prefix(),
            manual_prefix: default_manual_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Local time the daily window opens, `HH:MM`.
    #[serde(default = "default_window_start")]
    pub window_start: String,
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u32,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_bootstrap_delay")]
    pub bootstrap_delay_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            window_start: default_window_start(),
            window_minutes: default_window_minutes(),
            poll_interval_secs: default_poll_interval(),
            bootstrap_delay_secs: default_bootstrap_delay(),
        }
    }
}

impl ScheduleConfig {
    pub fn window_start_time(&self) -> Result<chrono::NaiveTime> {
        chrono::NaiveTime::parse_from_str(self.window_start.trim(), "%H:%M").map_err(|e| {
            DeskDropError::Config(format!("invalid schedule.window_start '{}': {e}", self.window_start))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where uploaded files are moved after a successful upload.
    #[serde(default = "default_image_dir")]
    pub backup_dir: String,
    /// Where the per-day HTML pages are written.
    #[serde(default = "default_image_dir")]
    pub artifact_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            backup_dir: default_image_dir(),
            artifact_dir: default_image_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DesktopBackend {
    /// Write notices to the log only.
    #[default]
    Log,
    /// Shell out to `notify-send` / `osascript`.
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DesktopConfig {
    #[serde(default)]
    pub backend: DesktopBackend,
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeskDropConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub qiniu: QiniuConfig,
    #[serde(default)]
    pub pushplus: PushPlusConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub desktop: DesktopConfig,
}

/// Which backends are usable, for startup diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigCheck {
    pub github_missing: Vec<String>,
    pub qiniu_missing: Vec<String>,
    pub current: Option<ProviderKind>,
}

impl ConfigCheck {
    pub fn github_configured(&self) -> bool {
        self.github_missing.is_empty()
    }

    pub fn qiniu_configured(&self) -> bool {
        self.qiniu_missing.is_empty()
    }
}

impl DeskDropConfig {
    /// `~/.deskdrop`
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".deskdrop")
    }

    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Load from the default path, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DeskDropError::ConfigNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let set = |target: &mut String, key: &str| {
            if let Some(v) = get(key) {
                *target = v;
            }
        };

        set(&mut self.github.token, "GITHUB_TOKEN");
        set(&mut self.github.username, "GITHUB_USERNAME");
        set(&mut self.github.repository, "GITHUB_REPOSITORY");
        set(&mut self.github.branch, "GITHUB_BRANCH");

        set(&mut self.qiniu.access_key, "QINIU_ACCESS_KEY");
        set(&mut self.qiniu.secret_key, "QINIU_SECRET_KEY");
        set(&mut self.qiniu.bucket, "QINIU_BUCKET");
        set(&mut self.qiniu.domain, "QINIU_DOMAIN");
        set(&mut self.qiniu.region, "QINIU_REGION");

        set(&mut self.scan.directory, "DESKDROP_SCAN_DIR");

        if let Some(v) = get("PUSHPLUS_TOKEN") {
            self.pushplus.token = Some(v);
        }

        if let Some(v) = get("PORT") {
            match v.parse() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {v}"),
            }
        }
    }

    pub fn check(&self) -> ConfigCheck {
        ConfigCheck {
            github_missing: self.github.missing(),
            qiniu_missing: self.qiniu.missing(),
            current: self.resolve_provider().ok(),
        }
    }

    /// Resolve `storage.provider` to a concrete backend.
    pub fn resolve_provider(&self) -> Result<ProviderKind> {
        match self.storage.provider {
            ProviderChoice::GitHub => Ok(ProviderKind::GitHub),
            ProviderChoice::Qiniu => Ok(ProviderKind::Qiniu),
            ProviderChoice::Auto if self.qiniu.is_configured() => Ok(ProviderKind::Qiniu),
            ProviderChoice::Auto if self.github.is_configured() => Ok(ProviderKind::GitHub),
            ProviderChoice::Auto => Err(DeskDropError::StorageNotConfigured(
                "no complete Qiniu or GitHub configuration found".into(),
            )),
        }
    }

    pub fn scan_dir(&self) -> PathBuf {
        expand_path(&self.scan.directory)
    }

    pub fn backup_dir(&self) -> PathBuf {
        expand_path(&self.paths.backup_dir)
    }

    pub fn artifact_dir(&self) -> PathBuf {
        expand_path(&self.paths.artifact_dir)
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

fn is_placeholder(value: &str) -> bool {
    value.trim().starts_with("your_")
}

fn default_branch() -> String {
    "main".into()
}

fn default_github_api() -> String {
    "https://api.github.com".into()
}

fn default_qiniu_region() -> String {
    "z2".into()
}

fn default_pushplus_endpoint() -> String {
    "http://www.pushplus.plus/send".into()
}

fn default_push_timeout() -> u64 {
    10
}

fn default_scan_dir() -> String {
    "~/Desktop".into()
}

fn default_tag() -> String {
    "meet".into()
}

fn default_batch_prefix() -> String {
    "meet-files".into()
}

fn default_manual_prefix() -> String {
    crate::naming::DEFAULT_PREFIX.into()
}

fn default_window_start() -> String {
    "09:00".into()
}

fn default_window_minutes() -> u32 {
    60
}

fn default_poll_interval() -> u64 {
    30
}

fn default_bootstrap_delay() -> u64 {
    5
}

fn default_image_dir() -> String {
    "./image".into()
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    3005
}
