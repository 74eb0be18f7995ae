#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use deskdrop_core::traits::{
    DesktopNotifier, LifecycleNotice, MessageFormat, NoticeLevel, NotificationChannel, StorageProvider,
};
use deskdrop_core::types::{StorageInfo, StoredObject, UploadResult};
use deskdrop_scheduler::{OrchestratorSettings, UploadOrchestrator};

pub fn scenario_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

#[derive(Default)]
pub struct MockStorage {
    pub uploads: Mutex<Vec<(PathBuf, String)>>,
    pub fail: HashSet<String>,
    pub panic_on: Option<String>,
    pub delay: Option<Duration>,
}

impl MockStorage {
    pub fn uploaded_names(&self) -> Vec<String> {
        self.uploads
            .lock()
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }
}

#[async_trait]
impl StorageProvider for MockStorage {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload_file(&self, local_path: &Path, remote_key: &str) -> Option<String> {
        self.uploads
            .lock()
            .push((local_path.to_path_buf(), remote_key.to_string()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let name = local_path.file_name()?.to_string_lossy().into_owned();
        if self.panic_on.as_deref() == Some(name.as_str()) {
            panic!("storage backend blew up on {name}");
        }
        if self.fail.contains(&name) {
            return None;
        }
        Some(format!("https://host/{remote_key}"))
    }

    async fn upload_inline(&self, _encoded: &str, remote_key: &str) -> Option<String> {
        Some(format!("https://host/{remote_key}"))
    }

    async fn exists(&self, _remote_key: &str) -> bool {
        false
    }

    async fn delete(&self, _remote_key: &str) -> bool {
        true
    }

    async fn list(&self, _prefix: &str) -> Option<Vec<StoredObject>> {
        Some(Vec::new())
    }

    async fn describe(&self) -> Option<StorageInfo> {
        None
    }
}

pub struct MockChannel {
    pub accept: bool,
    pub summaries: Mutex<Vec<(Vec<UploadResult>, Vec<UploadResult>)>>,
    pub lifecycle: Mutex<Vec<LifecycleNotice>>,
}

impl MockChannel {
    pub fn new(accept: bool) -> Self {
        Self {
            accept,
            summaries: Mutex::new(Vec::new()),
            lifecycle: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NotificationChannel for MockChannel {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn send(&self, _title: &str, _content: &str, _format: MessageFormat) -> bool {
        self.accept
    }

    async fn send_cycle_summary(&self, successes: &[UploadResult], failures: &[UploadResult]) -> bool {
        self.summaries.lock().push((successes.to_vec(), failures.to_vec()));
        self.accept
    }

    async fn send_lifecycle_notice(&self, notice: &LifecycleNotice) -> bool {
        self.lifecycle.lock().push(notice.clone());
        self.accept
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<(String, String, NoticeLevel)>>,
}

impl RecordingNotifier {
    pub fn titles(&self) -> Vec<String> {
        self.notices.lock().iter().map(|(t, _, _)| t.clone()).collect()
    }
}

#[async_trait]
impl DesktopNotifier for RecordingNotifier {
    async fn notify(&self, title: &str, message: &str, level: NoticeLevel) {
        self.notices
            .lock()
            .push((title.to_string(), message.to_string(), level));
    }
}

/// A desktop, backup and artifact directory under one temp root.
pub struct Fixture {
    pub root: tempfile::TempDir,
    pub storage: Arc<MockStorage>,
    pub channel: Arc<MockChannel>,
    pub desktop: Arc<RecordingNotifier>,
    pub orchestrator: Arc<UploadOrchestrator>,
}

impl Fixture {
    pub fn new(storage: MockStorage, channel: MockChannel) -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("Desktop")).unwrap();
        let settings = OrchestratorSettings {
            scan_dir: root.path().join("Desktop"),
            tag: "meet".into(),
            batch_prefix: "meet-files".into(),
            backup_dir: root.path().join("backup"),
            artifact_dir: root.path().join("image"),
        };
        Self::with_settings(root, settings, storage, channel)
    }

    pub fn with_settings(
        root: tempfile::TempDir,
        settings: OrchestratorSettings,
        storage: MockStorage,
        channel: MockChannel,
    ) -> Self {
        let storage = Arc::new(storage);
        let channel = Arc::new(channel);
        let desktop = Arc::new(RecordingNotifier::default());
        let orchestrator = Arc::new(
            UploadOrchestrator::new(storage.clone(), channel.clone(), desktop.clone(), settings)
                .with_fixed_date(scenario_date()),
        );
        Self {
            root,
            storage,
            channel,
            desktop,
            orchestrator,
        }
    }

    pub fn desk(&self, name: &str) -> PathBuf {
        self.root.path().join("Desktop").join(name)
    }

    pub fn drop_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.desk(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn backup(&self, name: &str) -> PathBuf {
        self.root.path().join("backup").join(name)
    }

    pub fn artifact(&self) -> PathBuf {
        self.root.path().join("image").join("2024-01-15.html")
    }
}
