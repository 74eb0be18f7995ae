//! API route handlers for the gateway.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use chrono::{Local, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use deskdrop_core::naming;
use deskdrop_core::traits::MessageFormat;
use deskdrop_core::types::{HistoryKind, HistoryRecord, HistoryStatus, ScheduleMode};
use deskdrop_scheduler::{CycleOutcome, DatePredicate, FileScanner, SchedulerSettings};

use super::server::AppState;
use crate::error::ApiError;

type ApiResult = Result<Json<Value>, ApiError>;

const DEFAULT_INLINE_NAME: &str = "image.jpg";
const DEFAULT_HISTORY_PAGE: usize = 20;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineUploadRequest {
    pub base64_data: Option<String>,
    pub filename: Option<String>,
    pub prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadRequest {
    pub file_path: Option<String>,
    pub filename: Option<String>,
    pub prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FilenameRequest {
    #[serde(alias = "originalFilename")]
    pub filename: Option<String>,
    pub prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PushRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub template: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SwitchModeRequest {
    pub mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn mode_description(mode: ScheduleMode, settings: &SchedulerSettings) -> String {
    match mode {
        ScheduleMode::Production => format!(
            "Checks once a day at {} plus a random 0-{} minute delay",
            settings.window.start().format("%H:%M"),
            settings.window.span_minutes()
        ),
        ScheduleMode::Continuous => {
            format!("Checks every {} s", settings.poll_interval.as_secs())
        }
    }
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let provider = state.provider_name();
    Json(json!({
        "status": "ok",
        "service": format!("DeskDrop ({provider})"),
        "version": env!("CARGO_PKG_VERSION"),
        "provider": provider,
        "configured": state.storage.is_some(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Describe the configured backend.
pub async fn storage_info(State(state): State<Arc<AppState>>) -> ApiResult {
    let storage = state.storage()?;
    let info = storage
        .describe()
        .await
        .ok_or_else(|| ApiError::Internal("failed to describe storage backend".into()))?;
    Ok(Json(json!({ "success": true, "info": info })))
}

/// Upload a base64 payload under a freshly generated key.
pub async fn upload_base64(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InlineUploadRequest>,
) -> ApiResult {
    let storage = state.storage()?;
    let data = non_empty(req.base64_data)
        .ok_or_else(|| ApiError::BadRequest("base64Data is required".into()))?;
    let original = non_empty(req.filename).unwrap_or_else(|| DEFAULT_INLINE_NAME.into());
    let prefix = non_empty(req.prefix).unwrap_or_else(|| state.config.scan.manual_prefix.clone());

    let key = storage.generate_unique_name(&original, &prefix);
    if storage.exists(&key).await {
        return Err(ApiError::Conflict(format!("file already exists: {key}")));
    }

    let record = HistoryRecord::new(HistoryKind::Base64Upload, &key, HistoryStatus::Success)
        .with_original(&original);
    match storage.upload_inline(&data, &key).await {
        Some(url) => {
            tracing::info!("Inline upload stored as {key}");
            state.record(record.with_url(&url));
            Ok(Json(json!({
                "success": true,
                "url": url,
                "filename": key,
                "message": "upload succeeded",
            })))
        }
        None => {
            let mut failed = record.with_error("upload failed");
            failed.status = HistoryStatus::Failed;
            state.record(failed);
            Err(ApiError::Internal("upload failed".into()))
        }
    }
}

/// Upload a file that already exists on this machine.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FileUploadRequest>,
) -> ApiResult {
    let storage = state.storage()?;
    let path = non_empty(req.file_path)
        .map(std::path::PathBuf::from)
        .ok_or_else(|| ApiError::BadRequest("filePath is required".into()))?;

    let is_file = tokio::fs::metadata(&path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(ApiError::NotFound(format!("file not found: {}", path.display())));
    }

    let original = non_empty(req.filename)
        .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| DEFAULT_INLINE_NAME.into());
    let prefix = non_empty(req.prefix).unwrap_or_else(|| state.config.scan.manual_prefix.clone());
    let key = storage.generate_unique_name(&original, &prefix);

    let record = HistoryRecord::new(HistoryKind::FileUpload, &key, HistoryStatus::Success)
        .with_original(&original);
    match storage.upload_file(&path, &key).await {
        Some(url) => {
            state.record(record.with_url(&url));
            Ok(Json(json!({
                "success": true,
                "url": url,
                "filename": key,
                "message": "upload succeeded",
            })))
        }
        None => {
            let mut failed = record.with_error("upload failed");
            failed.status = HistoryStatus::Failed;
            state.record(failed);
            Err(ApiError::Internal("upload failed".into()))
        }
    }
}

pub async fn file_exists(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> ApiResult {
    let storage = state.storage()?;
    let exists = storage.exists(&key).await;
    Ok(Json(json!({ "success": true, "exists": exists, "filename": key })))
}

pub async fn delete_file(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> ApiResult {
    let storage = state.storage()?;
    if storage.delete(&key).await {
        state.record(HistoryRecord::new(HistoryKind::Delete, &key, HistoryStatus::Success));
        Ok(Json(json!({ "success": true, "filename": key, "message": "deleted" })))
    } else {
        state.record(
            HistoryRecord::new(HistoryKind::Delete, &key, HistoryStatus::Failed)
                .with_error("delete failed"),
        );
        Err(ApiError::Internal(format!("failed to delete {key}")))
    }
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let storage = state.storage()?;
    let prefix = query.path.unwrap_or_default();
    let files = storage
        .list(&prefix)
        .await
        .ok_or_else(|| ApiError::Internal("failed to list files".into()))?;
    Ok(Json(json!({
        "success": true,
        "path": prefix,
        "count": files.len(),
        "files": files,
    })))
}

/// Today's candidates in the scan directory, without uploading.
pub async fn scan_desktop(State(state): State<Arc<AppState>>) -> ApiResult {
    let dir = state.config.scan_dir();
    if !tokio::fs::metadata(&dir).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Err(ApiError::NotFound(format!(
            "scan directory not found: {}",
            dir.display()
        )));
    }

    let scanner = FileScanner::new(&dir, DatePredicate::new(state.config.scan.tag.clone()));
    let files = scanner.scan().await;
    Ok(Json(json!({
        "success": true,
        "desktopPath": dir,
        "dateFilter": Local::now().format("%Y%m%d").to_string(),
        "count": files.len(),
        "files": files,
    })))
}

/// Run one cycle now and record every per-file result.
pub async fn upload_desktop_files(State(state): State<Arc<AppState>>) -> ApiResult {
    let scheduler = state.scheduler()?;
    let report = match scheduler.run_once().await {
        CycleOutcome::Completed(report) => report,
        CycleOutcome::NoCandidates => {
            return Ok(Json(json!({
                "success": true,
                "message": "no matching files",
                "results": [],
                "total": 0,
                "successCount": 0,
                "failureCount": 0,
            })));
        }
        CycleOutcome::Skipped => {
            return Err(ApiError::Conflict("an upload cycle is already running".into()));
        }
        CycleOutcome::Failed(e) => return Err(ApiError::Internal(e)),
    };

    for result in report.successes.iter().chain(&report.failures) {
        let status = if result.success {
            HistoryStatus::Success
        } else {
            HistoryStatus::Failed
        };
        let mut record = HistoryRecord::new(HistoryKind::DesktopUpload, &result.remote_key, status)
            .with_original(&result.source_name)
            .with_method("batch");
        record = match &result.url {
            Some(url) => record.with_url(url),
            None => record.with_error("upload failed"),
        };
        state.record(record);
    }

    let results: Vec<_> = report.successes.iter().chain(&report.failures).collect();
    Ok(Json(json!({
        "success": true,
        "results": results,
        "total": report.total(),
        "successCount": report.successes.len(),
        "failureCount": report.failures.len(),
    })))
}

pub async fn generate_filename(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FilenameRequest>,
) -> ApiResult {
    let original = non_empty(req.filename)
        .ok_or_else(|| ApiError::BadRequest("filename is required".into()))?;
    let prefix = non_empty(req.prefix).unwrap_or_else(|| state.config.scan.manual_prefix.clone());
    let unique = match &state.storage {
        Some(storage) => storage.generate_unique_name(&original, &prefix),
        None => naming::unique_name(&original, &prefix),
    };
    Ok(Json(json!({
        "success": true,
        "originalFilename": original,
        "uniqueFilename": unique,
    })))
}

/// Send a raw message through the push channel.
pub async fn push(State(state): State<Arc<AppState>>, Json(req): Json<PushRequest>) -> ApiResult {
    if !state.channel.is_configured() {
        return Err(ApiError::Unavailable(format!(
            "{} channel is not configured",
            state.channel.name()
        )));
    }
    let (Some(title), Some(content)) = (non_empty(req.title), non_empty(req.content)) else {
        return Err(ApiError::BadRequest("title and content are required".into()));
    };
    let format = match non_empty(req.template) {
        Some(t) => t.parse::<MessageFormat>().map_err(ApiError::BadRequest)?,
        None => MessageFormat::default(),
    };

    if state.channel.send(&title, &content, format).await {
        Ok(Json(json!({ "success": true, "message": "push sent" })))
    } else {
        Err(ApiError::Internal("push failed".into()))
    }
}

pub async fn switch_mode(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SwitchModeRequest>,
) -> ApiResult {
    let mode = non_empty(req.mode)
        .ok_or_else(|| ApiError::BadRequest("mode is required".into()))?
        .parse::<ScheduleMode>()
        .map_err(ApiError::BadRequest)?;
    let scheduler = state.scheduler()?;

    scheduler.switch_mode(mode).await;
    tracing::info!("Scheduler switched to {mode} via API");
    Ok(Json(json!({
        "success": true,
        "mode": mode,
        "message": format!("switched to {mode} mode"),
        "description": mode_description(mode, scheduler.settings()),
    })))
}

pub async fn current_mode(State(state): State<Arc<AppState>>) -> Json<Value> {
    let Some(scheduler) = &state.scheduler else {
        return Json(json!({
            "success": true,
            "mode": null,
            "schedulerStatus": "not_initialized",
        }));
    };
    let status = scheduler.status();
    Json(json!({
        "success": true,
        "mode": status.mode,
        "description": mode_description(status.mode, scheduler.settings()),
        "schedulerStatus": if status.running { "running" } else { "stopped" },
        "status": status,
    }))
}

/// Newest-first history page with totals.
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Json<Value> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_PAGE);
    let offset = query.offset.unwrap_or(0);
    let (records, stats) = {
        let history = state.history.lock();
        (history.page(offset, limit), history.stats())
    };
    let has_more = offset + records.len() < stats.total;

    Json(json!({
        "success": true,
        "history": records,
        "pagination": {
            "limit": limit,
            "offset": offset,
            "total": stats.total,
            "hasMore": has_more,
        },
        "stats": stats,
        "serviceStatus": {
            "running": true,
            "provider": state.provider_name(),
            "configured": state.storage.is_some(),
            "uptimeSecs": state.start_time.elapsed().as_secs(),
        },
    }))
}

pub async fn not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "not found", "path": uri.path() })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::Path as FsPath;

    use deskdrop_core::config::DeskDropConfig;
    use deskdrop_core::traits::{
        DesktopNotifier, LifecycleNotice, NoticeLevel, NotificationChannel, StorageProvider,
    };
    use deskdrop_core::types::{StorageInfo, StoredObject, UploadResult};
    use deskdrop_scheduler::{OrchestratorSettings, Scheduler, UploadOrchestrator};

    #[derive(Default)]
    struct FakeStorage {
        taken: bool,
        broken: bool,
    }

    #[async_trait]
    impl StorageProvider for FakeStorage {
        fn name(&self) -> &str {
            "fake"
        }

        async fn upload_file(&self, _local_path: &FsPath, remote_key: &str) -> Option<String> {
            (!self.broken).then(|| format!("https://cdn/{remote_key}"))
        }

        async fn upload_inline(&self, _encoded: &str, remote_key: &str) -> Option<String> {
            (!self.broken).then(|| format!("https://cdn/{remote_key}"))
        }

        async fn exists(&self, _remote_key: &str) -> bool {
            self.taken
        }

        async fn delete(&self, _remote_key: &str) -> bool {
            !self.broken
        }

        async fn list(&self, prefix: &str) -> Option<Vec<StoredObject>> {
            Some(vec![StoredObject {
                name: "a.png".into(),
                path: format!("{prefix}a.png"),
                size: 3,
                url: None,
                kind: None,
            }])
        }

        async fn describe(&self) -> Option<StorageInfo> {
            (!self.broken).then(|| StorageInfo {
                name: "fake".into(),
                size: None,
                metadata: json!({ "provider": "fake" }),
            })
        }
    }

    #[derive(Default)]
    struct FakeChannel {
        configured: bool,
        sent: Mutex<Vec<(String, MessageFormat)>>,
    }

    #[async_trait]
    impl NotificationChannel for FakeChannel {
        fn name(&self) -> &str {
            "fake"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn send(&self, title: &str, _content: &str, format: MessageFormat) -> bool {
            self.sent.lock().push((title.to_string(), format));
            true
        }

        async fn send_cycle_summary(&self, _s: &[UploadResult], _f: &[UploadResult]) -> bool {
            true
        }

        async fn send_lifecycle_notice(&self, _notice: &LifecycleNotice) -> bool {
            true
        }
    }

    struct Silent;

    #[async_trait]
    impl DesktopNotifier for Silent {
        async fn notify(&self, _title: &str, _message: &str, _level: NoticeLevel) {}
    }

    fn state_with(storage: Option<FakeStorage>, channel: FakeChannel) -> Arc<AppState> {
        let storage = storage.map(|s| Arc::new(s) as Arc<dyn StorageProvider>);
        Arc::new(AppState::new(
            DeskDropConfig::default(),
            storage,
            Arc::new(channel),
            None,
        ))
    }

    fn state() -> Arc<AppState> {
        state_with(Some(FakeStorage::default()), FakeChannel::default())
    }

    /// State whose scheduler scans `root/Desktop` for today's files.
    fn scheduled_state(root: &FsPath) -> Arc<AppState> {
        let mut config = DeskDropConfig::default();
        config.scan.directory = root.join("Desktop").to_string_lossy().into_owned();
        config.paths.backup_dir = root.join("backup").to_string_lossy().into_owned();
        config.paths.artifact_dir = root.join("image").to_string_lossy().into_owned();

        let storage: Arc<dyn StorageProvider> = Arc::new(FakeStorage::default());
        let channel: Arc<dyn NotificationChannel> = Arc::new(FakeChannel::default());
        let orchestrator = Arc::new(UploadOrchestrator::new(
            storage.clone(),
            channel.clone(),
            Arc::new(Silent),
            OrchestratorSettings::from_config(&config),
        ));
        let settings = SchedulerSettings::from_config(&config).unwrap();
        let scheduler = Arc::new(Scheduler::new(orchestrator, settings));
        Arc::new(AppState::new(config, Some(storage), channel, Some(scheduler)))
    }

    fn today_name(stem: &str, ext: &str) -> String {
        format!("{stem}{}.{ext}", Local::now().format("%Y%m%d"))
    }

    #[tokio::test]
    async fn test_health_check() {
        let result = health_check(State(state())).await;
        assert_eq!(result.0["status"], "ok");
        assert_eq!(result.0["provider"], "fake");
        assert_eq!(result.0["configured"], true);

        let bare = health_check(State(state_with(None, FakeChannel::default()))).await;
        assert_eq!(bare.0["provider"], "none");
        assert_eq!(bare.0["configured"], false);
    }

    #[tokio::test]
    async fn test_storage_routes_need_backend() {
        let s = state_with(None, FakeChannel::default());
        let err = storage_info(State(s.clone())).await.unwrap_err();
        assert!(matches!(err, ApiError::Unavailable(_)));
        let err = file_exists(State(s), Path("a.png".into())).await.unwrap_err();
        assert!(matches!(err, ApiError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_storage_info_failure_is_internal() {
        let s = state_with(
            Some(FakeStorage {
                broken: true,
                ..Default::default()
            }),
            FakeChannel::default(),
        );
        let err = storage_info(State(s)).await.unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[tokio::test]
    async fn test_upload_base64_records_history() {
        let s = state();
        let req = InlineUploadRequest {
            base64_data: Some("aGk=".into()),
            filename: Some("shot.png".into()),
            prefix: Some("docs".into()),
        };
        let result = upload_base64(State(s.clone()), Json(req)).await.unwrap();
        let key = result.0["filename"].as_str().unwrap().to_string();
        assert!(key.starts_with("docs_"));
        assert!(key.ends_with("_shot.png"));
        assert_eq!(result.0["url"], format!("https://cdn/{key}"));

        let history = s.history.lock().recent(10);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, HistoryKind::Base64Upload);
        assert_eq!(history[0].original_filename.as_deref(), Some("shot.png"));
    }

    #[tokio::test]
    async fn test_upload_base64_validation_and_conflict() {
        let err = upload_base64(State(state()), Json(InlineUploadRequest::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let taken = state_with(
            Some(FakeStorage {
                taken: true,
                ..Default::default()
            }),
            FakeChannel::default(),
        );
        let req = InlineUploadRequest {
            base64_data: Some("aGk=".into()),
            ..Default::default()
        };
        let err = upload_base64(State(taken.clone()), Json(req)).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert!(taken.history.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_upload_is_recorded() {
        let s = state_with(
            Some(FakeStorage {
                broken: true,
                ..Default::default()
            }),
            FakeChannel::default(),
        );
        let req = InlineUploadRequest {
            base64_data: Some("aGk=".into()),
            ..Default::default()
        };
        assert!(upload_base64(State(s.clone()), Json(req)).await.is_err());
        let history = s.history.lock().recent(1);
        assert_eq!(history[0].status, HistoryStatus::Failed);
        assert!(history[0].filename.ends_with("_image.jpg"));
    }

    #[tokio::test]
    async fn test_upload_file_missing_path() {
        let req = FileUploadRequest {
            file_path: Some("/definitely/not/here.png".into()),
            ..Default::default()
        };
        let err = upload_file(State(state()), Json(req)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upload_file_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"pdf").unwrap();

        let req = FileUploadRequest {
            file_path: Some(path.to_string_lossy().into_owned()),
            ..Default::default()
        };
        let result = upload_file(State(state()), Json(req)).await.unwrap();
        let key = result.0["filename"].as_str().unwrap();
        assert!(key.starts_with("img_"));
        assert!(key.ends_with("_notes.pdf"));
    }

    #[tokio::test]
    async fn test_delete_records_history() {
        let s = state();
        let result = delete_file(State(s.clone()), Path("dir/a.png".into())).await.unwrap();
        assert_eq!(result.0["filename"], "dir/a.png");
        let history = s.history.lock().recent(1);
        assert_eq!(history[0].kind, HistoryKind::Delete);
    }

    #[tokio::test]
    async fn test_list_files_passes_prefix() {
        let query = ListQuery {
            path: Some("shots/".into()),
        };
        let result = list_files(State(state()), Query(query)).await.unwrap();
        assert_eq!(result.0["count"], 1);
        assert_eq!(result.0["files"][0]["path"], "shots/a.png");
    }

    #[tokio::test]
    async fn test_generate_filename() {
        let req = FilenameRequest {
            filename: Some("a b.png".into()),
            prefix: None,
        };
        let result = generate_filename(State(state()), Json(req)).await.unwrap();
        let unique = result.0["uniqueFilename"].as_str().unwrap();
        assert!(unique.starts_with("img_"));
        assert!(unique.ends_with("_a b.png"));

        let legacy: FilenameRequest =
            serde_json::from_value(json!({ "originalFilename": "x.jpg" })).unwrap();
        assert_eq!(legacy.filename.as_deref(), Some("x.jpg"));

        let err = generate_filename(State(state()), Json(FilenameRequest::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_push_validation() {
        let unconfigured = push(
            State(state()),
            Json(PushRequest {
                title: Some("t".into()),
                content: Some("c".into()),
                template: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(unconfigured, ApiError::Unavailable(_)));

        let channel = FakeChannel {
            configured: true,
            ..Default::default()
        };
        let s = state_with(None, channel);
        let missing = push(State(s.clone()), Json(PushRequest::default())).await.unwrap_err();
        assert!(matches!(missing, ApiError::BadRequest(_)));

        let bad_format = push(
            State(s.clone()),
            Json(PushRequest {
                title: Some("t".into()),
                content: Some("c".into()),
                template: Some("pdf".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(bad_format, ApiError::BadRequest(_)));

        let ok = push(
            State(s),
            Json(PushRequest {
                title: Some("t".into()),
                content: Some("c".into()),
                template: Some("markdown".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(ok.0["success"], true);
    }

    #[tokio::test]
    async fn test_mode_routes_without_scheduler() {
        let s = state();
        let current = current_mode(State(s.clone())).await;
        assert_eq!(current.0["schedulerStatus"], "not_initialized");

        let err = switch_mode(
            State(s),
            Json(SwitchModeRequest {
                mode: Some("production".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_switch_mode() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("Desktop")).unwrap();
        let s = scheduled_state(root.path());

        let err = switch_mode(
            State(s.clone()),
            Json(SwitchModeRequest {
                mode: Some("hourly".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let result = switch_mode(
            State(s.clone()),
            Json(SwitchModeRequest {
                mode: Some("test".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(result.0["mode"], "continuous");

        let current = current_mode(State(s.clone())).await;
        assert_eq!(current.0["schedulerStatus"], "running");
        assert_eq!(current.0["status"]["hasContinuousTimer"], true);

        s.scheduler.as_ref().unwrap().stop().await;
        let current = current_mode(State(s)).await;
        assert_eq!(current.0["schedulerStatus"], "stopped");
    }

    #[tokio::test]
    async fn test_scan_and_upload_desktop_files() {
        let root = tempfile::tempdir().unwrap();
        let desk = root.path().join("Desktop");
        std::fs::create_dir(&desk).unwrap();
        let name = today_name("meet-", "png");
        std::fs::write(desk.join(&name), b"png").unwrap();
        std::fs::write(desk.join("meet-19990101.png"), b"old").unwrap();
        let s = scheduled_state(root.path());

        let scanned = scan_desktop(State(s.clone())).await.unwrap();
        assert_eq!(scanned.0["count"], 1);
        assert_eq!(scanned.0["files"][0]["name"], name.as_str());

        let result = upload_desktop_files(State(s.clone())).await.unwrap();
        assert_eq!(result.0["total"], 1);
        assert_eq!(result.0["successCount"], 1);
        assert!(root.path().join("backup").join(&name).exists());

        let history = s.history.lock().recent(10);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, HistoryKind::DesktopUpload);
        assert_eq!(history[0].method, "batch");
        assert_eq!(history[0].original_filename.as_deref(), Some(name.as_str()));

        let again = upload_desktop_files(State(s)).await.unwrap();
        assert_eq!(again.0["total"], 0);
    }

    #[tokio::test]
    async fn test_scan_desktop_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let s = scheduled_state(root.path());
        let err = scan_desktop(State(s)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_history_pagination() {
        let s = state();
        for i in 0..5 {
            s.record(HistoryRecord::new(
                HistoryKind::FileUpload,
                format!("f{i}"),
                HistoryStatus::Success,
            ));
        }
        let query = HistoryQuery {
            limit: Some(2),
            offset: Some(1),
        };
        let result = history(State(s.clone()), Query(query)).await;
        assert_eq!(result.0["history"][0]["filename"], "f3");
        assert_eq!(result.0["pagination"]["total"], 5);
        assert_eq!(result.0["pagination"]["hasMore"], true);
        assert_eq!(result.0["stats"]["successful"], 5);

        let last = history(
            State(s),
            Query(HistoryQuery {
                limit: Some(10),
                offset: Some(3),
            }),
        )
        .await;
        assert_eq!(last.0["pagination"]["hasMore"], false);
        assert_eq!(last.0["history"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_not_found_reports_path() {
        let uri: Uri = "/api/nope".parse().unwrap();
        let (status, body) = not_found(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.0["path"], "/api/nope");
    }
}
