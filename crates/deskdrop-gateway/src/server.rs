//! Shared state, router and listener.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use parking_lot::Mutex;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use deskdrop_core::config::DeskDropConfig;
use deskdrop_core::error::Result;
use deskdrop_core::traits::{NotificationChannel, StorageProvider};
use deskdrop_core::types::{History, HistoryRecord};
use deskdrop_scheduler::Scheduler;

use crate::error::ApiError;
use crate::routes;

/// Inline uploads arrive as base64 JSON bodies.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

pub struct AppState {
    pub config: DeskDropConfig,
    /// `None` when no backend is configured; storage routes then answer 503.
    pub storage: Option<Arc<dyn StorageProvider>>,
    pub channel: Arc<dyn NotificationChannel>,
    pub scheduler: Option<Arc<Scheduler>>,
    pub history: Mutex<History>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: DeskDropConfig,
        storage: Option<Arc<dyn StorageProvider>>,
        channel: Arc<dyn NotificationChannel>,
        scheduler: Option<Arc<Scheduler>>,
    ) -> Self {
        Self {
            config,
            storage,
            channel,
            scheduler,
            history: Mutex::new(History::default()),
            start_time: Instant::now(),
        }
    }

    pub fn storage(&self) -> std::result::Result<&Arc<dyn StorageProvider>, ApiError> {
        self.storage
            .as_ref()
            .ok_or_else(|| ApiError::Unavailable("storage backend is not configured".into()))
    }

    pub fn scheduler(&self) -> std::result::Result<&Arc<Scheduler>, ApiError> {
        self.scheduler
            .as_ref()
            .ok_or_else(|| ApiError::Unavailable("scheduler is not initialized".into()))
    }

    pub fn provider_name(&self) -> &str {
        self.storage.as_ref().map_or("none", |s| s.name())
    }

    pub fn record(&self, record: HistoryRecord) {
        self.history.lock().push(record);
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/api/storage-info", get(routes::storage_info))
        .route("/api/upload-base64", post(routes::upload_base64))
        .route("/api/upload-file", post(routes::upload_file))
        .route("/api/file-exists/{*key}", get(routes::file_exists))
        .route("/api/delete/{*key}", delete(routes::delete_file))
        .route("/api/files", get(routes::list_files))
        .route("/api/scan-desktop", get(routes::scan_desktop))
        .route("/api/upload-desktop-files", post(routes::upload_desktop_files))
        .route("/api/generate-filename", post(routes::generate_filename))
        .route("/api/push", post(routes::push))
        .route("/api/switch-mode", post(routes::switch_mode))
        .route("/api/current-mode", get(routes::current_mode))
        .route("/api/history", get(routes::history))
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve(
    state: Arc<AppState>,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        "Gateway listening on http://{addr} (storage: {})",
        state.provider_name()
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("Gateway stopped");
    Ok(())
}
