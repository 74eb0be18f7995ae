//! One upload cycle: scan, upload each candidate, move it to backup,
//! aggregate, notify, and append the day's artifact.
//!
//! Per-file problems never abort a cycle. The cycle body runs in its own
//! task so even a panic comes back as [`CycleOutcome::Failed`] instead of
//! taking down the timer that fired it.

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use deskdrop_core::config::DeskDropConfig;
use deskdrop_core::traits::{
    DesktopNotifier, LifecycleNotice, NoticeLevel, NotificationChannel, StorageProvider,
};
use deskdrop_core::types::{CycleReport, FileCandidate, UploadResult};

use crate::artifact::HtmlArtifact;
use crate::backup;
use crate::scanner::{DatePredicate, FileScanner};

/// Filesystem layout and key prefix for scheduled cycles.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub scan_dir: PathBuf,
    pub tag: String,
    pub batch_prefix: String,
    pub backup_dir: PathBuf,
    pub artifact_dir: PathBuf,
}

impl OrchestratorSettings {
    pub fn from_config(config: &DeskDropConfig) -> Self {
        Self {
            scan_dir: config.scan_dir(),
            tag: config.scan.tag.clone(),
            batch_prefix: config.scan.batch_prefix.clone(),
            backup_dir: config.backup_dir(),
            artifact_dir: config.artifact_dir(),
        }
    }
}

/// Where a running cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    Scanning,
    Uploading,
    Aggregating,
    Notifying,
    ArtifactRendering,
}

#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// The scan found nothing; no summary was pushed.
    NoCandidates,
    /// Another cycle was still in flight.
    Skipped,
    /// The cycle died; error notices have been sent.
    Failed(String),
}

impl CycleOutcome {
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            CycleOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

pub struct UploadOrchestrator {
    storage: Arc<dyn StorageProvider>,
    channel: Arc<dyn NotificationChannel>,
    desktop: Arc<dyn DesktopNotifier>,
    scanner: FileScanner,
    artifact: HtmlArtifact,
    settings: OrchestratorSettings,
    fixed_date: Option<NaiveDate>,
    in_flight: AtomicBool,
    phase: Mutex<CyclePhase>,
}

impl UploadOrchestrator {
    pub fn new(
        storage: Arc<dyn StorageProvider>,
        channel: Arc<dyn NotificationChannel>,
        desktop: Arc<dyn DesktopNotifier>,
        settings: OrchestratorSettings,
    ) -> Self {
        let scanner = FileScanner::new(&settings.scan_dir, DatePredicate::new(settings.tag.clone()));
        let artifact = HtmlArtifact::new(&settings.artifact_dir);
        Self {
            storage,
            channel,
            desktop,
            scanner,
            artifact,
            settings,
            fixed_date: None,
            in_flight: AtomicBool::new(false),
            phase: Mutex::new(CyclePhase::Idle),
        }
    }

    /// Evaluate the naming predicate against `date` instead of today.
    pub fn with_fixed_date(mut self, date: NaiveDate) -> Self {
        self.fixed_date = Some(date);
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn storage(&self) -> &Arc<dyn StorageProvider> {
        &self.storage
    }

    pub fn channel(&self) -> &Arc<dyn NotificationChannel> {
        &self.channel
    }

    pub fn desktop(&self) -> &Arc<dyn DesktopNotifier> {
        &self.desktop
    }

    pub fn phase(&self) -> CyclePhase {
        *self.phase.lock()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn today(&self) -> NaiveDate {
        self.fixed_date.unwrap_or_else(|| Local::now().date_naive())
    }

    fn set_phase(&self, phase: CyclePhase) {
        *self.phase.lock() = phase;
    }

    /// Today's candidates, without uploading anything.
    pub async fn scan_candidates(&self) -> Vec<FileCandidate> {
        self.scanner.scan_on(self.today()).await
    }

    /// Run one cycle. Overlapping calls return [`CycleOutcome::Skipped`].
    pub async fn execute_cycle(self: &Arc<Self>) -> CycleOutcome {
        let Some(guard) = CycleGuard::acquire(self) else {
            tracing::warn!("Upload cycle already in flight, skipping this firing");
            return CycleOutcome::Skipped;
        };

        let this = Arc::clone(self);
        let task = tokio::spawn(async move {
            let _guard = guard;
            this.run_cycle().await
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => self.report_fatal(format!("cycle task failed: {e}")).await,
        }
    }

    async fn run_cycle(&self) -> CycleOutcome {
        let date = self.today();
        tracing::info!("=== Upload cycle started ({date}) ===");

        self.set_phase(CyclePhase::Scanning);
        let candidates = self.scanner.scan_on(date).await;
        if candidates.is_empty() {
            tracing::info!("No matching files in {}", self.settings.scan_dir.display());
            self.desktop
                .notify(
                    "Upload check",
                    &format!("No matching {} files found", self.settings.tag),
                    NoticeLevel::Info,
                )
                .await;
            return CycleOutcome::NoCandidates;
        }

        tracing::info!("Found {} candidate(s):", candidates.len());
        for c in &candidates {
            tracing::info!("- {} ({:.2} KB)", c.name, c.size_kb());
        }

        self.set_phase(CyclePhase::Uploading);
        let mut results = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            results.push(self.upload_candidate(candidate).await);
        }

        self.set_phase(CyclePhase::Aggregating);
        let report = CycleReport::from_results(results);
        tracing::info!(
            "Upload finished: {} succeeded, {} failed",
            report.successes.len(),
            report.failures.len()
        );
        self.notify_desktop(&report).await;

        self.set_phase(CyclePhase::Notifying);
        let pushed = self
            .channel
            .send_cycle_summary(&report.successes, &report.failures)
            .await;

        if !pushed {
            tracing::warn!("Summary push not delivered, skipping artifact");
        } else if !report.successes.is_empty() {
            self.set_phase(CyclePhase::ArtifactRendering);
            match self.artifact.append(&report.successes, date).await {
                Ok(Some(path)) => tracing::debug!("Artifact written: {}", path.display()),
                Ok(None) => tracing::debug!("No image uploads, artifact skipped"),
                Err(e) => tracing::error!("Failed to write artifact: {e}"),
            }
        }

        tracing::info!("=== Upload cycle finished ===");
        CycleOutcome::Completed(report)
    }

    async fn upload_candidate(&self, candidate: &FileCandidate) -> UploadResult {
        let key = self
            .storage
            .generate_unique_name(&candidate.name, &self.settings.batch_prefix);
        tracing::info!("Uploading {} -> {key}", candidate.name);

        let Some(url) = self.storage.upload_file(&candidate.path, &key).await else {
            tracing::error!("Upload failed: {}", candidate.name);
            return UploadResult::failed(&candidate.name, key);
        };
        tracing::info!("Uploaded {}: {url}", candidate.name);

        let moved = match backup::move_to_backup(&candidate.path, &self.settings.backup_dir).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Could not move {} to backup: {e}", candidate.name);
                false
            }
        };

        UploadResult::succeeded(&candidate.name, key, url, moved)
    }

    async fn notify_desktop(&self, report: &CycleReport) {
        if !report.successes.is_empty() {
            let lines: Vec<String> = report
                .successes
                .iter()
                .map(|r| {
                    let mark = if r.moved_to_backup { " ✓" } else { " (move failed)" };
                    format!("{}{mark}", r.source_name)
                })
                .collect();
            let message = format!(
                "Uploaded {} file(s), moved {} to backup:\n{}",
                report.successes.len(),
                report.moved_count(),
                lines.join("\n")
            );
            self.desktop
                .notify("Upload succeeded", &message, NoticeLevel::Success)
                .await;
        }

        if !report.failures.is_empty() {
            let names: Vec<&str> = report.failures.iter().map(|r| r.source_name.as_str()).collect();
            let message = format!("{} file(s) failed to upload:\n{}", names.len(), names.join("\n"));
            self.desktop
                .notify("Upload failed", &message, NoticeLevel::Error)
                .await;
        }
    }

    async fn report_fatal(&self, message: String) -> CycleOutcome {
        tracing::error!("Upload cycle failed: {message}");
        self.desktop
            .notify("Upload error", &format!("Cycle failed: {message}"), NoticeLevel::Error)
            .await;
        self.channel
            .send_lifecycle_notice(&LifecycleNotice::Error(message.clone()))
            .await;
        CycleOutcome::Failed(message)
    }
}

/// Held for the lifetime of one cycle; clears the in-flight flag on drop,
/// including when the cycle task unwinds.
struct CycleGuard {
    owner: Arc<UploadOrchestrator>,
}

impl CycleGuard {
    fn acquire(owner: &Arc<UploadOrchestrator>) -> Option<Self> {
        owner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                owner: Arc::clone(owner),
            })
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.owner.set_phase(CyclePhase::Idle);
        self.owner.in_flight.store(false, Ordering::Release);
    }
}
