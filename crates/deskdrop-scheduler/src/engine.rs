//! Scheduling engine. Owns the single timer driver.
//!
//! At most one driver task exists at a time. It is stored and removed only
//! through `install` and `release`, so switching modes always tears the old
//! driver down first. Drivers spawn each cycle as its own task: stopping
//! cancels future firings but lets an in-flight cycle finish.

use chrono::Local;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use deskdrop_core::config::DeskDropConfig;
use deskdrop_core::error::Result;
use deskdrop_core::traits::{LifecycleNotice, NoticeLevel};
use deskdrop_core::types::{ScheduleMode, SchedulerState, SchedulerStatus};

use crate::orchestrator::{CycleOutcome, UploadOrchestrator};
use crate::window::{ProductionWindow, until};

/// Timer policy parameters.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub window: ProductionWindow,
    pub poll_interval: Duration,
    pub bootstrap_delay: Duration,
}

impl SchedulerSettings {
    pub fn from_config(config: &DeskDropConfig) -> Result<Self> {
        Ok(Self {
            window: ProductionWindow::from_config(&config.schedule)?,
            poll_interval: Duration::from_secs(config.schedule.poll_interval_secs.max(1)),
            bootstrap_delay: Duration::from_secs(config.schedule.bootstrap_delay_secs),
        })
    }
}

struct Driver {
    mode: ScheduleMode,
    handle: JoinHandle<()>,
}

struct SchedulerInner {
    driver: Option<Driver>,
    last_mode: ScheduleMode,
}

pub struct Scheduler {
    orchestrator: Arc<UploadOrchestrator>,
    settings: SchedulerSettings,
    inner: Mutex<SchedulerInner>,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<UploadOrchestrator>, settings: SchedulerSettings) -> Self {
        Self {
            orchestrator,
            settings,
            inner: Mutex::new(SchedulerInner {
                driver: None,
                last_mode: ScheduleMode::Production,
            }),
        }
    }

    pub fn orchestrator(&self) -> &Arc<UploadOrchestrator> {
        &self.orchestrator
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Arm the daily production window.
    pub async fn start(&self) {
        self.stop().await;

        let window = self.settings.window;
        let handle = tokio::spawn(production_driver(Arc::clone(&self.orchestrator), window));
        self.install(ScheduleMode::Production, handle);
        if window.contains(Local::now().time()) {
            tracing::info!("Started inside today's window, first production run is tomorrow");
        }

        tracing::info!(
            "Scheduler started (production): daily at {} + random 0-{} min, watching {}",
            window.start().format("%H:%M"),
            window.span_minutes(),
            self.orchestrator.settings().scan_dir.display()
        );
        self.announce_start(
            ScheduleMode::Production,
            &format!(
                "Checks once a day in the {}-minute window from {}",
                window.span_minutes(),
                window.start().format("%H:%M")
            ),
        )
        .await;
    }

    /// Arm fixed-interval polling with one bootstrap firing.
    pub async fn start_continuous(&self) {
        self.stop().await;

        let handle = tokio::spawn(continuous_driver(
            Arc::clone(&self.orchestrator),
            self.settings.poll_interval,
            self.settings.bootstrap_delay,
        ));
        self.install(ScheduleMode::Continuous, handle);

        tracing::info!(
            "Scheduler started (continuous): every {:?}, first run in {:?}",
            self.settings.poll_interval,
            self.settings.bootstrap_delay
        );
        self.announce_start(
            ScheduleMode::Continuous,
            &format!("Checking every {} s", self.settings.poll_interval.as_secs()),
        )
        .await;
    }

    /// Cancel the active driver. Safe to call repeatedly.
    pub async fn stop(&self) {
        let mode = match self.release() {
            Some(mode) => {
                tracing::info!("Scheduler stopped ({mode})");
                mode
            }
            None => self.inner.lock().last_mode,
        };

        self.orchestrator
            .desktop()
            .notify("DeskDrop stopped", &format!("{mode} mode stopped"), NoticeLevel::Info)
            .await;
    }

    /// `stop()` followed by the target mode's start.
    pub async fn switch_mode(&self, mode: ScheduleMode) {
        match mode {
            ScheduleMode::Production => self.start().await,
            ScheduleMode::Continuous => self.start_continuous().await,
        }
    }

    /// Run one cycle now, outside of any timer.
    pub async fn run_once(&self) -> CycleOutcome {
        tracing::info!("Manual upload cycle requested");
        self.orchestrator.execute_cycle().await
    }

    pub fn state(&self) -> SchedulerState {
        match &self.inner.lock().driver {
            Some(driver) => driver.mode.into(),
            None => SchedulerState::Stopped,
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        let inner = self.inner.lock();
        let active = inner.driver.as_ref().map(|d| d.mode);
        SchedulerStatus {
            running: active.is_some(),
            mode: inner.last_mode,
            has_production_timer: active == Some(ScheduleMode::Production),
            has_continuous_timer: active == Some(ScheduleMode::Continuous),
        }
    }

    /// The only place a driver is stored. Any previous driver is aborted.
    fn install(&self, mode: ScheduleMode, handle: JoinHandle<()>) {
        let mut inner = self.inner.lock();
        if let Some(old) = inner.driver.take() {
            tracing::warn!("Replacing active {} driver", old.mode);
            old.handle.abort();
        }
        inner.driver = Some(Driver { mode, handle });
        inner.last_mode = mode;
    }

    /// The only place a driver is removed.
    fn release(&self) -> Option<ScheduleMode> {
        let driver = self.inner.lock().driver.take()?;
        driver.handle.abort();
        Some(driver.mode)
    }

    async fn announce_start(&self, mode: ScheduleMode, detail: &str) {
        self.orchestrator
            .desktop()
            .notify(&format!("DeskDrop started ({mode})"), detail, NoticeLevel::Info)
            .await;
        self.orchestrator
            .channel()
            .send_lifecycle_notice(&LifecycleNotice::Started(mode))
            .await;
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(driver) = self.inner.get_mut().driver.take() {
            driver.handle.abort();
        }
    }
}

async fn production_driver(orchestrator: Arc<UploadOrchestrator>, window: ProductionWindow) {
    let mut after = Local::now();
    loop {
        let target = window.next_firing(&after, &mut rand::thread_rng());
        tracing::info!("Next production run at {}", target.format("%Y-%m-%d %H:%M"));
        tokio::time::sleep(until(&Local::now(), &target)).await;
        fire(&orchestrator, "production window");
        // Today's window has been used even if the clock lags the timer.
        after = target.max(Local::now());
    }
}

async fn continuous_driver(orchestrator: Arc<UploadOrchestrator>, interval: Duration, bootstrap: Duration) {
    // `interval_at` panics on a zero period.
    let interval = interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let bootstrap = tokio::time::sleep(bootstrap);
    tokio::pin!(bootstrap);
    let mut bootstrapped = false;

    loop {
        tokio::select! {
            _ = &mut bootstrap, if !bootstrapped => {
                bootstrapped = true;
                fire(&orchestrator, "bootstrap");
            }
            _ = ticker.tick() => fire(&orchestrator, "poll"),
        }
    }
}

/// Detach one cycle from the driver.
fn fire(orchestrator: &Arc<UploadOrchestrator>, reason: &'static str) {
    let orchestrator = Arc::clone(orchestrator);
    tokio::spawn(async move {
        tracing::debug!("Cycle fired by {reason}");
        match orchestrator.execute_cycle().await {
            CycleOutcome::Completed(report) => {
                tracing::debug!("Cycle ({reason}) done: {} file(s)", report.total());
            }
            CycleOutcome::NoCandidates => tracing::debug!("Cycle ({reason}) found nothing"),
            CycleOutcome::Skipped => tracing::debug!("Cycle ({reason}) skipped"),
            CycleOutcome::Failed(e) => tracing::debug!("Cycle ({reason}) failed: {e}"),
        }
    });
}
