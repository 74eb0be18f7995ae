//! # DeskDrop Scheduler
//!
//! Finds today's files, uploads them and decides when to do it.
//!
//! ```text
//! ┌───────────┐  fires   ┌────────────────────┐
//! │ Scheduler │ ───────▶ │ UploadOrchestrator │
//! └───────────┘          └─────────┬──────────┘
//!  production window               │ scan → upload → move → notify → artifact
//!  continuous poll                 ▼
//!                  FileScanner · StorageProvider · NotificationChannel
//! ```

pub mod artifact;
pub mod backup;
pub mod engine;
pub mod orchestrator;
pub mod scanner;
pub mod window;

pub use artifact::HtmlArtifact;
pub use engine::{Scheduler, SchedulerSettings};
pub use orchestrator::{CycleOutcome, CyclePhase, OrchestratorSettings, UploadOrchestrator};
pub use scanner::{DatePredicate, FileScanner, scan_directory};
pub use window::ProductionWindow;
