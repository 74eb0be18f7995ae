//! Core data types shared across DeskDrop crates.

pub mod history;
pub mod schedule;
pub mod storage;
pub mod upload;

pub use history::{History, HistoryKind, HistoryRecord, HistoryStats, HistoryStatus, MAX_HISTORY_RECORDS};
pub use schedule::{ScheduleMode, SchedulerState, SchedulerStatus};
pub use storage::{StorageInfo, StoredObject};
pub use upload::{CycleReport, FileCandidate, IMAGE_EXTENSIONS, UploadResult, image_urls, is_image_name};
