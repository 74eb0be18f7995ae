//! Capability traits implemented by the backend crates.

pub mod channel;
pub mod notifier;
pub mod storage;

pub use channel::{LifecycleNotice, MessageFormat, NotificationChannel};
pub use notifier::{DesktopNotifier, NoticeLevel};
pub use storage::StorageProvider;
