//! # DeskDrop Channels
//!
//! Outbound notification surfaces:
//! - [`PushPlusChannel`]: summary and lifecycle pushes through PushPlus
//! - [`desktop`]: transient local notices (log-only or OS command)
//! - [`content`]: pure HTML renderers for every push body

pub mod content;
pub mod desktop;
pub mod pushplus;

pub use desktop::{CommandNotifier, TracingNotifier, create_notifier};
pub use pushplus::PushPlusChannel;
