//! # DeskDrop Core
//!
//! Shared vocabulary for every DeskDrop crate: the error type, the data
//! model passed between scanner, orchestrator and notification layer, the
//! capability traits each backend implements, and the configuration file.

pub mod config;
pub mod error;
pub mod naming;
pub mod traits;
pub mod types;

pub use config::DeskDropConfig;
pub use error::{DeskDropError, Result};
