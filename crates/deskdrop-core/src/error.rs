//! Unified error types for DeskDrop.

use thiserror::Error;

/// Result type alias using DeskDropError.
pub type Result<T> = std::result::Result<T, DeskDropError>;

#[derive(Error, Debug)]
pub enum DeskDropError {
    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage not configured: {0}")]
    StorageNotConfigured(String),

    // Channel errors
    #[error("Channel error: {0}")]
    Channel(String),

    // Backup move errors
    #[error("Backup error: {0}")]
    Backup(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("{0}")]
    Other(String),
}

impl DeskDropError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    pub fn backup(msg: impl Into<String>) -> Self {
        Self::Backup(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }
}

impl From<toml::de::Error> for DeskDropError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e.to_string())
    }
}

impl From<toml::ser::Error> for DeskDropError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Toml(e.to_string())
    }
}
