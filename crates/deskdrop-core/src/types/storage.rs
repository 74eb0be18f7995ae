//! Remote object listings and backend descriptions.

use serde::{Deserialize, Serialize};

/// One entry from a storage listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredObject {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Identity and metadata of a configured backend, for health reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageInfo {
    pub name: String,
    pub size: Option<u64>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}
