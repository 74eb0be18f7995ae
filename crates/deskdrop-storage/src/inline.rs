//! Inline (base64) payload handling shared by the backends.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use deskdrop_core::error::{DeskDropError, Result};

/// Drop a `data:<mime>;base64,` prefix if present.
pub fn strip_data_prefix(encoded: &str) -> &str {
    let trimmed = encoded.trim();
    if trimmed.starts_with("data:") {
        if let Some(idx) = trimmed.find(";base64,") {
            return &trimmed[idx + ";base64,".len()..];
        }
    }
    trimmed
}

/// Decode inline data, accepting an optional data-URL prefix.
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    let bytes = STANDARD
        .decode(strip_data_prefix(encoded))
        .map_err(|e| DeskDropError::storage(format!("invalid base64 payload: {e}")))?;
    if bytes.is_empty() {
        return Err(DeskDropError::storage("empty payload"));
    }
    Ok(bytes)
}

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
