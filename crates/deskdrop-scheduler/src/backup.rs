//! Move uploaded files out of the scan directory.
//!
//! Targets are never overwritten: a name clash gets a UTC timestamp suffix,
//! then a counter if even that is taken.

use chrono::Utc;
use std::path::{Path, PathBuf};

use deskdrop_core::error::{DeskDropError, Result};
use deskdrop_core::naming::split_name;

/// Move `source` into `backup_dir` and return the final path.
pub async fn move_to_backup(source: &Path, backup_dir: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DeskDropError::Other(format!("not a file path: {}", source.display())))?;

    if !tokio::fs::try_exists(backup_dir).await.unwrap_or(false) {
        tracing::info!("Creating backup directory: {}", backup_dir.display());
    }
    tokio::fs::create_dir_all(backup_dir).await?;

    let target = free_target(backup_dir, file_name).await?;

    // Copy then delete, so a cross-device backup directory still works.
    tokio::fs::copy(source, &target).await?;
    if let Err(e) = tokio::fs::remove_file(source).await {
        // Leave a single copy behind: the original stays put on failure.
        let _ = tokio::fs::remove_file(&target).await;
        return Err(e.into());
    }

    tracing::info!(
        "Moved to backup: {file_name} -> {}",
        target.file_name().and_then(|n| n.to_str()).unwrap_or(file_name)
    );
    Ok(target)
}

/// Longest file name most filesystems accept, in bytes.
const MAX_NAME_BYTES: usize = 255;
/// Counter suffixes tried after the timestamped name is taken.
const MAX_COLLISION_ATTEMPTS: u32 = 1000;

async fn free_target(dir: &Path, file_name: &str) -> Result<PathBuf> {
    let direct = dir.join(file_name);
    if !exists(&direct).await? {
        return Ok(direct);
    }

    let (base, ext) = split_name(file_name);
    let stamp = collision_stamp();
    let stamped = dir.join(fit_name(base, &format!("_{stamp}"), ext));
    if !exists(&stamped).await? {
        return Ok(stamped);
    }

    for n in 1..=MAX_COLLISION_ATTEMPTS {
        let candidate = dir.join(fit_name(base, &format!("_{stamp}_{n}"), ext));
        if !exists(&candidate).await? {
            return Ok(candidate);
        }
    }
    Err(DeskDropError::backup(format!(
        "no free backup name for {file_name} after {MAX_COLLISION_ATTEMPTS} attempts"
    )))
}

/// `{base}{suffix}{ext}`, with `base` shortened on a char boundary so the
/// result stays within [`MAX_NAME_BYTES`].
fn fit_name(base: &str, suffix: &str, ext: &str) -> String {
    let budget = MAX_NAME_BYTES.saturating_sub(suffix.len() + ext.len());
    let mut cut = base.len().min(budget);
    while !base.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{suffix}{ext}", &base[..cut])
}

/// ISO-8601 UTC with `:` and `.` replaced, safe on every filesystem.
fn collision_stamp() -> String {
    Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

async fn exists(path: &Path) -> Result<bool> {
    tokio::fs::try_exists(path).await.map_err(|e| {
        DeskDropError::backup(format!("cannot check {}: {e}", path.display()))
    })
}
