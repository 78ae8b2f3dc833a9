use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// File name of the durable "is the index ready, and with what
/// configuration" record, stored next to the index collection.
pub const SYSTEM_STATE_FILE: &str = "system_state.json";

/// The sole durable record describing a completed index build. Written only
/// after a successful build; callers read it to decide whether to rebuild and
/// to verify the embedding model still agrees with the configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemState {
    pub chunk_count: u32,
    pub embedding_model: String,
    pub generative_model: Option<String>,
    /// RFC3339 UTC timestamp of the build that produced the index.
    pub indexed_at: String,
}

/// Reads the state record. A missing file means no successful build has
/// completed at this location; that is `Ok(None)`, not an error.
pub fn load(path: &Path) -> Result<Option<SystemState>, AppError> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path).map_err(|e| {
        AppError::new("STATE_READ_FAILED", "Failed to read system state")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    let state = serde_json::from_slice(&bytes).map_err(|e| {
        AppError::new("STATE_DECODE_FAILED", "Failed to decode system state")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    Ok(Some(state))
}

/// Writes the state record atomically (tmp file, then rename) so a crash
/// mid-write can never leave a truncated record behind.
pub fn save(path: &Path, state: &SystemState) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::new("STATE_WRITE_FAILED", "Failed to create state directory")
                .with_details(format!("path={}; err={}", parent.display(), e))
        })?;
    }
    let tmp = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(state).map_err(|e| {
        AppError::new("STATE_WRITE_FAILED", "Failed to encode system state")
            .with_details(e.to_string())
    })?;
    fs::write(&tmp, json.as_bytes()).map_err(|e| {
        AppError::new("STATE_WRITE_FAILED", "Failed to write system state")
            .with_details(format!("path={}; err={}", tmp.display(), e))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        AppError::new("STATE_WRITE_FAILED", "Failed to finalize system state write")
            .with_details(format!(
                "tmp={}; dest={}; err={}",
                tmp.display(),
                path.display(),
                e
            ))
    })?;
    Ok(())
}
