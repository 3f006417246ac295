//! Snapshot backup files.
//!
//! A backup is a single pretty-printed JSON document capturing the inbox,
//! today, projects, and areas views at one point in time. Snapshots are
//! immutable once written; restore only reads them back (see the server's
//! `restore_things3` tool).

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Literal version tag embedded in every snapshot.
pub const SNAPSHOT_VERSION: &str = "1.0.0";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Backup file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("backup I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("backup file is not a valid snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read-only projection of a to do or project, reconstructed fresh on every
/// query. No identity is carried across calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemView {
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: String,
}

/// Read-only projection of an area. Areas carry a title only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaView {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: String,
    pub version: String,
    pub data: SnapshotData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotData {
    pub inbox: Vec<ItemView>,
    pub today: Vec<ItemView>,
    pub projects: Vec<ItemView>,
    pub areas: Vec<AreaView>,
}

impl Snapshot {
    /// Stamp `data` with the current UTC time and the snapshot version.
    pub fn now(data: SnapshotData) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: SNAPSHOT_VERSION.to_string(),
            data,
        }
    }
}

/// `things3_backup_<unix-ms>.json` under `base`, or the desktop directory
/// (falling back to home, then the working directory) when no base is given.
pub fn default_backup_path(base: Option<&Path>) -> PathBuf {
    let dir = base.map(Path::to_path_buf).unwrap_or_else(|| {
        dirs::desktop_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    dir.join(format!(
        "things3_backup_{}.json",
        Utc::now().timestamp_millis()
    ))
}

pub async fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), BackupError> {
    let json = serde_json::to_string_pretty(snapshot)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

pub async fn read_snapshot(path: &Path) -> Result<Snapshot, BackupError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(BackupError::NotFound(path.to_path_buf()));
    }
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}
