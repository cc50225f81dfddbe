//! Tournament state on the local filesystem.
//!
//! The pairing core never touches storage; this module plays the surrounding
//! system's part for the CLI and tests:
//! - Per-round player snapshots (JSON)
//! - Pairing and result journals (JSONL)
//! - The collaborator traits the core's callers implement

mod file_store;
pub mod jsonl;

pub use file_store::{FileStore, PlayedRound};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::models::{HistoryError, RoundPairing, RoundResults, TournamentSnapshot};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Cannot apply round: {0}")]
    History(#[from] HistoryError),
}

/// Supplies the player snapshot a round is paired from.
pub trait SnapshotProvider {
    fn snapshot(&self, round: u32) -> Result<TournamentSnapshot, StorageError>;
}

/// Receives a played round so the next snapshot reflects it.
pub trait HistoryConsumer {
    fn record_round(
        &mut self,
        pairing: &RoundPairing,
        results: &RoundResults,
    ) -> Result<TournamentSnapshot, StorageError>;
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn tournaments_dir(&self) -> PathBuf {
        self.data_dir.join("tournaments")
    }

    /// Directory of one tournament. Ids are single path components.
    pub fn tournament_dir(&self, tournament_id: &str) -> Result<PathBuf, StorageError> {
        let valid = !tournament_id.is_empty()
            && tournament_id != "."
            && tournament_id != ".."
            && !tournament_id.contains(['/', '\\']);
        if !valid {
            return Err(StorageError::InvalidPath(format!(
                "tournament id {:?} is not a plain directory name",
                tournament_id
            )));
        }
        Ok(self.tournaments_dir().join(tournament_id))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Read a JSON document.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    if !path.exists() {
        return Err(StorageError::PathNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write a pretty-printed JSON document, creating parent directories.
///
/// The document is written beside `path` and renamed into place, so readers
/// see either the old file or the complete new one.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, serde_json::to_string_pretty(value)?)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}
