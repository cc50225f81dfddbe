//! File-backed tournament state.
//!
//! Layout under `<data_dir>/tournaments/<id>/`:
//! - `snapshots/round-NNN.json`: players going into round NNN
//! - `pairings.jsonl`: every pairing produced, in order
//! - `rounds.jsonl`: every played round with its results

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::jsonl::{Journal, JsonlReader, JsonlWriter};
use super::{load_json, save_json, HistoryConsumer, SnapshotProvider, StorageConfig, StorageError};
use crate::models::{apply_round, Player, RoundPairing, RoundResults, Score, TournamentSnapshot};

/// A round as played: its pairing plus the board results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayedRound {
    pub pairing: RoundPairing,
    pub results: RoundResults,
}

/// One tournament's snapshots and journals on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    bye_points: Score,
}

impl FileStore {
    /// Open (without creating) the store for `tournament_id`.
    pub fn open(
        config: &StorageConfig,
        tournament_id: &str,
        bye_points: Score,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            dir: config.tournament_dir(tournament_id)?,
            bye_points,
        })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn snapshots_dir(&self) -> PathBuf {
        self.dir.join("snapshots")
    }

    fn snapshot_path(&self, round: u32) -> PathBuf {
        self.snapshots_dir().join(format!("round-{:03}.json", round))
    }

    /// Register the starting field as the round 1 snapshot.
    pub fn init(&self, players: Vec<Player>) -> Result<TournamentSnapshot, StorageError> {
        let snapshot = TournamentSnapshot { round: 1, players };
        self.save_snapshot(&snapshot)?;
        info!(
            "Initialised tournament at {:?} with {} players",
            self.dir,
            snapshot.players.len()
        );
        Ok(snapshot)
    }

    pub fn save_snapshot(&self, snapshot: &TournamentSnapshot) -> Result<(), StorageError> {
        save_json(&self.snapshot_path(snapshot.round), snapshot)
    }

    /// Highest round with a stored snapshot.
    pub fn latest_round(&self) -> Result<Option<u32>, StorageError> {
        let dir = self.snapshots_dir();
        if !dir.exists() {
            return Ok(None);
        }

        let mut latest = None;
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let round = name
                .to_str()
                .and_then(|n| n.strip_prefix("round-"))
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|n| n.parse::<u32>().ok());
            if let Some(round) = round {
                latest = latest.max(Some(round));
            }
        }
        Ok(latest)
    }

    pub fn append_pairing(&self, pairing: &RoundPairing) -> Result<(), StorageError> {
        JsonlWriter::for_journal(&self.dir, Journal::Pairings).append(pairing)
    }

    /// Pairings recorded for `round`, oldest first.
    pub fn pairings_for(&self, round: u32) -> Result<Vec<RoundPairing>, StorageError> {
        let reader: JsonlReader<RoundPairing> =
            JsonlReader::for_journal(&self.dir, Journal::Pairings);
        reader.read_where(|p| p.round == round)
    }

    pub fn played_rounds(&self) -> Result<Vec<PlayedRound>, StorageError> {
        JsonlReader::for_journal(&self.dir, Journal::Rounds).read_all()
    }
}

impl SnapshotProvider for FileStore {
    fn snapshot(&self, round: u32) -> Result<TournamentSnapshot, StorageError> {
        load_json(&self.snapshot_path(round))
    }
}

impl HistoryConsumer for FileStore {
    /// Store the snapshot for the round after `pairing`, then journal the round.
    ///
    /// The journal only ever names rounds whose next snapshot is on disk.
    fn record_round(
        &mut self,
        pairing: &RoundPairing,
        results: &RoundResults,
    ) -> Result<TournamentSnapshot, StorageError> {
        let current = self.snapshot(pairing.round)?;
        let players = apply_round(&current.players, pairing, results, self.bye_points)?;

        let next = TournamentSnapshot {
            round: pairing.round + 1,
            players,
        };
        self.save_snapshot(&next)?;

        JsonlWriter::for_journal(&self.dir, Journal::Rounds).append(&PlayedRound {
            pairing: pairing.clone(),
            results: results.clone(),
        })?;
        debug!("Recorded round {} in {:?}", pairing.round, self.dir);
        Ok(next)
    }
}
