//! JSONL (JSON Lines) journals.
//!
//! Pairings and played rounds are append-only: each line is one JSON record,
//! written once and never rewritten in place.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

/// Journal kinds kept per tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Journal {
    Pairings,
    Rounds,
}

impl Journal {
    pub fn filename(&self) -> &'static str {
        match self {
            Journal::Pairings => "pairings.jsonl",
            Journal::Rounds => "rounds.jsonl",
        }
    }
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Writer for a journal inside a tournament directory.
    pub fn for_journal(tournament_dir: &Path, journal: Journal) -> Self {
        Self::new(tournament_dir.join(journal.filename()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_dir(&self) -> Result<(), super::StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append one record.
    pub fn append(&self, record: &T) -> Result<(), super::StorageError> {
        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", serde_json::to_string(record)?)?;
        writer.flush()?;

        debug!("Appended record to {:?}", self.path);
        Ok(())
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn for_journal(tournament_dir: &Path, journal: Journal) -> Self {
        Self::new(tournament_dir.join(journal.filename()))
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read every record. A missing file reads as empty; unparseable lines
    /// are logged and skipped.
    pub fn read_all(&self) -> Result<Vec<T>, super::StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        "Failed to parse line {} in {:?}: {}",
                        index + 1,
                        self.path,
                        e
                    );
                }
            }
        }

        debug!("Read {} records from {:?}", records.len(), self.path);
        Ok(records)
    }

    /// Read records matching a predicate.
    pub fn read_where<F>(&self, predicate: F) -> Result<Vec<T>, super::StorageError>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self.read_all()?.into_iter().filter(predicate).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Game, RoundPairing, SnapshotId};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn pairing(round: u32, white: u32, black: u32) -> RoundPairing {
        RoundPairing {
            round,
            snapshot_id: SnapshotId::from("abc"),
            games: vec![Game {
                board: 1,
                white,
                black,
            }],
            bye: None,
        }
    }

    #[test]
    fn test_append_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let writer = JsonlWriter::for_journal(temp_dir.path(), Journal::Pairings);
        let reader: JsonlReader<RoundPairing> =
            JsonlReader::for_journal(temp_dir.path(), Journal::Pairings);

        assert!(!reader.exists());
        writer.append(&pairing(1, 1, 2)).unwrap();
        writer.append(&pairing(2, 2, 1)).unwrap();

        let read = reader.read_all().unwrap();
        assert_eq!(read, vec![pairing(1, 1, 2), pairing(2, 2, 1)]);
        assert!(writer.path().ends_with("pairings.jsonl"));
    }

    #[test]
    fn test_read_missing_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let reader: JsonlReader<RoundPairing> =
            JsonlReader::new(temp_dir.path().join("nonexistent.jsonl"));
        assert!(reader.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_read_all_skips_bad_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad_lines.jsonl");
        let good = serde_json::to_string(&pairing(1, 1, 2)).unwrap();
        std::fs::write(&path, format!("{}\nnot-valid-json\n\n{}\n", good, good)).unwrap();

        let reader: JsonlReader<RoundPairing> = JsonlReader::new(path);
        assert_eq!(reader.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_read_where() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("filter.jsonl");
        let writer = JsonlWriter::new(path.clone());
        for record in [pairing(1, 1, 2), pairing(2, 3, 4), pairing(2, 5, 6)] {
            writer.append(&record).unwrap();
        }

        let reader: JsonlReader<RoundPairing> = JsonlReader::new(path);
        let round_two = reader.read_where(|p| p.round == 2).unwrap();
        assert_eq!(round_two.len(), 2);
        assert_eq!(round_two[1].games[0].white, 5);
    }

    #[test]
    fn test_journal_filenames() {
        assert_eq!(Journal::Pairings.filename(), "pairings.jsonl");
        assert_eq!(Journal::Rounds.filename(), "rounds.jsonl");
    }
}
