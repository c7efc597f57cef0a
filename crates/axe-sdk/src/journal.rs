//! Durable message journal
//!
//! Every message the client sends or receives is appended to a journal
//! stream keyed by message class (`NewOrder`, `OrderAck`, `CancelOrder`,
//! `OrderFill`) before it is folded into the ledger. The ledger can then be
//! rebuilt, or incrementally caught up, by re-reading the streams from any
//! offset; the ledger's per-source watermarks keep replays idempotent.

use axe_ledger::Order;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;

/// Journal storage errors
#[derive(Debug, Error)]
pub enum JournalError {
    /// Underlying storage failed
    #[error("journal storage error: {0}")]
    Io(#[from] std::io::Error),

    /// A journal entry could not be encoded or decoded
    #[error("journal entry corrupt: {0}")]
    Entry(#[from] serde_json::Error),
}

/// Append-only storage for ledger rows, keyed by message class
///
/// Entries within a key are totally ordered by append time; `read_since`
/// must return them in that order. Implementations are shared across tasks,
/// hence `Send + Sync`.
pub trait Journal: Send + Sync {
    /// Append one row to a stream
    fn append(&self, key: &str, row: &Order) -> Result<(), JournalError>;

    /// Read all rows of a stream from `offset` (0-based entry index) on
    fn read_since(&self, key: &str, offset: u64) -> Result<Vec<Order>, JournalError>;

    /// Number of entries in a stream
    fn len(&self, key: &str) -> Result<u64, JournalError>;
}

/// In-memory journal, the default backing store
///
/// State lives only as long as the client; use [`FileJournal`] when the
/// ledger must survive restarts.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    streams: parking_lot::RwLock<HashMap<String, Vec<Order>>>,
}

impl MemoryJournal {
    /// Create an empty journal
    pub fn new() -> Self {
        Self::default()
    }
}

impl Journal for MemoryJournal {
    fn append(&self, key: &str, row: &Order) -> Result<(), JournalError> {
        self.streams
            .write()
            .entry(key.to_string())
            .or_default()
            .push(row.clone());
        Ok(())
    }

    fn read_since(&self, key: &str, offset: u64) -> Result<Vec<Order>, JournalError> {
        let streams = self.streams.read();
        let rows = match streams.get(key) {
            Some(rows) => rows.iter().skip(offset as usize).cloned().collect(),
            None => Vec::new(),
        };
        Ok(rows)
    }

    fn len(&self, key: &str) -> Result<u64, JournalError> {
        Ok(self
            .streams
            .read()
            .get(key)
            .map(|rows| rows.len() as u64)
            .unwrap_or(0))
    }
}

/// File-backed journal, one JSON-lines file per message class
///
/// Each entry is a single line; the entry offset is the line number. Appends
/// open the file each time, so concurrent clients over the same directory
/// are not supported.
#[derive(Debug, Clone)]
pub struct FileJournal {
    dir: PathBuf,
}

impl FileJournal {
    /// Create a journal rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, JournalError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn stream_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.jsonl"))
    }
}

impl Journal for FileJournal {
    fn append(&self, key: &str, row: &Order) -> Result<(), JournalError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.stream_path(key))?;
        let line = serde_json::to_string(row)?;
        writeln!(file, "{line}")?;
        trace!(key, "journal entry appended");
        Ok(())
    }

    fn read_since(&self, key: &str, offset: u64) -> Result<Vec<Order>, JournalError> {
        let path = self.stream_path(key);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(fs::File::open(path)?);
        let mut rows = Vec::new();
        for line in reader.lines().skip(offset as usize) {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            rows.push(serde_json::from_str(&line)?);
        }
        Ok(rows)
    }

    fn len(&self, key: &str) -> Result<u64, JournalError> {
        let path = self.stream_path(key);
        if !path.exists() {
            return Ok(0);
        }
        let reader = BufReader::new(fs::File::open(path)?);
        Ok(reader.lines().count() as u64)
    }
}
