//! Completed-workout history.
//!
//! Entries are appended to a JSONL log with file locking. Older entries may
//! have been rolled up into CSV (see [`crate::rollup`]); [`load_history`]
//! reads both.

use crate::{Result, WorkoutHistoryEntry};
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// File name of the append log inside the data directory
pub const HISTORY_LOG_FILE: &str = "history.jsonl";

/// File name of the rolled-up archive inside the data directory
pub const HISTORY_CSV_FILE: &str = "history.csv";

/// Destination for completed-workout records
pub trait HistorySink {
    fn append(&mut self, entry: &WorkoutHistoryEntry) -> Result<()>;
}

/// JSONL history log with file locking
pub struct JsonlHistory {
    path: PathBuf,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistorySink for JsonlHistory {
    fn append(&mut self, entry: &WorkoutHistoryEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!(
            "Appended history entry {} ({}) to {:?}",
            entry.id,
            entry.workout_name,
            self.path
        );
        Ok(())
    }
}

/// Read all entries from a history log, skipping lines that don't parse
pub fn read_history(path: &Path) -> Result<Vec<WorkoutHistoryEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<WorkoutHistoryEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!(
                    "Skipping history entry at line {}: {}",
                    line_num + 1,
                    e
                );
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} history entries from {:?}", entries.len(), path);
    Ok(entries)
}

/// Load history from the log and the CSV archive
///
/// Entries present in both are reported once. Sorted newest first.
pub fn load_history(log_path: &Path, csv_path: &Path) -> Result<Vec<WorkoutHistoryEntry>> {
    let mut entries = Vec::new();
    let mut seen_ids = HashSet::new();

    for entry in read_history(log_path)? {
        if seen_ids.insert(entry.id) {
            entries.push(entry);
        }
    }
    let log_count = entries.len();

    if csv_path.exists() {
        for entry in crate::rollup::read_csv_history(csv_path)? {
            if seen_ids.insert(entry.id) {
                entries.push(entry);
            }
        }
    }

    entries.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    tracing::debug!(
        "Loaded {} history entries ({} from log)",
        entries.len(),
        log_count
    );
    Ok(entries)
}
