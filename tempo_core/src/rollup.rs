//! CSV rollup of the history log.
//!
//! The log is appended to `history.csv` and then renamed to
//! `.processed` rather than deleted, so a failed rollup never loses entries.

use crate::{Error, Result, WorkoutHistoryEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    id: String,
    workout_id: String,
    workout_name: String,
    completed_at: String,
    total_duration_seconds: u32,
    exercise_count: u32,
}

impl From<&WorkoutHistoryEntry> for CsvRow {
    fn from(entry: &WorkoutHistoryEntry) -> Self {
        CsvRow {
            id: entry.id.to_string(),
            workout_id: entry.workout_id.clone(),
            workout_name: entry.workout_name.clone(),
            completed_at: entry.completed_at.to_rfc3339(),
            total_duration_seconds: entry.total_duration_seconds,
            exercise_count: entry.exercise_count,
        }
    }
}

impl TryFrom<CsvRow> for WorkoutHistoryEntry {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::Other(format!("Invalid UUID: {}", e)))?;
        let completed_at = DateTime::parse_from_rfc3339(&row.completed_at)
            .map_err(|e| Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        Ok(WorkoutHistoryEntry {
            id,
            workout_id: row.workout_id,
            workout_name: row.workout_name,
            completed_at,
            total_duration_seconds: row.total_duration_seconds,
            exercise_count: row.exercise_count,
        })
    }
}

/// Path the log is renamed to once rolled up
pub fn processed_path(log_path: &Path) -> PathBuf {
    let mut name = log_path.as_os_str().to_os_string();
    name.push(".processed");
    PathBuf::from(name)
}

/// Append every log entry to the CSV and archive the log
///
/// The CSV is created with headers if empty and fsynced before the log is
/// renamed. Returns the number of entries rolled up.
pub fn rollup_history(log_path: &Path, csv_path: &Path) -> Result<usize> {
    let entries = crate::history::read_history(log_path)?;

    if entries.is_empty() {
        tracing::info!("No history entries to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for entry in &entries {
        writer.serialize(CsvRow::from(entry))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} history entries to {:?}", entries.len(), csv_path);

    let archived = processed_path(log_path);
    std::fs::rename(log_path, &archived)?;
    tracing::info!("Archived history log to {:?}", archived);

    Ok(entries.len())
}

/// Read archived entries, skipping rows that don't parse
pub fn read_csv_history(path: &Path) -> Result<Vec<WorkoutHistoryEntry>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut entries = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result.map_err(Error::from).and_then(WorkoutHistoryEntry::try_from) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!("Skipping history CSV row: {}", e),
        }
    }

    Ok(entries)
}

/// Remove archived `.processed` logs from `dir`
pub fn cleanup_processed(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed log: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed history logs", count);
    }

    Ok(count)
}
