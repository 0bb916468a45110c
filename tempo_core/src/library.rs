//! Workout library persistence with file locking.
//!
//! The library is a JSON array of workouts. A missing or unreadable file
//! yields the built-in defaults so there is always something to play.

use crate::catalog::default_workouts;
use crate::{Error, Result, Workout};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the library inside the data directory
pub const LIBRARY_FILE: &str = "workouts.json";

/// The user's saved workouts, in display order
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct WorkoutLibrary {
    pub workouts: Vec<Workout>,
}

impl Default for WorkoutLibrary {
    fn default() -> Self {
        build_default_library()
    }
}

/// A library seeded with the built-in workouts
pub fn build_default_library() -> WorkoutLibrary {
    WorkoutLibrary {
        workouts: default_workouts().to_vec(),
    }
}

impl WorkoutLibrary {
    /// Load the library from a file with shared locking
    ///
    /// Returns the default library if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No library file found, using default workouts");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open library file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock library file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read library file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<WorkoutLibrary>(&contents) {
            Ok(library) => {
                tracing::debug!(
                    "Loaded {} workouts from {:?}",
                    library.workouts.len(),
                    path
                );
                Ok(library)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse library file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save the library atomically (temp file, fsync, rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "library path missing parent")
        })?)?;

        // Readers holding a shared lock see the old file until the rename
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} workouts to {:?}", self.workouts.len(), path);
        Ok(())
    }

    /// Load the library, modify it, and save it back
    ///
    /// An exclusive lock on the sidecar [`lock_path`] is held across the
    /// whole cycle, so concurrent updates apply one after the other.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut WorkoutLibrary) -> Result<()>,
    {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path(path))?;
        lock.lock_exclusive()?;

        let result = Self::load(path).and_then(|mut library| {
            f(&mut library)?;
            library.save(path)?;
            Ok(library)
        });

        lock.unlock()?;
        result
    }

    pub fn get(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    /// Insert a workout or replace the one with the same id
    ///
    /// Returns `true` if an existing workout was replaced. Workouts that
    /// fail save validation are rejected and the library is left unchanged.
    pub fn upsert(&mut self, workout: Workout) -> Result<bool> {
        let errors = workout.validate_for_save();
        if !errors.is_empty() {
            return Err(Error::invalid_workout(&errors));
        }

        match self.workouts.iter_mut().find(|w| w.id == workout.id) {
            Some(existing) => {
                *existing = workout;
                Ok(true)
            }
            None => {
                self.workouts.push(workout);
                Ok(false)
            }
        }
    }

    /// Remove a workout by id, returning it
    pub fn remove(&mut self, id: &str) -> Result<Workout> {
        let pos = self
            .workouts
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| Error::WorkoutNotFound(id.to_string()))?;
        Ok(self.workouts.remove(pos))
    }
}

/// Sidecar file that serializes [`WorkoutLibrary::update`] callers
pub fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}
