//! Workout validation.
//!
//! Two levels of checks:
//! - playability, required before a session may start
//! - save checks, required before a workout enters the library

use crate::{Error, Result, Workout};
use std::collections::HashSet;

impl Workout {
    /// Collect every reason this workout cannot be played
    ///
    /// Returns an empty list for a playable workout.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.exercises.is_empty() {
            errors.push(format!("Workout '{}' has no exercises", self.id));
        }

        for (i, ex) in self.exercises.iter().enumerate() {
            if ex.name.trim().is_empty() {
                errors.push(format!("Exercise #{} has empty name", i + 1));
            }
            if ex.duration == 0 && ex.rep_count() == 0 {
                errors.push(format!(
                    "Exercise #{} ('{}') needs a duration or reps greater than 0",
                    i + 1,
                    ex.name
                ));
            }
        }

        errors
    }

    /// Playability checks plus library constraints (name, unique exercise ids)
    pub fn validate_for_save(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.id.trim().is_empty() {
            errors.push("Workout has empty ID".to_string());
        }
        if self.name.trim().is_empty() {
            errors.push("Workout has empty name".to_string());
        }

        let mut seen = HashSet::new();
        for ex in &self.exercises {
            if !seen.insert(ex.id.as_str()) {
                errors.push(format!("Duplicate exercise id '{}'", ex.id));
            }
        }

        errors.extend(self.validate());
        errors
    }

    /// Fail with `Error::InvalidWorkout` unless the workout is playable
    pub fn ensure_playable(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::invalid_workout(&errors))
        }
    }
}
