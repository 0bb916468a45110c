//! Core domain types for the Tempo workout player.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises and workouts (the playable definition)
//! - Session phases
//! - Completed-workout history entries
//!
//! Workout JSON uses camelCase field names so files exported by the web
//! builder load unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Exercise and Workout Types
// ============================================================================

/// A single exercise within a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    /// Work phase length in seconds; 0 means rep-based
    #[serde(default)]
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_duration: Option<u32>,
    /// Informational only (kg)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(
        default,
        rename = "superSetGroupId",
        skip_serializing_if = "Option::is_none"
    )]
    pub superset_group: Option<u32>,
}

impl Exercise {
    /// A timed exercise with a single set and no rest
    pub fn timed(id: &str, name: &str, duration: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            duration,
            reps: None,
            sets: None,
            rest_duration: None,
            weight: None,
            superset_group: None,
        }
    }

    /// A rep-based exercise (advanced by user confirmation)
    pub fn rep_based(id: &str, name: &str, reps: u32) -> Self {
        Self {
            reps: Some(reps),
            ..Self::timed(id, name, 0)
        }
    }

    pub fn with_sets(mut self, sets: u32) -> Self {
        self.sets = Some(sets);
        self
    }

    pub fn with_rest(mut self, seconds: u32) -> Self {
        self.rest_duration = Some(seconds);
        self
    }

    pub fn with_weight(mut self, kg: f64) -> Self {
        self.weight = Some(kg);
        self
    }

    pub fn in_superset(mut self, group: u32) -> Self {
        self.superset_group = Some(group);
        self
    }

    /// Number of sets, treating absent or zero as one
    pub fn set_count(&self) -> u32 {
        self.sets.filter(|s| *s > 0).unwrap_or(1)
    }

    /// Rest after each work phase in seconds (0 = no rest)
    pub fn rest_seconds(&self) -> u32 {
        self.rest_duration.unwrap_or(0)
    }

    pub fn rep_count(&self) -> u32 {
        self.reps.unwrap_or(0)
    }

    pub fn is_rep_based(&self) -> bool {
        self.duration == 0
    }

    /// Phase entered when this exercise's work step begins
    pub fn work_phase(&self) -> Phase {
        if self.is_rep_based() {
            Phase::RepWait
        } else {
            Phase::Work
        }
    }

    /// Seconds this exercise contributes to the workout total, saturating
    pub fn total_seconds(&self) -> u32 {
        self.duration
            .saturating_add(self.rest_seconds())
            .saturating_mul(self.set_count())
    }
}

/// A named, ordered list of exercises
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl Workout {
    pub fn new(id: &str, name: &str, exercises: Vec<Exercise>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            exercises,
        }
    }

    /// Planned elapsed time: sum of `(duration + rest) * sets` over exercises
    pub fn total_duration_seconds(&self) -> u32 {
        self.exercises
            .iter()
            .map(Exercise::total_seconds)
            .fold(0, u32::saturating_add)
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// Phase of the current step in a session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Timed work countdown
    Work,
    /// Timed recovery after a work phase
    Rest,
    /// Rep-based step waiting for the user to confirm completion
    RepWait,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Work => "WORK",
            Phase::Rest => "REST",
            Phase::RepWait => "READY",
        };
        f.write_str(s)
    }
}

// ============================================================================
// History Types
// ============================================================================

/// A record of a completed workout
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutHistoryEntry {
    pub id: Uuid,
    pub workout_id: String,
    pub workout_name: String,
    pub completed_at: DateTime<Utc>,
    pub total_duration_seconds: u32,
    pub exercise_count: u32,
}

impl WorkoutHistoryEntry {
    /// Create an entry for a workout completed at `completed_at`
    pub fn for_workout(workout: &Workout, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            workout_id: workout.id.clone(),
            workout_name: workout.name.clone(),
            completed_at,
            total_duration_seconds: workout.total_duration_seconds(),
            exercise_count: workout.exercises.len() as u32,
        }
    }
}
