//! Error types for the tempo_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tempo_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workout failed playability or save checks
    #[error("Invalid workout: {0}")]
    InvalidWorkout(String),

    /// No workout with the requested id in the library
    #[error("Workout not found: {0}")]
    WorkoutNotFound(String),

    /// Session playback error
    #[error("Session error: {0}")]
    Session(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an `InvalidWorkout` error from a list of validation problems
    pub fn invalid_workout(problems: &[String]) -> Self {
        Error::InvalidWorkout(problems.join("; "))
    }
}
