#![forbid(unsafe_code)]

//! Core domain model and playback logic for the Tempo workout player.
//!
//! This crate provides:
//! - Domain types (exercises, workouts, phases, history entries)
//! - Workout validation and superset grouping
//! - The session state machine and its derived view
//! - A timer-driven player shell with pluggable schedulers
//! - Persistence (workout library, history log, CSV rollup)

pub mod types;
pub mod error;
pub mod workout;
pub mod superset;
pub mod session;
pub mod view;
pub mod player;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod library;
pub mod history;
pub mod rollup;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::default_workouts;
pub use config::Config;
pub use superset::{SupersetGroup, SupersetIndex};
pub use session::{Effect, Event, PlaybackRules, Plan, Session, SessionState, Transition};
pub use view::{NextStep, PlayerView, SessionView};
pub use player::{
    simulate, ManualScheduler, Player, PlayerInput, Scheduler, SessionObserver, SessionSummary,
    ThreadScheduler,
};
pub use library::{build_default_library, WorkoutLibrary};
pub use history::{load_history, HistorySink, JsonlHistory};
pub use rollup::rollup_history;
