//! Derived, read-only view of a session.
//!
//! Everything here is recomputed from the workout and the session state on
//! each read; nothing is cached.

use crate::session::{Session, SessionState};
use crate::superset::SupersetIndex;
use crate::{Exercise, Phase, Workout};
use std::fmt;

/// What comes after the current exercise
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NextStep {
    Exercise(String),
    /// The current exercise is the last one in the workout
    LastExercise,
}

impl fmt::Display for NextStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextStep::Exercise(name) => f.write_str(name),
            NextStep::LastExercise => f.write_str("Last exercise"),
        }
    }
}

/// Superset membership of the current exercise
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupersetSummary {
    pub group_id: u32,
    /// Member names in play order
    pub members: Vec<String>,
    /// 1-based position of the current exercise among `members`
    pub position: usize,
}

/// Everything a presentation layer needs to draw an in-progress session
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerView {
    pub workout_name: String,
    pub exercise_name: String,
    /// 1-based
    pub exercise_number: usize,
    pub exercise_count: usize,
    /// 1-based
    pub set_number: u32,
    pub set_count: u32,
    pub phase: Phase,
    pub time_left: u32,
    /// `mm:ss` of `time_left`
    pub clock: String,
    /// Target reps, shown while waiting on a rep-based step
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub progress_percent: f64,
    pub next_step: NextStep,
    pub superset: Option<SupersetSummary>,
    pub is_paused: bool,
}

/// The screen a session should show
#[derive(Clone, Debug, PartialEq)]
pub enum SessionView {
    Playing(PlayerView),
    Finished {
        workout_name: String,
        total_duration_seconds: u32,
    },
    /// No exercise could be resolved; offer a way back instead of playing
    LoadFailed,
}

/// Percentage of the current phase already elapsed
///
/// The phase total is the exercise duration for `Work`/`RepWait` and the
/// rest duration for `Rest`; a zero total reports 0.
pub fn progress_percent(exercise: &Exercise, phase: Phase, time_left: u32) -> f64 {
    let total = match phase {
        Phase::Work | Phase::RepWait => exercise.duration,
        Phase::Rest => exercise.rest_seconds(),
    };
    if total == 0 {
        return 0.0;
    }
    let elapsed = total.saturating_sub(time_left);
    f64::from(elapsed) / f64::from(total) * 100.0
}

/// Format seconds as zero-padded `mm:ss`
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Name of the exercise after `index`, or the last-exercise sentinel
pub fn next_step(workout: &Workout, index: usize) -> NextStep {
    match workout.exercises.get(index + 1) {
        Some(next) => NextStep::Exercise(next.name.clone()),
        None => NextStep::LastExercise,
    }
}

/// Superset summary for the exercise at `index`, if it is in a group
pub fn superset_summary(
    workout: &Workout,
    supersets: &SupersetIndex,
    index: usize,
) -> Option<SupersetSummary> {
    let group = supersets.group_of(index)?;
    Some(SupersetSummary {
        group_id: group.group_id,
        members: group
            .members()
            .iter()
            .map(|m| workout.exercises[m.exercise].name.clone())
            .collect(),
        position: group.position_of(index)?,
    })
}

/// Build the view for any workout/state pair
///
/// Tolerates a state that does not belong to the workout: an out-of-range
/// exercise or set index falls back to the first one, and a workout with no
/// exercises yields `LoadFailed`.
pub fn build_view(workout: &Workout, supersets: &SupersetIndex, state: &SessionState) -> SessionView {
    if state.is_finished {
        return SessionView::Finished {
            workout_name: workout.name.clone(),
            total_duration_seconds: workout.total_duration_seconds(),
        };
    }

    let mut index = state.exercise_index;
    if index >= workout.exercises.len() {
        tracing::warn!(
            "Exercise index {} out of range for '{}', showing first exercise",
            index,
            workout.name
        );
        index = 0;
    }

    let Some(exercise) = workout.exercises.get(index) else {
        tracing::warn!("Workout '{}' has no exercises to show", workout.name);
        return SessionView::LoadFailed;
    };

    let set_count = exercise.set_count();
    let mut set_index = state.set_index;
    if set_index >= set_count {
        tracing::warn!(
            "Set index {} out of range for '{}', showing first set",
            set_index,
            exercise.name
        );
        set_index = 0;
    }

    SessionView::Playing(PlayerView {
        workout_name: workout.name.clone(),
        exercise_name: exercise.name.clone(),
        exercise_number: index + 1,
        exercise_count: workout.exercises.len(),
        set_number: set_index + 1,
        set_count,
        phase: state.phase,
        time_left: state.time_left,
        clock: format_clock(state.time_left),
        reps: (state.phase == Phase::RepWait).then(|| exercise.rep_count()),
        weight: exercise.weight.filter(|w| *w > 0.0),
        progress_percent: progress_percent(exercise, state.phase, state.time_left),
        next_step: next_step(workout, index),
        superset: superset_summary(workout, supersets, index),
        is_paused: state.is_paused,
    })
}

impl Session {
    pub fn view(&self) -> SessionView {
        build_view(self.workout(), self.plan().supersets(), self.state())
    }
}
