//! Session playback state machine.
//!
//! The machine is a pure function `transition(plan, rules, state, event)`
//! returning the next state and the side effects to emit. `Session` is a
//! thin owner around it for callers that just want to drive a workout.
//!
//! ## Advance rules (first match wins)
//!
//! 1. Superset member with another member left in this round → that member,
//!    same set, no rest.
//! 2. Last member of a round with more rounds left → rest (if any), then the
//!    group's first member with the next set.
//! 3. Last member of the last round → rest (if anything follows), then the
//!    exercise after the group.
//! 4. Plain exercise with rest and something after it → rest.
//! 5. Next set of the same exercise.
//! 6. Next exercise, set 0.
//! 7. Finish.
//!
//! Rest is only ever inserted when a following step exists, so a workout
//! never ends on a rest phase.

use crate::superset::SupersetIndex;
use crate::{Error, Exercise, Phase, Result, Workout};
use serde::{Deserialize, Serialize};

/// Countdown cue threshold used when no configuration is supplied
pub const DEFAULT_COUNTDOWN_CUE_SECONDS: u32 = 4;

// ============================================================================
// Plan
// ============================================================================

/// A validated workout together with its derived superset index
#[derive(Clone, Debug)]
pub struct Plan {
    workout: Workout,
    supersets: SupersetIndex,
}

impl Plan {
    /// Validate `workout` and derive its superset groups
    pub fn new(workout: Workout) -> Result<Self> {
        workout.ensure_playable()?;
        let supersets = SupersetIndex::build(&workout.exercises);
        Ok(Self { workout, supersets })
    }

    pub fn workout(&self) -> &Workout {
        &self.workout
    }

    pub fn supersets(&self) -> &SupersetIndex {
        &self.supersets
    }

    pub fn len(&self) -> usize {
        self.workout.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workout.exercises.is_empty()
    }

    pub fn exercise(&self, index: usize) -> Option<&Exercise> {
        self.workout.exercises.get(index)
    }

    fn first(&self) -> &Exercise {
        // Plan::new guarantees at least one exercise
        &self.workout.exercises[0]
    }
}

// ============================================================================
// State, events and effects
// ============================================================================

/// Mutable playback state, one per active session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub exercise_index: usize,
    pub set_index: u32,
    pub phase: Phase,
    /// Seconds left in a timed phase; 0 during `RepWait`
    pub time_left: u32,
    pub is_paused: bool,
    pub is_finished: bool,
}

impl SessionState {
    /// Paused at the first set of the first exercise
    pub fn initial(plan: &Plan) -> Self {
        let first = plan.first();
        Self {
            exercise_index: 0,
            set_index: 0,
            phase: first.work_phase(),
            time_left: first.duration,
            is_paused: true,
            is_finished: false,
        }
    }

    /// Whether the scheduler should be delivering ticks
    pub fn is_running(&self) -> bool {
        !self.is_paused && !self.is_finished && self.phase != Phase::RepWait
    }

    fn enter(&mut self, exercise: &Exercise, position: Position, paused: bool) {
        self.exercise_index = position.exercise;
        self.set_index = position.set;
        self.phase = exercise.work_phase();
        self.time_left = exercise.duration;
        self.is_paused = paused;
    }
}

/// Inputs to the state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// One elapsed second
    Tick,
    /// Play/pause, or confirm reps during `RepWait`
    TogglePause,
    SkipForward,
    SkipBackward,
}

/// Side effects requested by a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Final seconds of a timed phase
    CountdownTick { remaining: u32 },
    /// The current phase completed (timer ran out or reps confirmed)
    PhaseEnd,
    /// The last step of the workout completed
    WorkoutComplete,
}

/// Result of applying one event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

/// Tunable behaviour of the machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackRules {
    /// Emit `CountdownTick` when the remaining time drops to this or below
    pub countdown_cue_seconds: u32,
}

impl Default for PlaybackRules {
    fn default() -> Self {
        Self {
            countdown_cue_seconds: DEFAULT_COUNTDOWN_CUE_SECONDS,
        }
    }
}

// ============================================================================
// Transition function
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Position {
    exercise: usize,
    set: u32,
}

/// Where the session goes once the current step completes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    /// Next member of the same superset round; never preceded by rest
    SameRound(Position),
    /// Any other following step; rest applies if configured
    After(Position),
    End,
}

/// Apply `event` to `state`
pub fn transition(
    plan: &Plan,
    rules: &PlaybackRules,
    state: &SessionState,
    event: Event,
) -> Transition {
    let mut next = normalize(plan, state);
    let mut effects = Vec::new();

    if next.is_finished {
        return Transition {
            state: next,
            effects,
        };
    }

    match event {
        Event::Tick => tick(plan, rules, &mut next, &mut effects),
        Event::TogglePause => {
            if next.phase == Phase::RepWait {
                advance(plan, &mut next, &mut effects);
            } else {
                next.is_paused = !next.is_paused;
            }
        }
        Event::SkipForward => skip_forward(plan, &mut next),
        Event::SkipBackward => skip_backward(plan, &mut next),
    }

    Transition {
        state: next,
        effects,
    }
}

fn tick(plan: &Plan, rules: &PlaybackRules, state: &mut SessionState, effects: &mut Vec<Effect>) {
    if !state.is_running() {
        tracing::trace!("Ignoring tick while not running: {:?}", state);
        return;
    }

    if state.time_left > 1 {
        state.time_left -= 1;
        if state.time_left <= rules.countdown_cue_seconds {
            effects.push(Effect::CountdownTick {
                remaining: state.time_left,
            });
        }
    } else {
        state.time_left = 0;
        advance(plan, state, effects);
    }
}

fn advance(plan: &Plan, state: &mut SessionState, effects: &mut Vec<Effect>) {
    effects.push(Effect::PhaseEnd);

    let cur = &plan.workout.exercises[state.exercise_index];
    let step = next_step(plan, state);

    if state.phase != Phase::Rest {
        if let Step::After(_) = step {
            let rest = cur.rest_seconds();
            if rest > 0 {
                tracing::debug!(
                    "Resting {}s after '{}' set {}",
                    rest,
                    cur.name,
                    state.set_index + 1
                );
                state.phase = Phase::Rest;
                state.time_left = rest;
                state.is_paused = false;
                return;
            }
        }
    }

    match step {
        Step::SameRound(position) | Step::After(position) => {
            let exercise = &plan.workout.exercises[position.exercise];
            state.enter(exercise, position, exercise.is_rep_based());
            tracing::debug!(
                "Advanced to '{}' set {} ({:?})",
                exercise.name,
                position.set + 1,
                state.phase
            );
        }
        Step::End => {
            state.is_finished = true;
            state.is_paused = true;
            effects.push(Effect::WorkoutComplete);
            tracing::info!("Workout '{}' complete", plan.workout.name);
        }
    }
}

fn next_step(plan: &Plan, state: &SessionState) -> Step {
    let index = state.exercise_index;
    let set = state.set_index;

    if let Some(group) = plan.supersets.group_of(index) {
        if let Some(member) = group.next_member(index, set) {
            return Step::SameRound(Position {
                exercise: member,
                set,
            });
        }
        if let Some(first) = group.first_in_round(set + 1) {
            return Step::After(Position {
                exercise: first,
                set: set + 1,
            });
        }
        return after_exercise(plan, group.end() - 1);
    }

    let cur = &plan.workout.exercises[index];
    if set + 1 < cur.set_count() {
        return Step::After(Position {
            exercise: index,
            set: set + 1,
        });
    }
    after_exercise(plan, index)
}

fn after_exercise(plan: &Plan, index: usize) -> Step {
    if index + 1 < plan.len() {
        Step::After(Position {
            exercise: index + 1,
            set: 0,
        })
    } else {
        Step::End
    }
}

fn skip_forward(plan: &Plan, state: &mut SessionState) {
    let index = state.exercise_index;
    let cur = &plan.workout.exercises[index];

    let position = if state.set_index + 1 < cur.set_count() {
        Position {
            exercise: index,
            set: state.set_index + 1,
        }
    } else if index + 1 < plan.len() {
        Position {
            exercise: index + 1,
            set: 0,
        }
    } else {
        tracing::debug!("Skip forward at final step ignored");
        return;
    };

    state.enter(&plan.workout.exercises[position.exercise], position, true);
}

fn skip_backward(plan: &Plan, state: &mut SessionState) {
    let index = state.exercise_index;

    let position = if state.set_index > 0 {
        Position {
            exercise: index,
            set: state.set_index - 1,
        }
    } else if index > 0 {
        let prev = &plan.workout.exercises[index - 1];
        Position {
            exercise: index - 1,
            set: prev.set_count() - 1,
        }
    } else {
        tracing::debug!("Skip backward at first step ignored");
        return;
    };

    state.enter(&plan.workout.exercises[position.exercise], position, true);
}

/// Pull a drifted state back into range
///
/// An exercise index past the end restarts at the first exercise; a set
/// index past the exercise's set count restarts that exercise. A work phase
/// that does not fit the exercise kind restarts the step; rest fits either
/// kind. Every reset re-enters the step paused.
fn normalize(plan: &Plan, state: &SessionState) -> SessionState {
    let mut next = *state;
    if next.is_finished {
        return next;
    }

    if next.exercise_index >= plan.len() {
        tracing::warn!(
            "Exercise index {} out of range for '{}' ({} exercises), resetting to 0",
            next.exercise_index,
            plan.workout.name,
            plan.len()
        );
        next.enter(plan.first(), Position { exercise: 0, set: 0 }, true);
        return next;
    }

    let cur = &plan.workout.exercises[next.exercise_index];
    if next.set_index >= cur.set_count() {
        tracing::warn!(
            "Set index {} out of range for '{}' ({} sets), resetting to 0",
            next.set_index,
            cur.name,
            cur.set_count()
        );
        let position = Position {
            exercise: next.exercise_index,
            set: 0,
        };
        next.enter(cur, position, true);
    } else if next.phase != Phase::Rest && (next.phase == Phase::RepWait) != cur.is_rep_based() {
        tracing::warn!(
            "Phase {:?} does not match '{}', restarting the step",
            next.phase,
            cur.name
        );
        let position = Position {
            exercise: next.exercise_index,
            set: next.set_index,
        };
        next.enter(cur, position, true);
    }

    next
}

// ============================================================================
// Session
// ============================================================================

/// An owned playback session over one workout
#[derive(Clone, Debug)]
pub struct Session {
    plan: Plan,
    rules: PlaybackRules,
    state: SessionState,
}

impl Session {
    /// Start a paused session, refusing workouts that cannot be played
    pub fn start(workout: Workout) -> Result<Self> {
        Self::with_rules(workout, PlaybackRules::default())
    }

    pub fn with_rules(workout: Workout, rules: PlaybackRules) -> Result<Self> {
        let plan = Plan::new(workout)?;
        let state = SessionState::initial(&plan);
        tracing::info!(
            "Starting session for '{}' ({} exercises)",
            plan.workout.name,
            plan.len()
        );
        Ok(Self { plan, rules, state })
    }

    /// Replace the workout and start over
    ///
    /// On error the current session is left untouched.
    pub fn restart(&mut self, workout: Workout) -> Result<()> {
        let plan = Plan::new(workout)?;
        self.state = SessionState::initial(&plan);
        self.plan = plan;
        tracing::info!("Session restarted with '{}'", self.plan.workout.name);
        Ok(())
    }

    /// Overwrite the state, e.g. when resuming; drift is corrected on the next event
    pub fn restore(&mut self, state: SessionState) {
        self.state = state;
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn workout(&self) -> &Workout {
        &self.plan.workout
    }

    pub fn rules(&self) -> &PlaybackRules {
        &self.rules
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The exercise at the current index, if the index is in range
    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.plan.exercise(self.state.exercise_index)
    }

    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        let Transition { state, effects } = transition(&self.plan, &self.rules, &self.state, event);
        self.state = state;
        effects
    }

    pub fn tick(&mut self) -> Vec<Effect> {
        self.apply(Event::Tick)
    }

    pub fn toggle_pause(&mut self) -> Vec<Effect> {
        self.apply(Event::TogglePause)
    }

    pub fn skip_forward(&mut self) -> Vec<Effect> {
        self.apply(Event::SkipForward)
    }

    pub fn skip_backward(&mut self) -> Vec<Effect> {
        self.apply(Event::SkipBackward)
    }

    pub fn can_skip_forward(&self) -> bool {
        match self.current_exercise() {
            Some(cur) => {
                self.state.set_index + 1 < cur.set_count()
                    || self.state.exercise_index + 1 < self.plan.len()
            }
            None => false,
        }
    }

    pub fn can_skip_backward(&self) -> bool {
        self.state.exercise_index > 0 || self.state.set_index > 0
    }

    /// Fail unless the session has reached its end
    pub fn ensure_finished(&self) -> Result<()> {
        if self.state.is_finished {
            Ok(())
        } else {
            Err(Error::Session(format!(
                "'{}' stopped at exercise {} set {}",
                self.plan.workout.name,
                self.state.exercise_index + 1,
                self.state.set_index + 1
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed_workout() -> Workout {
        Workout::new(
            "w",
            "W",
            vec![Exercise::timed("a", "Squat", 30).with_sets(2).with_rest(10)],
        )
    }

    fn superset_workout() -> Workout {
        Workout::new(
            "ss",
            "Arms",
            vec![
                Exercise::timed("a", "Curl", 30).with_sets(2).in_superset(1),
                Exercise::timed("b", "Extension", 20)
                    .with_sets(2)
                    .with_rest(15)
                    .in_superset(1),
                Exercise::timed("c", "Plank", 10),
            ],
        )
    }

    fn ticks(session: &mut Session, n: usize) -> Vec<Effect> {
        let mut effects = Vec::new();
        for _ in 0..n {
            effects.extend(session.tick());
        }
        effects
    }

    fn assert_invariants(session: &Session) {
        let state = session.state();
        if state.is_finished {
            return;
        }
        let exercises = &session.workout().exercises;
        assert!(state.exercise_index < exercises.len());
        let cur = &exercises[state.exercise_index];
        assert!(state.set_index < cur.set_count(), "{:?}", state);
        if state.phase == Phase::RepWait {
            assert_eq!(cur.duration, 0);
        }
    }

    /// Tick until finished, starting playback and confirming reps as needed
    fn run_to_end(session: &mut Session, limit: usize) -> (usize, Vec<SessionState>) {
        let mut elapsed = 0;
        let mut seen = Vec::new();
        for _ in 0..limit {
            if session.state().is_finished {
                break;
            }
            if session.state().phase == Phase::RepWait || session.state().is_paused {
                session.toggle_pause();
            } else {
                session.tick();
                elapsed += 1;
            }
            assert_invariants(session);
            seen.push(*session.state());
        }
        (elapsed, seen)
    }

    #[test]
    fn test_start_state() {
        let session = Session::start(timed_workout()).unwrap();
        let state = session.state();
        assert_eq!(state.exercise_index, 0);
        assert_eq!(state.set_index, 0);
        assert_eq!(state.phase, Phase::Work);
        assert_eq!(state.time_left, 30);
        assert!(state.is_paused);
        assert!(!state.is_finished);
    }

    #[test]
    fn test_start_rejects_empty_workout() {
        let result = Session::start(Workout::new("w", "Empty", vec![]));
        assert!(matches!(result, Err(Error::InvalidWorkout(_))));
    }

    #[test]
    fn test_rep_based_start_waits() {
        let workout = Workout::new("w", "Reps", vec![Exercise::rep_based("a", "Push-up", 10)]);
        let session = Session::start(workout).unwrap();
        assert_eq!(session.state().phase, Phase::RepWait);
        assert_eq!(session.state().time_left, 0);
    }

    #[test]
    fn test_ticks_ignored_while_paused() {
        let mut session = Session::start(timed_workout()).unwrap();
        assert!(ticks(&mut session, 5).is_empty());
        assert_eq!(session.state().time_left, 30);
    }

    #[test]
    fn test_timed_sets_with_rest_scenario() {
        let mut session = Session::start(timed_workout()).unwrap();
        session.toggle_pause();

        ticks(&mut session, 30);
        assert_eq!(session.state().phase, Phase::Rest);
        assert_eq!(session.state().time_left, 10);
        assert!(!session.state().is_paused);

        ticks(&mut session, 10);
        assert_eq!(session.state().phase, Phase::Work);
        assert_eq!(session.state().set_index, 1);
        assert_eq!(session.state().time_left, 30);
        assert!(!session.state().is_paused);

        let effects = ticks(&mut session, 30);
        assert!(session.state().is_finished);
        assert!(session.state().is_paused);
        assert_eq!(
            effects.iter().filter(|e| **e == Effect::WorkoutComplete).count(),
            1
        );
    }

    #[test]
    fn test_countdown_cues() {
        let mut session = Session::start(timed_workout()).unwrap();
        session.toggle_pause();

        let effects = ticks(&mut session, 30);
        let cues: Vec<u32> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::CountdownTick { remaining } => Some(*remaining),
                _ => None,
            })
            .collect();
        assert_eq!(cues, vec![4, 3, 2, 1]);
        assert_eq!(effects.last(), Some(&Effect::PhaseEnd));
    }

    #[test]
    fn test_countdown_cue_threshold_from_rules() {
        let rules = PlaybackRules {
            countdown_cue_seconds: 2,
        };
        let mut session = Session::with_rules(timed_workout(), rules).unwrap();
        session.toggle_pause();
        let effects = ticks(&mut session, 30);
        let cues = effects
            .iter()
            .filter(|e| matches!(e, Effect::CountdownTick { .. }))
            .count();
        assert_eq!(cues, 2);
    }

    #[test]
    fn test_rep_based_confirm_moves_to_next_rep_wait() {
        let workout = Workout::new(
            "w",
            "Reps",
            vec![
                Exercise::rep_based("a", "Push-up", 10),
                Exercise::rep_based("b", "Dips", 8),
            ],
        );
        let mut session = Session::start(workout).unwrap();

        let effects = session.toggle_pause();
        assert_eq!(effects, vec![Effect::PhaseEnd]);
        let state = session.state();
        assert_eq!(state.exercise_index, 1);
        assert_eq!(state.phase, Phase::RepWait);
        assert!(state.is_paused);

        let effects = session.toggle_pause();
        assert_eq!(effects, vec![Effect::PhaseEnd, Effect::WorkoutComplete]);
        assert!(session.state().is_finished);
    }

    #[test]
    fn test_rep_based_rest_then_next_set_waits() {
        let workout = Workout::new(
            "w",
            "Reps",
            vec![Exercise::rep_based("a", "Pull-up", 8).with_sets(2).with_rest(5)],
        );
        let mut session = Session::start(workout).unwrap();

        session.toggle_pause();
        assert_eq!(session.state().phase, Phase::Rest);
        assert!(!session.state().is_paused);

        ticks(&mut session, 5);
        let state = session.state();
        assert_eq!(state.phase, Phase::RepWait);
        assert_eq!(state.set_index, 1);
        assert!(state.is_paused);

        // Last set: no trailing rest
        session.toggle_pause();
        assert!(session.state().is_finished);
    }

    #[test]
    fn test_no_trailing_rest() {
        let workout = Workout::new(
            "w",
            "Two",
            vec![
                Exercise::timed("a", "Jack", 5).with_rest(3),
                Exercise::timed("b", "Squat", 5).with_rest(3),
            ],
        );
        let mut session = Session::start(workout).unwrap();
        session.toggle_pause();

        ticks(&mut session, 5);
        assert_eq!(session.state().phase, Phase::Rest);
        ticks(&mut session, 3);
        assert_eq!(session.state().exercise_index, 1);

        for _ in 0..5 {
            session.tick();
            assert_ne!(session.state().phase, Phase::Rest);
        }
        assert!(session.state().is_finished);
    }

    #[test]
    fn test_superset_members_have_no_rest_between() {
        let mut session = Session::start(superset_workout()).unwrap();
        session.toggle_pause();

        ticks(&mut session, 30);
        let state = session.state();
        assert_eq!(state.exercise_index, 1);
        assert_eq!(state.set_index, 0);
        assert_eq!(state.phase, Phase::Work);
        assert_eq!(state.time_left, 20);
    }

    #[test]
    fn test_superset_rounds_and_exit() {
        let mut session = Session::start(superset_workout()).unwrap();
        session.toggle_pause();

        // A0, B0, then rest from B before round 2
        ticks(&mut session, 30 + 20);
        assert_eq!(session.state().phase, Phase::Rest);
        assert_eq!(session.state().time_left, 15);
        assert_eq!(session.state().exercise_index, 1);

        ticks(&mut session, 15);
        let state = session.state();
        assert_eq!((state.exercise_index, state.set_index), (0, 1));
        assert_eq!(state.phase, Phase::Work);

        // A1, B1, rest, then plank
        ticks(&mut session, 30 + 20);
        assert_eq!(session.state().phase, Phase::Rest);
        ticks(&mut session, 15);
        let state = session.state();
        assert_eq!((state.exercise_index, state.set_index), (2, 0));

        ticks(&mut session, 10);
        assert!(session.state().is_finished);
    }

    #[test]
    fn test_superset_without_rest_jumps_back_to_first_member() {
        let workout = Workout::new(
            "w",
            "Pair",
            vec![
                Exercise::timed("a", "Row", 5).with_sets(2).in_superset(3),
                Exercise::rep_based("b", "Push-up", 12).with_sets(2).in_superset(3),
            ],
        );
        let mut session = Session::start(workout).unwrap();
        session.toggle_pause();

        ticks(&mut session, 5);
        assert_eq!(session.state().phase, Phase::RepWait);
        assert!(session.state().is_paused);

        session.toggle_pause();
        let state = session.state();
        assert_eq!((state.exercise_index, state.set_index), (0, 1));
        assert_eq!(state.phase, Phase::Work);
        assert!(!state.is_paused);
    }

    #[test]
    fn test_superset_rep_based_last_member_rests_between_rounds() {
        let workout = Workout::new(
            "w",
            "Arms",
            vec![
                Exercise::rep_based("a", "Curl", 10).with_sets(2).in_superset(1),
                Exercise::rep_based("b", "Extension", 10)
                    .with_sets(2)
                    .with_rest(4)
                    .in_superset(1),
                Exercise::timed("c", "Plank", 5),
            ],
        );
        let mut session = Session::start(workout).unwrap();

        session.toggle_pause();
        assert_eq!(session.state().exercise_index, 1);
        session.toggle_pause();
        assert_eq!(session.state().phase, Phase::Rest);
        assert_eq!(session.state().exercise_index, 1);

        ticks(&mut session, 4);
        let state = session.state();
        assert_eq!((state.exercise_index, state.set_index), (0, 1));
        assert_eq!(state.phase, Phase::RepWait);
        assert!(state.is_paused);

        session.toggle_pause();
        session.toggle_pause();
        assert_eq!(session.state().phase, Phase::Rest);
        ticks(&mut session, 4);
        let state = session.state();
        assert_eq!((state.exercise_index, state.set_index), (2, 0));
        assert_eq!(state.phase, Phase::Work);

        ticks(&mut session, 5);
        assert!(session.state().is_finished);
    }

    #[test]
    fn test_superset_final_group_has_no_trailing_rest() {
        let workout = Workout::new(
            "w",
            "Finisher",
            vec![
                Exercise::timed("a", "Swing", 5).in_superset(1).with_rest(30),
                Exercise::timed("b", "Burpee", 5).in_superset(1).with_rest(30),
            ],
        );
        let mut session = Session::start(workout).unwrap();
        session.toggle_pause();
        ticks(&mut session, 5);
        assert_eq!(session.state().exercise_index, 1);
        assert_eq!(session.state().phase, Phase::Work);
        ticks(&mut session, 5);
        assert!(session.state().is_finished);
    }

    #[test]
    fn test_superset_member_with_fewer_sets_sits_out() {
        let workout = Workout::new(
            "w",
            "Uneven",
            vec![
                Exercise::timed("a", "Curl", 3).with_sets(2).in_superset(1),
                Exercise::timed("b", "Dip", 3).with_sets(1).in_superset(1),
                Exercise::timed("c", "Press", 3).with_sets(2).in_superset(1),
            ],
        );
        let mut session = Session::start(workout).unwrap();
        let (elapsed, seen) = run_to_end(&mut session, 100);

        assert!(session.state().is_finished);
        assert_eq!(elapsed, 3 * 5);
        assert!(seen
            .iter()
            .all(|s| !(s.exercise_index == 1 && s.set_index == 1)));
    }

    #[test]
    fn test_termination_bounded_by_phase_total() {
        let workouts = vec![
            timed_workout(),
            superset_workout(),
            Workout::new(
                "r",
                "Reps with rest",
                vec![
                    Exercise::rep_based("a", "Pull-up", 8).with_sets(3).with_rest(4),
                    Exercise::timed("b", "Plank", 5).with_rest(2),
                ],
            ),
            Workout::new(
                "sr",
                "Rep superset",
                vec![
                    Exercise::timed("a", "Jack", 6),
                    Exercise::rep_based("b", "Curl", 10).with_sets(3).in_superset(1),
                    Exercise::rep_based("c", "Extension", 10)
                        .with_sets(3)
                        .with_rest(6)
                        .in_superset(1),
                    Exercise::timed("d", "Plank", 4),
                ],
            ),
            Workout::new(
                "w",
                "Mixed",
                vec![
                    Exercise::timed("a", "Jack", 7).with_sets(3).with_rest(2),
                    Exercise::timed("b", "Lunge", 4).in_superset(9).with_sets(2),
                    Exercise::timed("c", "Squat", 6).in_superset(9).with_sets(2).with_rest(5),
                    Exercise::timed("d", "Plank", 9).with_rest(4),
                ],
            ),
        ];

        for workout in workouts {
            // Upper bound: every work phase plus every rest phase
            let bound = workout.total_duration_seconds() as usize;
            let mut session = Session::start(workout).unwrap();
            let (elapsed, _) = run_to_end(&mut session, bound * 2 + 100);
            assert!(session.state().is_finished);
            assert!(elapsed <= bound, "{} > {}", elapsed, bound);
        }
    }

    #[test]
    fn test_toggle_pause_twice_is_identity() {
        let mut session = Session::start(timed_workout()).unwrap();
        let before = *session.state();
        session.toggle_pause();
        session.toggle_pause();
        assert_eq!(*session.state(), before);

        session.toggle_pause();
        ticks(&mut session, 30);
        assert_eq!(session.state().phase, Phase::Rest);
        let before = *session.state();
        session.toggle_pause();
        assert!(session.state().is_paused);
        session.toggle_pause();
        assert_eq!(*session.state(), before);
    }

    #[test]
    fn test_skip_forward_through_sets_and_exercises() {
        let workout = Workout::new(
            "w",
            "Skip",
            vec![
                Exercise::timed("a", "Jack", 30).with_sets(2).with_rest(10),
                Exercise::rep_based("b", "Push-up", 10),
            ],
        );
        let mut session = Session::start(workout).unwrap();
        session.toggle_pause();
        ticks(&mut session, 3);

        let effects = session.skip_forward();
        assert!(effects.is_empty());
        let state = *session.state();
        assert_eq!((state.exercise_index, state.set_index), (0, 1));
        assert_eq!(state.time_left, 30);
        assert!(state.is_paused);

        session.skip_forward();
        let state = *session.state();
        assert_eq!((state.exercise_index, state.set_index), (1, 0));
        assert_eq!(state.phase, Phase::RepWait);
        assert!(!session.can_skip_forward());
    }

    #[test]
    fn test_skip_forward_at_final_step_is_noop() {
        let mut session = Session::start(timed_workout()).unwrap();
        session.skip_forward();
        let before = *session.state();
        assert!(!session.can_skip_forward());
        let effects = session.skip_forward();
        assert!(effects.is_empty());
        assert_eq!(*session.state(), before);
    }

    #[test]
    fn test_skip_backward() {
        let workout = Workout::new(
            "w",
            "Back",
            vec![
                Exercise::timed("a", "Jack", 30).with_sets(3),
                Exercise::timed("b", "Squat", 20),
            ],
        );
        let mut session = Session::start(workout).unwrap();
        assert!(!session.can_skip_backward());
        let before = *session.state();
        session.skip_backward();
        assert_eq!(*session.state(), before);

        session.skip_forward();
        session.skip_forward();
        session.skip_forward();
        assert_eq!(session.state().exercise_index, 1);

        session.skip_backward();
        let state = session.state();
        assert_eq!((state.exercise_index, state.set_index), (0, 2));
        assert_eq!(state.time_left, 30);
        assert!(state.is_paused);

        session.skip_backward();
        assert_eq!(session.state().set_index, 1);
    }

    #[test]
    fn test_skip_from_rest_lands_paused_in_work() {
        let mut session = Session::start(timed_workout()).unwrap();
        session.toggle_pause();
        ticks(&mut session, 30);
        assert_eq!(session.state().phase, Phase::Rest);

        session.skip_forward();
        let state = session.state();
        assert_eq!(state.phase, Phase::Work);
        assert_eq!(state.set_index, 1);
        assert!(state.is_paused);
    }

    #[test]
    fn test_skip_ignores_superset_grouping() {
        let mut session = Session::start(superset_workout()).unwrap();
        // Raw index navigation: Curl set 2 comes before Extension
        session.skip_forward();
        let state = session.state();
        assert_eq!((state.exercise_index, state.set_index), (0, 1));
    }

    #[test]
    fn test_finished_session_ignores_events() {
        let workout = Workout::new("w", "One", vec![Exercise::rep_based("a", "Dips", 5)]);
        let mut session = Session::start(workout).unwrap();
        session.toggle_pause();
        assert!(session.state().is_finished);
        session.ensure_finished().unwrap();

        let before = *session.state();
        for event in [Event::Tick, Event::TogglePause, Event::SkipBackward] {
            assert!(session.apply(event).is_empty());
            assert_eq!(*session.state(), before);
        }
    }

    #[test]
    fn test_out_of_range_index_is_clamped() {
        let mut session = Session::start(timed_workout()).unwrap();
        let mut drifted = *session.state();
        drifted.exercise_index = 7;
        drifted.is_paused = false;
        session.restore(drifted);
        assert!(session.current_exercise().is_none());

        session.tick();
        let state = session.state();
        assert_eq!(state.exercise_index, 0);
        assert_eq!(state.set_index, 0);
        assert!(state.is_paused);
        assert_eq!(state.time_left, 30);
    }

    #[test]
    fn test_work_phase_on_rep_exercise_restarts_step() {
        let workout = Workout::new(
            "w",
            "Reps",
            vec![Exercise::rep_based("a", "Pull-up", 8).with_sets(2).with_rest(5)],
        );
        let mut session = Session::start(workout).unwrap();
        let mut drifted = *session.state();
        drifted.phase = Phase::Work;
        drifted.time_left = 9;
        drifted.set_index = 1;
        drifted.is_paused = false;
        session.restore(drifted);

        session.tick();
        let state = session.state();
        assert_eq!(state.phase, Phase::RepWait);
        assert_eq!(state.set_index, 1);
        assert!(state.is_paused);
    }

    #[test]
    fn test_rest_phase_is_valid_for_rep_exercise() {
        let workout = Workout::new(
            "w",
            "Reps",
            vec![Exercise::rep_based("a", "Pull-up", 8).with_sets(2).with_rest(5)],
        );
        let mut session = Session::start(workout).unwrap();
        session.toggle_pause();
        assert_eq!(session.state().phase, Phase::Rest);

        session.tick();
        let state = session.state();
        assert_eq!(state.phase, Phase::Rest);
        assert_eq!(state.time_left, 4);
        assert_eq!(state.set_index, 0);
        assert!(!state.is_paused);
    }

    #[test]
    fn test_restart_with_new_workout() {
        let mut session = Session::start(timed_workout()).unwrap();
        session.toggle_pause();
        ticks(&mut session, 12);

        let other = Workout::new("r", "Reps", vec![Exercise::rep_based("x", "Dips", 5)]);
        session.restart(other).unwrap();
        assert_eq!(session.workout().id, "r");
        assert_eq!(session.state().phase, Phase::RepWait);
        assert!(session.state().is_paused);

        assert!(session.restart(Workout::new("e", "Empty", vec![])).is_err());
        assert_eq!(session.workout().id, "r");
    }

    #[test]
    fn test_pure_transition_does_not_mutate_input() {
        let plan = Plan::new(timed_workout()).unwrap();
        let rules = PlaybackRules::default();
        let state = SessionState::initial(&plan);

        let result = transition(&plan, &rules, &state, Event::TogglePause);
        assert!(!result.state.is_paused);
        assert!(state.is_paused);
        assert!(result.effects.is_empty());
    }
}
