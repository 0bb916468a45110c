//! Imperative shell around the session: timer, observers, termination.
//!
//! The interval that drives `tick()` is a scoped resource. While the
//! session is running the player holds exactly one `IntervalGuard`; every
//! change that stops the session (pause, rep wait, finish, workout swap,
//! end) drops the guard, which disarms the interval.
//!
//! Ticks carry the id of the interval that produced them. A tick from an
//! interval that is no longer armed (queued before a pause, or from a
//! previous workout) is dropped, so one elapsed second can never advance
//! the machine twice.

use crate::session::{Effect, Event, Session, SessionState};
use crate::view::SessionView;
use crate::{Error, Result, Workout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

/// Identifies one armed interval
pub type TimerId = u64;

// ============================================================================
// Scheduler
// ============================================================================

/// Handle to an armed interval; dropping it disarms the interval
#[derive(Debug)]
pub struct IntervalGuard {
    id: TimerId,
    cancelled: Arc<AtomicBool>,
}

impl IntervalGuard {
    /// Create a guard and the flag the interval should poll
    pub fn new(id: TimerId) -> (Self, Arc<AtomicBool>) {
        let cancelled = Arc::new(AtomicBool::new(false));
        (
            Self {
                id,
                cancelled: Arc::clone(&cancelled),
            },
            cancelled,
        )
    }

    pub fn id(&self) -> TimerId {
        self.id
    }
}

impl Drop for IntervalGuard {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        tracing::trace!("Disarmed interval {}", self.id);
    }
}

/// Source of periodic ticks
pub trait Scheduler {
    /// Start delivering `PlayerInput::Tick(id)` every `period`
    fn arm(&mut self, id: TimerId, period: Duration) -> IntervalGuard;
}

/// Everything that can be fed to a player
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerInput {
    Tick(TimerId),
    TogglePause,
    SkipForward,
    SkipBackward,
    /// User ends the session
    End,
}

/// Real-time scheduler: one background thread per armed interval
///
/// Ticks are sent into the same channel as user commands, so the player
/// sees them strictly one after another.
pub struct ThreadScheduler {
    tx: Sender<PlayerInput>,
}

impl ThreadScheduler {
    pub fn new(tx: Sender<PlayerInput>) -> Self {
        Self { tx }
    }
}

impl Scheduler for ThreadScheduler {
    fn arm(&mut self, id: TimerId, period: Duration) -> IntervalGuard {
        let (guard, cancelled) = IntervalGuard::new(id);
        let tx = self.tx.clone();

        std::thread::spawn(move || loop {
            std::thread::sleep(period);
            if cancelled.load(Ordering::SeqCst) {
                break;
            }
            if tx.send(PlayerInput::Tick(id)).is_err() {
                break;
            }
        });

        tracing::debug!("Armed interval {} every {:?}", id, period);
        guard
    }
}

/// Scheduler that never fires on its own; ticks are delivered by the caller
///
/// Used for simulation and tests. Keeps the cancel flag of every interval it
/// armed so callers can check none leaked.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    intervals: Vec<(TimerId, Arc<AtomicBool>)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of intervals armed and not yet disarmed
    pub fn live_intervals(&self) -> usize {
        self.intervals
            .iter()
            .filter(|(_, cancelled)| !cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Id of the most recent live interval
    pub fn current(&self) -> Option<TimerId> {
        self.intervals
            .iter()
            .rev()
            .find(|(_, cancelled)| !cancelled.load(Ordering::SeqCst))
            .map(|(id, _)| *id)
    }

    /// Total number of intervals ever armed
    pub fn armed_count(&self) -> usize {
        self.intervals.len()
    }
}

impl Scheduler for ManualScheduler {
    fn arm(&mut self, id: TimerId, _period: Duration) -> IntervalGuard {
        let (guard, cancelled) = IntervalGuard::new(id);
        self.intervals.push((id, cancelled));
        guard
    }
}

// ============================================================================
// Observer
// ============================================================================

/// Receiver of fire-and-forget session notifications
///
/// Implementations must return promptly; they run between ticks.
pub trait SessionObserver {
    fn on_countdown_tick(&mut self, _remaining: u32) {}

    fn on_phase_end(&mut self) {}

    fn on_workout_complete(&mut self, _workout: &Workout) {}

    /// The session ended, either completed or abandoned; called once
    fn on_finish(&mut self, _workout: &Workout) {}
}

// ============================================================================
// Player
// ============================================================================

/// Outcome handed back when a session ends
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub workout: Workout,
    /// Whether the workout ran to its natural end
    pub completed: bool,
    /// Planned elapsed time: sum of `(duration + rest) * sets`
    pub total_duration_seconds: u32,
}

/// A session wired to a scheduler and an observer
pub struct Player<S: Scheduler, O: SessionObserver> {
    session: Session,
    scheduler: S,
    observer: O,
    period: Duration,
    interval: Option<IntervalGuard>,
    next_timer_id: TimerId,
    ended: bool,
}

impl<S: Scheduler, O: SessionObserver> Player<S, O> {
    pub fn new(session: Session, scheduler: S, observer: O, period: Duration) -> Self {
        let mut player = Self {
            session,
            scheduler,
            observer,
            period,
            interval: None,
            next_timer_id: 1,
            ended: false,
        };
        player.sync_timer();
        player
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn view(&self) -> SessionView {
        self.session.view()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Id of the armed interval, if the session is running
    pub fn armed_timer(&self) -> Option<TimerId> {
        self.interval.as_ref().map(IntervalGuard::id)
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Feed one input; returns the summary when the input ended the session
    pub fn handle(&mut self, input: PlayerInput) -> Option<SessionSummary> {
        match input {
            PlayerInput::Tick(id) => self.on_tick(id),
            PlayerInput::TogglePause => self.toggle_pause(),
            PlayerInput::SkipForward => self.skip_forward(),
            PlayerInput::SkipBackward => self.skip_backward(),
            PlayerInput::End => return self.finish(),
        }
        None
    }

    /// A tick from interval `id`
    pub fn on_tick(&mut self, id: TimerId) {
        if self.armed_timer() != Some(id) {
            tracing::debug!("Dropping stale tick from interval {}", id);
            return;
        }
        self.apply(Event::Tick);
    }

    pub fn toggle_pause(&mut self) {
        self.apply(Event::TogglePause);
    }

    pub fn skip_forward(&mut self) {
        self.apply(Event::SkipForward);
    }

    pub fn skip_backward(&mut self) {
        self.apply(Event::SkipBackward);
    }

    /// Swap in a new workout, cancelling any pending interval first
    pub fn load(&mut self, workout: Workout) -> Result<()> {
        self.interval = None;
        let result = self.session.restart(workout);
        if result.is_ok() {
            self.ended = false;
        }
        self.sync_timer();
        result
    }

    /// End the session and notify the observer
    ///
    /// Returns `None` if the session was already ended.
    pub fn finish(&mut self) -> Option<SessionSummary> {
        if self.ended {
            return None;
        }
        self.ended = true;
        self.interval = None;

        let workout = self.session.workout();
        self.observer.on_finish(workout);

        let completed = self.session.state().is_finished;
        tracing::info!(
            "Session for '{}' ended ({})",
            workout.name,
            if completed { "completed" } else { "abandoned" }
        );

        Some(SessionSummary {
            workout: workout.clone(),
            completed,
            total_duration_seconds: workout.total_duration_seconds(),
        })
    }

    fn apply(&mut self, event: Event) {
        if self.ended {
            tracing::debug!("Ignoring {:?} after session end", event);
            return;
        }

        let effects = self.session.apply(event);
        for effect in effects {
            match effect {
                Effect::CountdownTick { remaining } => self.observer.on_countdown_tick(remaining),
                Effect::PhaseEnd => self.observer.on_phase_end(),
                Effect::WorkoutComplete => {
                    self.observer.on_workout_complete(self.session.workout())
                }
            }
        }

        self.sync_timer();
    }

    /// Arm the interval when runnable, disarm it otherwise
    fn sync_timer(&mut self) {
        let runnable = !self.ended && self.session.state().is_running();
        match (runnable, self.interval.is_some()) {
            (true, false) => {
                let id = self.next_timer_id;
                self.next_timer_id += 1;
                self.interval = Some(self.scheduler.arm(id, self.period));
            }
            (false, true) => {
                self.interval = None;
            }
            _ => {}
        }
    }
}

/// Drive a manually scheduled player to the end of its workout
///
/// Starts playback when paused, confirms rep-based steps and fires the armed
/// interval until the workout completes. Returns the number of ticks spent.
/// Fails if the workout has not finished after `max_steps` inputs.
pub fn simulate<O: SessionObserver>(
    player: &mut Player<ManualScheduler, O>,
    max_steps: usize,
) -> Result<u32> {
    let mut ticks = 0;

    for _ in 0..max_steps {
        if player.state().is_finished {
            return Ok(ticks);
        }

        match player.armed_timer() {
            Some(id) => {
                player.on_tick(id);
                ticks += 1;
            }
            // Paused or waiting on reps: both resume with play/pause
            None => player.toggle_pause(),
        }
    }

    if player.state().is_finished {
        Ok(ticks)
    } else {
        Err(Error::Session(format!(
            "'{}' did not finish within {} steps",
            player.session().workout().name,
            max_steps
        )))
    }
}
