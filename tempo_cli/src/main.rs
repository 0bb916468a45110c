use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use tempo_core::history::{HISTORY_CSV_FILE, HISTORY_LOG_FILE};
use tempo_core::library::LIBRARY_FILE;
use tempo_core::view::format_clock;
use tempo_core::*;

#[derive(Parser)]
#[command(name = "tempo")]
#[command(about = "Interval workout player for the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List workouts in the library
    List,

    /// Show a workout's exercises and superset groups
    Show { id: String },

    /// Add or replace a workout from a JSON file
    Save {
        #[arg(long)]
        file: PathBuf,
    },

    /// Remove a workout from the library
    Delete { id: String },

    /// Play a workout
    Play {
        id: String,

        /// Run on a simulated clock, starting and confirming reps automatically
        #[arg(long)]
        simulate: bool,
    },

    /// List completed workouts, newest first
    History,

    /// Roll up the history log to CSV
    Rollup {
        /// Remove processed history logs after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

/// Where everything lives under the data directory
struct DataPaths {
    dir: PathBuf,
    library: PathBuf,
    history_log: PathBuf,
    history_csv: PathBuf,
}

impl DataPaths {
    fn new(dir: PathBuf) -> Self {
        Self {
            library: dir.join(LIBRARY_FILE),
            history_log: dir.join(HISTORY_LOG_FILE),
            history_csv: dir.join(HISTORY_CSV_FILE),
            dir,
        }
    }
}

fn main() -> Result<()> {
    tempo_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let paths = DataPaths::new(cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone()));

    match cli.command {
        Commands::List => cmd_list(&paths),
        Commands::Show { id } => cmd_show(&paths, &id),
        Commands::Save { file } => cmd_save(&paths, &file),
        Commands::Delete { id } => cmd_delete(&paths, &id),
        Commands::Play { id, simulate } => cmd_play(&paths, &id, simulate, &config),
        Commands::History => cmd_history(&paths),
        Commands::Rollup { cleanup } => cmd_rollup(&paths, cleanup),
    }
}

fn load_workout(paths: &DataPaths, id: &str) -> Result<Workout> {
    WorkoutLibrary::load(&paths.library)?
        .get(id)
        .cloned()
        .ok_or_else(|| Error::WorkoutNotFound(id.to_string()))
}

fn cmd_list(paths: &DataPaths) -> Result<()> {
    let library = WorkoutLibrary::load(&paths.library)?;

    if library.workouts.is_empty() {
        println!("No workouts saved.");
        return Ok(());
    }

    for workout in &library.workouts {
        println!(
            "  {:<12} {:<40} {:>2} exercises  {}",
            workout.id,
            workout.name,
            workout.exercises.len(),
            format_clock(workout.total_duration_seconds())
        );
    }
    Ok(())
}

fn cmd_show(paths: &DataPaths, id: &str) -> Result<()> {
    let workout = load_workout(paths, id)?;
    let supersets = SupersetIndex::build(&workout.exercises);

    println!("\n  {} ({})", workout.name, workout.id);
    println!(
        "  Total time: {}",
        format_clock(workout.total_duration_seconds())
    );
    println!();

    for (i, ex) in workout.exercises.iter().enumerate() {
        let work = if ex.is_rep_based() {
            format!("{} reps", ex.rep_count())
        } else {
            format!("{}s", ex.duration)
        };
        let mut line = format!("  {:>2}. {:<28} {} x {}", i + 1, ex.name, ex.set_count(), work);
        if let Some(weight) = ex.weight.filter(|w| *w > 0.0) {
            line.push_str(&format!(" @ {}kg", weight));
        }
        if ex.rest_seconds() > 0 {
            line.push_str(&format!(", rest {}s", ex.rest_seconds()));
        }
        if let Some(group) = supersets.group_of(i) {
            line.push_str(&format!("  [superset {}]", group.group_id));
        }
        println!("{}", line);
    }

    for group in supersets.groups() {
        let names: Vec<_> = group
            .members()
            .iter()
            .map(|m| workout.exercises[m.exercise].name.as_str())
            .collect();
        println!(
            "\n  Superset {}: {} ({} rounds)",
            group.group_id,
            names.join(" + "),
            group.rounds()
        );
    }
    println!();
    Ok(())
}

fn cmd_save(paths: &DataPaths, file: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(file)?;
    let workout: Workout = serde_json::from_str(&contents)?;
    let name = workout.name.clone();

    let mut replaced = false;
    WorkoutLibrary::update(&paths.library, |library| {
        replaced = library.upsert(workout)?;
        Ok(())
    })?;

    if replaced {
        println!("✓ Updated workout '{}'", name);
    } else {
        println!("✓ Added workout '{}'", name);
    }
    Ok(())
}

fn cmd_delete(paths: &DataPaths, id: &str) -> Result<()> {
    let mut removed = None;
    WorkoutLibrary::update(&paths.library, |library| {
        removed = Some(library.remove(id)?);
        Ok(())
    })?;

    if let Some(workout) = removed {
        println!("✓ Deleted workout '{}'", workout.name);
    }
    Ok(())
}

fn cmd_play(paths: &DataPaths, id: &str, simulate: bool, config: &Config) -> Result<()> {
    let workout = load_workout(paths, id)?;
    let session = Session::with_rules(workout, config.player.rules())?;

    println!("\n  ▶ {}", session.workout().name);
    println!(
        "  Total time: {}\n",
        format_clock(session.workout().total_duration_seconds())
    );

    let summary = if simulate {
        play_simulated(session)?
    } else {
        play_interactive(session, config)?
    };

    if summary.completed {
        let entry = WorkoutHistoryEntry::for_workout(&summary.workout, chrono::Utc::now());
        JsonlHistory::new(&paths.history_log).append(&entry)?;
        println!("✓ Logged to history");
    } else {
        println!("Session ended before completion - not logged.");
    }
    Ok(())
}

fn play_simulated(session: Session) -> Result<SessionSummary> {
    let steps: usize = session
        .workout()
        .exercises
        .iter()
        .map(|ex| ex.set_count() as usize)
        .sum();
    let max_steps = session.workout().total_duration_seconds() as usize + 2 * steps + 8;

    let mut player = Player::new(
        session,
        ManualScheduler::new(),
        ConsoleObserver::default(),
        std::time::Duration::ZERO,
    );
    let ticks = simulate(&mut player, max_steps)?;

    let observer = player.observer();
    println!(
        "  Simulated {} seconds ({} phases, {} countdown cues)",
        ticks, observer.phase_ends, observer.cues
    );

    player
        .finish()
        .ok_or_else(|| Error::Session("session already ended".into()))
}

fn play_interactive(session: Session, config: &Config) -> Result<SessionSummary> {
    let (tx, rx) = mpsc::channel();
    spawn_keyboard(tx.clone());

    println!("  Enter/p: play-pause or confirm reps   n: next   b: back   q: quit\n");

    let mut player = Player::new(
        session,
        ThreadScheduler::new(tx),
        ConsoleObserver {
            bell: true,
            ..ConsoleObserver::default()
        },
        config.player.tick_interval(),
    );
    if config.player.auto_start {
        player.toggle_pause();
    }
    render(&player.view())?;

    loop {
        let input = rx.recv().unwrap_or(PlayerInput::End);
        if let Some(summary) = player.handle(input) {
            println!();
            return Ok(summary);
        }
        if player.state().is_finished {
            if let Some(summary) = player.finish() {
                println!();
                return Ok(summary);
            }
        }
        render(&player.view())?;
    }
}

/// Forward keyboard lines to the player until stdin closes
fn spawn_keyboard(tx: Sender<PlayerInput>) {
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let input = match line.trim().to_lowercase().as_str() {
                "" | "p" => PlayerInput::TogglePause,
                "n" => PlayerInput::SkipForward,
                "b" => PlayerInput::SkipBackward,
                "q" => PlayerInput::End,
                other => {
                    tracing::warn!("Unknown command '{}'", other);
                    continue;
                }
            };
            if tx.send(input).is_err() {
                return;
            }
        }
        let _ = tx.send(PlayerInput::End);
    });
}

fn render(view: &SessionView) -> Result<()> {
    let mut out = io::stdout().lock();
    match view {
        SessionView::Playing(v) => {
            let mut line = format!(
                "{:<5} {}  {} ({}/{}, set {}/{})",
                v.phase,
                v.clock,
                v.exercise_name,
                v.exercise_number,
                v.exercise_count,
                v.set_number,
                v.set_count
            );
            if let Some(reps) = v.reps {
                line.push_str(&format!(" x{}", reps));
            }
            if let Some(weight) = v.weight {
                line.push_str(&format!(" @ {}kg", weight));
            }
            if let Some(superset) = &v.superset {
                line.push_str(&format!(
                    " [superset {}/{}]",
                    superset.position,
                    superset.members.len()
                ));
            }
            line.push_str(&format!("  next: {}", v.next_step));
            if v.is_paused {
                line.push_str("  (paused)");
            }
            write!(out, "\r\x1b[2K{}", line)?;
        }
        SessionView::Finished {
            workout_name,
            total_duration_seconds,
        } => {
            write!(
                out,
                "\r\x1b[2K✓ {} finished ({})",
                workout_name,
                format_clock(*total_duration_seconds)
            )?;
        }
        SessionView::LoadFailed => {
            write!(out, "\r\x1b[2KCould not load this workout. Press q to go back.")?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Prints completion and counts cues; rings the terminal bell when live
#[derive(Debug, Default)]
struct ConsoleObserver {
    bell: bool,
    cues: u32,
    phase_ends: u32,
}

impl SessionObserver for ConsoleObserver {
    fn on_countdown_tick(&mut self, _remaining: u32) {
        self.cues += 1;
        if self.bell {
            print!("\x07");
        }
    }

    fn on_phase_end(&mut self) {
        self.phase_ends += 1;
        if self.bell {
            println!();
        }
    }

    fn on_workout_complete(&mut self, workout: &Workout) {
        println!("✓ Workout complete: {}", workout.name);
    }
}

fn cmd_history(paths: &DataPaths) -> Result<()> {
    let entries = load_history(&paths.history_log, &paths.history_csv)?;

    if entries.is_empty() {
        println!("No completed workouts yet.");
        return Ok(());
    }

    for entry in &entries {
        println!(
            "  {}  {:<40} {}  {} exercises",
            entry.completed_at.format("%Y-%m-%d %H:%M"),
            entry.workout_name,
            format_clock(entry.total_duration_seconds),
            entry.exercise_count
        );
    }
    Ok(())
}

fn cmd_rollup(paths: &DataPaths, cleanup: bool) -> Result<()> {
    if !paths.history_log.exists() {
        println!("No history log found - nothing to roll up.");
        return Ok(());
    }

    let count = rollup_history(&paths.history_log, &paths.history_csv)?;

    println!("✓ Rolled up {} history entries to CSV", count);
    println!("  CSV: {}", paths.history_csv.display());

    if cleanup {
        let cleaned = tempo_core::rollup::cleanup_processed(&paths.dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed history logs", cleaned);
        }
    }

    Ok(())
}
