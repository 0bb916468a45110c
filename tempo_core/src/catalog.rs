//! Built-in workouts.
//!
//! A fresh library is seeded with these so there is something to play on
//! first run.

use crate::types::*;
use once_cell::sync::Lazy;

/// Cached default workouts - built once and reused
static DEFAULT_WORKOUTS: Lazy<Vec<Workout>> = Lazy::new(build_default_workouts);

/// Get a reference to the cached default workouts
pub fn default_workouts() -> &'static [Workout] {
    &DEFAULT_WORKOUTS
}

fn build_default_workouts() -> Vec<Workout> {
    vec![
        // Beginner full body: six timed moves, one set each
        Workout::new(
            "preset-1",
            "Quick Full Body for Beginners (5 min)",
            vec![
                Exercise::timed("p1-ex1", "Jumping Jack", 30).with_rest(15),
                Exercise::timed("p1-ex2", "Squat", 30).with_rest(15),
                Exercise::timed("p1-ex3", "Knee Push-up", 30).with_rest(15),
                Exercise::timed("p1-ex4", "Plank", 30).with_rest(15),
                Exercise::timed("p1-ex5", "Jumping Jack", 30).with_rest(15),
                Exercise::timed("p1-ex6", "Squat", 30).with_rest(15),
            ],
        ),
        Workout::new(
            "preset-2",
            "HIIT Challenge (10 min)",
            vec![
                Exercise::timed("p2-ex1", "Burpee", 45).with_sets(2).with_rest(15),
                Exercise::timed("p2-ex2", "Mountain Climber", 45)
                    .with_sets(2)
                    .with_rest(15),
                Exercise::timed("p2-ex3", "Squat Jump", 45)
                    .with_sets(2)
                    .with_rest(15),
                Exercise::timed("p2-ex4", "High Knees", 45)
                    .with_sets(2)
                    .with_rest(15),
            ],
        ),
        Workout::new(
            "preset-3",
            "Core Focus (8 min)",
            vec![
                Exercise::timed("p3-ex1", "Plank", 60).with_sets(2).with_rest(30),
                Exercise::timed("p3-ex2", "Crunch", 60).with_sets(2).with_rest(30),
                Exercise::timed("p3-ex3", "Leg Raise", 60)
                    .with_sets(2)
                    .with_rest(30),
            ],
        ),
        // Strength days are rep-based: each set waits for confirmation
        Workout::new(
            "preset-4",
            "Upper Body Strength",
            vec![
                Exercise::rep_based("p4-ex1", "Push-up", 10)
                    .with_sets(3)
                    .with_rest(60),
                Exercise::rep_based("p4-ex2", "Pull-up (or assisted)", 8)
                    .with_sets(3)
                    .with_rest(60),
                Exercise::rep_based("p4-ex3", "Dumbbell Shoulder Press", 12)
                    .with_weight(10.0)
                    .with_sets(3)
                    .with_rest(60),
                Exercise::rep_based("p4-ex4", "Dumbbell Curl", 12)
                    .with_weight(8.0)
                    .with_sets(3)
                    .with_rest(60),
                Exercise::rep_based("p4-ex5", "Dips", 10).with_sets(3).with_rest(60),
            ],
        ),
        Workout::new(
            "preset-5",
            "Lower Body Strength",
            vec![
                Exercise::rep_based("p5-ex1", "Squat", 12)
                    .with_weight(20.0)
                    .with_sets(3)
                    .with_rest(60),
                Exercise::rep_based("p5-ex2", "Lunge", 10).with_sets(3).with_rest(60),
                Exercise::rep_based("p5-ex3", "Deadlift", 8)
                    .with_weight(40.0)
                    .with_sets(3)
                    .with_rest(90),
                Exercise::rep_based("p5-ex4", "Calf Raise", 20)
                    .with_sets(3)
                    .with_rest(45),
                Exercise::rep_based("p5-ex5", "Hip Thrust", 12)
                    .with_weight(30.0)
                    .with_sets(3)
                    .with_rest(60),
            ],
        ),
        // Arms superset: curl and extension back to back, rest after each round
        Workout::new(
            "preset-6",
            "Arm Superset",
            vec![
                Exercise::timed("p6-ex1", "Jumping Jack", 60),
                Exercise::rep_based("p6-ex2", "Dumbbell Curl", 12)
                    .with_weight(8.0)
                    .with_sets(3)
                    .with_rest(60)
                    .in_superset(1),
                Exercise::rep_based("p6-ex3", "Triceps Extension", 12)
                    .with_weight(8.0)
                    .with_sets(3)
                    .with_rest(60)
                    .in_superset(1),
                Exercise::timed("p6-ex4", "Plank", 45),
            ],
        ),
    ]
}
