//! # Guest Data Seeder
//!
//! Populates a local database with pending guest workouts for development
//! and for exercising the upload job by hand.
//!
//! ## Usage
//! ```bash
//! # Seed ./ironlog_dev.db with the default 3 extra days
//! cargo run -p ironlog-db --bin seed
//!
//! # Custom path and number of extra days
//! cargo run -p ironlog-db --bin seed -- --db ./data/ironlog.db --days 10
//! ```
//!
//! ## Generated Data
//! - "Bench Press" (Chest) on 2024-01-10 with three sets: 10, 10, 8 reps
//! - N further days, each with one or two scheduled exercises and
//!   three planned sets per exercise
//!
//! Every row is created `pending`.

use chrono::{Duration, NaiveDate};
use ironlog_core::{
    DayExerciseRepository, ExerciseRepository, ExerciseSetRepository, NewDayExercise,
    NewExerciseDefinition, NewExerciseSet, NewTrainingDay, TrainingDayRepository,
};
use ironlog_db::{Database, DbConfig};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Library exercises used by the extra days: (name, target muscle).
const LIBRARY: &[(&str, &str)] = &[
    ("Squat", "Legs"),
    ("Deadlift", "Back"),
    ("Overhead Press", "Shoulders"),
    ("Pull Up", "Back"),
    ("Barbell Curl", "Biceps"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut extra_days: i64 = 3;
    let mut db_path = String::from("./ironlog_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    extra_days = args[i + 1].parse().unwrap_or(3);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("IronLog Guest Data Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>     Extra training days to generate (default: 3)");
                println!("  -d, --db <PATH>    Database file path (default: ./ironlog_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    info!(path = %db_path, "Connected to local database");

    if !db.training_days().list().await?.is_empty() {
        warn!("Database already has training days, skipping seed");
        println!("Delete {} to regenerate.", db_path);
        return Ok(());
    }

    // Bench day
    let bench = db
        .exercises()
        .create(&NewExerciseDefinition::new("Bench Press", "Chest"))
        .await?;
    let first_date = NaiveDate::from_ymd_opt(2024, 1, 10).ok_or("invalid seed date")?;
    let day = db
        .training_days()
        .create(&NewTrainingDay::new(first_date).with_title("Push"))
        .await?;
    let scheduled = db
        .day_exercises()
        .create(&NewDayExercise::new(day.id, Some(bench.id), 0))
        .await?;
    let sets: Vec<_> = [10, 10, 8]
        .iter()
        .enumerate()
        .map(|(order, reps)| {
            NewExerciseSet::planned(&scheduled.id, order as i64, Some(*reps), Some(60.0))
        })
        .collect();
    db.exercise_sets().bulk_create(&scheduled.id, &sets).await?;

    let mut library = Vec::with_capacity(LIBRARY.len());
    for (name, muscle) in LIBRARY {
        library.push(
            db.exercises()
                .create(&NewExerciseDefinition::new(*name, *muscle))
                .await?,
        );
    }

    for n in 1..=extra_days {
        let date = first_date + Duration::days(n);
        let day = db.training_days().create(&NewTrainingDay::new(date)).await?;

        let per_day = 1 + (n as usize % 2);
        for slot in 0..per_day {
            let exercise = &library[(n as usize + slot) % library.len()];
            let scheduled = db
                .day_exercises()
                .create(&NewDayExercise::new(
                    day.id.clone(),
                    Some(exercise.id.clone()),
                    slot as i64,
                ))
                .await?;

            let sets: Vec<_> = (0..3)
                .map(|order| NewExerciseSet::planned(&scheduled.id, order, Some(5), Some(80.0)))
                .collect();
            db.exercise_sets().bulk_create(&scheduled.id, &sets).await?;
        }
    }

    let total = db.exercises().list_pending().await?.len()
        + db.training_days().list_pending().await?.len()
        + db.day_exercises().list_pending().await?.len()
        + db.exercise_sets().list_pending().await?.len();

    info!(pending = total, "Seed complete");
    println!("Seeded {} pending rows into {}", total, db_path);

    db.close().await;
    Ok(())
}
