//! # Sync Progress
//!
//! Progress events emitted by the upload job, in the shape a UI progress
//! bar consumes.
//!
//! ## Event Sequence
//! ```text
//! {exercises, 1, 2} {exercises, 2, 2}
//! {trainingDays, 1, 1}
//! {dayExercises, 1, 1}
//! {exerciseSets, 3, 3}          ← cumulative, once per parent group
//! {done, 7, 7}
//! ```

use serde::{Deserialize, Serialize};

/// Phase of an upload run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncPhase {
    Exercises,
    TrainingDays,
    DayExercises,
    ExerciseSets,
    Done,
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncPhase::Exercises => write!(f, "exercises"),
            SyncPhase::TrainingDays => write!(f, "trainingDays"),
            SyncPhase::DayExercises => write!(f, "dayExercises"),
            SyncPhase::ExerciseSets => write!(f, "exerciseSets"),
            SyncPhase::Done => write!(f, "done"),
        }
    }
}

/// One progress event: `current` of `total` rows done in `phase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    pub phase: SyncPhase,
    pub current: usize,
    pub total: usize,
}

impl SyncProgress {
    pub fn new(phase: SyncPhase, current: usize, total: usize) -> Self {
        SyncProgress {
            phase,
            current,
            total,
        }
    }

    /// Completed fraction in `0.0..=1.0`. An empty phase counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Callback receiving progress events. Invoked synchronously by the job.
pub type ProgressCallback<'a> = &'a (dyn Fn(SyncProgress) + Send + Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&SyncProgress::new(SyncPhase::TrainingDays, 1, 4)).unwrap();
        assert_eq!(json, r#"{"phase":"trainingDays","current":1,"total":4}"#);
        assert_eq!(SyncPhase::ExerciseSets.to_string(), "exerciseSets");
    }

    #[test]
    fn test_fraction() {
        assert_eq!(SyncProgress::new(SyncPhase::Exercises, 1, 4).fraction(), 0.25);
        assert_eq!(SyncProgress::new(SyncPhase::Done, 0, 0).fraction(), 1.0);
    }
}
