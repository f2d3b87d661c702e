//! # Local Store Maintenance
//!
//! Housekeeping around an upload run: how much is left to send, and
//! removal of local rows the remote store now owns.
//!
//! ## Cleanup Order
//! ```text
//! exercise_sets ──► day_exercises ──► training_days ──► exercises
//!   (leaves)                                            (roots)
//! ```
//! Children go first so a parent is only removed once nothing local still
//! points at it. Each repository's `delete_synced` also skips synced rows
//! that still have children, so a `pending` row is never cascaded away.

use ironlog_core::{LocalStore, SyncTracked};
use serde::Serialize;
use tracing::info;

use crate::error::SyncResult;

/// Rows removed by [`cleanup_synced_local_data`], per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    pub exercise_sets: u64,
    pub day_exercises: u64,
    pub training_days: u64,
    pub exercises: u64,
}

impl CleanupSummary {
    pub fn total(&self) -> u64 {
        self.exercise_sets + self.day_exercises + self.training_days + self.exercises
    }
}

/// Local rows still waiting for upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PendingDataCount {
    pub exercises: usize,
    pub training_days: usize,
    pub day_exercises: usize,
    pub exercise_sets: usize,
    pub total: usize,
}

impl PendingDataCount {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Deletes every local row already uploaded, leaves first.
///
/// ## Returns
/// Number of rows removed per table. `pending` rows are untouched.
pub async fn cleanup_synced_local_data(local: &dyn LocalStore) -> SyncResult<CleanupSummary> {
    let summary = CleanupSummary {
        exercise_sets: local.exercise_sets().delete_synced().await?,
        day_exercises: local.day_exercises().delete_synced().await?,
        training_days: local.training_days().delete_synced().await?,
        exercises: local.exercises().delete_synced().await?,
    };

    info!(
        exercise_sets = summary.exercise_sets,
        day_exercises = summary.day_exercises,
        training_days = summary.training_days,
        exercises = summary.exercises,
        "Synced local data removed"
    );
    Ok(summary)
}

/// Counts `pending` rows in each local table.
pub async fn pending_data_count(local: &dyn LocalStore) -> SyncResult<PendingDataCount> {
    let exercises = local.exercises().find_all_pending().await?.len();
    let training_days = local.training_days().find_all_pending().await?.len();
    let day_exercises = local.day_exercises().find_all_pending().await?.len();
    let exercise_sets = local.exercise_sets().find_all_pending().await?.len();

    Ok(PendingDataCount {
        exercises,
        training_days,
        day_exercises,
        exercise_sets,
        total: exercises + training_days + day_exercises + exercise_sets,
    })
}
