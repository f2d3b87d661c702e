//! # Guest Data Sync Job
//!
//! Uploads every `pending` local row to the remote store in foreign-key
//! order, rewriting parent ids as it goes, and flips each uploaded row to
//! `synced`.
//!
//! ## Phases
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         One Sync Run                                    │
//! │                                                                         │
//! │  1. exercises      create (idempotent) ──► exercise map   ──► mark      │
//! │  2. trainingDays   get_or_create(date) ──► day map        ──► mark      │
//! │                       └─ existing day, other id = MERGED               │
//! │  3. dayExercises   resolve day + exercise through maps                 │
//! │                    create (idempotent) ──► day exercise map ──► mark   │
//! │                       └─ merged day: display_order appended after max  │
//! │  4. exerciseSets   group by remapped parent (first seen order)         │
//! │                    one bulk_create per parent, then mark all           │
//! │  5. done                                                               │
//! │                                                                         │
//! │  Any error: stop. Remote rows and local `synced` flags already          │
//! │  written stay; the next run picks up the remaining `pending` rows.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Idempotence
//! Local ids are sent as remote ids. If a create hits a conflict and a
//! remote row with the local id exists, that row was uploaded by an
//! earlier run that stopped before `mark_as_synced`, and it is reused.
//!
//! ## Parent Resolution
//! A parent id missing from this run's maps belongs to a row synced in an
//! earlier run. It is checked against the remote store instead of being
//! forwarded blindly; see [`SyncError::UnresolvedReference`].

use ironlog_core::{
    oldest_first, DayExercise, DayExerciseRepository, ExerciseRepository, ExerciseSet,
    ExerciseSetRepository, LocalStore, NewDayExercise, NewExerciseDefinition, NewExerciseSet,
    NewTrainingDay, Record, RemoteStore, StoreError, StoreResult, SyncTracked, TrainingDay,
    TrainingDayRepository,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::progress::{ProgressCallback, SyncPhase, SyncProgress};

// =============================================================================
// Results
// =============================================================================

/// Rows uploaded by one run, per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub exercises: usize,
    pub training_days: usize,
    /// Training days that reused a remote day already present for the date.
    pub merged_training_days: usize,
    pub day_exercises: usize,
    pub exercise_sets: usize,
    /// Sets found remotely already (earlier interrupted run) and not re-sent.
    pub skipped_exercise_sets: usize,
    /// Exercise references dropped because the exercise no longer exists.
    pub degraded_references: usize,
}

impl SyncSummary {
    /// Rows processed across all four tables.
    pub fn total(&self) -> usize {
        self.exercises + self.training_days + self.day_exercises + self.exercise_sets
    }
}

/// Result of [`SyncJob::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub success: bool,
    pub error: Option<String>,
    /// Work completed before success or failure.
    pub summary: SyncSummary,
}

// =============================================================================
// Id Map
// =============================================================================

/// `local id → remote id` for one table, scoped to one run.
#[derive(Debug, Default)]
pub(crate) struct IdMap {
    entries: HashMap<String, String>,
}

impl IdMap {
    pub(crate) fn insert(&mut self, local: &str, remote: &str) {
        self.entries.insert(local.to_string(), remote.to_string());
    }

    pub(crate) fn get(&self, local: &str) -> Option<&str> {
        self.entries.get(local).map(String::as_str)
    }
}

// =============================================================================
// Sync Job
// =============================================================================

/// Moves guest data from the local store to the remote store.
///
/// ## Usage
/// ```rust,ignore
/// let job = SyncJob::new(Arc::new(db), Arc::new(RestRemote::new(&config.remote)?));
/// let outcome = job.run(Some(&|p| println!("{} {}/{}", p.phase, p.current, p.total))).await;
/// if !outcome.success {
///     show_error(outcome.error.unwrap_or_default());
/// }
/// ```
#[derive(Clone)]
pub struct SyncJob {
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
}

impl SyncJob {
    pub fn new(local: Arc<dyn LocalStore>, remote: Arc<dyn RemoteStore>) -> Self {
        SyncJob { local, remote }
    }

    /// Runs all phases. Never fails: errors are logged and reported in the
    /// outcome.
    pub async fn run(&self, progress: Option<ProgressCallback<'_>>) -> SyncOutcome {
        info!("Guest data sync started");

        let mut run = Run::new(self.local.as_ref(), self.remote.as_ref(), progress);
        match run.execute().await {
            Ok(()) => {
                info!(rows = run.summary.total(), "Guest data sync finished");
                SyncOutcome {
                    success: true,
                    error: None,
                    summary: run.summary,
                }
            }
            Err(e) => {
                error!(error = %e, uploaded = run.summary.total(), "Guest data sync failed");
                SyncOutcome {
                    success: false,
                    error: Some(e.to_string()),
                    summary: run.summary,
                }
            }
        }
    }
}

// =============================================================================
// Run State
// =============================================================================

/// State of one run: id maps, caches and counters.
struct Run<'a> {
    local: &'a dyn LocalStore,
    remote: &'a dyn RemoteStore,
    progress: Option<ProgressCallback<'a>>,
    summary: SyncSummary,

    exercises: IdMap,
    training_days: IdMap,
    day_exercises: IdMap,
    /// Exercise ids confirmed absent remotely.
    missing_exercises: HashSet<String>,
    /// Remote day ids that were merged into, with the next free display order.
    merged_days: HashMap<String, i64>,
    /// Local day exercise id → display order on a merged day.
    shifted_orders: HashMap<String, i64>,
}

impl<'a> Run<'a> {
    fn new(
        local: &'a dyn LocalStore,
        remote: &'a dyn RemoteStore,
        progress: Option<ProgressCallback<'a>>,
    ) -> Self {
        Run {
            local,
            remote,
            progress,
            summary: SyncSummary::default(),
            exercises: IdMap::default(),
            training_days: IdMap::default(),
            day_exercises: IdMap::default(),
            missing_exercises: HashSet::new(),
            merged_days: HashMap::new(),
            shifted_orders: HashMap::new(),
        }
    }

    fn emit(&self, phase: SyncPhase, current: usize, total: usize) {
        if let Some(callback) = self.progress {
            callback(SyncProgress::new(phase, current, total));
        }
    }

    async fn execute(&mut self) -> SyncResult<()> {
        self.sync_exercises().await?;
        self.sync_training_days().await?;
        self.sync_day_exercises().await?;
        self.sync_exercise_sets().await?;

        let total = self.summary.total();
        self.emit(SyncPhase::Done, total, total);
        Ok(())
    }

    // =========================================================================
    // Phase 1: Exercises
    // =========================================================================

    async fn sync_exercises(&mut self) -> SyncResult<()> {
        let pending = oldest_first(self.local.exercises().find_all_pending().await?);
        let total = pending.len();
        info!(phase = %SyncPhase::Exercises, total, "Sync phase started");

        for (i, row) in pending.iter().enumerate() {
            let input = NewExerciseDefinition::from(row);
            let repo = self.remote.exercises();
            let uploaded = or_existing(repo.create(&input).await, repo.find_by_id(&row.id)).await?;

            self.exercises.insert(&row.id, &uploaded.id);
            self.local.exercises().mark_as_synced(&row.id).await?;
            self.summary.exercises += 1;
            debug!(local_id = %row.id, remote_id = %uploaded.id, "Exercise synced");

            self.emit(SyncPhase::Exercises, i + 1, total);
        }
        Ok(())
    }

    // =========================================================================
    // Phase 2: Training Days
    // =========================================================================

    async fn sync_training_days(&mut self) -> SyncResult<()> {
        let pending = oldest_first(self.local.training_days().find_all_pending().await?);
        let total = pending.len();
        info!(phase = %SyncPhase::TrainingDays, total, "Sync phase started");

        for (i, row) in pending.iter().enumerate() {
            let (remote_day, created) = self
                .remote
                .training_days()
                .get_or_create(&NewTrainingDay::from(row))
                .await?;

            if !created && remote_day.id != row.id {
                info!(
                    date = %row.date,
                    local_id = %row.id,
                    remote_id = %remote_day.id,
                    "Merging into existing remote training day"
                );
                self.summary.merged_training_days += 1;
            }

            self.training_days.insert(&row.id, &remote_day.id);
            self.local.training_days().mark_as_synced(&row.id).await?;
            self.summary.training_days += 1;

            self.emit(SyncPhase::TrainingDays, i + 1, total);
        }
        Ok(())
    }

    // =========================================================================
    // Phase 3: Day Exercises
    // =========================================================================

    async fn sync_day_exercises(&mut self) -> SyncResult<()> {
        let pending = oldest_first(self.local.day_exercises().find_all_pending().await?);
        let total = pending.len();
        info!(phase = %SyncPhase::DayExercises, total, "Sync phase started");

        for (i, row) in pending.iter().enumerate() {
            let training_day_id = self.resolve_training_day(&row.training_day_id).await?;
            let exercise_id = self.resolve_exercise(row.exercise_id.as_deref()).await?;

            let mut input = NewDayExercise::from(row);
            input.exercise_id = exercise_id;
            if training_day_id != row.training_day_id {
                input.display_order = self
                    .merged_display_order(&training_day_id, row, &pending)
                    .await?;
            }
            input.training_day_id = training_day_id;

            let repo = self.remote.day_exercises();
            let uploaded = or_existing(repo.create(&input).await, repo.find_by_id(&row.id)).await?;

            self.day_exercises.insert(&row.id, &uploaded.id);
            self.local.day_exercises().mark_as_synced(&row.id).await?;
            self.summary.day_exercises += 1;
            debug!(
                local_id = %row.id,
                training_day_id = %uploaded.training_day_id,
                display_order = uploaded.display_order,
                "Day exercise synced"
            );

            self.emit(SyncPhase::DayExercises, i + 1, total);
        }
        Ok(())
    }

    /// Display order for `row` on a remote day that already had exercises.
    ///
    /// The day's pending rows are appended after the remote maximum in
    /// their local display order.
    async fn merged_display_order(
        &mut self,
        remote_day_id: &str,
        row: &DayExercise,
        pending: &[DayExercise],
    ) -> SyncResult<i64> {
        if let Some(order) = self.shifted_orders.get(&row.id) {
            return Ok(*order);
        }

        let mut next = match self.merged_days.get(remote_day_id) {
            Some(next) => *next,
            None => self
                .remote
                .day_exercises()
                .find_by_parent_id(remote_day_id)
                .await?
                .iter()
                .map(|d| d.display_order + 1)
                .max()
                .unwrap_or(0),
        };

        let mut siblings: Vec<&DayExercise> = pending
            .iter()
            .filter(|d| d.training_day_id == row.training_day_id)
            .collect();
        siblings.sort_by_key(|d| d.display_order);

        for sibling in siblings {
            self.shifted_orders.insert(sibling.id.clone(), next);
            next += 1;
        }
        self.merged_days.insert(remote_day_id.to_string(), next);

        self.shifted_orders
            .get(&row.id)
            .copied()
            .ok_or_else(|| SyncError::unresolved(DayExercise::ENTITY, &row.id))
    }

    // =========================================================================
    // Phase 4: Exercise Sets
    // =========================================================================

    async fn sync_exercise_sets(&mut self) -> SyncResult<()> {
        let pending = oldest_first(self.local.exercise_sets().find_all_pending().await?);
        let total = pending.len();
        info!(phase = %SyncPhase::ExerciseSets, total, "Sync phase started");

        // Remapped parent → sets, in first-seen parent order
        let mut groups: Vec<(String, Vec<&ExerciseSet>)> = Vec::new();
        let mut group_index: HashMap<String, usize> = HashMap::new();
        for set in &pending {
            let parent = self.resolve_day_exercise(&set.day_exercise_id).await?;
            match group_index.get(&parent) {
                Some(&idx) => groups[idx].1.push(set),
                None => {
                    group_index.insert(parent.clone(), groups.len());
                    groups.push((parent, vec![set]));
                }
            }
        }

        let mut done = 0;
        for (parent, mut sets) in groups {
            sets.sort_by_key(|s| s.set_order);

            let already_uploaded: HashSet<String> = self
                .remote
                .exercise_sets()
                .find_by_parent_id(&parent)
                .await?
                .into_iter()
                .map(|s| s.id)
                .collect();

            let inputs: Vec<NewExerciseSet> = sets
                .iter()
                .filter(|s| !already_uploaded.contains(&s.id))
                .map(|s| NewExerciseSet::from(*s))
                .collect();
            let skipped = sets.len() - inputs.len();

            if !inputs.is_empty() {
                self.remote
                    .exercise_sets()
                    .bulk_create(&parent, &inputs)
                    .await?;
            }
            debug!(parent = %parent, sent = inputs.len(), skipped, "Exercise set group synced");

            self.summary.skipped_exercise_sets += skipped;
            done += sets.len();
            self.emit(SyncPhase::ExerciseSets, done, total);
        }

        for set in &pending {
            self.local.exercise_sets().mark_as_synced(&set.id).await?;
        }
        self.summary.exercise_sets += pending.len();
        Ok(())
    }

    // =========================================================================
    // Parent Resolution
    // =========================================================================

    async fn resolve_training_day(&mut self, local_id: &str) -> SyncResult<String> {
        if let Some(remote_id) = self.training_days.get(local_id) {
            return Ok(remote_id.to_string());
        }

        if self.remote.training_days().find_by_id(local_id).await?.is_some() {
            self.training_days.insert(local_id, local_id);
            return Ok(local_id.to_string());
        }

        // Synced in an earlier run under a merged day: match by date
        let local_day: Option<TrainingDay> =
            self.local.training_days().find_by_id(local_id).await?;
        if let Some(day) = local_day {
            if let Some(remote_day) = self.remote.training_days().find_by_date(day.date).await? {
                self.training_days.insert(local_id, &remote_day.id);
                return Ok(remote_day.id);
            }
        }

        Err(SyncError::unresolved(TrainingDay::ENTITY, local_id))
    }

    async fn resolve_exercise(&mut self, local_id: Option<&str>) -> SyncResult<Option<String>> {
        let Some(local_id) = local_id else {
            return Ok(None);
        };

        if let Some(remote_id) = self.exercises.get(local_id) {
            return Ok(Some(remote_id.to_string()));
        }
        if self.missing_exercises.contains(local_id) {
            self.summary.degraded_references += 1;
            return Ok(None);
        }

        if self.remote.exercises().find_by_id(local_id).await?.is_some() {
            self.exercises.insert(local_id, local_id);
            return Ok(Some(local_id.to_string()));
        }

        warn!(
            exercise_id = %local_id,
            "Exercise not found remotely, uploading as placeholder"
        );
        self.missing_exercises.insert(local_id.to_string());
        self.summary.degraded_references += 1;
        Ok(None)
    }

    async fn resolve_day_exercise(&mut self, local_id: &str) -> SyncResult<String> {
        if let Some(remote_id) = self.day_exercises.get(local_id) {
            return Ok(remote_id.to_string());
        }

        if self.remote.day_exercises().find_by_id(local_id).await?.is_some() {
            self.day_exercises.insert(local_id, local_id);
            return Ok(local_id.to_string());
        }

        Err(SyncError::unresolved(DayExercise::ENTITY, local_id))
    }
}

/// Resolves a create conflict by reusing the row an earlier run uploaded.
async fn or_existing<T: Record>(
    created: StoreResult<T>,
    existing: impl Future<Output = StoreResult<Option<T>>>,
) -> SyncResult<T> {
    match created {
        Ok(row) => Ok(row),
        Err(StoreError::Conflict { entity, detail }) => match existing.await? {
            Some(row) => {
                debug!(entity = T::ENTITY, id = %row.id(), "Reusing previously uploaded row");
                Ok(row)
            }
            None => Err(StoreError::Conflict { entity, detail }.into()),
        },
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironlog_core::ExerciseDefinition;

    #[test]
    fn test_id_map() {
        let mut map = IdMap::default();
        assert_eq!(map.get("a"), None);

        map.insert("a", "b");
        assert_eq!(map.get("a"), Some("b"));
    }

    #[test]
    fn test_summary_total_excludes_side_counters() {
        let summary = SyncSummary {
            exercises: 1,
            training_days: 1,
            merged_training_days: 1,
            day_exercises: 1,
            exercise_sets: 3,
            skipped_exercise_sets: 2,
            degraded_references: 1,
        };
        assert_eq!(summary.total(), 6);
    }

    #[tokio::test]
    async fn test_or_existing_reuses_row_on_conflict() {
        let conflict: StoreResult<ExerciseDefinition> =
            Err(StoreError::conflict("exercises", "duplicate id"));
        let existing = NewExerciseDefinition::new("Bench Press", "Chest").to_row(chrono::Utc::now());

        let reused = or_existing(conflict, async { Ok(Some(existing.clone())) })
            .await
            .unwrap();
        assert_eq!(reused, existing);
    }

    #[tokio::test]
    async fn test_or_existing_keeps_conflict_when_row_is_absent() {
        let conflict: StoreResult<ExerciseDefinition> =
            Err(StoreError::conflict("day_exercises", "duplicate display_order"));

        let err = or_existing(conflict, async { Ok(None) }).await.unwrap_err();
        assert!(matches!(err, SyncError::Store(StoreError::Conflict { .. })));
    }
}
