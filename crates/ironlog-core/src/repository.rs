//! # Repository Contracts
//!
//! Per-entity CRUD contracts shared by the local store (SQLite, guest mode)
//! and the remote store (hosted backend, signed-in mode).
//!
//! ## Contract Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Contracts                                 │
//! │                                                                         │
//! │   ExerciseRepository      find_all / find_by_id / create / update /    │
//! │   TrainingDayRepository   delete  (+ find_by_date, get_or_create)      │
//! │   DayExerciseRepository   (+ find_by_parent_id)                        │
//! │   ExerciseSetRepository   (+ find_by_parent_id, bulk_create)           │
//! │                                                                         │
//! │   SyncTracked<T>          LOCAL ONLY: find_all_pending /               │
//! │                           mark_as_synced / delete_synced / sync_status │
//! │                                                                         │
//! │   LocalStore  = 4 × (entity repository + SyncTracked)                  │
//! │   RemoteStore = 4 × entity repository                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Shared Semantics
//! - Reads never fail on "no match": they return `None` or an empty `Vec`.
//! - `create` borrows its input and returns the stored row.
//! - `update` writes only the provided fields and fails with
//!   [`StoreError::NotFound`] when the row is missing.
//! - `delete` of a missing row is not an error.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreResult;
use crate::types::{
    DayExercise, DayExerciseUpdate, ExerciseDefinition, ExerciseDefinitionUpdate, ExerciseSet,
    ExerciseSetUpdate, NewDayExercise, NewExerciseDefinition, NewExerciseSet, NewTrainingDay,
    SyncStatus, TrainingDay, TrainingDayUpdate,
};

// =============================================================================
// Entity Repositories
// =============================================================================

#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    async fn find_all(&self) -> StoreResult<Vec<ExerciseDefinition>>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<ExerciseDefinition>>;

    async fn create(&self, input: &NewExerciseDefinition) -> StoreResult<ExerciseDefinition>;

    async fn update(
        &self,
        id: &str,
        update: &ExerciseDefinitionUpdate,
    ) -> StoreResult<ExerciseDefinition>;

    async fn delete(&self, id: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait TrainingDayRepository: Send + Sync {
    async fn find_all(&self) -> StoreResult<Vec<TrainingDay>>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<TrainingDay>>;

    async fn find_by_date(&self, date: NaiveDate) -> StoreResult<Option<TrainingDay>>;

    async fn create(&self, input: &NewTrainingDay) -> StoreResult<TrainingDay>;

    /// Returns the day for `input.date`, creating it from `input` if absent.
    ///
    /// The flag is `true` when the row was created by this call.
    async fn get_or_create(&self, input: &NewTrainingDay) -> StoreResult<(TrainingDay, bool)>;

    async fn update(&self, id: &str, update: &TrainingDayUpdate) -> StoreResult<TrainingDay>;

    async fn delete(&self, id: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait DayExerciseRepository: Send + Sync {
    async fn find_all(&self) -> StoreResult<Vec<DayExercise>>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<DayExercise>>;

    /// Day exercises of one training day, by `display_order`.
    async fn find_by_parent_id(&self, training_day_id: &str) -> StoreResult<Vec<DayExercise>>;

    async fn create(&self, input: &NewDayExercise) -> StoreResult<DayExercise>;

    async fn update(&self, id: &str, update: &DayExerciseUpdate) -> StoreResult<DayExercise>;

    async fn delete(&self, id: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait ExerciseSetRepository: Send + Sync {
    async fn find_all(&self) -> StoreResult<Vec<ExerciseSet>>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<ExerciseSet>>;

    /// Sets of one day exercise, by `set_order`.
    async fn find_by_parent_id(&self, day_exercise_id: &str) -> StoreResult<Vec<ExerciseSet>>;

    async fn create(&self, input: &NewExerciseSet) -> StoreResult<ExerciseSet>;

    /// Creates all `inputs` under `day_exercise_id`, in input order.
    ///
    /// The parent id overrides whatever the inputs carry.
    async fn bulk_create(
        &self,
        day_exercise_id: &str,
        inputs: &[NewExerciseSet],
    ) -> StoreResult<Vec<ExerciseSet>>;

    async fn update(&self, id: &str, update: &ExerciseSetUpdate) -> StoreResult<ExerciseSet>;

    async fn delete(&self, id: &str) -> StoreResult<()>;
}

// =============================================================================
// Local-only Extension
// =============================================================================

/// Sync bookkeeping on local rows.
#[async_trait]
pub trait SyncTracked<T>: Send + Sync {
    /// Rows still `pending`, oldest first.
    async fn find_all_pending(&self) -> StoreResult<Vec<T>>;

    async fn mark_as_synced(&self, id: &str) -> StoreResult<()>;

    /// Deletes `synced` rows that no longer have local children.
    ///
    /// Returns the number of rows removed.
    async fn delete_synced(&self) -> StoreResult<u64>;

    async fn sync_status(&self, id: &str) -> StoreResult<Option<SyncStatus>>;
}

pub trait LocalExerciseRepository: ExerciseRepository + SyncTracked<ExerciseDefinition> {}

impl<R> LocalExerciseRepository for R where R: ExerciseRepository + SyncTracked<ExerciseDefinition> {}

pub trait LocalTrainingDayRepository: TrainingDayRepository + SyncTracked<TrainingDay> {}

impl<R> LocalTrainingDayRepository for R where R: TrainingDayRepository + SyncTracked<TrainingDay> {}

pub trait LocalDayExerciseRepository: DayExerciseRepository + SyncTracked<DayExercise> {}

impl<R> LocalDayExerciseRepository for R where R: DayExerciseRepository + SyncTracked<DayExercise> {}

pub trait LocalExerciseSetRepository: ExerciseSetRepository + SyncTracked<ExerciseSet> {}

impl<R> LocalExerciseSetRepository for R where R: ExerciseSetRepository + SyncTracked<ExerciseSet> {}

// =============================================================================
// Store Bundles
// =============================================================================

/// The guest-mode store: every table carries a sync status.
pub trait LocalStore: Send + Sync {
    fn exercises(&self) -> &dyn LocalExerciseRepository;

    fn training_days(&self) -> &dyn LocalTrainingDayRepository;

    fn day_exercises(&self) -> &dyn LocalDayExerciseRepository;

    fn exercise_sets(&self) -> &dyn LocalExerciseSetRepository;
}

/// The signed-in store, authoritative once data lands there.
pub trait RemoteStore: Send + Sync {
    fn exercises(&self) -> &dyn ExerciseRepository;

    fn training_days(&self) -> &dyn TrainingDayRepository;

    fn day_exercises(&self) -> &dyn DayExerciseRepository;

    fn exercise_sets(&self) -> &dyn ExerciseSetRepository;
}
