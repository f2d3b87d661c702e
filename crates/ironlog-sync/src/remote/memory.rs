//! # In-Memory Remote Store
//!
//! A [`RemoteStore`] backed by plain vectors behind a tokio `RwLock`.
//! Behaves like the hosted tables: unique keys, foreign keys, cascades
//! and server-side timestamps. Used by tests and offline demos.
//!
//! ## Constraints Enforced
//! ```text
//! exercises       PK id
//! training_days   PK id, UNIQUE date
//! day_exercises   PK id, FK training_day_id (CASCADE), FK exercise_id (SET NULL),
//!                 UNIQUE (training_day_id, display_order)
//! exercise_sets   PK id, FK day_exercise_id (CASCADE),
//!                 UNIQUE (day_exercise_id, set_order)
//! ```

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use ironlog_core::validation::{
    validate_day_exercise_update, validate_exercise_update, validate_id, validate_new_day_exercise,
    validate_new_exercise, validate_new_set, validate_new_training_day, validate_set_update,
    validate_training_day_update,
};
use ironlog_core::{
    DayExercise, DayExerciseRepository, DayExerciseUpdate, ExerciseDefinition,
    ExerciseDefinitionUpdate, ExerciseRepository, ExerciseSet, ExerciseSetRepository,
    ExerciseSetUpdate, NewDayExercise, NewExerciseDefinition, NewExerciseSet, NewTrainingDay,
    Record, RemoteStore, StoreError, StoreResult, TrainingDay, TrainingDayRepository,
    TrainingDayUpdate,
};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    exercises: Vec<ExerciseDefinition>,
    training_days: Vec<TrainingDay>,
    day_exercises: Vec<DayExercise>,
    exercise_sets: Vec<ExerciseSet>,
}

type Shared = Arc<RwLock<Tables>>;

fn check_id(id: &Option<String>) -> StoreResult<()> {
    if let Some(id) = id {
        validate_id("id", id)?;
    }
    Ok(())
}

fn duplicate_id<T: Record>(rows: &[T], id: &str) -> StoreResult<()> {
    if rows.iter().any(|r| r.id() == id) {
        return Err(StoreError::conflict(T::ENTITY, format!("duplicate id {id}")));
    }
    Ok(())
}

fn missing_parent(entity: &str, column: &str, id: &str) -> StoreError {
    StoreError::Backend(format!(
        "{entity}.{column} violates foreign key: {id} does not exist"
    ))
}

/// In-memory remote store.
///
/// Clones share the same tables.
#[derive(Debug, Clone)]
pub struct MemoryRemote {
    exercises: MemoryExercises,
    training_days: MemoryTrainingDays,
    day_exercises: MemoryDayExercises,
    exercise_sets: MemoryExerciseSets,
}

impl MemoryRemote {
    pub fn new() -> Self {
        let state: Shared = Arc::default();
        MemoryRemote {
            exercises: MemoryExercises {
                state: state.clone(),
            },
            training_days: MemoryTrainingDays {
                state: state.clone(),
            },
            day_exercises: MemoryDayExercises {
                state: state.clone(),
            },
            exercise_sets: MemoryExerciseSets { state },
        }
    }

    /// Number of rows per table: (exercises, days, day exercises, sets).
    pub async fn row_counts(&self) -> (usize, usize, usize, usize) {
        let t = self.exercises.state.read().await;
        (
            t.exercises.len(),
            t.training_days.len(),
            t.day_exercises.len(),
            t.exercise_sets.len(),
        )
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStore for MemoryRemote {
    fn exercises(&self) -> &dyn ExerciseRepository {
        &self.exercises
    }

    fn training_days(&self) -> &dyn TrainingDayRepository {
        &self.training_days
    }

    fn day_exercises(&self) -> &dyn DayExerciseRepository {
        &self.day_exercises
    }

    fn exercise_sets(&self) -> &dyn ExerciseSetRepository {
        &self.exercise_sets
    }
}

// =============================================================================
// Exercises
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryExercises {
    state: Shared,
}

#[async_trait]
impl ExerciseRepository for MemoryExercises {
    async fn find_all(&self) -> StoreResult<Vec<ExerciseDefinition>> {
        Ok(self.state.read().await.exercises.clone())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<ExerciseDefinition>> {
        let tables = self.state.read().await;
        Ok(tables.exercises.iter().find(|e| e.id == id).cloned())
    }

    async fn create(&self, input: &NewExerciseDefinition) -> StoreResult<ExerciseDefinition> {
        validate_new_exercise(input)?;
        check_id(&input.id)?;

        let mut tables = self.state.write().await;
        let row = input.to_row(Utc::now());
        duplicate_id(&tables.exercises, &row.id)?;
        tables.exercises.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        id: &str,
        update: &ExerciseDefinitionUpdate,
    ) -> StoreResult<ExerciseDefinition> {
        validate_exercise_update(update)?;

        let mut tables = self.state.write().await;
        let row = tables
            .exercises
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::not_found(ExerciseDefinition::ENTITY, id))?;
        update.apply(row, Utc::now());
        Ok(row.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut tables = self.state.write().await;
        tables.exercises.retain(|e| e.id != id);
        for de in tables
            .day_exercises
            .iter_mut()
            .filter(|de| de.exercise_id.as_deref() == Some(id))
        {
            de.exercise_id = None;
        }
        Ok(())
    }
}

// =============================================================================
// Training Days
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryTrainingDays {
    state: Shared,
}

impl MemoryTrainingDays {
    fn insert(tables: &mut Tables, input: &NewTrainingDay) -> StoreResult<TrainingDay> {
        validate_new_training_day(input)?;
        check_id(&input.id)?;

        let row = input.to_row(Utc::now());
        duplicate_id(&tables.training_days, &row.id)?;
        if tables.training_days.iter().any(|d| d.date == row.date) {
            return Err(StoreError::conflict(
                TrainingDay::ENTITY,
                format!("duplicate date {}", row.date),
            ));
        }
        tables.training_days.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl TrainingDayRepository for MemoryTrainingDays {
    async fn find_all(&self) -> StoreResult<Vec<TrainingDay>> {
        let mut rows = self.state.read().await.training_days.clone();
        rows.sort_by_key(|d| d.date);
        Ok(rows)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<TrainingDay>> {
        let tables = self.state.read().await;
        Ok(tables.training_days.iter().find(|d| d.id == id).cloned())
    }

    async fn find_by_date(&self, date: NaiveDate) -> StoreResult<Option<TrainingDay>> {
        let tables = self.state.read().await;
        Ok(tables.training_days.iter().find(|d| d.date == date).cloned())
    }

    async fn create(&self, input: &NewTrainingDay) -> StoreResult<TrainingDay> {
        let mut tables = self.state.write().await;
        Self::insert(&mut tables, input)
    }

    async fn get_or_create(&self, input: &NewTrainingDay) -> StoreResult<(TrainingDay, bool)> {
        let mut tables = self.state.write().await;
        if let Some(existing) = tables.training_days.iter().find(|d| d.date == input.date) {
            return Ok((existing.clone(), false));
        }
        Ok((Self::insert(&mut tables, input)?, true))
    }

    async fn update(&self, id: &str, update: &TrainingDayUpdate) -> StoreResult<TrainingDay> {
        validate_training_day_update(update)?;

        let mut tables = self.state.write().await;
        let row = tables
            .training_days
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StoreError::not_found(TrainingDay::ENTITY, id))?;
        update.apply(row, Utc::now());
        Ok(row.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut tables = self.state.write().await;
        tables.training_days.retain(|d| d.id != id);

        let orphaned: Vec<String> = tables
            .day_exercises
            .iter()
            .filter(|de| de.training_day_id == id)
            .map(|de| de.id.clone())
            .collect();
        tables.day_exercises.retain(|de| de.training_day_id != id);
        tables
            .exercise_sets
            .retain(|s| !orphaned.contains(&s.day_exercise_id));
        Ok(())
    }
}

// =============================================================================
// Day Exercises
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryDayExercises {
    state: Shared,
}

#[async_trait]
impl DayExerciseRepository for MemoryDayExercises {
    async fn find_all(&self) -> StoreResult<Vec<DayExercise>> {
        Ok(self.state.read().await.day_exercises.clone())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<DayExercise>> {
        let tables = self.state.read().await;
        Ok(tables.day_exercises.iter().find(|d| d.id == id).cloned())
    }

    async fn find_by_parent_id(&self, training_day_id: &str) -> StoreResult<Vec<DayExercise>> {
        let tables = self.state.read().await;
        let mut rows: Vec<_> = tables
            .day_exercises
            .iter()
            .filter(|d| d.training_day_id == training_day_id)
            .cloned()
            .collect();
        rows.sort_by_key(|d| d.display_order);
        Ok(rows)
    }

    async fn create(&self, input: &NewDayExercise) -> StoreResult<DayExercise> {
        validate_new_day_exercise(input)?;
        check_id(&input.id)?;

        let mut tables = self.state.write().await;
        if !tables
            .training_days
            .iter()
            .any(|d| d.id == input.training_day_id)
        {
            return Err(missing_parent(
                DayExercise::ENTITY,
                "training_day_id",
                &input.training_day_id,
            ));
        }
        if let Some(exercise_id) = &input.exercise_id {
            if !tables.exercises.iter().any(|e| &e.id == exercise_id) {
                return Err(missing_parent(DayExercise::ENTITY, "exercise_id", exercise_id));
            }
        }

        let row = input.to_row(Utc::now());
        duplicate_id(&tables.day_exercises, &row.id)?;
        if tables.day_exercises.iter().any(|d| {
            d.training_day_id == row.training_day_id && d.display_order == row.display_order
        }) {
            return Err(StoreError::conflict(
                DayExercise::ENTITY,
                format!("duplicate display_order {}", row.display_order),
            ));
        }
        tables.day_exercises.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: &str, update: &DayExerciseUpdate) -> StoreResult<DayExercise> {
        validate_day_exercise_update(update)?;

        let mut tables = self.state.write().await;
        let row = tables
            .day_exercises
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StoreError::not_found(DayExercise::ENTITY, id))?;
        update.apply(row, Utc::now());
        Ok(row.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut tables = self.state.write().await;
        tables.day_exercises.retain(|d| d.id != id);
        tables.exercise_sets.retain(|s| s.day_exercise_id != id);
        Ok(())
    }
}

// =============================================================================
// Exercise Sets
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryExerciseSets {
    state: Shared,
}

impl MemoryExerciseSets {
    fn check_insert(tables: &Tables, input: &NewExerciseSet) -> StoreResult<ExerciseSet> {
        validate_new_set(input)?;
        check_id(&input.id)?;

        if !tables
            .day_exercises
            .iter()
            .any(|d| d.id == input.day_exercise_id)
        {
            return Err(missing_parent(
                ExerciseSet::ENTITY,
                "day_exercise_id",
                &input.day_exercise_id,
            ));
        }

        let row = input.to_row(Utc::now());
        duplicate_id(&tables.exercise_sets, &row.id)?;
        if tables
            .exercise_sets
            .iter()
            .any(|s| s.day_exercise_id == row.day_exercise_id && s.set_order == row.set_order)
        {
            return Err(StoreError::conflict(
                ExerciseSet::ENTITY,
                format!("duplicate set_order {}", row.set_order),
            ));
        }
        Ok(row)
    }
}

#[async_trait]
impl ExerciseSetRepository for MemoryExerciseSets {
    async fn find_all(&self) -> StoreResult<Vec<ExerciseSet>> {
        Ok(self.state.read().await.exercise_sets.clone())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<ExerciseSet>> {
        let tables = self.state.read().await;
        Ok(tables.exercise_sets.iter().find(|s| s.id == id).cloned())
    }

    async fn find_by_parent_id(&self, day_exercise_id: &str) -> StoreResult<Vec<ExerciseSet>> {
        let tables = self.state.read().await;
        let mut rows: Vec<_> = tables
            .exercise_sets
            .iter()
            .filter(|s| s.day_exercise_id == day_exercise_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.set_order);
        Ok(rows)
    }

    async fn create(&self, input: &NewExerciseSet) -> StoreResult<ExerciseSet> {
        let mut tables = self.state.write().await;
        let row = Self::check_insert(&tables, input)?;
        tables.exercise_sets.push(row.clone());
        Ok(row)
    }

    async fn bulk_create(
        &self,
        day_exercise_id: &str,
        inputs: &[NewExerciseSet],
    ) -> StoreResult<Vec<ExerciseSet>> {
        let mut tables = self.state.write().await;
        let before = tables.exercise_sets.len();

        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            let mut input = input.clone();
            input.day_exercise_id = day_exercise_id.to_string();
            match Self::check_insert(&tables, &input) {
                Ok(row) => {
                    tables.exercise_sets.push(row.clone());
                    created.push(row);
                }
                Err(e) => {
                    tables.exercise_sets.truncate(before);
                    return Err(e);
                }
            }
        }
        Ok(created)
    }

    async fn update(&self, id: &str, update: &ExerciseSetUpdate) -> StoreResult<ExerciseSet> {
        validate_set_update(update)?;

        let mut tables = self.state.write().await;
        let row = tables
            .exercise_sets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::not_found(ExerciseSet::ENTITY, id))?;
        update.apply(row, Utc::now());
        Ok(row.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.state.write().await.exercise_sets.retain(|s| s.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create_by_date() {
        let remote = MemoryRemote::new();
        let days = remote.training_days();

        let (first, created) = days
            .get_or_create(&NewTrainingDay::new(date(10)).with_title("Push"))
            .await
            .unwrap();
        assert!(created);

        let (again, created) = days
            .get_or_create(&NewTrainingDay::new(date(10)))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(again, first);

        let err = days.create(&NewTrainingDay::new(date(10))).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let remote = MemoryRemote::new();

        let err = remote
            .day_exercises()
            .create(&NewDayExercise::new("nope", None, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        let err = remote
            .exercise_sets()
            .bulk_create("nope", &[NewExerciseSet::planned("nope", 0, Some(5), None)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn test_bulk_create_rolls_back_on_conflict() {
        let remote = MemoryRemote::new();
        let (day, _) = remote
            .training_days()
            .get_or_create(&NewTrainingDay::new(date(10)))
            .await
            .unwrap();
        let de = remote
            .day_exercises()
            .create(&NewDayExercise::new(day.id, None, 0))
            .await
            .unwrap();

        let inputs = [
            NewExerciseSet::planned(&de.id, 0, Some(5), None),
            NewExerciseSet::planned(&de.id, 0, Some(5), None),
        ];
        let err = remote
            .exercise_sets()
            .bulk_create(&de.id, &inputs)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(remote.row_counts().await, (0, 1, 1, 0));
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let remote = MemoryRemote::new();
        let exercise = remote
            .exercises()
            .create(&NewExerciseDefinition::new("Squat", "Legs"))
            .await
            .unwrap();
        let (day, _) = remote
            .training_days()
            .get_or_create(&NewTrainingDay::new(date(10)))
            .await
            .unwrap();
        let de = remote
            .day_exercises()
            .create(&NewDayExercise::new(day.id.clone(), Some(exercise.id.clone()), 0))
            .await
            .unwrap();
        remote
            .exercise_sets()
            .create(&NewExerciseSet::planned(&de.id, 0, Some(5), None))
            .await
            .unwrap();

        remote.exercises().delete(&exercise.id).await.unwrap();
        let de = remote.day_exercises().find_by_id(&de.id).await.unwrap().unwrap();
        assert!(de.is_placeholder());

        remote.training_days().delete(&day.id).await.unwrap();
        assert_eq!(remote.row_counts().await, (0, 0, 0, 0));
    }
}
