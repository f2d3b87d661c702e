//! # Exercise Set Repository
//!
//! Local storage for [`ExerciseSet`] rows, ordered by `set_order` within
//! their day exercise.
//!
//! ## Bulk Create
//! ```text
//! bulk_create(parent, [s0, s1, s2])
//!      │
//!      ▼
//! BEGIN ── INSERT s0 ── INSERT s1 ── INSERT s2 ── COMMIT
//!               │
//!               └── any failure → ROLLBACK (no partial group)
//! ```

use async_trait::async_trait;
use ironlog_core::validation::{validate_id, validate_new_set, validate_set_update};
use ironlog_core::{
    ExerciseSet, ExerciseSetRepository, ExerciseSetUpdate, NewExerciseSet, Record, StoreResult,
    SyncStatus, SyncTracked,
};
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use super::{delete_by_id, mark_synced, now, sync_status_of};
use crate::error::{DbError, DbResult};

const TABLE: &str = "exercise_sets";

const SELECT_COLUMNS: &str = r#"
    SELECT id, day_exercise_id, set_order, planned_reps, planned_weight,
           actual_reps, actual_weight, is_completed, completed_at, created_at, updated_at
    FROM exercise_sets
"#;

const INSERT_SQL: &str = r#"
    INSERT INTO exercise_sets (
        id, day_exercise_id, set_order, planned_reps, planned_weight,
        actual_reps, actual_weight, is_completed, completed_at,
        created_at, updated_at, sync_status
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
"#;

/// Repository for local exercise sets.
#[derive(Debug, Clone)]
pub struct LocalExerciseSets {
    pool: SqlitePool,
}

impl LocalExerciseSets {
    /// Creates a new LocalExerciseSets repository.
    pub fn new(pool: SqlitePool) -> Self {
        LocalExerciseSets { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<ExerciseSet>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY day_exercise_id, set_order");
        let rows = sqlx::query_as::<_, ExerciseSet>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ExerciseSet>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let row = sqlx::query_as::<_, ExerciseSet>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Sets of one day exercise, in set order.
    pub async fn list_for_parent(&self, day_exercise_id: &str) -> DbResult<Vec<ExerciseSet>> {
        let sql = format!("{SELECT_COLUMNS} WHERE day_exercise_id = ?1 ORDER BY set_order");
        let rows = sqlx::query_as::<_, ExerciseSet>(&sql)
            .bind(day_exercise_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    fn prepare(input: &NewExerciseSet) -> DbResult<ExerciseSet> {
        validate_new_set(input)?;
        if let Some(id) = &input.id {
            validate_id("id", id)?;
        }
        Ok(input.to_row(now()))
    }

    async fn insert_row<'e, E>(executor: E, row: &ExerciseSet) -> DbResult<()>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query(INSERT_SQL)
            .bind(&row.id)
            .bind(&row.day_exercise_id)
            .bind(row.set_order)
            .bind(row.planned_reps)
            .bind(row.planned_weight)
            .bind(row.actual_reps)
            .bind(row.actual_weight)
            .bind(row.is_completed)
            .bind(row.completed_at)
            .bind(row.created_at)
            .bind(row.updated_at)
            .bind(SyncStatus::Pending)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Inserts a new set as `pending`.
    pub async fn insert(&self, input: &NewExerciseSet) -> DbResult<ExerciseSet> {
        let row = Self::prepare(input)?;
        debug!(id = %row.id, day_exercise_id = %row.day_exercise_id, "Inserting exercise set");

        Self::insert_row(&self.pool, &row).await?;
        Ok(row)
    }

    /// Inserts all `inputs` under `day_exercise_id` in one transaction.
    ///
    /// ## Arguments
    /// * `day_exercise_id` - Parent for every row; overrides the inputs' own
    /// * `inputs` - Sets in the order they are inserted
    pub async fn insert_many(
        &self,
        day_exercise_id: &str,
        inputs: &[NewExerciseSet],
    ) -> DbResult<Vec<ExerciseSet>> {
        let rows = inputs
            .iter()
            .map(|input| {
                let mut input = input.clone();
                input.day_exercise_id = day_exercise_id.to_string();
                Self::prepare(&input)
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(day_exercise_id = %day_exercise_id, count = rows.len(), "Bulk inserting sets");

        let mut tx = self.pool.begin().await?;
        for row in &rows {
            Self::insert_row(&mut *tx, row).await?;
        }
        tx.commit().await?;

        Ok(rows)
    }

    pub async fn patch(&self, id: &str, update: &ExerciseSetUpdate) -> DbResult<ExerciseSet> {
        validate_set_update(update)?;

        let mut row = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(ExerciseSet::ENTITY, id))?;
        update.apply(&mut row, now());

        sqlx::query(
            r#"
            UPDATE exercise_sets
            SET set_order = ?1, planned_reps = ?2, planned_weight = ?3,
                actual_reps = ?4, actual_weight = ?5, is_completed = ?6,
                completed_at = ?7, updated_at = ?8
            WHERE id = ?9
            "#,
        )
        .bind(row.set_order)
        .bind(row.planned_reps)
        .bind(row.planned_weight)
        .bind(row.actual_reps)
        .bind(row.actual_weight)
        .bind(row.is_completed)
        .bind(row.completed_at)
        .bind(row.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_pending(&self) -> DbResult<Vec<ExerciseSet>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE sync_status = ?1 ORDER BY created_at ASC, rowid ASC"
        );
        let rows = sqlx::query_as::<_, ExerciseSet>(&sql)
            .bind(SyncStatus::Pending)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn purge_synced(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM exercise_sets WHERE sync_status = ?1")
            .bind(SyncStatus::Synced)
            .execute(&self.pool)
            .await?;

        debug!(removed = result.rows_affected(), "Purged synced exercise sets");
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Contract Implementations
// =============================================================================

#[async_trait]
impl ExerciseSetRepository for LocalExerciseSets {
    async fn find_all(&self) -> StoreResult<Vec<ExerciseSet>> {
        Ok(self.list().await?)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<ExerciseSet>> {
        Ok(self.get_by_id(id).await?)
    }

    async fn find_by_parent_id(&self, day_exercise_id: &str) -> StoreResult<Vec<ExerciseSet>> {
        Ok(self.list_for_parent(day_exercise_id).await?)
    }

    async fn create(&self, input: &NewExerciseSet) -> StoreResult<ExerciseSet> {
        Ok(self.insert(input).await?)
    }

    async fn bulk_create(
        &self,
        day_exercise_id: &str,
        inputs: &[NewExerciseSet],
    ) -> StoreResult<Vec<ExerciseSet>> {
        Ok(self.insert_many(day_exercise_id, inputs).await?)
    }

    async fn update(&self, id: &str, update: &ExerciseSetUpdate) -> StoreResult<ExerciseSet> {
        Ok(self.patch(id, update).await?)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        delete_by_id(&self.pool, TABLE, id).await?;
        Ok(())
    }
}

#[async_trait]
impl SyncTracked<ExerciseSet> for LocalExerciseSets {
    async fn find_all_pending(&self) -> StoreResult<Vec<ExerciseSet>> {
        Ok(self.list_pending().await?)
    }

    async fn mark_as_synced(&self, id: &str) -> StoreResult<()> {
        Ok(mark_synced(&self.pool, TABLE, ExerciseSet::ENTITY, id).await?)
    }

    async fn delete_synced(&self) -> StoreResult<u64> {
        Ok(self.purge_synced().await?)
    }

    async fn sync_status(&self, id: &str) -> StoreResult<Option<SyncStatus>> {
        Ok(sync_status_of(&self.pool, TABLE, id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::database;
    use chrono::{NaiveDate, Utc};
    use ironlog_core::{
        DayExerciseRepository, NewDayExercise, NewTrainingDay, StoreError, TrainingDayRepository,
    };
    use pretty_assertions::assert_eq;

    async fn seeded_parent(db: &crate::Database) -> String {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let day = db.training_days().create(&NewTrainingDay::new(date)).await.unwrap();
        db.day_exercises()
            .create(&NewDayExercise::new(day.id, None, 0))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_bulk_create_overrides_parent_and_keeps_order() {
        let db = database().await;
        let parent = seeded_parent(&db).await;

        let inputs = vec![
            NewExerciseSet::planned("ignored", 0, Some(10), Some(60.0)),
            NewExerciseSet::planned("ignored", 1, Some(8), Some(70.0)),
        ];
        let created = db.exercise_sets().bulk_create(&parent, &inputs).await.unwrap();

        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|s| s.day_exercise_id == parent));

        let stored = db.exercise_sets().find_by_parent_id(&parent).await.unwrap();
        assert_eq!(stored, created);
    }

    #[tokio::test]
    async fn test_bulk_create_is_all_or_nothing() {
        let db = database().await;
        let parent = seeded_parent(&db).await;

        // duplicate set_order within the parent
        let inputs = vec![
            NewExerciseSet::planned(&parent, 0, Some(10), None),
            NewExerciseSet::planned(&parent, 0, Some(10), None),
        ];
        let err = db.exercise_sets().bulk_create(&parent, &inputs).await.unwrap_err();

        assert!(matches!(err, StoreError::Conflict { .. }));
        assert!(db.exercise_sets().find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_complete_set() {
        let db = database().await;
        let parent = seeded_parent(&db).await;
        let set = db
            .exercise_sets()
            .create(&NewExerciseSet::planned(&parent, 0, Some(5), Some(100.0)))
            .await
            .unwrap();

        let at = Utc::now();
        let done = db
            .exercise_sets()
            .update(&set.id, &ExerciseSetUpdate::complete(Some(5), Some(102.5), at))
            .await
            .unwrap();

        assert!(done.is_completed);
        assert_eq!(done.actual_weight, Some(102.5));
        assert_eq!(done.planned_weight, Some(100.0));

        let reread = db.exercise_sets().find_by_id(&set.id).await.unwrap().unwrap();
        assert_eq!(reread.actual_reps, Some(5));
        assert!(reread.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_negative_reps_rejected() {
        let db = database().await;
        let parent = seeded_parent(&db).await;

        let err = db
            .exercise_sets()
            .create(&NewExerciseSet::planned(&parent, 0, Some(-1), None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cascade_from_day_exercise() {
        let db = database().await;
        let parent = seeded_parent(&db).await;
        db.exercise_sets()
            .create(&NewExerciseSet::planned(&parent, 0, None, None))
            .await
            .unwrap();

        db.day_exercises().delete(&parent).await.unwrap();
        assert!(db.exercise_sets().find_all().await.unwrap().is_empty());
    }
}
