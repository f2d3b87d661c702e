//! # Day Exercise Repository
//!
//! Local storage for [`DayExercise`] rows: the exercises scheduled on a
//! training day, rendered by `display_order`.

use async_trait::async_trait;
use ironlog_core::validation::{validate_day_exercise_update, validate_id, validate_new_day_exercise};
use ironlog_core::{
    DayExercise, DayExerciseRepository, DayExerciseUpdate, NewDayExercise, Record, StoreResult,
    SyncStatus, SyncTracked,
};
use sqlx::SqlitePool;
use tracing::debug;

use super::{delete_by_id, mark_synced, now, sync_status_of};
use crate::error::{DbError, DbResult};

const TABLE: &str = "day_exercises";

const SELECT_COLUMNS: &str = r#"
    SELECT id, training_day_id, exercise_id, display_order, is_completed, created_at, updated_at
    FROM day_exercises
"#;

/// Repository for local day exercises.
#[derive(Debug, Clone)]
pub struct LocalDayExercises {
    pool: SqlitePool,
}

impl LocalDayExercises {
    /// Creates a new LocalDayExercises repository.
    pub fn new(pool: SqlitePool) -> Self {
        LocalDayExercises { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<DayExercise>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY training_day_id, display_order");
        let rows = sqlx::query_as::<_, DayExercise>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<DayExercise>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let row = sqlx::query_as::<_, DayExercise>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Day exercises of one training day, in display order.
    pub async fn list_for_day(&self, training_day_id: &str) -> DbResult<Vec<DayExercise>> {
        let sql = format!("{SELECT_COLUMNS} WHERE training_day_id = ?1 ORDER BY display_order");
        let rows = sqlx::query_as::<_, DayExercise>(&sql)
            .bind(training_day_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Inserts a new day exercise as `pending`.
    ///
    /// ## Errors
    /// * `ForeignKeyViolation` - Training day or exercise does not exist
    /// * `UniqueViolation` - `display_order` already used on that day
    pub async fn insert(&self, input: &NewDayExercise) -> DbResult<DayExercise> {
        validate_new_day_exercise(input)?;
        if let Some(id) = &input.id {
            validate_id("id", id)?;
        }

        let row = input.to_row(now());
        debug!(
            id = %row.id,
            training_day_id = %row.training_day_id,
            display_order = row.display_order,
            "Inserting day exercise"
        );

        sqlx::query(
            r#"
            INSERT INTO day_exercises (
                id, training_day_id, exercise_id, display_order, is_completed,
                created_at, updated_at, sync_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&row.id)
        .bind(&row.training_day_id)
        .bind(&row.exercise_id)
        .bind(row.display_order)
        .bind(row.is_completed)
        .bind(row.created_at)
        .bind(row.updated_at)
        .bind(SyncStatus::Pending)
        .execute(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn patch(&self, id: &str, update: &DayExerciseUpdate) -> DbResult<DayExercise> {
        validate_day_exercise_update(update)?;

        let mut row = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(DayExercise::ENTITY, id))?;
        update.apply(&mut row, now());

        sqlx::query(
            r#"
            UPDATE day_exercises
            SET exercise_id = ?1, display_order = ?2, is_completed = ?3, updated_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(&row.exercise_id)
        .bind(row.display_order)
        .bind(row.is_completed)
        .bind(row.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_pending(&self) -> DbResult<Vec<DayExercise>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE sync_status = ?1 ORDER BY created_at ASC, rowid ASC"
        );
        let rows = sqlx::query_as::<_, DayExercise>(&sql)
            .bind(SyncStatus::Pending)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Deletes synced day exercises that no longer have local sets.
    pub async fn purge_synced(&self) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM day_exercises
            WHERE sync_status = ?1
              AND NOT EXISTS (
                  SELECT 1 FROM exercise_sets s WHERE s.day_exercise_id = day_exercises.id
              )
            "#,
        )
        .bind(SyncStatus::Synced)
        .execute(&self.pool)
        .await?;

        debug!(removed = result.rows_affected(), "Purged synced day exercises");
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Contract Implementations
// =============================================================================

#[async_trait]
impl DayExerciseRepository for LocalDayExercises {
    async fn find_all(&self) -> StoreResult<Vec<DayExercise>> {
        Ok(self.list().await?)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<DayExercise>> {
        Ok(self.get_by_id(id).await?)
    }

    async fn find_by_parent_id(&self, training_day_id: &str) -> StoreResult<Vec<DayExercise>> {
        Ok(self.list_for_day(training_day_id).await?)
    }

    async fn create(&self, input: &NewDayExercise) -> StoreResult<DayExercise> {
        Ok(self.insert(input).await?)
    }

    async fn update(&self, id: &str, update: &DayExerciseUpdate) -> StoreResult<DayExercise> {
        Ok(self.patch(id, update).await?)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        delete_by_id(&self.pool, TABLE, id).await?;
        Ok(())
    }
}

#[async_trait]
impl SyncTracked<DayExercise> for LocalDayExercises {
    async fn find_all_pending(&self) -> StoreResult<Vec<DayExercise>> {
        Ok(self.list_pending().await?)
    }

    async fn mark_as_synced(&self, id: &str) -> StoreResult<()> {
        Ok(mark_synced(&self.pool, TABLE, DayExercise::ENTITY, id).await?)
    }

    async fn delete_synced(&self) -> StoreResult<u64> {
        Ok(self.purge_synced().await?)
    }

    async fn sync_status(&self, id: &str) -> StoreResult<Option<SyncStatus>> {
        Ok(sync_status_of(&self.pool, TABLE, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::database;
    use chrono::NaiveDate;
    use ironlog_core::{
        ExerciseRepository, NewExerciseDefinition, NewTrainingDay, StoreError,
        TrainingDayRepository,
    };
    use pretty_assertions::assert_eq;

    async fn seeded_day(db: &crate::Database) -> String {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        db.training_days()
            .create(&NewTrainingDay::new(date))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_find_by_parent_orders_by_display_order() {
        let db = database().await;
        let day = seeded_day(&db).await;
        let repo = db.day_exercises();

        let second = repo.create(&NewDayExercise::new(day.clone(), None, 1)).await.unwrap();
        let first = repo.create(&NewDayExercise::new(day.clone(), None, 0)).await.unwrap();

        let ids: Vec<_> = repo
            .find_by_parent_id(&day)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert!(repo.find_by_parent_id("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_parent_is_rejected() {
        let db = database().await;

        let err = db
            .day_exercises()
            .create(&NewDayExercise::new("no-such-day", None, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn test_deleting_exercise_leaves_placeholder() {
        let db = database().await;
        let day = seeded_day(&db).await;
        let exercise = db
            .exercises()
            .create(&NewExerciseDefinition::new("Dip", "Triceps"))
            .await
            .unwrap();

        let scheduled = db
            .day_exercises()
            .create(&NewDayExercise::new(day, Some(exercise.id.clone()), 0))
            .await
            .unwrap();
        assert!(!scheduled.is_placeholder());

        db.exercises().delete(&exercise.id).await.unwrap();

        let reread = db.day_exercises().find_by_id(&scheduled.id).await.unwrap().unwrap();
        assert!(reread.is_placeholder());
    }

    #[tokio::test]
    async fn test_update_clears_exercise_reference() {
        let db = database().await;
        let day = seeded_day(&db).await;
        let exercise = db
            .exercises()
            .create(&NewExerciseDefinition::new("Lunge", "Legs"))
            .await
            .unwrap();
        let scheduled = db
            .day_exercises()
            .create(&NewDayExercise::new(day, Some(exercise.id), 0))
            .await
            .unwrap();

        let updated = db
            .day_exercises()
            .update(
                &scheduled.id,
                &DayExerciseUpdate {
                    exercise_id: Some(None),
                    is_completed: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.exercise_id, None);
        assert!(updated.is_completed);
        assert_eq!(updated.display_order, 0);
    }
}
