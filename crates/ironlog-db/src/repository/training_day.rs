//! # Training Day Repository
//!
//! Local storage for [`TrainingDay`] rows. The `date` column is unique, so
//! a guest has at most one training day per calendar day.
//!
//! ## Get-or-Create
//! ```text
//! get_or_create(input)
//!      │
//!      ├── find_by_date(input.date) ── Some(day) ──► (day, false)
//!      │
//!      └── None ──► INSERT
//!                     │
//!                     ├── ok ───────────────────────► (new_day, true)
//!                     └── UNIQUE(date) lost a race ─► re-read ► (day, false)
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use ironlog_core::validation::{validate_id, validate_new_training_day, validate_training_day_update};
use ironlog_core::{
    NewTrainingDay, Record, StoreResult, SyncStatus, SyncTracked, TrainingDay,
    TrainingDayRepository, TrainingDayUpdate,
};
use sqlx::SqlitePool;
use tracing::debug;

use super::{delete_by_id, mark_synced, now, sync_status_of};
use crate::error::{DbError, DbResult};

const TABLE: &str = "training_days";

const SELECT_COLUMNS: &str = r#"
    SELECT id, date, title, status, created_at, updated_at
    FROM training_days
"#;

/// Repository for local training days.
#[derive(Debug, Clone)]
pub struct LocalTrainingDays {
    pool: SqlitePool,
}

impl LocalTrainingDays {
    /// Creates a new LocalTrainingDays repository.
    pub fn new(pool: SqlitePool) -> Self {
        LocalTrainingDays { pool }
    }

    /// Lists every training day by date.
    pub async fn list(&self) -> DbResult<Vec<TrainingDay>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY date ASC");
        let rows = sqlx::query_as::<_, TrainingDay>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<TrainingDay>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let row = sqlx::query_as::<_, TrainingDay>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_by_date(&self, date: NaiveDate) -> DbResult<Option<TrainingDay>> {
        let sql = format!("{SELECT_COLUMNS} WHERE date = ?1");
        let row = sqlx::query_as::<_, TrainingDay>(&sql)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Inserts a new training day as `pending`.
    ///
    /// Fails with [`DbError::UniqueViolation`] when the date is taken.
    pub async fn insert(&self, input: &NewTrainingDay) -> DbResult<TrainingDay> {
        validate_new_training_day(input)?;
        if let Some(id) = &input.id {
            validate_id("id", id)?;
        }

        let row = input.to_row(now());
        debug!(id = %row.id, date = %row.date, "Inserting training day");

        sqlx::query(
            r#"
            INSERT INTO training_days (
                id, date, title, status, created_at, updated_at, sync_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&row.id)
        .bind(row.date)
        .bind(&row.title)
        .bind(row.status)
        .bind(row.created_at)
        .bind(row.updated_at)
        .bind(SyncStatus::Pending)
        .execute(&self.pool)
        .await?;

        Ok(row)
    }

    /// Returns the day for `input.date`, creating it when absent.
    ///
    /// ## Returns
    /// * `(day, true)` - Created by this call
    /// * `(day, false)` - Already existed; `input` is ignored
    pub async fn get_or_insert(&self, input: &NewTrainingDay) -> DbResult<(TrainingDay, bool)> {
        if let Some(existing) = self.get_by_date(input.date).await? {
            return Ok((existing, false));
        }

        match self.insert(input).await {
            Ok(created) => Ok((created, true)),
            Err(DbError::UniqueViolation { field }) if field.contains("date") => {
                let existing = self
                    .get_by_date(input.date)
                    .await?
                    .ok_or_else(|| DbError::not_found(TrainingDay::ENTITY, input.date.to_string()))?;
                Ok((existing, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Applies a partial update. The row keeps its sync status.
    pub async fn patch(&self, id: &str, update: &TrainingDayUpdate) -> DbResult<TrainingDay> {
        validate_training_day_update(update)?;

        let mut row = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(TrainingDay::ENTITY, id))?;
        update.apply(&mut row, now());

        sqlx::query("UPDATE training_days SET title = ?1, status = ?2, updated_at = ?3 WHERE id = ?4")
            .bind(&row.title)
            .bind(row.status)
            .bind(row.updated_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn list_pending(&self) -> DbResult<Vec<TrainingDay>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE sync_status = ?1 ORDER BY created_at ASC, rowid ASC"
        );
        let rows = sqlx::query_as::<_, TrainingDay>(&sql)
            .bind(SyncStatus::Pending)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Deletes synced days that no longer have local day exercises.
    ///
    /// The FK cascade would otherwise take pending children with them.
    pub async fn purge_synced(&self) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM training_days
            WHERE sync_status = ?1
              AND NOT EXISTS (
                  SELECT 1 FROM day_exercises de WHERE de.training_day_id = training_days.id
              )
            "#,
        )
        .bind(SyncStatus::Synced)
        .execute(&self.pool)
        .await?;

        debug!(removed = result.rows_affected(), "Purged synced training days");
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Contract Implementations
// =============================================================================

#[async_trait]
impl TrainingDayRepository for LocalTrainingDays {
    async fn find_all(&self) -> StoreResult<Vec<TrainingDay>> {
        Ok(self.list().await?)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<TrainingDay>> {
        Ok(self.get_by_id(id).await?)
    }

    async fn find_by_date(&self, date: NaiveDate) -> StoreResult<Option<TrainingDay>> {
        Ok(self.get_by_date(date).await?)
    }

    async fn create(&self, input: &NewTrainingDay) -> StoreResult<TrainingDay> {
        Ok(self.insert(input).await?)
    }

    async fn get_or_create(&self, input: &NewTrainingDay) -> StoreResult<(TrainingDay, bool)> {
        Ok(self.get_or_insert(input).await?)
    }

    async fn update(&self, id: &str, update: &TrainingDayUpdate) -> StoreResult<TrainingDay> {
        Ok(self.patch(id, update).await?)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        delete_by_id(&self.pool, TABLE, id).await?;
        Ok(())
    }
}

#[async_trait]
impl SyncTracked<TrainingDay> for LocalTrainingDays {
    async fn find_all_pending(&self) -> StoreResult<Vec<TrainingDay>> {
        Ok(self.list_pending().await?)
    }

    async fn mark_as_synced(&self, id: &str) -> StoreResult<()> {
        Ok(mark_synced(&self.pool, TABLE, TrainingDay::ENTITY, id).await?)
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
    use ironlog_core::{
        DayExerciseRepository, NewDayExercise, StoreError, TrainingDayStatus,
    };
    use pretty_assertions::assert_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_find_by_date() {
        let db = database().await;
        let repo = db.training_days();

        let day = repo
            .create(&NewTrainingDay::new(date(10)).with_title("Push"))
            .await
            .unwrap();

        assert_eq!(repo.find_by_date(date(10)).await.unwrap(), Some(day));
        assert_eq!(repo.find_by_date(date(11)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_date_is_unique() {
        let db = database().await;
        let repo = db.training_days();

        repo.create(&NewTrainingDay::new(date(10))).await.unwrap();
        let err = repo.create(&NewTrainingDay::new(date(10))).await.unwrap_err();

        match err {
            StoreError::Conflict { entity, .. } => assert_eq!(entity, "training_days"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_or_create_returns_existing_day() {
        let db = database().await;
        let repo = db.training_days();

        let (first, created) = repo
            .get_or_create(&NewTrainingDay::new(date(10)).with_title("Legs"))
            .await
            .unwrap();
        assert!(created);

        let (second, created) = repo
            .get_or_create(&NewTrainingDay::new(date(10)).with_title("Ignored"))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second, first);
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_status() {
        let db = database().await;
        let repo = db.training_days();
        let day = repo.create(&NewTrainingDay::new(date(10))).await.unwrap();

        let updated = repo
            .update(
                &day.id,
                &TrainingDayUpdate {
                    status: Some(TrainingDayStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, TrainingDayStatus::Completed);
        assert_eq!(
            repo.find_by_id(&day.id).await.unwrap().map(|d| d.status),
            Some(TrainingDayStatus::Completed)
        );
        assert_eq!(repo.sync_status(&day.id).await.unwrap(), Some(SyncStatus::Pending));
    }

    #[tokio::test]
    async fn test_delete_synced_keeps_days_with_local_children() {
        let db = database().await;
        let days = db.training_days();

        let with_child = days.create(&NewTrainingDay::new(date(10))).await.unwrap();
        let empty = days.create(&NewTrainingDay::new(date(11))).await.unwrap();
        db.day_exercises()
            .create(&NewDayExercise::new(with_child.id.clone(), None, 0))
            .await
            .unwrap();

        days.mark_as_synced(&with_child.id).await.unwrap();
        days.mark_as_synced(&empty.id).await.unwrap();

        assert_eq!(days.delete_synced().await.unwrap(), 1);
        assert!(days.find_by_id(&with_child.id).await.unwrap().is_some());
        assert_eq!(days.find_by_id(&empty.id).await.unwrap(), None);
        assert_eq!(
            db.day_exercises().find_by_parent_id(&with_child.id).await.unwrap().len(),
            1
        );
    }
}
