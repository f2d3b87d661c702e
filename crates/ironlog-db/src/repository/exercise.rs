//! # Exercise Library Repository
//!
//! Local storage for [`ExerciseDefinition`] rows.
//!
//! ## Cleanup Guard
//! ```text
//! day_exercises.exercise_id → exercises.id  ON DELETE SET NULL
//!
//! Deleting a synced exercise that a local day exercise still points at
//! would silently turn that (pending) row into a placeholder, so
//! delete_synced() keeps every exercise that is still referenced.
//! ```

use async_trait::async_trait;
use ironlog_core::validation::{validate_exercise_update, validate_id, validate_new_exercise};
use ironlog_core::{
    ExerciseDefinition, ExerciseDefinitionUpdate, ExerciseRepository, NewExerciseDefinition,
    Record, StoreResult, SyncStatus, SyncTracked,
};
use sqlx::SqlitePool;
use tracing::debug;

use super::{delete_by_id, mark_synced, now, sync_status_of};
use crate::error::{DbError, DbResult};

const TABLE: &str = "exercises";

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, target_muscle, description, link, created_at, updated_at
    FROM exercises
"#;

/// Repository for the local exercise library.
#[derive(Debug, Clone)]
pub struct LocalExercises {
    pool: SqlitePool,
}

impl LocalExercises {
    /// Creates a new LocalExercises repository.
    pub fn new(pool: SqlitePool) -> Self {
        LocalExercises { pool }
    }

    /// Lists every exercise, oldest first.
    pub async fn list(&self) -> DbResult<Vec<ExerciseDefinition>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY created_at ASC, rowid ASC");
        let rows = sqlx::query_as::<_, ExerciseDefinition>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Gets an exercise by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(ExerciseDefinition))` - Exercise found
    /// * `Ok(None)` - Exercise not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ExerciseDefinition>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let row = sqlx::query_as::<_, ExerciseDefinition>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Inserts a new exercise as `pending`.
    ///
    /// ## Arguments
    /// * `input` - Name, target muscle and optional details. An explicit
    ///   `id` must be a UUID.
    pub async fn insert(&self, input: &NewExerciseDefinition) -> DbResult<ExerciseDefinition> {
        validate_new_exercise(input)?;
        if let Some(id) = &input.id {
            validate_id("id", id)?;
        }

        let row = input.to_row(now());
        debug!(id = %row.id, name = %row.name, "Inserting exercise");

        sqlx::query(
            r#"
            INSERT INTO exercises (
                id, name, target_muscle, description, link,
                created_at, updated_at, sync_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.target_muscle)
        .bind(&row.description)
        .bind(&row.link)
        .bind(row.created_at)
        .bind(row.updated_at)
        .bind(SyncStatus::Pending)
        .execute(&self.pool)
        .await?;

        Ok(row)
    }

    /// Applies a partial update. The row keeps its sync status.
    pub async fn patch(
        &self,
        id: &str,
        update: &ExerciseDefinitionUpdate,
    ) -> DbResult<ExerciseDefinition> {
        validate_exercise_update(update)?;

        let mut row = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(ExerciseDefinition::ENTITY, id))?;
        update.apply(&mut row, now());

        sqlx::query(
            r#"
            UPDATE exercises
            SET name = ?1, target_muscle = ?2, description = ?3, link = ?4, updated_at = ?5
            WHERE id = ?6
            "#,
        )
        .bind(&row.name)
        .bind(&row.target_muscle)
        .bind(&row.description)
        .bind(&row.link)
        .bind(row.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(row)
    }

    /// Pending exercises, oldest first.
    pub async fn list_pending(&self) -> DbResult<Vec<ExerciseDefinition>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE sync_status = ?1 ORDER BY created_at ASC, rowid ASC"
        );
        let rows = sqlx::query_as::<_, ExerciseDefinition>(&sql)
            .bind(SyncStatus::Pending)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Deletes synced exercises no local day exercise references.
    pub async fn purge_synced(&self) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM exercises
            WHERE sync_status = ?1
              AND NOT EXISTS (
                  SELECT 1 FROM day_exercises de WHERE de.exercise_id = exercises.id
              )
            "#,
        )
        .bind(SyncStatus::Synced)
        .execute(&self.pool)
        .await?;

        debug!(removed = result.rows_affected(), "Purged synced exercises");
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Contract Implementations
// =============================================================================

#[async_trait]
impl ExerciseRepository for LocalExercises {
    async fn find_all(&self) -> StoreResult<Vec<ExerciseDefinition>> {
        Ok(self.list().await?)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<ExerciseDefinition>> {
        Ok(self.get_by_id(id).await?)
    }

    async fn create(&self, input: &NewExerciseDefinition) -> StoreResult<ExerciseDefinition> {
        Ok(self.insert(input).await?)
    }

    async fn update(
        &self,
        id: &str,
        update: &ExerciseDefinitionUpdate,
    ) -> StoreResult<ExerciseDefinition> {
        Ok(self.patch(id, update).await?)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        delete_by_id(&self.pool, TABLE, id).await?;
        Ok(())
    }
}

#[async_trait]
impl SyncTracked<ExerciseDefinition> for LocalExercises {
    async fn find_all_pending(&self) -> StoreResult<Vec<ExerciseDefinition>> {
        Ok(self.list_pending().await?)
    }

    async fn mark_as_synced(&self, id: &str) -> StoreResult<()> {
        Ok(mark_synced(&self.pool, TABLE, ExerciseDefinition::ENTITY, id).await?)
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
    use crate::repository::test_support::{database, uuid};
    use ironlog_core::{StoreError, ValidationError};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_create_and_read_back() {
        let db = database().await;
        let repo = db.exercises();

        let created = repo
            .create(&NewExerciseDefinition::new("Bench Press", "Chest").with_description("Flat"))
            .await
            .unwrap();

        let found = repo.find_by_id(&created.id).await.unwrap();
        assert_eq!(found, Some(created.clone()));
        assert_eq!(
            repo.sync_status(&created.id).await.unwrap(),
            Some(SyncStatus::Pending)
        );
        assert_eq!(repo.find_by_id("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_keeps_explicit_id() {
        let db = database().await;
        let mut input = NewExerciseDefinition::new("Squat", "Legs");
        input.id = Some(uuid(7));

        let created = db.exercises().create(&input).await.unwrap();
        assert_eq!(created.id, uuid(7));

        let err = db.exercises().create(&input).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let db = database().await;

        let err = db
            .exercises()
            .create(&NewExerciseDefinition::new("  ", "Legs"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Validation(ValidationError::Required {
                field: "name".to_string()
            })
        );
        assert!(db.exercises().find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_writes_only_provided_fields() {
        let db = database().await;
        let repo = db.exercises();
        let created = repo
            .create(&NewExerciseDefinition::new("Row", "Back").with_description("Barbell"))
            .await
            .unwrap();

        let updated = repo
            .update(
                &created.id,
                &ExerciseDefinitionUpdate {
                    name: Some("Pendlay Row".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Pendlay Row");
        assert_eq!(updated.description.as_deref(), Some("Barbell"));
        assert_eq!(repo.find_by_id(&created.id).await.unwrap(), Some(updated));

        let err = repo
            .update("missing", &ExerciseDefinitionUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let db = database().await;
        let repo = db.exercises();
        let created = repo
            .create(&NewExerciseDefinition::new("Curl", "Biceps"))
            .await
            .unwrap();

        repo.delete(&created.id).await.unwrap();
        repo.delete(&created.id).await.unwrap();
        assert_eq!(repo.find_by_id(&created.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pending_and_synced_lifecycle() {
        let db = database().await;
        let repo = db.exercises();
        let a = repo
            .create(&NewExerciseDefinition::new("A", "Chest"))
            .await
            .unwrap();
        let b = repo
            .create(&NewExerciseDefinition::new("B", "Back"))
            .await
            .unwrap();

        repo.mark_as_synced(&a.id).await.unwrap();

        let pending: Vec<_> = repo
            .find_all_pending()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(pending, vec![b.id.clone()]);

        assert_eq!(repo.delete_synced().await.unwrap(), 1);
        assert_eq!(repo.find_by_id(&a.id).await.unwrap(), None);
        assert!(repo.find_by_id(&b.id).await.unwrap().is_some());

        let err = repo.mark_as_synced("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
