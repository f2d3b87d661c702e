//! # Repository Module
//!
//! SQLite implementations of the core repository contracts.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Local Repositories                                   │
//! │                                                                         │
//! │  Each repository has two faces:                                        │
//! │                                                                         │
//! │  inherent methods  → DbResult<T>     (used inside this crate, seed)    │
//! │  trait impls       → StoreResult<T>  (entity contract + SyncTracked)   │
//! │                                                                         │
//! │  The trait impls delegate to the inherent methods and convert          │
//! │  DbError into StoreError.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`exercise::LocalExercises`] - Exercise library
//! - [`training_day::LocalTrainingDays`] - Training days (unique per date)
//! - [`day_exercise::LocalDayExercises`] - Exercises scheduled on a day
//! - [`exercise_set::LocalExerciseSets`] - Sets of a day exercise

use chrono::{DateTime, Utc};
use ironlog_core::SyncStatus;
use sqlx::SqlitePool;

use crate::error::{DbError, DbResult};

pub mod day_exercise;
pub mod exercise;
pub mod exercise_set;
pub mod training_day;

/// Current time truncated to microseconds, the precision stored in SQLite.
///
/// Keeps returned rows equal to what a later read produces.
pub(crate) fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

/// Sets `sync_status = 'synced'` on one row of `table`.
///
/// Fails with NotFound when no row has that id.
pub(crate) async fn mark_synced(
    pool: &SqlitePool,
    table: &str,
    entity: &str,
    id: &str,
) -> DbResult<()> {
    let sql = format!("UPDATE {table} SET sync_status = ?1 WHERE id = ?2");
    let result = sqlx::query(&sql)
        .bind(SyncStatus::Synced)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(entity, id));
    }
    Ok(())
}

/// Reads the sync status of one row of `table`.
pub(crate) async fn sync_status_of(
    pool: &SqlitePool,
    table: &str,
    id: &str,
) -> DbResult<Option<SyncStatus>> {
    let sql = format!("SELECT sync_status FROM {table} WHERE id = ?1");
    let status = sqlx::query_scalar::<_, SyncStatus>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(status)
}

/// Deletes a row by id. Missing rows are not an error.
pub(crate) async fn delete_by_id(pool: &SqlitePool, table: &str, id: &str) -> DbResult<u64> {
    let sql = format!("DELETE FROM {table} WHERE id = ?1");
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    Ok(result.rows_affected())
}
