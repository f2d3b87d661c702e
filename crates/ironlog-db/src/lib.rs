//! # ironlog-db: Local Store for IronLog
//!
//! Guest-mode storage on SQLite via sqlx. Every table carries a local
//! `sync_status` column that the upload job reads and flips.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        IronLog Data Flow                                │
//! │                                                                         │
//! │  Guest user edits a workout                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   ironlog-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌──────────────────┐  ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories    │  │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  LocalExercises  │  │  (embedded)  │  │   │
//! │  │   │ SqlitePool    │◄───│  LocalTraining-  │  │ 001_init.sql │  │   │
//! │  │   │ LocalStore    │    │  Days / ...      │  │              │  │   │
//! │  │   └───────────────┘    └──────────────────┘  └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ironlog-sync reads pending rows and uploads them after sign-in        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and the [`Database`] handle
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-entity repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ironlog_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/ironlog.db")).await?;
//! let pending = db.training_days().find_all_pending().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::day_exercise::LocalDayExercises;
pub use repository::exercise::LocalExercises;
pub use repository::exercise_set::LocalExerciseSets;
pub use repository::training_day::LocalTrainingDays;
