//! # ironlog-sync: Guest Data Upload
//!
//! After a guest signs in, everything recorded locally is replayed into the
//! remote store in dependency order, parent ids rewritten on the way, and
//! each uploaded row is marked `synced` so an interrupted run resumes.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  LocalStore (SQLite)                        RemoteStore (REST)         │
//! │  ┌──────────────────┐                       ┌──────────────────┐       │
//! │  │ exercises        │ ── 1 ──────────────►  │ exercises        │       │
//! │  │ training_days    │ ── 2 get_or_create ►  │ training_days    │       │
//! │  │ day_exercises    │ ── 3 remap parents ►  │ day_exercises    │       │
//! │  │ exercise_sets    │ ── 4 bulk by parent►  │ exercise_sets    │       │
//! │  └──────────────────┘                       └──────────────────┘       │
//! │          ▲                                                              │
//! │          └── mark_as_synced per row, delete_synced on cleanup          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`job`] - The four-phase upload
//! - [`session`] - Post-login coordinator (single-flight, cleanup)
//! - [`maintenance`] - Pending count and cleanup of synced rows
//! - [`remote`] - REST and in-memory remote stores
//! - [`progress`] - Progress events
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Sync error types

pub mod config;
pub mod error;
pub mod job;
pub mod maintenance;
pub mod progress;
pub mod remote;
pub mod session;

pub use config::{LocalSettings, RemoteSettings, SyncConfig, SyncSettings};
pub use error::{SyncError, SyncResult};
pub use job::{SyncJob, SyncOutcome, SyncSummary};
pub use maintenance::{
    cleanup_synced_local_data, pending_data_count, CleanupSummary, PendingDataCount,
};
pub use progress::{ProgressCallback, SyncPhase, SyncProgress};
pub use remote::{MemoryRemote, RestRemote};
pub use session::{GuestDataSync, SyncAttempt, SyncState};
