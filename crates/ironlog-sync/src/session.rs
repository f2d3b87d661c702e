//! # Guest Data Sync Session
//!
//! Coordinator the app calls right after sign-in. Wraps [`SyncJob`] with a
//! state indicator, a "nothing to do" shortcut, post-upload cleanup and a
//! guard against a second concurrent trigger.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ──sync_if_needed──► Syncing ──success──► Succeeded              │
//! │     ▲                         │                     │                   │
//! │     │                         └──failure──► Failed(msg)                │
//! │     │                                               │                   │
//! │     └───────────── next sync_if_needed ◄────────────┘                  │
//! │                                                                         │
//! │   Second call while Syncing → SyncError::AlreadyRunning                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use ironlog_core::{LocalStore, RemoteStore};
use ironlog_db::{Database, DbConfig};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::job::{SyncJob, SyncOutcome};
use crate::maintenance::{cleanup_synced_local_data, pending_data_count, CleanupSummary};
use crate::progress::ProgressCallback;
use crate::remote::RestRemote;

/// Upload state, for a UI indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "camelCase")]
pub enum SyncState {
    Idle,
    Syncing,
    Succeeded,
    Failed(String),
}

/// Result of [`GuestDataSync::sync_if_needed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAttempt {
    /// No pending local rows; nothing was sent.
    NothingToSync,
    /// The job ran. Cleanup is `Some` when it succeeded and cleanup is on.
    Completed {
        outcome: SyncOutcome,
        cleanup: Option<CleanupSummary>,
    },
}

/// Single-flight wrapper around [`SyncJob`].
pub struct GuestDataSync {
    local: Arc<dyn LocalStore>,
    job: SyncJob,
    cleanup_after_sync: bool,
    state: RwLock<SyncState>,
    in_flight: Mutex<()>,
}

impl GuestDataSync {
    pub fn new(
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        cleanup_after_sync: bool,
    ) -> Self {
        GuestDataSync {
            job: SyncJob::new(local.clone(), remote),
            local,
            cleanup_after_sync,
            state: RwLock::new(SyncState::Idle),
            in_flight: Mutex::new(()),
        }
    }

    /// Opens the local database and the REST remote described by `config`.
    ///
    /// ## Errors
    /// `InvalidConfig` when the remote session is incomplete, `Store` when
    /// the database cannot be opened.
    pub async fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        config.validate()?;
        config.require_remote()?;

        let db = Database::new(DbConfig::new(&config.local.database_path)).await?;
        let remote = RestRemote::new(&config.remote)?;

        Ok(GuestDataSync::new(
            Arc::new(db),
            Arc::new(remote),
            config.sync.cleanup_after_sync,
        ))
    }

    pub async fn state(&self) -> SyncState {
        self.state.read().await.clone()
    }

    /// Uploads pending guest data if there is any.
    ///
    /// ## Arguments
    /// * `progress` - Optional callback, forwarded to [`SyncJob::run`]
    ///
    /// ## Returns
    /// * `NothingToSync` - No pending rows, state unchanged
    /// * `Completed` - The job ran; check `outcome.success`
    ///
    /// ## Errors
    /// `AlreadyRunning` if another call is in flight. Pending-count and
    /// cleanup failures propagate; job failures are reported in the outcome.
    pub async fn sync_if_needed(
        &self,
        progress: Option<ProgressCallback<'_>>,
    ) -> SyncResult<SyncAttempt> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| SyncError::AlreadyRunning)?;

        let pending = pending_data_count(self.local.as_ref()).await?;
        if pending.is_empty() {
            debug!("No pending guest data");
            return Ok(SyncAttempt::NothingToSync);
        }

        info!(pending = pending.total, "Pending guest data found");
        *self.state.write().await = SyncState::Syncing;

        let outcome = self.job.run(progress).await;
        if !outcome.success {
            let message = outcome.error.clone().unwrap_or_default();
            *self.state.write().await = SyncState::Failed(message);
            return Ok(SyncAttempt::Completed {
                outcome,
                cleanup: None,
            });
        }

        *self.state.write().await = SyncState::Succeeded;

        let cleanup = if self.cleanup_after_sync {
            Some(cleanup_synced_local_data(self.local.as_ref()).await?)
        } else {
            None
        };

        Ok(SyncAttempt::Completed { outcome, cleanup })
    }
}
