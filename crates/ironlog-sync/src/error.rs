//! # Sync Error Types
//!
//! Error types for the upload job, its configuration and its coordinator.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Store       │  │       Job               │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Store(..)      │  │  UnresolvedReference    │ │
//! │  │  InvalidUrl     │  │  Http           │  │  AlreadyRunning         │ │
//! │  │  ConfigLoad/Save│  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use ironlog_core::StoreError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering every failure of an upload run.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Invalid remote URL.
    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// A local or remote repository call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(String),

    // =========================================================================
    // Job Errors
    // =========================================================================
    /// A row points at a parent that exists neither in this run's id map
    /// nor in the remote store.
    #[error("Cannot resolve {entity} {id} in the remote store")]
    UnresolvedReference { entity: String, id: String },

    /// Another upload is still in flight.
    #[error("A guest data sync is already running")]
    AlreadyRunning,
}

impl SyncError {
    pub fn unresolved(entity: impl Into<String>, id: impl Into<String>) -> Self {
        SyncError::UnresolvedReference {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns true if a later attempt may succeed without user action.
    ///
    /// ## Retryable Errors
    /// - Store unreachable (network, closed pool)
    /// - A run already in flight
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Store(e) => e.is_transient(),
            SyncError::AlreadyRunning => true,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ironlog_db::DbError> for SyncError {
    fn from(err: ironlog_db::DbError) -> Self {
        SyncError::Store(err.into())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Http(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::Store(StoreError::Unavailable("offline".into())).is_retryable());
        assert!(SyncError::AlreadyRunning.is_retryable());

        assert!(!SyncError::Store(StoreError::Unauthorized).is_retryable());
        assert!(!SyncError::unresolved("TrainingDay", "abc").is_retryable());
        assert!(!SyncError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::unresolved("DayExercise", "abc-123");
        assert!(err.to_string().contains("DayExercise"));
        assert!(err.to_string().contains("abc-123"));

        let store = SyncError::from(StoreError::not_found("ExerciseSet", "s1"));
        assert_eq!(store.to_string(), "ExerciseSet not found: s1");
        assert!(SyncError::InvalidUrl("x".into()).is_config_error());
    }
}
