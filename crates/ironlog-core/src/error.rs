//! # Error Types
//!
//! Domain-specific error types for ironlog-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ironlog-core errors (this file)                                       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── StoreError       - Repository contract failures (local + remote)  │
//! │                                                                         │
//! │  ironlog-db errors (separate crate)                                    │
//! │  └── DbError          - SQLite failures, converted into StoreError     │
//! │                                                                         │
//! │  ironlog-sync errors (separate crate)                                  │
//! │  └── SyncError        - Job, config and HTTP failures                  │
//! │                                                                         │
//! │  Flow: ValidationError → StoreError → SyncError → SyncOutcome.error    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write reaches a store, local or remote.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date, invalid URL).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn too_long(field: &str, max: usize) -> Self {
        ValidationError::TooLong {
            field: field.to_string(),
            max,
        }
    }

    pub(crate) fn negative(field: &str) -> Self {
        ValidationError::Negative {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid_format(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Store Error
// =============================================================================

/// Errors returned by every repository implementation.
///
/// Both backends speak this type so the sync job can treat them alike.
/// Backend-specific detail is flattened into the message strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Row does not exist (update / mark_as_synced on a missing id).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique or primary-key constraint rejected the write.
    #[error("{entity} conflict: {detail}")]
    Conflict { entity: String, detail: String },

    /// Input rejected before the write.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Remote backend refused the credentials.
    #[error("Not authorized by the remote backend")]
    Unauthorized,

    /// Store could not be reached (network, closed pool).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Conflict error.
    pub fn conflict(entity: impl Into<String>, detail: impl Into<String>) -> Self {
        StoreError::Conflict {
            entity: entity.into(),
            detail: detail.into(),
        }
    }

    /// Returns true for failures a later attempt may not hit.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type for repository operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
