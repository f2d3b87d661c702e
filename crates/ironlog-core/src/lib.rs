//! # ironlog-core: Domain Layer for IronLog
//!
//! Workout entities, input validation and the repository contracts shared by
//! the local (guest) store and the remote (signed-in) store.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        IronLog Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Mobile UI (screens, forms)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ironlog-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌────────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │ validation │  │ repository │  │  error   │  │   │
//! │  │   │ Exercise  │  │   names    │  │ LocalStore │  │ Store    │  │   │
//! │  │   │ Day / Set │  │   dates    │  │ RemoteStore│  │ Error    │  │   │
//! │  │   └───────────┘  └────────────┘  └────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                 │                                 │                     │
//! │  ┌──────────────▼──────────────┐   ┌──────────────▼──────────────┐    │
//! │  │  ironlog-db (local SQLite)  │   │  ironlog-sync (remote + job)│    │
//! │  └─────────────────────────────┘   └─────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities, create inputs and patches
//! - [`validation`] - Field and input validation
//! - [`repository`] - Async repository contracts
//! - [`error`] - Validation and store errors

pub mod error;
pub mod repository;
pub mod types;
pub mod validation;

pub use error::{StoreError, StoreResult, ValidationError, ValidationResult};
pub use repository::{
    DayExerciseRepository, ExerciseRepository, ExerciseSetRepository, LocalDayExerciseRepository,
    LocalExerciseRepository, LocalExerciseSetRepository, LocalStore, LocalTrainingDayRepository,
    RemoteStore, SyncTracked, TrainingDayRepository,
};
pub use types::*;
