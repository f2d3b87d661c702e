//! # Domain Types
//!
//! Core domain types used throughout IronLog.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Entities (FK dependency order)                       │
//! │                                                                         │
//! │  ┌────────────────────┐        ┌────────────────────┐                  │
//! │  │ ExerciseDefinition │        │    TrainingDay     │                  │
//! │  │  name              │        │  date (unique)     │                  │
//! │  │  target_muscle     │        │  status            │                  │
//! │  └─────────┬──────────┘        └─────────┬──────────┘                  │
//! │            │ exercise_id (nullable)      │ training_day_id             │
//! │            └──────────────┬──────────────┘                             │
//! │                           ▼                                             │
//! │                 ┌────────────────────┐                                  │
//! │                 │    DayExercise     │  display_order (unique per day)  │
//! │                 └─────────┬──────────┘                                  │
//! │                           │ day_exercise_id                             │
//! │                           ▼                                             │
//! │                 ┌────────────────────┐                                  │
//! │                 │    ExerciseSet     │  set_order (unique per parent)   │
//! │                 └────────────────────┘                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity comes with a `New*` input (create) and a `*Update` patch.
//! Patches use `Option<T>` for "leave untouched" and `Option<Option<T>>`
//! for nullable columns, so `Some(None)` clears a value.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Record
// =============================================================================

/// Common accessors the sync job needs on every entity.
pub trait Record {
    /// Entity name used in errors and logs.
    const ENTITY: &'static str;

    fn id(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;
}

/// Sorts rows by creation time, oldest first.
///
/// The sort is stable: rows with identical timestamps keep the order the
/// store returned them in.
pub fn oldest_first<T: Record>(mut rows: Vec<T>) -> Vec<T> {
    rows.sort_by_key(|row| row.created_at());
    rows
}

/// Generates a new entity ID.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Sync Status
// =============================================================================

/// Local-only lifecycle marker for guest rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Created locally, not yet mirrored to the remote store.
    #[default]
    Pending,
    /// Mirrored remotely; eligible for cleanup.
    Synced,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Pending => write!(f, "pending"),
            SyncStatus::Synced => write!(f, "synced"),
        }
    }
}

// =============================================================================
// Exercise Definition
// =============================================================================

/// An exercise in the user's library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ExerciseDefinition {
    pub id: String,
    pub name: String,
    /// Target muscle group, e.g. "Chest".
    pub target_muscle: String,
    pub description: Option<String>,
    /// External reference (video, article).
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for ExerciseDefinition {
    const ENTITY: &'static str = "ExerciseDefinition";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Input for creating an exercise definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExerciseDefinition {
    /// Explicit ID; the store generates one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub target_muscle: String,
    pub description: Option<String>,
    pub link: Option<String>,
}

impl NewExerciseDefinition {
    pub fn new(name: impl Into<String>, target_muscle: impl Into<String>) -> Self {
        NewExerciseDefinition {
            id: None,
            name: name.into(),
            target_muscle: target_muscle.into(),
            description: None,
            link: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Builds the stored row, stamping the ID and timestamps.
    pub fn to_row(&self, now: DateTime<Utc>) -> ExerciseDefinition {
        ExerciseDefinition {
            id: self.id.clone().unwrap_or_else(generate_id),
            name: self.name.trim().to_string(),
            target_muscle: self.target_muscle.trim().to_string(),
            description: self.description.clone(),
            link: self.link.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&ExerciseDefinition> for NewExerciseDefinition {
    fn from(row: &ExerciseDefinition) -> Self {
        NewExerciseDefinition {
            id: Some(row.id.clone()),
            name: row.name.clone(),
            target_muscle: row.target_muscle.clone(),
            description: row.description.clone(),
            link: row.link.clone(),
        }
    }
}

/// Partial update for an exercise definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDefinitionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_muscle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Option<String>>,
}

impl ExerciseDefinitionUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.target_muscle.is_none()
            && self.description.is_none()
            && self.link.is_none()
    }

    /// Writes the provided fields onto `row`.
    pub fn apply(&self, row: &mut ExerciseDefinition, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            row.name = name.trim().to_string();
        }
        if let Some(target_muscle) = &self.target_muscle {
            row.target_muscle = target_muscle.trim().to_string();
        }
        if let Some(description) = &self.description {
            row.description = description.clone();
        }
        if let Some(link) = &self.link {
            row.link = link.clone();
        }
        row.updated_at = now;
    }
}

// =============================================================================
// Training Day
// =============================================================================

/// Planning/progress state of a training day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TrainingDayStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
}

/// One calendar day of training. At most one per date per owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TrainingDay {
    pub id: String,
    pub date: NaiveDate,
    pub title: Option<String>,
    pub status: TrainingDayStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for TrainingDay {
    const ENTITY: &'static str = "TrainingDay";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Input for creating a training day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrainingDay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: NaiveDate,
    pub title: Option<String>,
    #[serde(default)]
    pub status: TrainingDayStatus,
}

impl NewTrainingDay {
    pub fn new(date: NaiveDate) -> Self {
        NewTrainingDay {
            id: None,
            date,
            title: None,
            status: TrainingDayStatus::Planned,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_status(mut self, status: TrainingDayStatus) -> Self {
        self.status = status;
        self
    }

    pub fn to_row(&self, now: DateTime<Utc>) -> TrainingDay {
        TrainingDay {
            id: self.id.clone().unwrap_or_else(generate_id),
            date: self.date,
            title: self.title.clone(),
            status: self.status,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&TrainingDay> for NewTrainingDay {
    fn from(row: &TrainingDay) -> Self {
        NewTrainingDay {
            id: Some(row.id.clone()),
            date: row.date,
            title: row.title.clone(),
            status: row.status,
        }
    }
}

/// Partial update for a training day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingDayUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TrainingDayStatus>,
}

impl TrainingDayUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.status.is_none()
    }

    pub fn apply(&self, row: &mut TrainingDay, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            row.title = title.clone();
        }
        if let Some(status) = self.status {
            row.status = status;
        }
        row.updated_at = now;
    }
}

// =============================================================================
// Day Exercise
// =============================================================================

/// An exercise scheduled on a training day.
///
/// `exercise_id` is `None` once the library exercise has been deleted; the
/// row is then rendered as a "deleted exercise" placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DayExercise {
    pub id: String,
    pub training_day_id: String,
    pub exercise_id: Option<String>,
    /// Render order within the day; unique per training day.
    pub display_order: i64,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DayExercise {
    /// True when the referenced library exercise no longer exists.
    pub fn is_placeholder(&self) -> bool {
        self.exercise_id.is_none()
    }
}

impl Record for DayExercise {
    const ENTITY: &'static str = "DayExercise";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Input for creating a day exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDayExercise {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub training_day_id: String,
    pub exercise_id: Option<String>,
    pub display_order: i64,
    #[serde(default)]
    pub is_completed: bool,
}

impl NewDayExercise {
    pub fn new(
        training_day_id: impl Into<String>,
        exercise_id: Option<String>,
        display_order: i64,
    ) -> Self {
        NewDayExercise {
            id: None,
            training_day_id: training_day_id.into(),
            exercise_id,
            display_order,
            is_completed: false,
        }
    }

    pub fn to_row(&self, now: DateTime<Utc>) -> DayExercise {
        DayExercise {
            id: self.id.clone().unwrap_or_else(generate_id),
            training_day_id: self.training_day_id.clone(),
            exercise_id: self.exercise_id.clone(),
            display_order: self.display_order,
            is_completed: self.is_completed,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&DayExercise> for NewDayExercise {
    fn from(row: &DayExercise) -> Self {
        NewDayExercise {
            id: Some(row.id.clone()),
            training_day_id: row.training_day_id.clone(),
            exercise_id: row.exercise_id.clone(),
            display_order: row.display_order,
            is_completed: row.is_completed,
        }
    }
}

/// Partial update for a day exercise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayExerciseUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl DayExerciseUpdate {
    pub fn is_empty(&self) -> bool {
        self.exercise_id.is_none() && self.display_order.is_none() && self.is_completed.is_none()
    }

    pub fn apply(&self, row: &mut DayExercise, now: DateTime<Utc>) {
        if let Some(exercise_id) = &self.exercise_id {
            row.exercise_id = exercise_id.clone();
        }
        if let Some(display_order) = self.display_order {
            row.display_order = display_order;
        }
        if let Some(is_completed) = self.is_completed {
            row.is_completed = is_completed;
        }
        row.updated_at = now;
    }
}

// =============================================================================
// Exercise Set
// =============================================================================

/// One set of a day exercise, planned and (once done) actual values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ExerciseSet {
    pub id: String,
    pub day_exercise_id: String,
    /// Position within the day exercise; unique per parent.
    pub set_order: i64,
    pub planned_reps: Option<i64>,
    pub planned_weight: Option<f64>,
    pub actual_reps: Option<i64>,
    pub actual_weight: Option<f64>,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for ExerciseSet {
    const ENTITY: &'static str = "ExerciseSet";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Input for creating an exercise set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewExerciseSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub day_exercise_id: String,
    pub set_order: i64,
    pub planned_reps: Option<i64>,
    pub planned_weight: Option<f64>,
    pub actual_reps: Option<i64>,
    pub actual_weight: Option<f64>,
    #[serde(default)]
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl NewExerciseSet {
    /// A planned (not yet performed) set.
    pub fn planned(
        day_exercise_id: impl Into<String>,
        set_order: i64,
        reps: Option<i64>,
        weight: Option<f64>,
    ) -> Self {
        NewExerciseSet {
            day_exercise_id: day_exercise_id.into(),
            set_order,
            planned_reps: reps,
            planned_weight: weight,
            ..Default::default()
        }
    }

    pub fn to_row(&self, now: DateTime<Utc>) -> ExerciseSet {
        ExerciseSet {
            id: self.id.clone().unwrap_or_else(generate_id),
            day_exercise_id: self.day_exercise_id.clone(),
            set_order: self.set_order,
            planned_reps: self.planned_reps,
            planned_weight: self.planned_weight,
            actual_reps: self.actual_reps,
            actual_weight: self.actual_weight,
            is_completed: self.is_completed,
            completed_at: self.completed_at,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&ExerciseSet> for NewExerciseSet {
    fn from(row: &ExerciseSet) -> Self {
        NewExerciseSet {
            id: Some(row.id.clone()),
            day_exercise_id: row.day_exercise_id.clone(),
            set_order: row.set_order,
            planned_reps: row.planned_reps,
            planned_weight: row.planned_weight,
            actual_reps: row.actual_reps,
            actual_weight: row.actual_weight,
            is_completed: row.is_completed,
            completed_at: row.completed_at,
        }
    }
}

/// Partial update for an exercise set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSetUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_reps: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_weight: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_reps: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_weight: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl ExerciseSetUpdate {
    /// Records the performed values and marks the set done.
    pub fn complete(reps: Option<i64>, weight: Option<f64>, at: DateTime<Utc>) -> Self {
        ExerciseSetUpdate {
            actual_reps: Some(reps),
            actual_weight: Some(weight),
            is_completed: Some(true),
            completed_at: Some(Some(at)),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.set_order.is_none()
            && self.planned_reps.is_none()
            && self.planned_weight.is_none()
            && self.actual_reps.is_none()
            && self.actual_weight.is_none()
            && self.is_completed.is_none()
            && self.completed_at.is_none()
    }

    pub fn apply(&self, row: &mut ExerciseSet, now: DateTime<Utc>) {
        if let Some(set_order) = self.set_order {
            row.set_order = set_order;
        }
        if let Some(planned_reps) = self.planned_reps {
            row.planned_reps = planned_reps;
        }
        if let Some(planned_weight) = self.planned_weight {
            row.planned_weight = planned_weight;
        }
        if let Some(actual_reps) = self.actual_reps {
            row.actual_reps = actual_reps;
        }
        if let Some(actual_weight) = self.actual_weight {
            row.actual_weight = actual_weight;
        }
        if let Some(is_completed) = self.is_completed {
            row.is_completed = is_completed;
        }
        if let Some(completed_at) = self.completed_at {
            row.completed_at = completed_at;
        }
        row.updated_at = now;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn day_at(id: &str, created_at: DateTime<Utc>) -> TrainingDay {
        TrainingDay {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            title: None,
            status: TrainingDayStatus::Planned,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_oldest_first_is_stable() {
        let t0 = Utc::now();
        let rows = vec![
            day_at("late", t0 + Duration::seconds(5)),
            day_at("tie-a", t0),
            day_at("early", t0 - Duration::seconds(5)),
            day_at("tie-b", t0),
        ];

        let ids: Vec<_> = oldest_first(rows).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["early", "tie-a", "tie-b", "late"]);
    }

    #[test]
    fn test_new_exercise_uses_explicit_id() {
        let now = Utc::now();
        let mut input = NewExerciseDefinition::new(" Bench Press ", "Chest");
        input.id = Some("fixed".to_string());

        let row = input.to_row(now);
        assert_eq!(row.id, "fixed");
        assert_eq!(row.name, "Bench Press");
        assert_eq!(row.created_at, now);

        let generated = NewExerciseDefinition::new("Squat", "Legs").to_row(now);
        assert!(Uuid::parse_str(&generated.id).is_ok());
    }

    #[test]
    fn test_update_leaves_untouched_fields() {
        let now = Utc::now();
        let mut row = NewExerciseDefinition::new("Row", "Back")
            .with_description("Barbell")
            .to_row(now);

        let update = ExerciseDefinitionUpdate {
            link: Some(Some("https://example.com/row".into())),
            ..Default::default()
        };
        update.apply(&mut row, now);

        assert_eq!(row.description.as_deref(), Some("Barbell"));
        assert_eq!(row.link.as_deref(), Some("https://example.com/row"));

        let clear = ExerciseDefinitionUpdate {
            description: Some(None),
            ..Default::default()
        };
        clear.apply(&mut row, now);
        assert_eq!(row.description, None);
        assert_eq!(row.name, "Row");
    }

    #[test]
    fn test_complete_set_update() {
        let now = Utc::now();
        let mut set = NewExerciseSet::planned("de-1", 0, Some(10), Some(60.0)).to_row(now);

        ExerciseSetUpdate::complete(Some(8), Some(60.0), now).apply(&mut set, now);

        assert!(set.is_completed);
        assert_eq!(set.actual_reps, Some(8));
        assert_eq!(set.planned_reps, Some(10));
        assert_eq!(set.completed_at, Some(now));
    }

    #[test]
    fn test_update_serializes_only_provided_fields() {
        let update = DayExerciseUpdate {
            exercise_id: Some(None),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "exercise_id": null }));
        assert!(!update.is_empty());
        assert!(DayExerciseUpdate::default().is_empty());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&TrainingDayStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(SyncStatus::default(), SyncStatus::Pending);
        assert_eq!(SyncStatus::Synced.to_string(), "synced");
    }
}
