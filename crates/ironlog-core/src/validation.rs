//! # Validation Module
//!
//! Input validation for create inputs and patches.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (called by every repository before writing)      │
//! │  ├── Required fields, lengths                                          │
//! │  ├── Non-negative orders, reps and weights                             │
//! │  └── Calendar dates, http(s) links                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Store constraints                                            │
//! │  ├── UNIQUE (date), (day, display_order), (parent, set_order)          │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ironlog_core::validation::{parse_calendar_date, validate_name};
//!
//! assert!(validate_name("name", "Bench Press").is_ok());
//! assert!(parse_calendar_date("2024-01-10").is_ok());
//! assert!(parse_calendar_date("10/01/2024").is_err());
//! ```

use chrono::NaiveDate;

use crate::error::{ValidationError, ValidationResult};
use crate::types::{
    DayExerciseUpdate, ExerciseDefinitionUpdate, ExerciseSetUpdate, NewDayExercise,
    NewExerciseDefinition, NewExerciseSet, NewTrainingDay, TrainingDayUpdate,
};

/// Maximum length of names, muscle groups and titles.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of free-text descriptions.
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Calendar date wire format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a required, length-limited text field.
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::too_long(field, MAX_NAME_LEN));
    }

    Ok(())
}

fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::too_long(field, max)),
        _ => Ok(()),
    }
}

/// Validates an external link: must parse and use http or https.
pub fn validate_link(link: &str) -> ValidationResult<()> {
    let parsed = url::Url::parse(link.trim())
        .map_err(|e| ValidationError::invalid_format("link", e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ValidationError::invalid_format(
            "link",
            format!("unsupported scheme '{}'", other),
        )),
    }
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_calendar_date(value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| ValidationError::invalid_format("date", e.to_string()))
}

fn validate_non_negative(field: &str, value: Option<i64>) -> ValidationResult<()> {
    match value {
        Some(v) if v < 0 => Err(ValidationError::negative(field)),
        _ => Ok(()),
    }
}

fn validate_weight(field: &str, value: Option<f64>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::invalid_format(field, "not a number")),
        Some(v) if v < 0.0 => Err(ValidationError::negative(field)),
        _ => Ok(()),
    }
}

/// Validates an entity ID (UUID string).
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    uuid::Uuid::parse_str(id)
        .map_err(|_| ValidationError::invalid_format(field, "must be a valid UUID"))?;

    Ok(())
}

// =============================================================================
// Input Validators
// =============================================================================

pub fn validate_new_exercise(input: &NewExerciseDefinition) -> ValidationResult<()> {
    validate_name("name", &input.name)?;
    validate_name("target_muscle", &input.target_muscle)?;
    validate_optional_text("description", input.description.as_deref(), MAX_DESCRIPTION_LEN)?;
    if let Some(link) = &input.link {
        validate_link(link)?;
    }
    Ok(())
}

pub fn validate_exercise_update(update: &ExerciseDefinitionUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_name("name", name)?;
    }
    if let Some(target_muscle) = &update.target_muscle {
        validate_name("target_muscle", target_muscle)?;
    }
    if let Some(description) = &update.description {
        validate_optional_text("description", description.as_deref(), MAX_DESCRIPTION_LEN)?;
    }
    if let Some(Some(link)) = &update.link {
        validate_link(link)?;
    }
    Ok(())
}

pub fn validate_new_training_day(input: &NewTrainingDay) -> ValidationResult<()> {
    validate_optional_text("title", input.title.as_deref(), MAX_NAME_LEN)
}

pub fn validate_training_day_update(update: &TrainingDayUpdate) -> ValidationResult<()> {
    if let Some(title) = &update.title {
        validate_optional_text("title", title.as_deref(), MAX_NAME_LEN)?;
    }
    Ok(())
}

pub fn validate_new_day_exercise(input: &NewDayExercise) -> ValidationResult<()> {
    if input.training_day_id.trim().is_empty() {
        return Err(ValidationError::required("training_day_id"));
    }
    validate_non_negative("display_order", Some(input.display_order))
}

pub fn validate_day_exercise_update(update: &DayExerciseUpdate) -> ValidationResult<()> {
    validate_non_negative("display_order", update.display_order)
}

pub fn validate_new_set(input: &NewExerciseSet) -> ValidationResult<()> {
    if input.day_exercise_id.trim().is_empty() {
        return Err(ValidationError::required("day_exercise_id"));
    }
    validate_non_negative("set_order", Some(input.set_order))?;
    validate_non_negative("planned_reps", input.planned_reps)?;
    validate_non_negative("actual_reps", input.actual_reps)?;
    validate_weight("planned_weight", input.planned_weight)?;
    validate_weight("actual_weight", input.actual_weight)
}

pub fn validate_set_update(update: &ExerciseSetUpdate) -> ValidationResult<()> {
    validate_non_negative("set_order", update.set_order)?;
    validate_non_negative("planned_reps", update.planned_reps.flatten())?;
    validate_non_negative("actual_reps", update.actual_reps.flatten())?;
    validate_weight("planned_weight", update.planned_weight.flatten())?;
    validate_weight("actual_weight", update.actual_weight.flatten())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Bench Press").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"A".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_link() {
        assert!(validate_link("https://example.com/bench").is_ok());
        assert!(validate_link("http://example.com").is_ok());
        assert!(validate_link("ftp://example.com").is_err());
        assert!(validate_link("not a url").is_err());
    }

    #[test]
    fn test_parse_calendar_date() {
        let date = parse_calendar_date("2024-01-10").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert!(parse_calendar_date("2024-02-30").is_err());
        assert!(parse_calendar_date("").is_err());
    }

    #[test]
    fn test_validate_new_exercise() {
        let ok = NewExerciseDefinition::new("Bench Press", "Chest");
        assert!(validate_new_exercise(&ok).is_ok());

        let missing_muscle = NewExerciseDefinition::new("Bench Press", "");
        assert_eq!(
            validate_new_exercise(&missing_muscle),
            Err(ValidationError::required("target_muscle"))
        );

        let bad_link = NewExerciseDefinition::new("Bench Press", "Chest").with_link("mailto:x");
        assert!(validate_new_exercise(&bad_link).is_err());
    }

    #[test]
    fn test_validate_new_set() {
        assert!(validate_new_set(&NewExerciseSet::planned("de", 0, Some(10), Some(60.0))).is_ok());
        assert!(validate_new_set(&NewExerciseSet::planned("de", -1, None, None)).is_err());
        assert!(validate_new_set(&NewExerciseSet::planned("de", 0, Some(-3), None)).is_err());
        assert!(validate_new_set(&NewExerciseSet::planned("de", 0, None, Some(f64::NAN))).is_err());
        assert!(validate_new_set(&NewExerciseSet::planned("", 0, None, None)).is_err());
    }

    #[test]
    fn test_validate_set_update_checks_cleared_values() {
        let clear = ExerciseSetUpdate {
            actual_reps: Some(None),
            ..Default::default()
        };
        assert!(validate_set_update(&clear).is_ok());

        let negative = ExerciseSetUpdate {
            actual_weight: Some(Some(-2.5)),
            ..Default::default()
        };
        assert!(validate_set_update(&negative).is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_id("id", "").is_err());
        assert!(validate_id("id", "not-a-uuid").is_err());
    }
}
