//! Input checks applied before a form reaches the store.

use chrono::{Duration, NaiveDate};

use crate::categories;
use crate::error::ValidationError;
use crate::records::{ExerciseForm, MedicationFields};

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        value: value.to_string(),
    })
}

/// Reject dates more than `max_future_days` after `today`.
pub fn ensure_not_future(
    date: NaiveDate,
    today: NaiveDate,
    max_future_days: u32,
) -> Result<NaiveDate, ValidationError> {
    let latest = today + Duration::days(i64::from(max_future_days));
    if date > latest {
        return Err(ValidationError::DateInFuture { date, latest });
    }
    Ok(date)
}

fn required(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::invalid(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Canonicalize an exercise form: trims text, checks the problem number and
/// categories, and bounds the date.
pub fn exercise_form(
    form: &ExerciseForm,
    today: NaiveDate,
    max_future_days: u32,
) -> Result<ExerciseForm, ValidationError> {
    if form.leetcode_number <= 0 {
        return Err(ValidationError::invalid(
            "leetcode_number",
            "must be a positive number",
        ));
    }
    Ok(ExerciseForm {
        leetcode_number: form.leetcode_number,
        title: required("title", &form.title)?,
        link: required("link", &form.link)?,
        notes: optional(form.notes.as_deref()),
        date_completed: ensure_not_future(form.date_completed, today, max_future_days)?,
        primary_category: categories::primary_category(&form.primary_category)?.to_string(),
        additional_tags: categories::additional_tags(&form.additional_tags)?,
    })
}

/// Trim the medication name (required) and description (blank becomes absent).
pub fn medication_fields(fields: &MedicationFields) -> Result<MedicationFields, ValidationError> {
    Ok(MedicationFields {
        name: required("name", &fields.name)?,
        description: optional(fields.description.as_deref()),
    })
}
