//! Row types of the record store and the pagination helpers used to list them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::streak::StreakState;

/// Hosted rows carry `null` for an unset counter or an empty tag list.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One per identity, created at sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub streak_count: u32,
    pub last_completed_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Placeholder used when the profile cannot be read.
    pub fn empty(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: user_id.to_string(),
            name: None,
            streak_count: 0,
            last_completed_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn streak(&self) -> StreakState {
        StreakState::new(self.streak_count, self.last_completed_date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: String,
    pub name: Option<String>,
}

/// Catalogue entry, shared by every user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: i64,
    pub leetcode_number: i64,
    pub title: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProblem {
    pub leetcode_number: i64,
    pub title: String,
    pub link: String,
}

/// A completion: the user solved a problem on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvedExercise {
    pub id: i64,
    pub user_id: String,
    pub problem_id: i64,
    pub notes: Option<String>,
    pub date_completed: NaiveDate,
    pub primary_category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub additional_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable fields of a solved exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseFields {
    pub notes: Option<String>,
    pub date_completed: NaiveDate,
    pub primary_category: String,
    pub additional_tags: Vec<String>,
}

/// Input of the add and edit operations: problem fields plus exercise fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseForm {
    pub leetcode_number: i64,
    pub title: String,
    pub link: String,
    pub notes: Option<String>,
    pub date_completed: NaiveDate,
    pub primary_category: String,
    pub additional_tags: Vec<String>,
}

/// Solved exercise joined with its problem, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseWithProblem {
    pub id: i64,
    pub user_id: String,
    pub problem_id: i64,
    pub notes: Option<String>,
    pub date_completed: NaiveDate,
    pub primary_category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub additional_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub leetcode_number: i64,
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationFields {
    pub name: String,
    pub description: Option<String>,
}

/// Zero-based row window, `limit` rows starting at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub offset: u64,
    pub limit: u64,
}

impl RowRange {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// A single row at `index`.
    pub fn single(index: u64) -> Self {
        Self::new(index, 1)
    }

    /// Inclusive index of the last row, as used by HTTP `Range` headers.
    pub fn last_index(&self) -> u64 {
        self.offset + self.limit.max(1) - 1
    }
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn range(&self) -> RowRange {
        let offset = u64::from(self.page - 1) * u64::from(self.per_page);
        RowRange::new(offset, u64::from(self.per_page))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total_count: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_count: u64) -> Self {
        let per_page = u64::from(request.per_page);
        let pages = total_count.div_ceil(per_page).max(1);
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total_count,
            total_pages: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }
}

/// Numbers shown on the dashboard cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total_exercises: u64,
    pub current_streak: u32,
    pub total_medications: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_to_range() {
        assert_eq!(PageRequest::new(1, 10).range(), RowRange::new(0, 10));
        assert_eq!(PageRequest::new(3, 20).range(), RowRange::new(40, 20));
        // page 0 is clamped to the first page
        assert_eq!(PageRequest::new(0, 10).range(), RowRange::new(0, 10));
    }

    #[test]
    fn last_index_is_inclusive() {
        assert_eq!(RowRange::new(10, 10).last_index(), 19);
        assert_eq!(RowRange::single(7).last_index(), 7);
    }

    #[test]
    fn total_pages_rounds_up_and_never_zero() {
        let req = PageRequest::new(1, 10);
        assert_eq!(Page::<()>::new(vec![], req, 0).total_pages, 1);
        assert_eq!(Page::<()>::new(vec![], req, 10).total_pages, 1);
        assert_eq!(Page::<()>::new(vec![], req, 11).total_pages, 2);
    }

    #[test]
    fn null_counter_and_tags_read_as_empty() {
        let profile: Profile = serde_json::from_str(
            r#"{"id":"u1","name":null,"streak_count":null,"last_completed_date":null,
                "created_at":"2024-06-01T00:00:00Z","updated_at":"2024-06-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(profile.streak_count, 0);

        let exercise: SolvedExercise = serde_json::from_str(
            r#"{"id":1,"user_id":"u1","problem_id":2,"notes":null,
                "date_completed":"2024-06-01","primary_category":"Stack",
                "additional_tags":null,
                "created_at":"2024-06-01T00:00:00Z","updated_at":"2024-06-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(exercise.additional_tags.is_empty());
    }

    #[test]
    fn empty_profile_has_no_streak() {
        let profile = Profile::empty("user-1");
        assert_eq!(profile.streak(), StreakState::default());
        assert!(profile.name.is_none());
    }
}
