//! The record store seam.
//!
//! Every persistent read and write goes through [`RecordStore`]. Two
//! implementations ship with the crate: [`crate::storage::Database`] (SQLite)
//! and [`crate::remote::RestStore`] (hosted PostgREST). Both report failures
//! as [`StoreError`], never as backend-specific errors.
//!
//! Rows are always scoped by `user_id`; updating or deleting a row that does
//! not belong to the user reports `NotFound`.

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::records::{
    ExerciseFields, ExerciseWithProblem, Medication, MedicationFields, NewProblem, NewProfile,
    Problem, Profile, RowRange, SolvedExercise,
};
use crate::streak::StreakState;

pub type StoreResult<T> = Result<T, StoreError>;

pub trait RecordStore {
    /// Short backend name for logs ("sqlite", "rest").
    fn backend(&self) -> &'static str;

    /// Act on behalf of the signed-in user. Backends that enforce row
    /// ownership themselves need the access token; local ones ignore it.
    fn set_access_token(&self, _token: Option<&str>) {}

    // -- profiles --

    /// Number of completions the user has on `date`.
    fn count_events_on_date(&self, user_id: &str, date: NaiveDate) -> StoreResult<u64>;

    fn read_profile(&self, user_id: &str) -> StoreResult<Option<Profile>>;

    fn create_profile(&self, profile: &NewProfile) -> StoreResult<Profile>;

    /// Persist the streak fields of the profile.
    fn write_streak(&self, user_id: &str, state: StreakState) -> StoreResult<()>;

    fn rename_profile(&self, user_id: &str, name: &str) -> StoreResult<Profile>;

    // -- problems --

    fn find_problem_by_number(&self, leetcode_number: i64) -> StoreResult<Option<Problem>>;

    fn create_problem(&self, problem: &NewProblem) -> StoreResult<Problem>;

    fn update_problem(&self, problem_id: i64, problem: &NewProblem) -> StoreResult<()>;

    // -- solved exercises --

    fn find_exercise_for_problem(
        &self,
        user_id: &str,
        problem_id: i64,
    ) -> StoreResult<Option<SolvedExercise>>;

    fn insert_exercise(
        &self,
        user_id: &str,
        problem_id: i64,
        fields: &ExerciseFields,
    ) -> StoreResult<SolvedExercise>;

    fn update_exercise(
        &self,
        user_id: &str,
        exercise_id: i64,
        fields: &ExerciseFields,
    ) -> StoreResult<()>;

    fn delete_exercise(&self, user_id: &str, exercise_id: i64) -> StoreResult<()>;

    fn exercise(&self, user_id: &str, exercise_id: i64) -> StoreResult<Option<ExerciseWithProblem>>;

    /// A window of the user's exercises, newest `date_completed` first, with
    /// the exact total.
    fn list_exercises(
        &self,
        user_id: &str,
        range: RowRange,
    ) -> StoreResult<(Vec<ExerciseWithProblem>, u64)>;

    // -- medications --

    fn insert_medication(
        &self,
        user_id: &str,
        fields: &MedicationFields,
    ) -> StoreResult<Medication>;

    fn update_medication(
        &self,
        user_id: &str,
        medication_id: i64,
        fields: &MedicationFields,
    ) -> StoreResult<()>;

    fn delete_medication(&self, user_id: &str, medication_id: i64) -> StoreResult<()>;

    fn medication(&self, user_id: &str, medication_id: i64) -> StoreResult<Option<Medication>>;

    fn count_medications(&self, user_id: &str) -> StoreResult<u64>;

    /// A window of the user's medications, newest first.
    fn list_medications(&self, user_id: &str, range: RowRange) -> StoreResult<Vec<Medication>>;
}
