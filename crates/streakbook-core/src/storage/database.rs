//! SQLite-backed record store.
//!
//! Provides persistent storage for:
//! - Profiles and their streak fields
//! - The shared problem catalogue and each user's solved exercises
//! - The medication log

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::migrations;
use crate::error::StoreError;
use crate::records::{
    ExerciseFields, ExerciseWithProblem, Medication, MedicationFields, NewProblem, NewProfile,
    Problem, Profile, RowRange, SolvedExercise,
};
use crate::store::{RecordStore, StoreResult};
use crate::streak::StreakState;

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "streakbook.db";

/// Busy timeout applied when none is configured.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

const DATE_FORMAT: &str = "%Y-%m-%d";

const PROFILE_COLUMNS: &str = "id, name, streak_count, last_completed_date, created_at, updated_at";

const EXERCISE_COLUMNS: &str =
    "id, user_id, problem_id, notes, date_completed, primary_category, additional_tags, created_at, updated_at";

const JOINED_COLUMNS: &str = "e.id, e.user_id, e.problem_id, e.notes, e.date_completed, e.primary_category,
     e.additional_tags, e.created_at, e.updated_at, p.leetcode_number, p.title, p.link";

/// SQLite database for profiles, exercises and medications.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open (or create) the database at `path`. Waits up to `busy_timeout`
    /// for a lock before reporting the store as unavailable.
    pub fn open_at(path: &Path, busy_timeout: Duration) -> Result<Self, StoreError> {
        debug!(path = %path.display(), "opening database");
        let conn = Connection::open(path)?;
        Self::init(conn, busy_timeout)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, DEFAULT_BUSY_TIMEOUT)
    }

    fn init(conn: Connection, busy_timeout: Duration) -> Result<Self, StoreError> {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn)?;
        Ok(Self { conn })
    }
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn optional_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn tags(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn encode_tags(tags: &[String]) -> StoreResult<String> {
    serde_json::to_string(tags).map_err(|e| StoreError::Unknown(e.to_string()))
}

fn expect_affected(rows: usize, what: &str, id: impl std::fmt::Display) -> StoreResult<()> {
    if rows == 0 {
        return Err(StoreError::NotFound(format!("{what} {id}")));
    }
    Ok(())
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        name: row.get(1)?,
        streak_count: u32::try_from(row.get::<_, i64>(2)?).unwrap_or(0),
        last_completed_date: optional_date(row, 3)?,
        created_at: timestamp(row, 4)?,
        updated_at: timestamp(row, 5)?,
    })
}

fn problem_from_row(row: &Row<'_>) -> rusqlite::Result<Problem> {
    Ok(Problem {
        id: row.get(0)?,
        leetcode_number: row.get(1)?,
        title: row.get(2)?,
        link: row.get(3)?,
        created_at: timestamp(row, 4)?,
        updated_at: timestamp(row, 5)?,
    })
}

fn exercise_from_row(row: &Row<'_>) -> rusqlite::Result<SolvedExercise> {
    Ok(SolvedExercise {
        id: row.get(0)?,
        user_id: row.get(1)?,
        problem_id: row.get(2)?,
        notes: row.get(3)?,
        date_completed: date(row, 4)?,
        primary_category: row.get(5)?,
        additional_tags: tags(row, 6)?,
        created_at: timestamp(row, 7)?,
        updated_at: timestamp(row, 8)?,
    })
}

fn joined_from_row(row: &Row<'_>) -> rusqlite::Result<ExerciseWithProblem> {
    Ok(ExerciseWithProblem {
        id: row.get(0)?,
        user_id: row.get(1)?,
        problem_id: row.get(2)?,
        notes: row.get(3)?,
        date_completed: date(row, 4)?,
        primary_category: row.get(5)?,
        additional_tags: tags(row, 6)?,
        created_at: timestamp(row, 7)?,
        updated_at: timestamp(row, 8)?,
        leetcode_number: row.get(9)?,
        title: row.get(10)?,
        link: row.get(11)?,
    })
}

fn medication_from_row(row: &Row<'_>) -> rusqlite::Result<Medication> {
    Ok(Medication {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: timestamp(row, 4)?,
    })
}

impl RecordStore for Database {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn count_events_on_date(&self, user_id: &str, date: NaiveDate) -> StoreResult<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM solved_exercises WHERE user_id = ?1 AND date_completed = ?2",
            params![user_id, format_date(date)],
            |row| row.get(0),
        )?;
        Ok(count(n))
    }

    fn read_profile(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        let profile = self
            .conn
            .query_row(
                &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"),
                params![user_id],
                profile_from_row,
            )
            .optional()?;
        Ok(profile)
    }

    fn create_profile(&self, profile: &NewProfile) -> StoreResult<Profile> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO profiles (id, name, streak_count, last_completed_date, created_at, updated_at)
             VALUES (?1, ?2, 0, NULL, ?3, ?3)",
            params![profile.id, profile.name, now],
        )?;
        self.read_profile(&profile.id)?
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", profile.id)))
    }

    fn write_streak(&self, user_id: &str, state: StreakState) -> StoreResult<()> {
        let rows = self.conn.execute(
            "UPDATE profiles SET streak_count = ?2, last_completed_date = ?3, updated_at = ?4
             WHERE id = ?1",
            params![
                user_id,
                i64::from(state.streak_count),
                state.last_completed_date.map(format_date),
                Utc::now().to_rfc3339(),
            ],
        )?;
        expect_affected(rows, "profile", user_id)
    }

    fn rename_profile(&self, user_id: &str, name: &str) -> StoreResult<Profile> {
        let rows = self.conn.execute(
            "UPDATE profiles SET name = ?2, updated_at = ?3 WHERE id = ?1",
            params![user_id, name, Utc::now().to_rfc3339()],
        )?;
        expect_affected(rows, "profile", user_id)?;
        self.read_profile(user_id)?
            .ok_or_else(|| StoreError::NotFound(format!("profile {user_id}")))
    }

    fn find_problem_by_number(&self, leetcode_number: i64) -> StoreResult<Option<Problem>> {
        let problem = self
            .conn
            .query_row(
                "SELECT id, leetcode_number, title, link, created_at, updated_at
                 FROM problems WHERE leetcode_number = ?1",
                params![leetcode_number],
                problem_from_row,
            )
            .optional()?;
        Ok(problem)
    }

    fn create_problem(&self, problem: &NewProblem) -> StoreResult<Problem> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO problems (leetcode_number, title, link, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![
                problem.leetcode_number,
                problem.title,
                problem.link,
                now.to_rfc3339()
            ],
        )?;
        Ok(Problem {
            id: self.conn.last_insert_rowid(),
            leetcode_number: problem.leetcode_number,
            title: problem.title.clone(),
            link: problem.link.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    fn update_problem(&self, problem_id: i64, problem: &NewProblem) -> StoreResult<()> {
        let rows = self.conn.execute(
            "UPDATE problems SET leetcode_number = ?2, title = ?3, link = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                problem_id,
                problem.leetcode_number,
                problem.title,
                problem.link,
                Utc::now().to_rfc3339()
            ],
        )?;
        expect_affected(rows, "problem", problem_id)
    }

    fn find_exercise_for_problem(
        &self,
        user_id: &str,
        problem_id: i64,
    ) -> StoreResult<Option<SolvedExercise>> {
        let exercise = self
            .conn
            .query_row(
                &format!(
                    "SELECT {EXERCISE_COLUMNS} FROM solved_exercises
                     WHERE user_id = ?1 AND problem_id = ?2"
                ),
                params![user_id, problem_id],
                exercise_from_row,
            )
            .optional()?;
        Ok(exercise)
    }

    fn insert_exercise(
        &self,
        user_id: &str,
        problem_id: i64,
        fields: &ExerciseFields,
    ) -> StoreResult<SolvedExercise> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO solved_exercises
                (user_id, problem_id, notes, date_completed, primary_category, additional_tags, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                user_id,
                problem_id,
                fields.notes,
                format_date(fields.date_completed),
                fields.primary_category,
                encode_tags(&fields.additional_tags)?,
                now.to_rfc3339(),
            ],
        )?;
        Ok(SolvedExercise {
            id: self.conn.last_insert_rowid(),
            user_id: user_id.to_string(),
            problem_id,
            notes: fields.notes.clone(),
            date_completed: fields.date_completed,
            primary_category: fields.primary_category.clone(),
            additional_tags: fields.additional_tags.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    fn update_exercise(
        &self,
        user_id: &str,
        exercise_id: i64,
        fields: &ExerciseFields,
    ) -> StoreResult<()> {
        let rows = self.conn.execute(
            "UPDATE solved_exercises
             SET notes = ?3, date_completed = ?4, primary_category = ?5, additional_tags = ?6, updated_at = ?7
             WHERE id = ?1 AND user_id = ?2",
            params![
                exercise_id,
                user_id,
                fields.notes,
                format_date(fields.date_completed),
                fields.primary_category,
                encode_tags(&fields.additional_tags)?,
                Utc::now().to_rfc3339(),
            ],
        )?;
        expect_affected(rows, "exercise", exercise_id)
    }

    fn delete_exercise(&self, user_id: &str, exercise_id: i64) -> StoreResult<()> {
        let rows = self.conn.execute(
            "DELETE FROM solved_exercises WHERE id = ?1 AND user_id = ?2",
            params![exercise_id, user_id],
        )?;
        expect_affected(rows, "exercise", exercise_id)
    }

    fn exercise(
        &self,
        user_id: &str,
        exercise_id: i64,
    ) -> StoreResult<Option<ExerciseWithProblem>> {
        let exercise = self
            .conn
            .query_row(
                &format!(
                    "SELECT {JOINED_COLUMNS}
                     FROM solved_exercises e JOIN problems p ON p.id = e.problem_id
                     WHERE e.id = ?1 AND e.user_id = ?2"
                ),
                params![exercise_id, user_id],
                joined_from_row,
            )
            .optional()?;
        Ok(exercise)
    }

    fn list_exercises(
        &self,
        user_id: &str,
        range: RowRange,
    ) -> StoreResult<(Vec<ExerciseWithProblem>, u64)> {
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM solved_exercises WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {JOINED_COLUMNS}
             FROM solved_exercises e JOIN problems p ON p.id = e.problem_id
             WHERE e.user_id = ?1
             ORDER BY e.date_completed DESC, e.id DESC
             LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt.query_map(
            params![user_id, sql_int(range.limit), sql_int(range.offset)],
            joined_from_row,
        )?;
        let items = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((items, count(total)))
    }

    fn insert_medication(
        &self,
        user_id: &str,
        fields: &MedicationFields,
    ) -> StoreResult<Medication> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO medications (user_id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, fields.name, fields.description, now.to_rfc3339()],
        )?;
        Ok(Medication {
            id: self.conn.last_insert_rowid(),
            user_id: user_id.to_string(),
            name: fields.name.clone(),
            description: fields.description.clone(),
            created_at: now,
        })
    }

    fn update_medication(
        &self,
        user_id: &str,
        medication_id: i64,
        fields: &MedicationFields,
    ) -> StoreResult<()> {
        let rows = self.conn.execute(
            "UPDATE medications SET name = ?3, description = ?4 WHERE id = ?1 AND user_id = ?2",
            params![medication_id, user_id, fields.name, fields.description],
        )?;
        expect_affected(rows, "medication", medication_id)
    }

    fn delete_medication(&self, user_id: &str, medication_id: i64) -> StoreResult<()> {
        let rows = self.conn.execute(
            "DELETE FROM medications WHERE id = ?1 AND user_id = ?2",
            params![medication_id, user_id],
        )?;
        expect_affected(rows, "medication", medication_id)
    }

    fn medication(&self, user_id: &str, medication_id: i64) -> StoreResult<Option<Medication>> {
        let medication = self
            .conn
            .query_row(
                "SELECT id, user_id, name, description, created_at
                 FROM medications WHERE id = ?1 AND user_id = ?2",
                params![medication_id, user_id],
                medication_from_row,
            )
            .optional()?;
        Ok(medication)
    }

    fn count_medications(&self, user_id: &str) -> StoreResult<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM medications WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count(n))
    }

    fn list_medications(&self, user_id: &str, range: RowRange) -> StoreResult<Vec<Medication>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, description, created_at
             FROM medications WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(
            params![user_id, sql_int(range.limit), sql_int(range.offset)],
            medication_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
