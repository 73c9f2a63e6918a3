//! PostgREST-backed [`RecordStore`].
//!
//! Tables live under `{url}/rest/v1/`. Filters use the `eq.` operator,
//! listings send `Range` with `Prefer: count=exact` and read the total back
//! from `Content-Range`. Writes ask for `return=representation` so an update
//! that matched no row can be reported as `NotFound`.

use std::cell::RefCell;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::{RestClient, RestResponse};
use crate::error::StoreError;
use crate::records::{
    ExerciseFields, ExerciseWithProblem, Medication, MedicationFields, NewProblem, NewProfile,
    Problem, Profile, RowRange, SolvedExercise,
};
use crate::store::{RecordStore, StoreResult};
use crate::streak::StreakState;

const EXERCISE_WITH_PROBLEM: &str = "*,problems(leetcode_number,title,link)";

pub struct RestStore {
    client: Arc<RestClient>,
    access_token: RefCell<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct ProblemRef {
    leetcode_number: i64,
    title: String,
    link: String,
}

/// Exercise row with its problem embedded by PostgREST.
#[derive(Debug, Deserialize)]
struct JoinedRow {
    #[serde(flatten)]
    exercise: SolvedExercise,
    problems: ProblemRef,
}

impl From<JoinedRow> for ExerciseWithProblem {
    fn from(row: JoinedRow) -> Self {
        let e = row.exercise;
        ExerciseWithProblem {
            id: e.id,
            user_id: e.user_id,
            problem_id: e.problem_id,
            notes: e.notes,
            date_completed: e.date_completed,
            primary_category: e.primary_category,
            additional_tags: e.additional_tags,
            created_at: e.created_at,
            updated_at: e.updated_at,
            leetcode_number: row.problems.leetcode_number,
            title: row.problems.title,
            link: row.problems.link,
        }
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

fn first<T>(rows: Vec<T>, what: &str) -> StoreResult<T> {
    rows.into_iter()
        .next()
        .ok_or_else(|| StoreError::NotFound(what.to_string()))
}

impl RestStore {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self {
            client,
            access_token: RefCell::new(None),
        }
    }

    fn table(&self, table: &str, query: &[(&str, String)]) -> StoreResult<Url> {
        let mut url = self.client.endpoint(&format!("rest/v1/{table}"))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let token = self.access_token.borrow();
        self.client.request(method, url, token.as_deref())
    }

    fn send(&self, request: RequestBuilder) -> StoreResult<RestResponse> {
        self.client.execute(request)?.into_store_result()
    }

    fn select<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        let url = self.table(table, query)?;
        self.send(self.request(Method::GET, url))?.json()
    }

    fn count(&self, table: &str, query: &[(&str, String)]) -> StoreResult<u64> {
        let url = self.table(table, query)?;
        let resp = self.send(
            self.request(Method::HEAD, url)
                .header("Prefer", "count=exact"),
        )?;
        resp.total_count()
            .ok_or_else(|| StoreError::Unknown(format!("{table}: missing Content-Range total")))
    }

    /// Send a write and return the affected rows.
    fn write<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        table: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> StoreResult<Vec<T>> {
        let url = self.table(table, query)?;
        let mut request = self
            .request(method, url)
            .header("Prefer", "return=representation");
        if let Some(body) = body {
            request = request.json(&body);
        }
        self.send(request)?.json()
    }

    /// Fetch a window of rows plus the exact total.
    fn select_range<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
        range: RowRange,
    ) -> StoreResult<(Vec<T>, u64)> {
        let url = self.table(table, query)?;
        let request = self
            .request(Method::GET, url)
            .header("Prefer", "count=exact")
            .header("Range-Unit", "items")
            .header("Range", format!("{}-{}", range.offset, range.last_index()));
        let resp = self.client.execute(request)?;

        // past the last row: empty window, total still reported
        if resp.status == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok((Vec::new(), resp.total_count().unwrap_or(0)));
        }
        let resp = resp.into_store_result()?;
        let rows: Vec<T> = resp.json()?;
        let total = resp.total_count().unwrap_or(rows.len() as u64);
        debug!(table, offset = range.offset, rows = rows.len(), total, "range query");
        Ok((rows, total))
    }
}

impl RecordStore for RestStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    fn set_access_token(&self, token: Option<&str>) {
        *self.access_token.borrow_mut() = token.map(str::to_string);
    }

    fn count_events_on_date(&self, user_id: &str, date: NaiveDate) -> StoreResult<u64> {
        self.count(
            "solved_exercises",
            &[
                ("select", "id".into()),
                ("user_id", eq(user_id)),
                ("date_completed", eq(date)),
            ],
        )
    }

    fn read_profile(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        let rows: Vec<Profile> =
            self.select("profiles", &[("select", "*".into()), ("id", eq(user_id))])?;
        Ok(rows.into_iter().next())
    }

    fn create_profile(&self, profile: &NewProfile) -> StoreResult<Profile> {
        let rows = self.write(
            Method::POST,
            "profiles",
            &[],
            Some(json!({
                "id": profile.id,
                "name": profile.name,
                "streak_count": 0,
                "last_completed_date": null,
            })),
        )?;
        first(rows, "profile")
    }

    fn write_streak(&self, user_id: &str, state: StreakState) -> StoreResult<()> {
        let rows: Vec<Profile> = self.write(
            Method::PATCH,
            "profiles",
            &[("id", eq(user_id))],
            Some(json!({
                "streak_count": state.streak_count,
                "last_completed_date": state.last_completed_date,
                "updated_at": Utc::now(),
            })),
        )?;
        first(rows, "profile").map(|_| ())
    }

    fn rename_profile(&self, user_id: &str, name: &str) -> StoreResult<Profile> {
        let rows = self.write(
            Method::PATCH,
            "profiles",
            &[("id", eq(user_id))],
            Some(json!({ "name": name, "updated_at": Utc::now() })),
        )?;
        first(rows, "profile")
    }

    fn find_problem_by_number(&self, leetcode_number: i64) -> StoreResult<Option<Problem>> {
        let rows: Vec<Problem> = self.select(
            "problems",
            &[
                ("select", "*".into()),
                ("leetcode_number", eq(leetcode_number)),
            ],
        )?;
        Ok(rows.into_iter().next())
    }

    fn create_problem(&self, problem: &NewProblem) -> StoreResult<Problem> {
        let rows = self.write(
            Method::POST,
            "problems",
            &[],
            Some(serde_json::to_value(problem).map_err(|e| StoreError::Unknown(e.to_string()))?),
        )?;
        first(rows, "problem")
    }

    fn update_problem(&self, problem_id: i64, problem: &NewProblem) -> StoreResult<()> {
        let rows: Vec<Problem> = self.write(
            Method::PATCH,
            "problems",
            &[("id", eq(problem_id))],
            Some(json!({
                "leetcode_number": problem.leetcode_number,
                "title": problem.title,
                "link": problem.link,
                "updated_at": Utc::now(),
            })),
        )?;
        first(rows, "problem").map(|_| ())
    }

    fn find_exercise_for_problem(
        &self,
        user_id: &str,
        problem_id: i64,
    ) -> StoreResult<Option<SolvedExercise>> {
        let rows: Vec<SolvedExercise> = self.select(
            "solved_exercises",
            &[
                ("select", "*".into()),
                ("user_id", eq(user_id)),
                ("problem_id", eq(problem_id)),
            ],
        )?;
        Ok(rows.into_iter().next())
    }

    fn insert_exercise(
        &self,
        user_id: &str,
        problem_id: i64,
        fields: &ExerciseFields,
    ) -> StoreResult<SolvedExercise> {
        let rows = self.write(
            Method::POST,
            "solved_exercises",
            &[],
            Some(json!({
                "user_id": user_id,
                "problem_id": problem_id,
                "notes": fields.notes,
                "date_completed": fields.date_completed,
                "primary_category": fields.primary_category,
                "additional_tags": fields.additional_tags,
            })),
        )?;
        first(rows, "exercise")
    }

    fn update_exercise(
        &self,
        user_id: &str,
        exercise_id: i64,
        fields: &ExerciseFields,
    ) -> StoreResult<()> {
        let rows: Vec<SolvedExercise> = self.write(
            Method::PATCH,
            "solved_exercises",
            &[("id", eq(exercise_id)), ("user_id", eq(user_id))],
            Some(json!({
                "notes": fields.notes,
                "date_completed": fields.date_completed,
                "primary_category": fields.primary_category,
                "additional_tags": fields.additional_tags,
                "updated_at": Utc::now(),
            })),
        )?;
        first(rows, "exercise").map(|_| ())
    }

    fn delete_exercise(&self, user_id: &str, exercise_id: i64) -> StoreResult<()> {
        let rows: Vec<SolvedExercise> = self.write(
            Method::DELETE,
            "solved_exercises",
            &[("id", eq(exercise_id)), ("user_id", eq(user_id))],
            None,
        )?;
        first(rows, "exercise").map(|_| ())
    }

    fn exercise(
        &self,
        user_id: &str,
        exercise_id: i64,
    ) -> StoreResult<Option<ExerciseWithProblem>> {
        let rows: Vec<JoinedRow> = self.select(
            "solved_exercises",
            &[
                ("select", EXERCISE_WITH_PROBLEM.into()),
                ("id", eq(exercise_id)),
                ("user_id", eq(user_id)),
            ],
        )?;
        Ok(rows.into_iter().next().map(ExerciseWithProblem::from))
    }

    fn list_exercises(
        &self,
        user_id: &str,
        range: RowRange,
    ) -> StoreResult<(Vec<ExerciseWithProblem>, u64)> {
        let (rows, total) = self.select_range::<JoinedRow>(
            "solved_exercises",
            &[
                ("select", EXERCISE_WITH_PROBLEM.into()),
                ("user_id", eq(user_id)),
                ("order", "date_completed.desc,id.desc".into()),
            ],
            range,
        )?;
        Ok((rows.into_iter().map(ExerciseWithProblem::from).collect(), total))
    }

    fn insert_medication(
        &self,
        user_id: &str,
        fields: &MedicationFields,
    ) -> StoreResult<Medication> {
        let rows = self.write(
            Method::POST,
            "medications",
            &[],
            Some(json!({
                "user_id": user_id,
                "name": fields.name,
                "description": fields.description,
            })),
        )?;
        first(rows, "medication")
    }

    fn update_medication(
        &self,
        user_id: &str,
        medication_id: i64,
        fields: &MedicationFields,
    ) -> StoreResult<()> {
        let rows: Vec<Medication> = self.write(
            Method::PATCH,
            "medications",
            &[("id", eq(medication_id)), ("user_id", eq(user_id))],
            Some(json!({ "name": fields.name, "description": fields.description })),
        )?;
        first(rows, "medication").map(|_| ())
    }

    fn delete_medication(&self, user_id: &str, medication_id: i64) -> StoreResult<()> {
        let rows: Vec<Medication> = self.write(
            Method::DELETE,
            "medications",
            &[("id", eq(medication_id)), ("user_id", eq(user_id))],
            None,
        )?;
        first(rows, "medication").map(|_| ())
    }

    fn medication(&self, user_id: &str, medication_id: i64) -> StoreResult<Option<Medication>> {
        let rows: Vec<Medication> = self.select(
            "medications",
            &[
                ("select", "*".into()),
                ("id", eq(medication_id)),
                ("user_id", eq(user_id)),
            ],
        )?;
        Ok(rows.into_iter().next())
    }

    fn count_medications(&self, user_id: &str) -> StoreResult<u64> {
        self.count(
            "medications",
            &[("select", "id".into()), ("user_id", eq(user_id))],
        )
    }

    fn list_medications(&self, user_id: &str, range: RowRange) -> StoreResult<Vec<Medication>> {
        let (rows, _) = self.select_range(
            "medications",
            &[
                ("select", "*".into()),
                ("user_id", eq(user_id)),
                ("order", "created_at.desc,id.desc".into()),
            ],
            range,
        )?;
        Ok(rows)
    }
}
