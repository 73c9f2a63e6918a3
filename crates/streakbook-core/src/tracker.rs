//! The tracker: the one object the presentation layer talks to.
//!
//! Owns the record store, the identity provider, the active session, a single
//! cached profile and the decay gate. Every operation except sign-up/sign-in
//! needs a session.
//!
//! Streak data flow on a new completion:
//! insert -> count same-day events -> read profile -> compute -> write -> drop cache.

use chrono::{NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{AuthError, CoreError, Result, StoreError, ValidationError};
use crate::identity::{AuthSession, IdentityProvider, SignUpOutcome, User};
use crate::records::{
    ExerciseFields, ExerciseForm, ExerciseWithProblem, Medication, MedicationFields, NewProblem,
    NewProfile, Page, PageRequest, Problem, Profile, RowRange, SolvedExercise, Stats,
};
use crate::storage::Config;
use crate::store::RecordStore;
use crate::streak::{
    apply_completion, check_decay, day_before, DecayGate, DecayPolicy, StreakDecayEvent,
    StreakUpdate,
};
use crate::validation;

/// Knobs the tracker takes from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSettings {
    pub exercises_per_page: u32,
    pub medications_per_page: u32,
    pub max_future_days: u32,
    pub decay_policy: DecayPolicy,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for TrackerSettings {
    fn from(config: &Config) -> Self {
        Self {
            exercises_per_page: config.store.exercises_per_page,
            medications_per_page: config.store.medications_per_page,
            max_future_days: config.streak.max_future_days,
            decay_policy: config.streak.decay_check,
        }
    }
}

/// Single-entry profile cache, dropped after every profile write.
#[derive(Debug, Default)]
struct ProfileCache {
    entry: Option<Profile>,
}

impl ProfileCache {
    fn get(&self, user_id: &str) -> Option<&Profile> {
        self.entry.as_ref().filter(|p| p.id == user_id)
    }

    fn put(&mut self, profile: Profile) {
        self.entry = Some(profile);
    }

    fn invalidate(&mut self) {
        self.entry = None;
    }
}

/// Result of recording a completion.
#[derive(Debug, Clone, Serialize)]
pub struct AddedExercise {
    pub exercise: SolvedExercise,
    pub problem: Problem,
    /// `None` when the streak update failed; the exercise is saved regardless.
    pub streak: Option<StreakUpdate>,
}

pub struct Tracker {
    store: Box<dyn RecordStore>,
    identity: Box<dyn IdentityProvider>,
    settings: TrackerSettings,
    session: Option<AuthSession>,
    cache: ProfileCache,
    decay: DecayGate,
}

impl Tracker {
    pub fn new(
        store: Box<dyn RecordStore>,
        identity: Box<dyn IdentityProvider>,
        settings: TrackerSettings,
    ) -> Self {
        Self {
            store,
            identity,
            settings,
            session: None,
            cache: ProfileCache::default(),
            decay: DecayGate::new(settings.decay_policy),
        }
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn identity_provider(&self) -> &'static str {
        self.identity.provider()
    }

    // -- session lifecycle --

    pub fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    fn user(&self) -> Result<&User> {
        self.session
            .as_ref()
            .map(|s| &s.user)
            .ok_or(CoreError::Auth(AuthError::NotAuthenticated))
    }

    fn user_id(&self) -> Result<String> {
        Ok(self.user()?.id.clone())
    }

    /// Install a freshly issued session.
    fn adopt(&mut self, session: AuthSession) {
        self.store.set_access_token(Some(&session.access_token));
        self.session = Some(session);
        self.cache.invalidate();
        self.decay.reset();
    }

    fn clear_session(&mut self) {
        self.store.set_access_token(None);
        self.session = None;
        self.cache.invalidate();
        self.decay.reset();
    }

    /// Create the account and its profile. A failure to create the profile
    /// is logged and does not fail the sign-up.
    pub fn sign_up(
        &mut self,
        name: Option<&str>,
        email: &str,
        password: &str,
    ) -> Result<SignUpOutcome> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let outcome = self.identity.sign_up(email, password, name)?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.adopt(session.clone());
        }

        let user = outcome.user();
        let profile = NewProfile {
            id: user.id.clone(),
            name: name.map(str::to_string),
        };
        match self.store.create_profile(&profile) {
            Ok(_) => info!(user_id = %user.id, "profile created"),
            Err(e) => warn!(user_id = %user.id, error = %e, "failed to create profile at sign-up"),
        }
        Ok(outcome)
    }

    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<&AuthSession> {
        let session = self.identity.sign_in(email, password)?;
        info!(user_id = %session.user.id, "signed in");
        self.adopt(session);
        Ok(self.session.as_ref().ok_or(AuthError::NotAuthenticated)?)
    }

    /// Revoke the session with the provider and forget it locally. A
    /// provider failure is logged; the local session is dropped regardless.
    pub fn sign_out(&mut self) -> Result<()> {
        if let Some(session) = &self.session {
            if let Err(e) = self.identity.sign_out(session) {
                warn!(error = %e, "sign-out with provider failed");
            }
            info!(user_id = %session.user.id, "signed out");
        }
        self.clear_session();
        Ok(())
    }

    /// Resume a persisted session. `decay_checked` says whether this session
    /// already ran its decay check.
    pub fn restore(&mut self, session: AuthSession, decay_checked: bool) {
        debug!(user_id = %session.user.id, decay_checked, "restoring session");
        self.store.set_access_token(Some(&session.access_token));
        self.session = Some(session);
        self.cache.invalidate();
        self.decay = DecayGate::with_ran(self.settings.decay_policy, decay_checked);
    }

    /// Whether the current session has run its decay check.
    pub fn decay_checked(&self) -> bool {
        self.decay.has_run()
    }

    /// Decays applied in this process.
    pub fn decay_history(&self) -> &[StreakDecayEvent] {
        self.decay.history()
    }

    /// Refresh the session when its access token is about to expire.
    /// Returns whether a refresh happened. A rejected refresh ends the
    /// session.
    pub fn refresh_if_needed(&mut self) -> Result<bool> {
        let session = self
            .session
            .as_ref()
            .ok_or(AuthError::NotAuthenticated)?;
        if !session.needs_refresh(Utc::now()) {
            return Ok(false);
        }
        self.refresh().map(|_| true)
    }

    /// Exchange the refresh token for a new session unconditionally.
    pub fn refresh(&mut self) -> Result<&AuthSession> {
        let refresh_token = self
            .session
            .as_ref()
            .ok_or(AuthError::NotAuthenticated)?
            .refresh_token
            .clone();

        match self.identity.refresh_session(&refresh_token) {
            Ok(fresh) => {
                info!(
                    user_id = %fresh.user.id,
                    expires_at = %fresh.expires_at,
                    "session refreshed"
                );
                self.store.set_access_token(Some(&fresh.access_token));
                self.session = Some(fresh);
                Ok(self.session.as_ref().ok_or(AuthError::NotAuthenticated)?)
            }
            Err(e @ (AuthError::RefreshFailed(_) | AuthError::SessionExpired)) => {
                warn!(error = %e, "refresh rejected, session ended");
                self.clear_session();
                Err(AuthError::SessionExpired.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Ask the provider who owns the current access token.
    pub fn current_user(&self) -> Result<User> {
        let session = self
            .session
            .as_ref()
            .ok_or(AuthError::NotAuthenticated)?;
        Ok(self.identity.current_user(&session.access_token)?)
    }

    /// Confirm an email address from a confirmation link and sign in.
    pub fn confirm_email(&mut self, token_hash: &str, kind: &str) -> Result<&AuthSession> {
        let session = self.identity.verify_email(token_hash, kind)?;
        info!(user_id = %session.user.id, "email confirmed");
        self.adopt(session);
        Ok(self.session.as_ref().ok_or(AuthError::NotAuthenticated)?)
    }

    // -- decay --

    /// Run the decay check due at session start.
    pub fn start_session(&mut self, today: NaiveDate) -> Result<Option<StreakDecayEvent>> {
        let user_id = self.user_id()?;
        if !self.decay.is_due(true) {
            return Ok(None);
        }
        Ok(self.run_decay(&user_id, today))
    }

    /// Failures are logged and leave the gate open so a later call retries.
    fn run_decay(&mut self, user_id: &str, today: NaiveDate) -> Option<StreakDecayEvent> {
        let outcome = self.try_decay(user_id, today);
        match outcome {
            Ok(event) => {
                self.decay.mark_ran();
                if let Some(event) = &event {
                    info!(
                        user_id,
                        before = event.streak_before,
                        after = event.streak_after,
                        "streak decayed"
                    );
                    self.decay.record(event.clone());
                }
                event
            }
            Err(e) => {
                warn!(user_id, error = %e, "decay check skipped");
                None
            }
        }
    }

    fn try_decay(
        &mut self,
        user_id: &str,
        today: NaiveDate,
    ) -> std::result::Result<Option<StreakDecayEvent>, StoreError> {
        let Some(profile) = self.store.read_profile(user_id)? else {
            return Ok(None);
        };
        let events_yesterday = self
            .store
            .count_events_on_date(user_id, day_before(today))?;
        let Some((state, event)) = check_decay(profile.streak(), today, events_yesterday) else {
            return Ok(None);
        };
        self.store.write_streak(user_id, state)?;
        self.cache.invalidate();
        Ok(Some(event))
    }

    // -- profile --

    /// The signed-in user's profile. Store failures fall back to an empty
    /// profile (streak 0) and are logged, never returned.
    pub fn profile(&mut self, today: NaiveDate) -> Result<Profile> {
        let user_id = self.user_id()?;
        if self.decay.policy() == DecayPolicy::EveryLoad {
            self.run_decay(&user_id, today);
        }

        if let Some(profile) = self.cache.get(&user_id) {
            return Ok(profile.clone());
        }

        match self.store.read_profile(&user_id) {
            Ok(Some(profile)) => {
                self.cache.put(profile.clone());
                Ok(profile)
            }
            Ok(None) => {
                warn!(user_id, "no profile row, using defaults");
                Ok(Profile::empty(&user_id))
            }
            Err(e) => {
                warn!(user_id, error = %e, "profile read failed, using defaults");
                Ok(Profile::empty(&user_id))
            }
        }
    }

    pub fn rename(&mut self, name: &str) -> Result<Profile> {
        let user_id = self.user_id()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::invalid("name", "must not be empty").into());
        }
        let profile = self.store.rename_profile(&user_id, name)?;
        self.cache.put(profile.clone());
        Ok(profile)
    }

    // -- exercises --

    /// Record a solved exercise and update the streak.
    ///
    /// The problem is looked up by number and created on first use. Adding
    /// a problem the user already recorded is a `Conflict`. A failure while
    /// updating the streak is logged; the exercise stays saved.
    pub fn add_exercise(&mut self, form: &ExerciseForm, today: NaiveDate) -> Result<AddedExercise> {
        let user_id = self.user_id()?;
        let form = validation::exercise_form(form, today, self.settings.max_future_days)?;

        let problem = self.find_or_create_problem(&form)?;
        if self
            .store
            .find_exercise_for_problem(&user_id, problem.id)?
            .is_some()
        {
            return Err(StoreError::Conflict(format!(
                "problem {} is already in your solved list",
                problem.leetcode_number
            ))
            .into());
        }

        let exercise = self
            .store
            .insert_exercise(&user_id, problem.id, &exercise_fields(&form))?;
        debug!(
            user_id,
            exercise_id = exercise.id,
            date = %exercise.date_completed,
            "exercise recorded"
        );

        let streak = match self.update_streak(&user_id, exercise.date_completed) {
            Ok(update) => Some(update),
            Err(e) => {
                warn!(user_id, error = %e, "streak update failed, keeping previous streak");
                None
            }
        };

        Ok(AddedExercise {
            exercise,
            problem,
            streak,
        })
    }

    fn find_or_create_problem(&self, form: &ExerciseForm) -> Result<Problem> {
        if let Some(problem) = self.store.find_problem_by_number(form.leetcode_number)? {
            return Ok(problem);
        }
        let new = NewProblem {
            leetcode_number: form.leetcode_number,
            title: form.title.clone(),
            link: form.link.clone(),
        };
        match self.store.create_problem(&new) {
            Ok(problem) => Ok(problem),
            // created concurrently by another user
            Err(StoreError::Conflict(_)) => self
                .store
                .find_problem_by_number(form.leetcode_number)?
                .ok_or_else(|| {
                    StoreError::NotFound(format!("problem {}", form.leetcode_number)).into()
                }),
            Err(e) => Err(e.into()),
        }
    }

    /// Runs after the insert, so the same-day count includes the new row.
    fn update_streak(
        &mut self,
        user_id: &str,
        date: NaiveDate,
    ) -> std::result::Result<StreakUpdate, StoreError> {
        let same_day = self.store.count_events_on_date(user_id, date)?;
        let profile = match self.store.read_profile(user_id)? {
            Some(profile) => profile,
            None => {
                let name = self.session.as_ref().and_then(|s| s.user.name.clone());
                self.store.create_profile(&NewProfile {
                    id: user_id.to_string(),
                    name,
                })?
            }
        };

        let update = apply_completion(profile.streak(), date, same_day);
        if update.is_changed() {
            self.store.write_streak(user_id, update.state)?;
            info!(
                user_id,
                streak = update.state.streak_count,
                change = ?update.change,
                "streak updated"
            );
        } else {
            debug!(user_id, change = ?update.change, "streak unchanged");
        }
        self.cache.invalidate();
        Ok(update)
    }

    /// Edit an exercise and its problem. The streak is not recomputed.
    pub fn update_exercise(
        &mut self,
        exercise_id: i64,
        form: &ExerciseForm,
        today: NaiveDate,
    ) -> Result<ExerciseWithProblem> {
        let user_id = self.user_id()?;
        let form = validation::exercise_form(form, today, self.settings.max_future_days)?;
        let current = self.exercise(exercise_id)?;

        let problem = NewProblem {
            leetcode_number: form.leetcode_number,
            title: form.title.clone(),
            link: form.link.clone(),
        };
        if problem.leetcode_number != current.leetcode_number
            || problem.title != current.title
            || problem.link != current.link
        {
            self.store.update_problem(current.problem_id, &problem)?;
        }
        self.store
            .update_exercise(&user_id, exercise_id, &exercise_fields(&form))?;
        self.exercise(exercise_id)
    }

    /// Delete an exercise. The streak is not recomputed.
    pub fn delete_exercise(&mut self, exercise_id: i64) -> Result<()> {
        let user_id = self.user_id()?;
        self.store.delete_exercise(&user_id, exercise_id)?;
        info!(user_id, exercise_id, "exercise deleted");
        Ok(())
    }

    pub fn exercise(&self, exercise_id: i64) -> Result<ExerciseWithProblem> {
        let user_id = self.user_id()?;
        self.store
            .exercise(&user_id, exercise_id)?
            .ok_or_else(|| StoreError::NotFound(format!("exercise {exercise_id}")).into())
    }

    /// One page of exercises, newest completion first.
    pub fn list_exercises(&self, page: u32) -> Result<Page<ExerciseWithProblem>> {
        let user_id = self.user_id()?;
        let request = PageRequest::new(page, self.settings.exercises_per_page);
        let (items, total) = self.store.list_exercises(&user_id, request.range())?;
        Ok(Page::new(items, request, total))
    }

    // -- medications --

    pub fn add_medication(&mut self, fields: &MedicationFields) -> Result<Medication> {
        let user_id = self.user_id()?;
        let fields = validation::medication_fields(fields)?;
        let medication = self.store.insert_medication(&user_id, &fields)?;
        debug!(user_id, medication_id = medication.id, "medication added");
        Ok(medication)
    }

    pub fn update_medication(
        &mut self,
        medication_id: i64,
        fields: &MedicationFields,
    ) -> Result<Medication> {
        let user_id = self.user_id()?;
        let fields = validation::medication_fields(fields)?;
        self.store
            .update_medication(&user_id, medication_id, &fields)?;
        self.medication(medication_id)
    }

    pub fn delete_medication(&mut self, medication_id: i64) -> Result<()> {
        let user_id = self.user_id()?;
        self.store.delete_medication(&user_id, medication_id)?;
        info!(user_id, medication_id, "medication deleted");
        Ok(())
    }

    pub fn medication(&self, medication_id: i64) -> Result<Medication> {
        let user_id = self.user_id()?;
        self.store
            .medication(&user_id, medication_id)?
            .ok_or_else(|| StoreError::NotFound(format!("medication {medication_id}")).into())
    }

    /// One page of medications, newest first.
    pub fn list_medications(&self, page: u32) -> Result<Page<Medication>> {
        let user_id = self.user_id()?;
        let request = PageRequest::new(page, self.settings.medications_per_page);
        let total = self.store.count_medications(&user_id)?;
        let items = self.store.list_medications(&user_id, request.range())?;
        Ok(Page::new(items, request, total))
    }

    /// A uniformly random entry of the log, `None` when it is empty.
    pub fn random_medication(&self) -> Result<Option<Medication>> {
        let user_id = self.user_id()?;
        let count = self.store.count_medications(&user_id)?;
        if count == 0 {
            return Ok(None);
        }
        let index = rand::thread_rng().gen_range(0..count);
        let rows = self
            .store
            .list_medications(&user_id, RowRange::single(index))?;
        Ok(rows.into_iter().next())
    }

    // -- dashboard --

    pub fn stats(&mut self, today: NaiveDate) -> Result<Stats> {
        let user_id = self.user_id()?;
        let (_, total_exercises) = self.store.list_exercises(&user_id, RowRange::single(0))?;
        let total_medications = self.store.count_medications(&user_id)?;
        let current_streak = self.profile(today)?.streak_count;
        Ok(Stats {
            total_exercises,
            current_streak,
            total_medications,
        })
    }
}

fn exercise_fields(form: &ExerciseForm) -> ExerciseFields {
    ExerciseFields {
        notes: form.notes.clone(),
        date_completed: form.date_completed,
        primary_category: form.primary_category.clone(),
        additional_tags: form.additional_tags.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreErrorKind;
    use crate::identity::LocalIdentity;
    use crate::storage::Database;
    use crate::streak::{StreakChange, StreakState};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn tracker(settings: TrackerSettings) -> Tracker {
        let store = Database::open_memory().unwrap();
        let identity = LocalIdentity::new(Database::open_memory().unwrap());
        let mut t = Tracker::new(Box::new(store), Box::new(identity), settings);
        t.sign_up(Some("Ada"), "ada@example.com", "hunter22").unwrap();
        t
    }

    fn form(n: i64, date: &str) -> ExerciseForm {
        ExerciseForm {
            leetcode_number: n,
            title: format!("Problem {n}"),
            link: format!("https://leetcode.com/problems/p{n}/"),
            notes: None,
            date_completed: d(date),
            primary_category: "Two Pointers".into(),
            additional_tags: vec![],
        }
    }

    #[test]
    fn operations_need_a_session() {
        let store = Database::open_memory().unwrap();
        let identity = LocalIdentity::new(Database::open_memory().unwrap());
        let mut t = Tracker::new(Box::new(store), Box::new(identity), TrackerSettings::default());
        assert!(matches!(
            t.list_exercises(1),
            Err(CoreError::Auth(AuthError::NotAuthenticated))
        ));
        assert!(t.profile(d("2024-05-01")).is_err());
    }

    #[test]
    fn sign_up_creates_an_empty_profile() {
        let mut t = tracker(TrackerSettings::default());
        let profile = t.profile(d("2024-05-01")).unwrap();
        assert_eq!(profile.name.as_deref(), Some("Ada"));
        assert_eq!(profile.streak(), StreakState::default());
    }

    #[test]
    fn consecutive_days_extend_the_streak() {
        let mut t = tracker(TrackerSettings::default());
        let today = d("2024-05-03");

        let first = t.add_exercise(&form(1, "2024-05-01"), today).unwrap();
        assert_eq!(first.streak.unwrap().change, StreakChange::Started);

        let second = t.add_exercise(&form(2, "2024-05-02"), today).unwrap();
        assert_eq!(second.streak.unwrap().state.streak_count, 2);

        // second completion on the same day leaves it alone
        let third = t.add_exercise(&form(3, "2024-05-02"), today).unwrap();
        assert!(!third.streak.unwrap().is_changed());

        let profile = t.profile(today).unwrap();
        assert_eq!(profile.streak(), StreakState::new(2, Some(d("2024-05-02"))));
    }

    #[test]
    fn duplicate_problem_is_a_conflict() {
        let mut t = tracker(TrackerSettings::default());
        let today = d("2024-05-03");
        t.add_exercise(&form(1, "2024-05-01"), today).unwrap();
        let err = t.add_exercise(&form(1, "2024-05-02"), today).unwrap_err();
        assert!(matches!(err, CoreError::Store(ref e) if e.kind() == StoreErrorKind::Conflict));
    }

    #[test]
    fn far_future_date_is_rejected() {
        let mut t = tracker(TrackerSettings::default());
        let err = t
            .add_exercise(&form(1, "2024-05-10"), d("2024-05-03"))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DateInFuture { .. })
        ));
    }

    #[test]
    fn decay_runs_once_per_session() {
        let mut t = tracker(TrackerSettings::default());
        t.add_exercise(&form(1, "2024-05-01"), d("2024-05-01")).unwrap();

        let event = t.start_session(d("2024-05-04")).unwrap().unwrap();
        assert_eq!(event.streak_before, 1);
        assert_eq!(t.profile(d("2024-05-04")).unwrap().streak_count, 0);
        assert!(t.decay_checked());
        assert!(t.start_session(d("2024-05-04")).unwrap().is_none());
        assert_eq!(t.decay_history().len(), 1);
    }

    #[test]
    fn every_load_policy_decays_on_profile_read() {
        let settings = TrackerSettings {
            decay_policy: DecayPolicy::EveryLoad,
            ..TrackerSettings::default()
        };
        let mut t = tracker(settings);
        t.add_exercise(&form(1, "2024-05-01"), d("2024-05-01")).unwrap();
        assert_eq!(t.profile(d("2024-05-02")).unwrap().streak_count, 1);
        assert_eq!(t.profile(d("2024-05-05")).unwrap().streak_count, 0);
    }

    #[test]
    fn editing_does_not_touch_the_streak() {
        let mut t = tracker(TrackerSettings::default());
        let today = d("2024-05-03");
        let added = t.add_exercise(&form(1, "2024-05-02"), today).unwrap();

        let mut edit = form(1, "2024-04-01");
        edit.title = "Two Sum".into();
        edit.notes = Some("hash map lookup".into());
        let updated = t.update_exercise(added.exercise.id, &edit, today).unwrap();
        assert_eq!(updated.title, "Two Sum");
        assert_eq!(updated.date_completed, d("2024-04-01"));

        let profile = t.profile(today).unwrap();
        assert_eq!(profile.streak(), StreakState::new(1, Some(d("2024-05-02"))));

        t.delete_exercise(added.exercise.id).unwrap();
        assert_eq!(t.profile(today).unwrap().streak_count, 1);
        assert!(t.exercise(added.exercise.id).is_err());
    }

    #[test]
    fn random_medication_on_empty_log_is_none() {
        let t = tracker(TrackerSettings::default());
        assert!(t.random_medication().unwrap().is_none());
    }

    #[test]
    fn random_medication_picks_an_existing_row() {
        let mut t = tracker(TrackerSettings::default());
        for name in ["Aspirin", "Ibuprofen", "Metformin"] {
            t.add_medication(&MedicationFields {
                name: name.into(),
                description: None,
            })
            .unwrap();
        }
        for _ in 0..10 {
            let pick = t.random_medication().unwrap().unwrap();
            assert!(["Aspirin", "Ibuprofen", "Metformin"].contains(&pick.name.as_str()));
        }
    }

    #[test]
    fn sign_out_forgets_the_session() {
        let mut t = tracker(TrackerSettings::default());
        t.sign_out().unwrap();
        assert!(t.session().is_none());
        assert!(t.stats(d("2024-05-01")).is_err());
    }

    #[test]
    fn rename_updates_the_cached_profile() {
        let mut t = tracker(TrackerSettings::default());
        t.rename("  Grace ").unwrap();
        assert_eq!(t.profile(d("2024-05-01")).unwrap().name.as_deref(), Some("Grace"));
        assert!(t.rename("   ").is_err());
    }
}
