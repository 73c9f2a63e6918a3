//! Session-start streak decay.
//!
//! A streak that was not extended yesterday is broken as of today. The check
//! looks only at whether yesterday has a completion; it does not trust the
//! stored `last_completed_date`. Running it twice gives the same result.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::engine::StreakState;

/// When the decay check runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayPolicy {
    /// Once per signed-in session, at session start
    #[default]
    OncePerSession,
    /// Every time the profile is loaded
    EveryLoad,
}

impl DecayPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecayPolicy::OncePerSession => "once_per_session",
            DecayPolicy::EveryLoad => "every_load",
        }
    }
}

/// Log entry for a decay that fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakDecayEvent {
    pub timestamp: DateTime<Utc>,
    pub checked_day: NaiveDate,
    pub streak_before: u32,
    pub streak_after: u32,
    pub reason: String,
}

/// The calendar day the decay check inspects.
pub fn day_before(today: NaiveDate) -> NaiveDate {
    today - Duration::days(1)
}

/// Decide whether the streak decays.
///
/// `events_yesterday` is the number of completions dated the day before
/// `today`. Returns the corrected state and an event when a reset happened.
pub fn check_decay(
    state: StreakState,
    today: NaiveDate,
    events_yesterday: u64,
) -> Option<(StreakState, StreakDecayEvent)> {
    if state.streak_count == 0 || events_yesterday > 0 {
        return None;
    }

    let yesterday = day_before(today);
    let event = StreakDecayEvent {
        timestamp: Utc::now(),
        checked_day: yesterday,
        streak_before: state.streak_count,
        streak_after: 0,
        reason: format!("No completion on {yesterday}, streak broken"),
    };
    let decayed = StreakState {
        streak_count: 0,
        last_completed_date: state.last_completed_date,
    };
    Some((decayed, event))
}

/// Tracks whether the check is due under a [`DecayPolicy`] and keeps the
/// history of decays applied in this session.
#[derive(Debug, Clone, Default)]
pub struct DecayGate {
    policy: DecayPolicy,
    ran: bool,
    history: Vec<StreakDecayEvent>,
}

impl DecayGate {
    pub fn new(policy: DecayPolicy) -> Self {
        Self {
            policy,
            ran: false,
            history: Vec::new(),
        }
    }

    /// Restore a gate for a session that already ran its check.
    pub fn with_ran(policy: DecayPolicy, ran: bool) -> Self {
        Self {
            policy,
            ran,
            history: Vec::new(),
        }
    }

    pub fn policy(&self) -> DecayPolicy {
        self.policy
    }

    pub fn has_run(&self) -> bool {
        self.ran
    }

    /// Whether the check should run now. `session_start` is true for the
    /// first profile access after sign-in or restore.
    pub fn is_due(&self, session_start: bool) -> bool {
        match self.policy {
            DecayPolicy::EveryLoad => true,
            DecayPolicy::OncePerSession => session_start && !self.ran,
        }
    }

    pub fn mark_ran(&mut self) {
        self.ran = true;
    }

    pub fn record(&mut self, event: StreakDecayEvent) {
        self.history.push(event);
    }

    pub fn history(&self) -> &[StreakDecayEvent] {
        &self.history
    }

    /// Forget the session, e.g. on sign-out.
    pub fn reset(&mut self) {
        self.ran = false;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn stale_streak_decays_to_zero() {
        let state = StreakState::new(7, Some(d("2024-05-07")));
        let (decayed, event) = check_decay(state, d("2024-05-10"), 0).unwrap();
        assert_eq!(decayed, StreakState::new(0, Some(d("2024-05-07"))));
        assert_eq!(event.streak_before, 7);
        assert_eq!(event.streak_after, 0);
        assert_eq!(event.checked_day, d("2024-05-09"));
        assert!(event.reason.contains("2024-05-09"));
    }

    #[test]
    fn completion_yesterday_keeps_streak() {
        let state = StreakState::new(4, Some(d("2024-05-09")));
        assert!(check_decay(state, d("2024-05-10"), 2).is_none());
    }

    #[test]
    fn zero_streak_never_decays() {
        let state = StreakState::new(0, None);
        assert!(check_decay(state, d("2024-05-10"), 0).is_none());
    }

    #[test]
    fn decay_is_idempotent() {
        let state = StreakState::new(3, Some(d("2024-05-01")));
        let (once, _) = check_decay(state, d("2024-05-10"), 0).unwrap();
        assert!(check_decay(once, d("2024-05-10"), 0).is_none());
    }

    #[test]
    fn once_per_session_gate() {
        let mut gate = DecayGate::new(DecayPolicy::OncePerSession);
        assert!(gate.is_due(true));
        assert!(!gate.is_due(false));
        gate.mark_ran();
        assert!(!gate.is_due(true));
        gate.reset();
        assert!(gate.is_due(true));
    }

    #[test]
    fn every_load_gate_is_always_due() {
        let mut gate = DecayGate::new(DecayPolicy::EveryLoad);
        gate.mark_ran();
        assert!(gate.is_due(false));
        assert!(gate.is_due(true));
    }

    #[test]
    fn policy_parses_from_snake_case() {
        let policy: DecayPolicy = serde_json::from_str("\"every_load\"").unwrap();
        assert_eq!(policy, DecayPolicy::EveryLoad);
        assert_eq!(DecayPolicy::default().as_str(), "once_per_session");
    }
}
