//! Consecutive-day streak computation.
//!
//! The engine is a pure function over calendar dates: it never touches the
//! store and never reads the clock. Callers supply the prior profile state,
//! the date of the completion that was just recorded and the number of
//! completions that now exist on that date (including the new one).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Streak fields of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    pub streak_count: u32,
    pub last_completed_date: Option<NaiveDate>,
}

impl StreakState {
    pub fn new(streak_count: u32, last_completed_date: Option<NaiveDate>) -> Self {
        Self {
            streak_count,
            last_completed_date,
        }
    }
}

/// Which branch of the update fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "change")]
pub enum StreakChange {
    /// First completion ever recorded
    Started,
    /// Completion on the day after the last one
    Extended,
    /// Gap of more than one day, or a completion dated before the last one
    Reset { gap_days: i64 },
    /// Nothing changed
    Unchanged { reason: UnchangedReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnchangedReason {
    /// Another completion already exists on the same date
    RepeatSameDay,
    /// First completion of the date, but the date equals the stored last date
    SameAsLastDate,
}

/// Result of [`apply_completion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakUpdate {
    pub state: StreakState,
    #[serde(flatten)]
    pub change: StreakChange,
}

impl StreakUpdate {
    /// Whether the profile needs to be written back.
    pub fn is_changed(&self) -> bool {
        !matches!(self.change, StreakChange::Unchanged { .. })
    }
}

/// Signed number of calendar days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

/// Compute the streak after a completion dated `new_date` was inserted.
///
/// `same_day_events` is the number of completions on `new_date` after the
/// insert; anything above one means the day was already counted.
pub fn apply_completion(
    prior: StreakState,
    new_date: NaiveDate,
    same_day_events: u64,
) -> StreakUpdate {
    if same_day_events > 1 {
        return unchanged(prior, UnchangedReason::RepeatSameDay);
    }

    let Some(last) = prior.last_completed_date else {
        return StreakUpdate {
            state: StreakState::new(1, Some(new_date)),
            change: StreakChange::Started,
        };
    };

    match days_between(last, new_date) {
        1 => StreakUpdate {
            state: StreakState::new(prior.streak_count.saturating_add(1), Some(new_date)),
            change: StreakChange::Extended,
        },
        // Unreachable while the same-day count is accurate.
        0 => unchanged(prior, UnchangedReason::SameAsLastDate),
        gap_days => StreakUpdate {
            state: StreakState::new(1, Some(new_date)),
            change: StreakChange::Reset { gap_days },
        },
    }
}

fn unchanged(prior: StreakState, reason: UnchangedReason) -> StreakUpdate {
    StreakUpdate {
        state: prior,
        change: StreakChange::Unchanged { reason },
    }
}
