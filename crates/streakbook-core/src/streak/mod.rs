//! Streak engine and decay check.

pub mod decay;
pub mod engine;

pub use decay::{check_decay, day_before, DecayGate, DecayPolicy, StreakDecayEvent};
pub use engine::{
    apply_completion, days_between, StreakChange, StreakState, StreakUpdate, UnchangedReason,
};
