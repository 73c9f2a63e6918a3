//! # Streakbook Core Library
//!
//! This library provides the core logic for Streakbook, a personal tracker for
//! solved coding exercises and a medication study log. It follows a CLI-first
//! design: every operation is exposed through [`Tracker`], and the
//! `streakbook` binary is a thin layer over it.
//!
//! ## Architecture
//!
//! - **Streak engine**: pure functions deciding whether a completion starts,
//!   extends, resets or leaves unchanged the consecutive-day counter, plus the
//!   session-start decay check
//! - **Record store**: the [`RecordStore`] trait, implemented by the SQLite
//!   [`Database`] and the hosted [`remote::RestStore`]
//! - **Identity**: the [`IdentityProvider`] trait, implemented by
//!   [`LocalIdentity`] and the hosted [`remote::RestAuth`]
//! - **Tracker**: owns store, identity, session and the profile cache
//!
//! ## Key Components
//!
//! - [`apply_completion`]: streak update for a new completion
//! - [`check_decay`]: session-start streak correction
//! - [`Tracker`]: the operations the CLI calls
//! - [`Config`]: application configuration management

pub mod categories;
pub mod error;
pub mod identity;
pub mod records;
pub mod remote;
pub mod storage;
pub mod store;
pub mod streak;
pub mod tracker;
pub mod validation;

pub use error::{
    AuthError, ConfigError, CoreError, StoreError, StoreErrorKind, ValidationError,
};
pub use identity::{AuthSession, IdentityProvider, LocalIdentity, SignUpOutcome, User};
pub use records::{
    ExerciseFields, ExerciseForm, ExerciseWithProblem, Medication, MedicationFields, NewProblem,
    NewProfile, Page, PageRequest, Problem, Profile, RowRange, SolvedExercise, Stats,
};
pub use storage::{Backend, Config, Database};
pub use store::{RecordStore, StoreResult};
pub use streak::{
    apply_completion, check_decay, days_between, DecayPolicy, StreakChange, StreakDecayEvent,
    StreakState, StreakUpdate,
};
pub use tracker::{AddedExercise, Tracker, TrackerSettings};
