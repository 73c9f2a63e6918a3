//! Core error types for streakbook-core.
//!
//! Backend failures are folded into the closed [`StoreError`] enumeration at
//! the store boundary, so nothing above the store ever inspects a raw SQLite
//! or HTTP error.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Core error type for streakbook-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Record store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Identity provider errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Whether the provider rejected the session for good. Any other failure,
    /// including an unreachable provider, leaves the saved session usable.
    pub fn ends_session(&self) -> bool {
        matches!(self, CoreError::Auth(AuthError::SessionExpired))
    }
}

/// Kind tag of a [`StoreError`], for callers that only branch on the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreErrorKind {
    Unavailable,
    NotFound,
    Conflict,
    Unknown,
}

/// Record store errors.
///
/// Every backend maps its native failures onto these four kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached, was locked, or did not answer in time
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The requested row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness or foreign-key constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Anything else
    #[error("Unexpected store error: {0}")]
    Unknown(String),
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::Unavailable(_) => StoreErrorKind::Unavailable,
            StoreError::NotFound(_) => StoreErrorKind::NotFound,
            StoreError::Conflict(_) => StoreErrorKind::Conflict,
            StoreError::Unknown(_) => StoreErrorKind::Unknown,
        }
    }
}

/// Identity provider errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown email or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Sign-up with an email that is already registered
    #[error("An account already exists for {email}")]
    EmailTaken { email: String },

    /// No active session
    #[error("Not signed in")]
    NotAuthenticated,

    /// Access and refresh tokens are no longer valid
    #[error("Session expired, sign in again")]
    SessionExpired,

    /// Malformed email or a password the provider will not accept
    #[error("Invalid sign-up details: {0}")]
    InvalidInput(String),

    /// The provider accepted the sign-up but wants the email confirmed first
    #[error("Check the inbox of {email} to confirm the account")]
    EmailConfirmationRequired { email: String },

    /// Token refresh was rejected
    #[error("Session refresh failed: {0}")]
    RefreshFailed(String),

    /// The provider has no equivalent for the requested operation
    #[error("Operation not supported by the {provider} identity provider")]
    Unsupported { provider: &'static str },

    /// Password hashing failed
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// Backing store failure
    #[error("{0}")]
    Store(#[from] StoreError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors raised before anything reaches the store.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Not a `YYYY-MM-DD` calendar date
    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    /// Date too far ahead of today
    #[error("Date {date} is in the future (latest accepted: {latest})")]
    DateInFuture { date: NaiveDate, latest: NaiveDate },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Primary category outside the closed list
    #[error("Unknown primary category: {0}")]
    UnknownCategory(String),

    /// Additional tag outside the closed list
    #[error("Unknown tag: {0}")]
    UnknownTag(String),
}

impl ValidationError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(err.to_string()),
            rusqlite::Error::SqliteFailure(failure, _msg) => match failure.code {
                rusqlite::ErrorCode::DatabaseBusy
                | rusqlite::ErrorCode::DatabaseLocked
                | rusqlite::ErrorCode::CannotOpen
                | rusqlite::ErrorCode::SystemIoFailure => StoreError::Unavailable(err.to_string()),
                rusqlite::ErrorCode::ConstraintViolation => StoreError::Conflict(err.to_string()),
                _ => StoreError::Unknown(err.to_string()),
            },
            _ => StoreError::Unknown(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            return StoreError::Unavailable(err.to_string());
        }
        match err.status() {
            Some(status) if status.as_u16() == 404 => StoreError::NotFound(err.to_string()),
            Some(status) if status.as_u16() == 409 => StoreError::Conflict(err.to_string()),
            Some(status) if status.is_server_error() => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Unknown(err.to_string()),
        }
    }
}

impl From<tokio::time::error::Elapsed> for StoreError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        StoreError::Unavailable("request timed out".to_string())
    }
}

impl From<rusqlite::Error> for AuthError {
    fn from(err: rusqlite::Error) -> Self {
        AuthError::Store(err.into())
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Store(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rows_maps_to_not_found() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.kind(), StoreErrorKind::NotFound);
    }

    #[test]
    fn busy_database_maps_to_unavailable() {
        let failure = rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY);
        let err: StoreError = rusqlite::Error::SqliteFailure(failure, None).into();
        assert_eq!(err.kind(), StoreErrorKind::Unavailable);
    }

    #[test]
    fn constraint_violation_maps_to_conflict() {
        let failure = rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT);
        let err: StoreError = rusqlite::Error::SqliteFailure(failure, None).into();
        assert_eq!(err.kind(), StoreErrorKind::Conflict);
    }

    #[test]
    fn only_expired_sessions_end_the_session() {
        assert!(CoreError::from(AuthError::SessionExpired).ends_session());
        let offline = CoreError::from(AuthError::Store(StoreError::Unavailable("timeout".into())));
        assert!(!offline.ends_session());
        assert!(!CoreError::from(AuthError::NotAuthenticated).ends_session());
    }

    #[test]
    fn store_error_converts_into_core_error() {
        let core: CoreError = StoreError::Conflict("dup".into()).into();
        assert!(matches!(core, CoreError::Store(StoreError::Conflict(_))));
    }
}
