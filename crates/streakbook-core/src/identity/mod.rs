//! Identity providers.
//!
//! An [`IdentityProvider`] turns credentials into an [`AuthSession`]. The
//! local provider keeps users in the SQLite database; the hosted provider
//! talks to a GoTrue-compatible auth service (see [`crate::remote::RestAuth`]).

pub mod local;
pub mod password;

pub use local::LocalIdentity;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Sessions expiring within this window are refreshed before use.
pub const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// An authenticated session. Serialized as the CLI's `session.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl AuthSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// True when the access token expires within the refresh margin.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now <= Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

/// Result of a sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Account created and signed in.
    SignedIn(AuthSession),
    /// Account created; the provider wants the email confirmed before sign-in.
    ConfirmationRequired(User),
}

impl SignUpOutcome {
    pub fn user(&self) -> &User {
        match self {
            SignUpOutcome::SignedIn(session) => &session.user,
            SignUpOutcome::ConfirmationRequired(user) => user,
        }
    }
}

pub trait IdentityProvider {
    /// Short provider name for logs and errors ("local", "hosted").
    fn provider(&self) -> &'static str;

    fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError>;

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError>;

    /// The user owning a still-valid access token.
    fn current_user(&self, access_token: &str) -> Result<User, AuthError>;

    /// Exchange a refresh token for a new session.
    fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError>;

    /// Confirm an email address with the token hash from a confirmation link.
    fn verify_email(&self, _token_hash: &str, _kind: &str) -> Result<AuthSession, AuthError> {
        Err(AuthError::Unsupported {
            provider: self.provider(),
        })
    }
}

/// Basic shape check before an address reaches the provider.
pub(crate) fn check_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
            Ok(email.to_string())
        }
        _ => Err(AuthError::InvalidInput(format!(
            "'{email}' is not an email address"
        ))),
    }
}
