//! Identity provider backed by the local SQLite database.
//!
//! Tokens are 32 random bytes, hex encoded. Only their SHA-256 digests are
//! stored. Refreshing rotates both tokens.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use super::{check_email, AuthSession, IdentityProvider, SignUpOutcome, User};
use crate::error::{AuthError, StoreError};
use crate::storage::Database;

/// Lifetime of an access token.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 3600;

pub struct LocalIdentity {
    db: Database,
    access_ttl: Duration,
}

fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AuthError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AuthError::Store(StoreError::Unknown(format!("bad timestamp: {e}"))))
}

impl LocalIdentity {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            access_ttl: Duration::seconds(ACCESS_TOKEN_TTL_SECS),
        }
    }

    /// Override the access token lifetime.
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    fn issue_session(&self, user: User) -> Result<AuthSession, AuthError> {
        let access_token = random_token();
        let refresh_token = random_token();
        let now = Utc::now();
        let expires_at = now + self.access_ttl;

        self.db.conn().execute(
            "INSERT INTO auth_sessions (access_digest, refresh_digest, user_id, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                digest(&access_token),
                digest(&refresh_token),
                user.id,
                expires_at.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;
        debug!(user_id = %user.id, %expires_at, "issued local session");

        Ok(AuthSession {
            access_token,
            refresh_token,
            expires_at,
            user,
        })
    }

    fn user_by_email(&self, email: &str) -> Result<Option<(User, String)>, AuthError> {
        let row = self
            .db
            .conn()
            .query_row(
                "SELECT id, email, name, password_hash FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok((
                        User {
                            id: row.get(0)?,
                            email: row.get(1)?,
                            name: row.get(2)?,
                        },
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        Ok(row)
    }
}

impl IdentityProvider for LocalIdentity {
    fn provider(&self) -> &'static str {
        "local"
    }

    fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError> {
        let email = check_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.clone(),
            name: name.map(str::to_string),
        };
        let inserted = self.db.conn().execute(
            "INSERT INTO users (id, email, name, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id,
                user.email,
                user.name,
                hash_password(password)?,
                Utc::now().to_rfc3339(),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(AuthError::EmailTaken { email });
            }
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user.id, "local account created");
        Ok(SignUpOutcome::SignedIn(self.issue_session(user)?))
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let (user, hash) = self
            .user_by_email(email.trim())?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password, &hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        self.issue_session(user)
    }

    fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError> {
        self.db.conn().execute(
            "DELETE FROM auth_sessions WHERE access_digest = ?1",
            params![digest(&session.access_token)],
        )?;
        Ok(())
    }

    fn current_user(&self, access_token: &str) -> Result<User, AuthError> {
        let row = self
            .db
            .conn()
            .query_row(
                "SELECT u.id, u.email, u.name, s.expires_at
                 FROM auth_sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.access_digest = ?1",
                params![digest(access_token)],
                |row| {
                    Ok((
                        User {
                            id: row.get(0)?,
                            email: row.get(1)?,
                            name: row.get(2)?,
                        },
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let (user, expires_at) = row.ok_or(AuthError::NotAuthenticated)?;
        if parse_timestamp(&expires_at)? <= Utc::now() {
            return Err(AuthError::SessionExpired);
        }
        Ok(user)
    }

    fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let refresh_digest = digest(refresh_token);
        let user = self
            .db
            .conn()
            .query_row(
                "SELECT u.id, u.email, u.name
                 FROM auth_sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.refresh_digest = ?1",
                params![refresh_digest],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| AuthError::RefreshFailed("unknown refresh token".into()))?;

        self.db.conn().execute(
            "DELETE FROM auth_sessions WHERE refresh_digest = ?1",
            params![refresh_digest],
        )?;
        self.issue_session(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> LocalIdentity {
        LocalIdentity::new(Database::open_memory().unwrap())
    }

    fn signed_in(outcome: SignUpOutcome) -> AuthSession {
        match outcome {
            SignUpOutcome::SignedIn(session) => session,
            other => panic!("expected a session, got {other:?}"),
        }
    }

    #[test]
    fn sign_up_then_sign_in() {
        let id = identity();
        let first = signed_in(id.sign_up("ada@example.com", "hunter22", Some("Ada")).unwrap());
        assert_eq!(first.access_token.len(), 64);
        assert_ne!(first.access_token, first.refresh_token);

        let session = id.sign_in("ada@example.com", "hunter22").unwrap();
        assert_eq!(session.user.id, first.user.id);
        assert_eq!(session.user.name.as_deref(), Some("Ada"));
        assert_eq!(id.current_user(&session.access_token).unwrap().id, first.user.id);
    }

    #[test]
    fn email_is_unique_ignoring_case() {
        let id = identity();
        id.sign_up("ada@example.com", "hunter22", None).unwrap();
        assert!(matches!(
            id.sign_up("ADA@example.com", "hunter22", None),
            Err(AuthError::EmailTaken { .. })
        ));
    }

    #[test]
    fn wrong_password_and_unknown_email_look_the_same() {
        let id = identity();
        id.sign_up("ada@example.com", "hunter22", None).unwrap();
        assert!(matches!(
            id.sign_in("ada@example.com", "nope-nope"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            id.sign_in("bob@example.com", "hunter22"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(matches!(
            identity().sign_up("ada@example.com", "abc", None),
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[test]
    fn sign_out_revokes_access_token() {
        let id = identity();
        let session = signed_in(id.sign_up("ada@example.com", "hunter22", None).unwrap());
        id.sign_out(&session).unwrap();
        assert!(matches!(
            id.current_user(&session.access_token),
            Err(AuthError::NotAuthenticated)
        ));
    }

    #[test]
    fn expired_token_needs_refresh_and_refresh_rotates() {
        let id = identity().with_access_ttl(Duration::seconds(-5));
        let session = signed_in(id.sign_up("ada@example.com", "hunter22", None).unwrap());
        assert!(matches!(
            id.current_user(&session.access_token),
            Err(AuthError::SessionExpired)
        ));

        let id = LocalIdentity {
            access_ttl: Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            ..id
        };
        let fresh = id.refresh_session(&session.refresh_token).unwrap();
        assert_ne!(fresh.refresh_token, session.refresh_token);
        assert_eq!(id.current_user(&fresh.access_token).unwrap().email, "ada@example.com");

        // the old refresh token is single use
        assert!(matches!(
            id.refresh_session(&session.refresh_token),
            Err(AuthError::RefreshFailed(_))
        ));
    }

    #[test]
    fn verify_email_is_unsupported_locally() {
        assert!(matches!(
            identity().verify_email("hash", "signup"),
            Err(AuthError::Unsupported { provider: "local" })
        ));
    }
}
