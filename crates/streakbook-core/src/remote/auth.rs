//! GoTrue-backed [`IdentityProvider`].

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{RestClient, RestResponse};
use crate::error::{AuthError, StoreError};
use crate::identity::{check_email, AuthSession, IdentityProvider, SignUpOutcome, User};

pub struct RestAuth {
    client: Arc<RestClient>,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl From<GoTrueUser> for User {
    fn from(user: GoTrueUser) -> Self {
        let name = user
            .user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        User {
            id: user.id,
            email: user.email.unwrap_or_default(),
            name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: GoTrueUser,
}

impl From<GoTrueSession> for AuthSession {
    fn from(session: GoTrueSession) -> Self {
        let expires_at = session
            .expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(|| Utc::now() + Duration::seconds(session.expires_in.unwrap_or(3600)));
        AuthSession {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_at,
            user: session.user.into(),
        }
    }
}

/// Error body; older servers send `error`/`error_description`, newer ones
/// `error_code`/`msg`.
#[derive(Debug, Default, Deserialize)]
struct GoTrueError {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl GoTrueError {
    fn parse(resp: &RestResponse) -> Self {
        serde_json::from_str(&resp.body).unwrap_or_default()
    }

    fn code(&self) -> &str {
        self.error_code
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or_default()
    }

    fn message(&self) -> String {
        self.msg
            .clone()
            .or_else(|| self.error_description.clone())
            .unwrap_or_else(|| self.code().to_string())
    }
}

fn store_failure(resp: RestResponse) -> AuthError {
    match resp.into_store_result() {
        Err(e) => AuthError::Store(e),
        Ok(resp) => AuthError::Store(StoreError::Unknown(format!(
            "unexpected auth response: HTTP {}",
            resp.status
        ))),
    }
}

impl RestAuth {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    fn call(
        &self,
        method: Method,
        path: &str,
        bearer: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Result<RestResponse, AuthError> {
        let url = self.client.endpoint(&format!("auth/v1/{path}"))?;
        let mut request = self.client.request(method, url, bearer);
        if let Some(body) = body {
            request = request.json(&body);
        }
        Ok(self.client.execute(request)?)
    }

    fn session(resp: &RestResponse) -> Result<AuthSession, AuthError> {
        let session: GoTrueSession = resp.json()?;
        Ok(session.into())
    }
}

impl IdentityProvider for RestAuth {
    fn provider(&self) -> &'static str {
        "hosted"
    }

    fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError> {
        let email = check_email(email)?;
        let resp = self.call(
            Method::POST,
            "signup",
            None,
            Some(json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            })),
        )?;

        if !resp.status.is_success() {
            let err = GoTrueError::parse(&resp);
            return Err(match err.code() {
                "user_already_exists" | "email_exists" => AuthError::EmailTaken { email },
                "weak_password" | "validation_failed" => AuthError::InvalidInput(err.message()),
                _ if resp.status.is_client_error()
                    && err.message().contains("already registered") =>
                {
                    AuthError::EmailTaken { email }
                }
                _ if resp.status.as_u16() == 422 => AuthError::InvalidInput(err.message()),
                _ => store_failure(resp),
            });
        }

        // with auto-confirm the body is a session, otherwise the bare user
        let body: serde_json::Value = resp.json()?;
        if body.get("access_token").is_some() {
            info!("hosted account created and signed in");
            return Ok(SignUpOutcome::SignedIn(Self::session(&resp)?));
        }
        let user: GoTrueUser = serde_json::from_value(body)
            .map_err(|e| StoreError::Unknown(format!("unexpected sign-up response: {e}")))?;
        info!("hosted account created, email confirmation pending");
        Ok(SignUpOutcome::ConfirmationRequired(user.into()))
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let resp = self.call(
            Method::POST,
            "token?grant_type=password",
            None,
            Some(json!({ "email": email.trim(), "password": password })),
        )?;
        if resp.status.is_success() {
            return Self::session(&resp);
        }

        let err = GoTrueError::parse(&resp);
        Err(match err.code() {
            "email_not_confirmed" => AuthError::EmailConfirmationRequired {
                email: email.trim().to_string(),
            },
            "invalid_credentials" | "invalid_grant" => AuthError::InvalidCredentials,
            _ if resp.status.as_u16() == 400 => AuthError::InvalidCredentials,
            _ => store_failure(resp),
        })
    }

    fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError> {
        let resp = self.call(Method::POST, "logout", Some(&session.access_token), None)?;
        if resp.status.is_success() {
            return Ok(());
        }
        // an already-dead token is as good as signed out
        if matches!(resp.status.as_u16(), 401 | 403 | 404) {
            warn!(status = %resp.status, "logout rejected, dropping session anyway");
            return Ok(());
        }
        Err(store_failure(resp))
    }

    fn current_user(&self, access_token: &str) -> Result<User, AuthError> {
        let resp = self.call(Method::GET, "user", Some(access_token), None)?;
        if resp.status.is_success() {
            let user: GoTrueUser = resp.json()?;
            return Ok(user.into());
        }
        Err(match resp.status.as_u16() {
            401 | 403 => AuthError::SessionExpired,
            _ => store_failure(resp),
        })
    }

    fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let resp = self.call(
            Method::POST,
            "token?grant_type=refresh_token",
            None,
            Some(json!({ "refresh_token": refresh_token })),
        )?;
        if resp.status.is_success() {
            return Self::session(&resp);
        }
        if resp.status.is_client_error() {
            return Err(AuthError::RefreshFailed(GoTrueError::parse(&resp).message()));
        }
        Err(store_failure(resp))
    }

    fn verify_email(&self, token_hash: &str, kind: &str) -> Result<AuthSession, AuthError> {
        let resp = self.call(
            Method::POST,
            "verify",
            None,
            Some(json!({ "type": kind, "token_hash": token_hash })),
        )?;
        if resp.status.is_success() {
            return Self::session(&resp);
        }
        if resp.status.is_client_error() {
            return Err(AuthError::InvalidInput(GoTrueError::parse(&resp).message()));
        }
        Err(store_failure(resp))
    }
}
