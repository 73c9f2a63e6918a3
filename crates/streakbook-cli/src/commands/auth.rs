//! Account and session commands.

use clap::Subcommand;
use serde_json::json;
use streakbook_core::{Config, SignUpOutcome};

use super::print_json;
use crate::context::{self, build_tracker, load_session, save_session};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create an account and sign in
    Signup {
        /// Email address
        email: String,
        /// Password (at least 6 characters)
        #[arg(long, env = "STREAKBOOK_PASSWORD", hide_env_values = true)]
        password: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },
    /// Sign in with email and password
    Login {
        /// Email address
        email: String,
        /// Password
        #[arg(long, env = "STREAKBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Exchange the refresh token for a new session
    Refresh,
    /// Confirm an email address with the token hash from the confirmation link
    Confirm {
        /// Token hash from the link
        token_hash: String,
        /// Confirmation type
        #[arg(long, default_value = "email")]
        kind: String,
    },
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    match action {
        AuthAction::Signup {
            email,
            password,
            name,
        } => {
            let mut tracker = build_tracker(&config)?;
            match tracker.sign_up(name.as_deref(), &email, &password)? {
                SignUpOutcome::SignedIn(session) => {
                    save_session(&tracker)?;
                    println!("Signed up and signed in as {}", session.user.email);
                }
                SignUpOutcome::ConfirmationRequired(user) => {
                    println!(
                        "Account created for {}. Check your inbox, then run `streakbook auth confirm <token-hash>`.",
                        user.email
                    );
                }
            }
        }
        AuthAction::Login { email, password } => {
            let mut tracker = build_tracker(&config)?;
            let user = tracker.sign_in(&email, &password)?.user.clone();
            context::start_session(&mut tracker)?;
            save_session(&tracker)?;
            println!("Signed in as {}", user.email);
        }
        AuthAction::Logout => {
            let Some(stored) = load_session()? else {
                println!("not signed in");
                return Ok(());
            };
            let mut tracker = build_tracker(&config)?;
            tracker.restore(stored.session, stored.decay_checked);
            tracker.sign_out()?;
            context::clear_session()?;
            println!("Signed out");
        }
        AuthAction::Status { json } => {
            let Some(stored) = load_session()? else {
                if json {
                    print_json(&json!({ "signed_in": false }))?;
                } else {
                    println!("not signed in");
                }
                return Ok(());
            };
            let mut tracker = build_tracker(&config)?;
            tracker.restore(stored.session.clone(), stored.decay_checked);
            let valid = tracker.current_user().map_err(|e| e.to_string());

            if json {
                print_json(&json!({
                    "signed_in": valid.is_ok(),
                    "user": stored.session.user,
                    "expires_at": stored.session.expires_at,
                    "backend": tracker.store_backend(),
                    "error": valid.as_ref().err(),
                }))?;
            } else {
                let user = &stored.session.user;
                println!("User:    {} ({})", user.email, user.id);
                if let Some(name) = &user.name {
                    println!("Name:    {name}");
                }
                println!("Expires: {}", stored.session.expires_at);
                println!("Backend: {}", tracker.store_backend());
                match valid {
                    Ok(_) => println!("Session: valid"),
                    Err(e) => println!("Session: invalid ({e})"),
                }
            }
        }
        AuthAction::Refresh => {
            let stored = load_session()?.ok_or("not signed in")?;
            let mut tracker = build_tracker(&config)?;
            tracker.restore(stored.session, stored.decay_checked);
            let refreshed = tracker.refresh().map(|session| session.expires_at);
            save_session(&tracker)?;
            println!("Session refreshed, expires {}", refreshed?);
        }
        AuthAction::Confirm { token_hash, kind } => {
            let mut tracker = build_tracker(&config)?;
            let email = tracker.confirm_email(&token_hash, &kind)?.user.email.clone();
            context::start_session(&mut tracker)?;
            save_session(&tracker)?;
            println!("Email confirmed, signed in as {email}");
        }
    }
    Ok(())
}
