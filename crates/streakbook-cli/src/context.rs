//! Builds the tracker for a command and persists the session between runs.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use streakbook_core::remote::{RestAuth, RestClient, RestStore};
use streakbook_core::storage::{data_dir, DATABASE_FILE};
use streakbook_core::{
    AuthSession, Backend, Config, Database, LocalIdentity, Tracker, TrackerSettings,
};
use tracing::debug;

const SESSION_FILE: &str = "session.json";

/// Contents of `session.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredSession {
    pub session: AuthSession,
    /// Whether this session already ran its decay check.
    #[serde(default)]
    pub decay_checked: bool,
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn session_path() -> Result<PathBuf, Box<dyn Error>> {
    Ok(data_dir()?.join(SESSION_FILE))
}

pub fn load_session() -> Result<Option<StoredSession>, Box<dyn Error>> {
    let path = session_path()?;
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write the tracker's current session, or remove the file when signed out.
pub fn save_session(tracker: &Tracker) -> Result<(), Box<dyn Error>> {
    let path = session_path()?;
    let Some(session) = tracker.session() else {
        return clear_session();
    };

    let stored = StoredSession {
        session: session.clone(),
        decay_checked: tracker.decay_checked(),
    };
    std::fs::write(&path, serde_json::to_string_pretty(&stored)?)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }
    debug!(path = %path.display(), "session saved");
    Ok(())
}

pub fn clear_session() -> Result<(), Box<dyn Error>> {
    match std::fs::remove_file(session_path()?) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// A tracker over the configured backend, without a session.
pub fn build_tracker(config: &Config) -> Result<Tracker, Box<dyn Error>> {
    let settings = TrackerSettings::from(config);
    let timeout = config.store.timeout();

    let tracker = match config.backend {
        Backend::Local => {
            let path = data_dir()?.join(DATABASE_FILE);
            let store = Database::open_at(&path, timeout)?;
            let identity = LocalIdentity::new(Database::open_at(&path, timeout)?);
            Tracker::new(Box::new(store), Box::new(identity), settings)
        }
        Backend::Hosted => {
            let client = Arc::new(RestClient::from_config(&config.hosted, timeout)?);
            Tracker::new(
                Box::new(RestStore::new(client.clone())),
                Box::new(RestAuth::new(client)),
                settings,
            )
        }
    };
    debug!(
        store = tracker.store_backend(),
        identity = tracker.identity_provider(),
        "tracker ready"
    );
    Ok(tracker)
}

/// Print the decay notice, if the session-start check fired.
pub fn start_session(tracker: &mut Tracker) -> Result<(), Box<dyn Error>> {
    if let Some(event) = tracker.start_session(today())? {
        eprintln!(
            "Streak reset from {} to {}: no exercise logged on {}",
            event.streak_before, event.streak_after, event.checked_day
        );
    }
    Ok(())
}

/// A tracker with the saved session restored, refreshed if close to expiry,
/// and the session-start decay check applied.
pub fn signed_in(config: &Config) -> Result<Tracker, Box<dyn Error>> {
    let stored = load_session()?.ok_or("not signed in, run `streakbook auth login` first")?;
    let mut tracker = build_tracker(config)?;
    tracker.restore(stored.session, stored.decay_checked);

    if let Err(e) = tracker.refresh_if_needed() {
        if e.ends_session() {
            clear_session()?;
        }
        return Err(e.into());
    }
    start_session(&mut tracker)?;
    save_session(&tracker)?;
    Ok(tracker)
}
