//! Database schema migrations for streakbook.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::{debug, warn};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 4;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);
    debug!(current_version, target_version = SCHEMA_VERSION, "checking schema");

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }
    if current_version < 4 {
        migrate_v4(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: profiles, problem catalogue and solved exercises.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS profiles (
            id                  TEXT PRIMARY KEY,
            name                TEXT,
            streak_count        INTEGER NOT NULL DEFAULT 0,
            last_completed_date TEXT,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS problems (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            leetcode_number INTEGER NOT NULL UNIQUE,
            title           TEXT NOT NULL,
            link            TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS solved_exercises (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id        TEXT NOT NULL,
            problem_id     INTEGER NOT NULL REFERENCES problems(id),
            notes          TEXT,
            date_completed TEXT NOT NULL,
            created_at     TEXT NOT NULL,
            updated_at     TEXT NOT NULL,
            UNIQUE (user_id, problem_id)
        );

        CREATE INDEX IF NOT EXISTS idx_solved_user_date ON solved_exercises(user_id, date_completed);",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: category and tags on solved exercises.
///
/// Existing rows get the first primary category and an empty tag list.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "ALTER TABLE solved_exercises ADD COLUMN primary_category TEXT NOT NULL DEFAULT 'Array & Hashing';
         ALTER TABLE solved_exercises ADD COLUMN additional_tags TEXT NOT NULL DEFAULT '[]';",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}

/// Migration v3: medication log.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS medications (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL,
            name        TEXT NOT NULL,
            description TEXT,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_medications_user_created ON medications(user_id, created_at);",
    )?;
    set_schema_version(&tx, 3)?;
    tx.commit()
}

/// Migration v4: local identity tables.
///
/// Tokens are stored as SHA-256 digests, never in clear.
fn migrate_v4(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
            name          TEXT,
            password_hash TEXT NOT NULL,
            created_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS auth_sessions (
            access_digest  TEXT PRIMARY KEY,
            refresh_digest TEXT NOT NULL UNIQUE,
            user_id        TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expires_at     TEXT NOT NULL,
            created_at     TEXT NOT NULL
        );",
    )?;
    set_schema_version(&tx, 4)?;
    tx.commit()
}
