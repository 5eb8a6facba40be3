//! SQLite-backed profile, session and log storage.
//!
//! One `users` row per user carries the profile, the session-state
//! token and the nullable in-flight recording (JSON with RFC 3339
//! timestamps and an ISO-8601 pause total). Completed entries land in
//! `logs` keyed by an autoincrement sequence, so listing order is
//! insertion order.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Timestamp;
use crate::error::{Result, StoreError};
use crate::log::LogEntry;
use crate::profile::{ProfileDefaults, UserProfile};
use crate::session::{Session, SessionState, Timer};
use crate::timefmt::{encode_duration, parse_duration};

use super::data_dir;

/// Log-store side effect of one applied transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEffect {
    None,
    Append(LogEntry),
    Clear,
}

/// Wire form of an in-flight timer, stored as JSON in
/// `users.recording`. `paused_at` is present exactly when the timer
/// is paused.
#[derive(Debug, Serialize, Deserialize)]
struct RecordingRow {
    project: String,
    started_at: String,
    pause: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    paused_at: Option<String>,
}

/// SQLite database holding profiles, sessions and completed logs.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/worklog/worklog.db`, creating
    /// the file and schema if they don't exist.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("worklog.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (and migrate) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database, for tests and ephemeral runs.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    user_id   TEXT PRIMARY KEY,
                    timezone  INTEGER NOT NULL DEFAULT 0,
                    projects  TEXT NOT NULL DEFAULT '[]',
                    state     TEXT NOT NULL DEFAULT 'idle',
                    recording TEXT
                );

                CREATE TABLE IF NOT EXISTS logs (
                    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
                    id         TEXT NOT NULL UNIQUE,
                    user_id    TEXT NOT NULL,
                    project    TEXT NOT NULL,
                    started_at TEXT NOT NULL,
                    stopped_at TEXT NOT NULL,
                    pause      TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_logs_user ON logs(user_id);",
            )
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))
    }

    // ── Profiles ─────────────────────────────────────────────────

    /// Fetch a profile, creating it from `defaults` on first contact.
    pub fn get_or_create(
        &self,
        user_id: &str,
        defaults: &ProfileDefaults,
    ) -> Result<UserProfile, StoreError> {
        if let Some(profile) = self.load_profile(user_id)? {
            return Ok(profile);
        }
        let profile = UserProfile::with_defaults(user_id, defaults);
        self.conn.execute(
            "INSERT OR IGNORE INTO users (user_id, timezone, projects) VALUES (?1, ?2, ?3)",
            params![
                profile.user_id,
                profile.timezone,
                serde_json::to_string(&profile.projects)?
            ],
        )?;
        Ok(profile)
    }

    fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT timezone, projects FROM users WHERE user_id = ?1")?;
        let row = stmt.query_row(params![user_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        });
        match row {
            Ok((timezone, projects)) => Ok(Some(UserProfile {
                user_id: user_id.to_string(),
                timezone,
                projects: serde_json::from_str(&projects)?,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE users SET timezone = ?2, projects = ?3 WHERE user_id = ?1",
            params![
                profile.user_id,
                profile.timezone,
                serde_json::to_string(&profile.projects)?
            ],
        )?;
        Ok(())
    }

    /// Append a project unless already present. Returns whether it
    /// was added.
    pub fn add_project(
        &self,
        user_id: &str,
        name: &str,
        defaults: &ProfileDefaults,
    ) -> Result<bool, StoreError> {
        let mut profile = self.get_or_create(user_id, defaults)?;
        if !profile.add_project(name) {
            return Ok(false);
        }
        self.save_profile(&profile)?;
        Ok(true)
    }

    /// Remove a project from the chooser. Existing log entries keep
    /// referencing it.
    pub fn remove_project(
        &self,
        user_id: &str,
        name: &str,
        defaults: &ProfileDefaults,
    ) -> Result<bool, StoreError> {
        let mut profile = self.get_or_create(user_id, defaults)?;
        if !profile.remove_project(name) {
            return Ok(false);
        }
        self.save_profile(&profile)?;
        Ok(true)
    }

    /// Set the display timezone offset. Any integer is accepted.
    pub fn set_timezone(
        &self,
        user_id: &str,
        offset: i64,
        defaults: &ProfileDefaults,
    ) -> Result<(), StoreError> {
        let mut profile = self.get_or_create(user_id, defaults)?;
        profile.timezone = offset;
        self.save_profile(&profile)
    }

    /// Projects in chooser (insertion) order.
    pub fn list_projects(
        &self,
        user_id: &str,
        defaults: &ProfileDefaults,
    ) -> Result<Vec<String>, StoreError> {
        Ok(self.get_or_create(user_id, defaults)?.projects)
    }

    // ── Sessions ─────────────────────────────────────────────────

    /// The stored session, or a fresh idle one for unknown users.
    pub fn load_session(&self, user_id: &str) -> Result<Session, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT state, recording FROM users WHERE user_id = ?1")?;
        let row = stmt.query_row(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        });
        let (state, recording) = match row {
            Ok(pair) => pair,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(Session::default()),
            Err(e) => return Err(e.into()),
        };
        let timer = match recording {
            None => Timer::Idle,
            Some(json) => row_to_timer(serde_json::from_str(&json)?)?,
        };
        Ok(Session {
            state: parse_session_state(&state),
            timer,
        })
    }

    /// Persist one applied transition. The session columns and the
    /// log effect commit together or not at all.
    pub fn save_turn(
        &mut self,
        profile: &UserProfile,
        session: &Session,
        effect: &LogEffect,
    ) -> Result<(), StoreError> {
        let recording = match timer_to_row(&session.timer) {
            Some(row) => Some(serde_json::to_string(&row)?),
            None => None,
        };
        let projects = serde_json::to_string(&profile.projects)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE users SET timezone = ?2, projects = ?3, state = ?4, recording = ?5
             WHERE user_id = ?1",
            params![
                profile.user_id,
                profile.timezone,
                projects,
                format_session_state(session.state),
                recording
            ],
        )?;
        match effect {
            LogEffect::None => {}
            LogEffect::Append(entry) => insert_log(&tx, &profile.user_id, entry)?,
            LogEffect::Clear => {
                tx.execute("DELETE FROM logs WHERE user_id = ?1", params![profile.user_id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ── Logs ─────────────────────────────────────────────────────

    /// Append a completed entry for `user_id`.
    pub fn append_log(&self, user_id: &str, entry: &LogEntry) -> Result<(), StoreError> {
        insert_log(&self.conn, user_id, entry)
    }

    /// All entries for `user_id` in insertion order.
    pub fn list_logs(&self, user_id: &str) -> Result<Vec<LogEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project, started_at, stopped_at, pause
             FROM logs WHERE user_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, project, started_at, stopped_at, pause) = row?;
            entries.push(LogEntry {
                id: Uuid::parse_str(&id)
                    .map_err(|e| StoreError::Corrupt(format!("bad log id '{id}': {e}")))?,
                project,
                start: decode_stamp(&started_at)?,
                stop: decode_stamp(&stopped_at)?,
                pause_total: parse_duration(&pause)
                    .ok_or_else(|| StoreError::Corrupt(format!("bad duration '{pause}'")))?,
            });
        }
        Ok(entries)
    }

    /// Delete every entry for `user_id`.
    pub fn clear_logs(&self, user_id: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM logs WHERE user_id = ?1", params![user_id])?;
        Ok(())
    }
}

fn insert_log(conn: &Connection, user_id: &str, entry: &LogEntry) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO logs (id, user_id, project, started_at, stopped_at, pause)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.id.to_string(),
            user_id,
            entry.project,
            encode_stamp(entry.start),
            encode_stamp(entry.stop),
            encode_duration(entry.pause_total)
        ],
    )?;
    Ok(())
}

// ── Row codecs ───────────────────────────────────────────────────

fn parse_session_state(token: &str) -> SessionState {
    match token {
        "project_chooser" => SessionState::ProjectChooser,
        "timer_running" => SessionState::TimerRunning,
        "timer_paused" => SessionState::TimerPaused,
        "log_menu" => SessionState::LogMenu,
        "settings_menu" => SessionState::SettingsMenu,
        "awaiting_new_project_name" => SessionState::AwaitingNewProjectName,
        "awaiting_project_to_remove" => SessionState::AwaitingProjectToRemove,
        "awaiting_timezone_input" => SessionState::AwaitingTimezoneInput,
        _ => SessionState::Idle,
    }
}

fn format_session_state(state: SessionState) -> &'static str {
    match state {
        SessionState::Idle => "idle",
        SessionState::ProjectChooser => "project_chooser",
        SessionState::TimerRunning => "timer_running",
        SessionState::TimerPaused => "timer_paused",
        SessionState::LogMenu => "log_menu",
        SessionState::SettingsMenu => "settings_menu",
        SessionState::AwaitingNewProjectName => "awaiting_new_project_name",
        SessionState::AwaitingProjectToRemove => "awaiting_project_to_remove",
        SessionState::AwaitingTimezoneInput => "awaiting_timezone_input",
    }
}

fn timer_to_row(timer: &Timer) -> Option<RecordingRow> {
    match timer {
        Timer::Idle => None,
        Timer::Running { project, started_at, pause_accum } => Some(RecordingRow {
            project: project.clone(),
            started_at: encode_stamp(*started_at),
            pause: encode_duration(*pause_accum),
            paused_at: None,
        }),
        Timer::Paused { project, started_at, pause_accum, paused_at } => Some(RecordingRow {
            project: project.clone(),
            started_at: encode_stamp(*started_at),
            pause: encode_duration(*pause_accum),
            paused_at: Some(encode_stamp(*paused_at)),
        }),
    }
}

fn row_to_timer(row: RecordingRow) -> Result<Timer, StoreError> {
    let started_at = decode_stamp(&row.started_at)?;
    let pause_accum = parse_duration(&row.pause)
        .ok_or_else(|| StoreError::Corrupt(format!("bad duration '{}'", row.pause)))?;
    Ok(match row.paused_at {
        None => Timer::Running {
            project: row.project,
            started_at,
            pause_accum,
        },
        Some(stamp) => Timer::Paused {
            project: row.project,
            started_at,
            pause_accum,
            paused_at: decode_stamp(&stamp)?,
        },
    })
}

fn encode_stamp(ts: Timestamp) -> String {
    DateTime::from_timestamp(ts, 0)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
        .to_rfc3339()
}

fn decode_stamp(s: &str) -> Result<Timestamp, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.timestamp())
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ProfileDefaults {
        ProfileDefaults::default()
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let db = Database::open_memory().unwrap();
        let first = db.get_or_create("u1", &defaults()).unwrap();
        assert_eq!(first.timezone, 0);
        assert_eq!(first.projects, ["Work", "Sport", "Education", "Portfolio"]);

        db.add_project("u1", "Piano", &defaults()).unwrap();
        let again = db.get_or_create("u1", &defaults()).unwrap();
        assert_eq!(again.projects.len(), 5);
    }

    #[test]
    fn project_mutations_report_whether_they_changed_anything() {
        let db = Database::open_memory().unwrap();
        assert!(db.add_project("u1", "Piano", &defaults()).unwrap());
        assert!(!db.add_project("u1", "Piano", &defaults()).unwrap());
        assert!(db.remove_project("u1", "Piano", &defaults()).unwrap());
        assert!(!db.remove_project("u1", "Piano", &defaults()).unwrap());
        assert_eq!(
            db.list_projects("u1", &defaults()).unwrap(),
            ["Work", "Sport", "Education", "Portfolio"]
        );
    }

    #[test]
    fn timezone_accepts_any_integer() {
        let db = Database::open_memory().unwrap();
        db.set_timezone("u1", -11, &defaults()).unwrap();
        assert_eq!(db.get_or_create("u1", &defaults()).unwrap().timezone, -11);
        db.set_timezone("u1", 99, &defaults()).unwrap();
        assert_eq!(db.get_or_create("u1", &defaults()).unwrap().timezone, 99);
    }

    #[test]
    fn logs_list_in_insertion_order() {
        let db = Database::open_memory().unwrap();
        let newer = LogEntry::new("B", 500, 600, 0);
        let older = LogEntry::new("A", 0, 100, 10);
        db.append_log("u1", &newer).unwrap();
        db.append_log("u1", &older).unwrap();

        let entries = db.list_logs("u1").unwrap();
        assert_eq!(entries, [newer, older]);

        db.clear_logs("u1").unwrap();
        assert!(db.list_logs("u1").unwrap().is_empty());
    }

    #[test]
    fn logs_are_scoped_per_user() {
        let db = Database::open_memory().unwrap();
        db.append_log("u1", &LogEntry::new("Work", 0, 50, 0)).unwrap();
        db.append_log("u2", &LogEntry::new("Work", 0, 80, 0)).unwrap();
        db.clear_logs("u1").unwrap();
        assert!(db.list_logs("u1").unwrap().is_empty());
        assert_eq!(db.list_logs("u2").unwrap().len(), 1);
    }

    #[test]
    fn save_turn_round_trips_a_paused_session() {
        let mut db = Database::open_memory().unwrap();
        let profile = db.get_or_create("u1", &defaults()).unwrap();
        let session = Session {
            state: SessionState::TimerPaused,
            timer: Timer::start("Work", 1000).pause(1100),
        };
        db.save_turn(&profile, &session, &LogEffect::None).unwrap();
        assert_eq!(db.load_session("u1").unwrap(), session);
    }

    #[test]
    fn save_turn_applies_log_effects_atomically_with_the_session() {
        let mut db = Database::open_memory().unwrap();
        let profile = db.get_or_create("u1", &defaults()).unwrap();
        let entry = LogEntry::new("Work", 1000, 1300, 50);
        db.save_turn(&profile, &Session::default(), &LogEffect::Append(entry.clone()))
            .unwrap();
        assert_eq!(db.list_logs("u1").unwrap(), [entry]);

        db.save_turn(&profile, &Session::default(), &LogEffect::Clear)
            .unwrap();
        assert!(db.list_logs("u1").unwrap().is_empty());
    }

    #[test]
    fn unknown_users_get_a_fresh_session() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.load_session("ghost").unwrap(), Session::default());
    }

    #[test]
    fn unrecognized_state_tokens_fall_back_to_idle() {
        assert_eq!(parse_session_state("warp_drive"), SessionState::Idle);
        assert_eq!(parse_session_state("log_menu"), SessionState::LogMenu);
    }
}
