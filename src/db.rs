// SQLite-backed local state surviving process restarts.
//
// The only thing remembered is which draft this machine was in: the event
// id and the participant id handed out by the join call. Read once at
// startup, cleared when the user leaves the draft.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

const KEY_EVENT_ID: &str = "event_id";
const KEY_PARTICIPANT_ID: &str = "participant_id";

/// The remembered draft membership from a previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RememberedSession {
    pub event_id: i64,
    pub participant_id: i64,
}

pub struct LocalStore {
    conn: Mutex<Connection>,
}

impl LocalStore {
    /// Open (or create) the store at `path`. Pass `":memory:"` for an
    /// ephemeral store in tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open local store at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set local store pragmas")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS session_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .context("failed to create local store schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the connection. Panics if the mutex is poisoned (another
    /// thread panicked while holding the lock), which cannot happen in
    /// normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("local store mutex poisoned")
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT value FROM session_state WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .context("failed to read session_state")
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO session_state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .context("failed to write session_state")?;
        Ok(())
    }

    /// Remember the active draft so a restart rejoins it.
    pub fn remember_session(&self, event_id: i64, participant_id: i64) -> Result<()> {
        self.set(KEY_EVENT_ID, &event_id.to_string())?;
        self.set(KEY_PARTICIPANT_ID, &participant_id.to_string())?;
        Ok(())
    }

    /// The remembered draft membership, if both halves are present and
    /// parse. A half-written or corrupted entry reads as nothing.
    pub fn remembered_session(&self) -> Result<Option<RememberedSession>> {
        let event_id = self.get(KEY_EVENT_ID)?.and_then(|v| v.parse().ok());
        let participant_id = self.get(KEY_PARTICIPANT_ID)?.and_then(|v| v.parse().ok());
        Ok(match (event_id, participant_id) {
            (Some(event_id), Some(participant_id)) => Some(RememberedSession {
                event_id,
                participant_id,
            }),
            _ => None,
        })
    }

    /// Forget the remembered draft (used when leaving).
    pub fn forget_session(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "DELETE FROM session_state WHERE key IN (?1, ?2)",
            params![KEY_EVENT_ID, KEY_PARTICIPANT_ID],
        )
        .context("failed to clear session_state")?;
        Ok(())
    }
}
