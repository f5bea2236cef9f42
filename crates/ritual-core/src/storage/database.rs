//! SQLite-based routine and completion-log storage.
//!
//! Two record kinds, matching the in-memory model one to one. Logs carry
//! their routine id as a plain column with no FK cascade: deleting a
//! routine's logs is the caller's responsibility, enforced in the effect
//! layer rather than the schema.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::data_dir;
use crate::error::{CoreError, DatabaseError};
use crate::routine::{CompletionLog, Routine};

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_routine(row: &rusqlite::Row) -> Result<Routine, rusqlite::Error> {
    let last_done: Option<String> = row.get(4)?;
    Ok(Routine {
        id: row.get(0)?,
        name: row.get(1)?,
        emoji: row.get(2)?,
        interval_days: row.get(3)?,
        last_done: last_done.as_deref().map(parse_datetime_fallback),
    })
}

fn row_to_log(row: &rusqlite::Row) -> Result<CompletionLog, rusqlite::Error> {
    let completed_at: String = row.get(2)?;
    Ok(CompletionLog {
        id: row.get(0)?,
        routine_id: row.get(1)?,
        completed_at: parse_datetime_fallback(&completed_at),
    })
}

/// SQLite database for routines and completion logs.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/ritual/ritual.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("ritual.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (and migrate) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS routines (
                id            TEXT PRIMARY KEY,
                name          TEXT NOT NULL,
                emoji         TEXT NOT NULL,
                interval_days INTEGER NOT NULL,
                last_done     TEXT
            );

            CREATE TABLE IF NOT EXISTS completion_logs (
                id           TEXT PRIMARY KEY,
                routine_id   TEXT NOT NULL,
                completed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_logs_routine_id
                ON completion_logs(routine_id);",
        )?;
        Ok(())
    }

    // ── Routines ─────────────────────────────────────────────────────

    pub fn insert_routine(&self, routine: &Routine) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO routines (id, name, emoji, interval_days, last_done)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                routine.id,
                routine.name,
                routine.emoji,
                routine.interval_days,
                routine.last_done.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// All routines, name ascending, case-insensitive.
    pub fn list_routines(&self) -> Result<Vec<Routine>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, emoji, interval_days, last_done
             FROM routines ORDER BY name COLLATE NOCASE ASC",
        )?;
        let rows = stmt.query_map([], row_to_routine)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_routine(&self, id: &str) -> Result<Option<Routine>, DatabaseError> {
        let routine = self
            .conn
            .query_row(
                "SELECT id, name, emoji, interval_days, last_done
                 FROM routines WHERE id = ?1",
                params![id],
                row_to_routine,
            )
            .optional()?;
        Ok(routine)
    }

    /// Update name, emoji, and interval. Never touches `last_done`.
    pub fn update_routine(&self, routine: &Routine) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE routines SET name = ?2, emoji = ?3, interval_days = ?4 WHERE id = ?1",
            params![
                routine.id,
                routine.name,
                routine.emoji,
                routine.interval_days
            ],
        )?;
        Ok(())
    }

    pub fn set_last_done(&self, id: &str, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE routines SET last_done = ?2 WHERE id = ?1",
            params![id, at.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn delete_routine(&self, id: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM routines WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Completion logs ──────────────────────────────────────────────

    pub fn insert_log(&self, log: &CompletionLog) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO completion_logs (id, routine_id, completed_at)
             VALUES (?1, ?2, ?3)",
            params![log.id, log.routine_id, log.completed_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Logs for one routine, newest first.
    pub fn logs_for_routine(&self, routine_id: &str) -> Result<Vec<CompletionLog>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, routine_id, completed_at
             FROM completion_logs WHERE routine_id = ?1
             ORDER BY completed_at DESC",
        )?;
        let rows = stmt.query_map(params![routine_id], row_to_log)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn delete_logs_for_routine(&self, routine_id: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "DELETE FROM completion_logs WHERE routine_id = ?1",
            params![routine_id],
        )?;
        Ok(())
    }
}
