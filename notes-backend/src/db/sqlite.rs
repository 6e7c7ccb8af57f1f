//! SQLite database behind an r2d2 connection pool.
//!
//! Every pooled connection has foreign keys enabled (history and share rows
//! cascade with their note) and a busy timeout, so writers queue behind
//! SQLite's own locking instead of failing immediately.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

use crate::config::Config;
use crate::error::NotesResult;

pub type DbConn = PooledConnection<SqliteConnectionManager>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        first_name TEXT NOT NULL DEFAULT '',
        last_name TEXT NOT NULL DEFAULT '',
        is_active INTEGER NOT NULL DEFAULT 1,
        is_staff INTEGER NOT NULL DEFAULT 0,
        is_superuser INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS auth_sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        token TEXT NOT NULL UNIQUE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS notes (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL CHECK (length(trim(title)) > 0),
        description TEXT NOT NULL CHECK (length(trim(description)) > 0),
        created_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        updated_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        version INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS note_accessible_users (
        note_id TEXT NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        PRIMARY KEY (note_id, user_id)
    );

    CREATE TABLE IF NOT EXISTS note_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        note_id TEXT NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
        updated_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        field TEXT NOT NULL,
        old_value TEXT NOT NULL,
        new_value TEXT NOT NULL,
        activity TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_note_history_note ON note_history(note_id, id);
    CREATE INDEX IF NOT EXISTS idx_note_shares_user ON note_accessible_users(user_id);
    CREATE INDEX IF NOT EXISTS idx_notes_created_by ON notes(created_by);
    CREATE INDEX IF NOT EXISTS idx_auth_sessions_user ON auth_sessions(user_id);
";

pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn new(config: &Config) -> NotesResult<Self> {
        if let Some(parent) = Path::new(&config.database_url).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    log::warn!("Could not create database directory {:?}: {}", parent, e);
                }
            }
        }

        let busy_timeout = config.db_busy_timeout;
        let manager = SqliteConnectionManager::file(&config.database_url).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.pragma_update(None, "foreign_keys", true)
        });

        let pool = Pool::builder()
            .max_size(config.db_pool_size)
            .connection_timeout(Duration::from_secs(30))
            .build(manager)?;

        let db = Self { pool };
        db.init_tables()?;

        log::info!(
            "[DB] Opened {} (pool size {})",
            config.database_url,
            config.db_pool_size
        );
        Ok(db)
    }

    fn init_tables(&self) -> NotesResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Check a connection out of the pool.
    pub fn conn(&self) -> NotesResult<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run `f` inside a single `BEGIN IMMEDIATE` transaction.
    ///
    /// The transaction commits only if `f` returns `Ok`; any error (including
    /// one raised half-way through a multi-statement write) rolls everything
    /// back when the transaction is dropped.
    pub fn transaction<T, F>(&self, f: F) -> NotesResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> NotesResult<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Current time at the precision timestamps are stored with.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 (microseconds, `Z`), so stored timestamps compare
/// correctly as plain text in SQL.
pub(crate) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 column, surfacing bad data as a conversion error.
pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::error::NotesError;

    #[test]
    fn test_schema_is_idempotent() {
        let (dir, db) = test_db();
        db.init_tables().expect("second init should be a no-op");

        // Re-opening the same file must not fail either
        let path = dir.path().join("notes.db");
        Database::new(&Config::for_database(path.to_string_lossy())).expect("reopen");
    }

    #[test]
    fn test_foreign_keys_enabled_on_every_connection() {
        let (_dir, db) = test_db();
        for _ in 0..3 {
            let conn = db.conn().unwrap();
            let enabled: i64 = conn
                .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
                .unwrap();
            assert_eq!(enabled, 1);
        }
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let (_dir, db) = test_db();
        let now = format_timestamp(&now());

        let result: NotesResult<()> = db.transaction(|tx| {
            tx.execute(
                "INSERT INTO users (username, email, password_hash, created_at) VALUES ('a', 'a@x', 'h', ?1)",
                [&now],
            )?;
            Err(NotesError::Validation("abort".to_string()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_timestamp_roundtrip() {
        let ts = now();
        let formatted = format_timestamp(&ts);
        assert!(formatted.ends_with('Z'));
        assert_eq!(parse_timestamp(0, &formatted).unwrap(), ts);
        assert!(parse_timestamp(3, "yesterday").is_err());
    }

    #[test]
    fn test_formatted_timestamps_sort_as_text() {
        let earlier = now();
        let later = earlier + chrono::Duration::milliseconds(1500);
        assert!(format_timestamp(&earlier) < format_timestamp(&later));
    }
}
