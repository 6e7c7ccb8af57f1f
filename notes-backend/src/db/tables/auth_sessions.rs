//! Auth session database operations

use chrono::Duration;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::db::sqlite::{format_timestamp, now, parse_timestamp};
use crate::db::Database;
use crate::error::NotesResult;
use crate::models::{Session, UserId};

impl Database {
    /// Create a new bearer session for a user that just logged in
    pub fn create_session(&self, user_id: UserId, ttl_hours: i64) -> NotesResult<Session> {
        let conn = self.conn()?;
        let token = Uuid::new_v4().to_string();
        let created_at = now();
        let expires_at = created_at + Duration::hours(ttl_hours);

        conn.execute(
            "INSERT INTO auth_sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![token, user_id, format_timestamp(&created_at), format_timestamp(&expires_at)],
        )?;

        let id = conn.last_insert_rowid();

        Ok(Session {
            id,
            token,
            user_id,
            created_at,
            expires_at,
        })
    }

    /// Validate a session token and extend its expiry if valid.
    ///
    /// Sessions of deactivated users are treated as invalid.
    pub fn validate_session(&self, token: &str, ttl_hours: i64) -> NotesResult<Option<Session>> {
        let conn = self.conn()?;
        let now = now();

        let session = conn
            .query_row(
                "SELECT s.id, s.token, s.user_id, s.created_at, s.expires_at
                 FROM auth_sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?1 AND s.expires_at > ?2 AND u.is_active = 1",
                params![token, format_timestamp(&now)],
                |row| {
                    let created_at: String = row.get(3)?;
                    let expires_at: String = row.get(4)?;
                    Ok(Session {
                        id: row.get(0)?,
                        token: row.get(1)?,
                        user_id: row.get(2)?,
                        created_at: parse_timestamp(3, &created_at)?,
                        expires_at: parse_timestamp(4, &expires_at)?,
                    })
                },
            )
            .optional()?;

        // Keep active sessions alive
        let session = match session {
            Some(mut session) => {
                let new_expires = now + Duration::hours(ttl_hours);
                conn.execute(
                    "UPDATE auth_sessions SET expires_at = ?1 WHERE id = ?2",
                    params![format_timestamp(&new_expires), session.id],
                )?;
                session.expires_at = new_expires;
                Some(session)
            }
            None => None,
        };

        Ok(session)
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, token: &str) -> NotesResult<bool> {
        let conn = self.conn()?;
        let rows_affected = conn.execute("DELETE FROM auth_sessions WHERE token = ?1", [token])?;
        Ok(rows_affected > 0)
    }

    /// Drop every expired session, returning how many were removed.
    pub fn purge_expired_sessions(&self) -> NotesResult<usize> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM auth_sessions WHERE expires_at <= ?1",
            [format_timestamp(&now())],
        )?;
        Ok(removed)
    }
}
