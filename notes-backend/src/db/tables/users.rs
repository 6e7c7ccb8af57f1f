//! User database operations

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::sqlite::{format_timestamp, now, parse_timestamp};
use crate::db::Database;
use crate::error::{is_unique_violation, NotesError, NotesResult};
use crate::identity::password;
use crate::models::{NewUser, User, UserId};

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, is_active, is_staff, is_superuser, created_at";

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get(8)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        is_active: row.get(5)?,
        is_staff: row.get(6)?,
        is_superuser: row.get(7)?,
        created_at: parse_timestamp(8, &created_at)?,
    })
}

/// Fetch a user by id on an existing connection or transaction.
pub fn fetch_user(conn: &Connection, user_id: UserId) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        [user_id],
        row_to_user,
    )
    .optional()
}

/// Ids from `user_ids` that do not belong to any registered user.
pub fn missing_user_ids(conn: &Connection, user_ids: &[UserId]) -> rusqlite::Result<Vec<UserId>> {
    let mut stmt = conn.prepare("SELECT 1 FROM users WHERE id = ?1")?;
    let mut missing = Vec::new();
    for &id in user_ids {
        if !stmt.exists([id])? {
            missing.push(id);
        }
    }
    Ok(missing)
}

/// Username for display in activity strings; falls back to the numeric id.
pub fn display_name(conn: &Connection, user_id: UserId) -> rusqlite::Result<String> {
    let name: Option<String> = conn
        .query_row("SELECT username FROM users WHERE id = ?1", [user_id], |row| row.get(0))
        .optional()?;
    Ok(name.unwrap_or_else(|| format!("user {}", user_id)))
}

fn validate_new_user(new_user: &NewUser) -> NotesResult<()> {
    if new_user.username.trim().is_empty() {
        return Err(NotesError::Validation("username may not be blank".to_string()));
    }
    if new_user.username.chars().count() > 150 {
        return Err(NotesError::Validation(
            "username may not exceed 150 characters".to_string(),
        ));
    }
    let email = new_user.email.trim();
    if email.is_empty() || !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(NotesError::Validation("enter a valid email address".to_string()));
    }
    if new_user.password.is_empty() {
        return Err(NotesError::Validation("password may not be blank".to_string()));
    }
    Ok(())
}

impl Database {
    /// Register a new account. Username and email must both be unused.
    pub fn create_user(&self, new_user: &NewUser) -> NotesResult<User> {
        validate_new_user(new_user)?;
        let password_hash = password::hash_password(&new_user.password)?;
        let created_at = now();

        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT INTO users (username, email, password_hash, first_name, last_name, is_active, is_staff, is_superuser, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?8)",
            params![
                new_user.username.trim(),
                new_user.email.trim(),
                password_hash,
                new_user.first_name,
                new_user.last_name,
                new_user.is_staff || new_user.is_superuser,
                new_user.is_superuser,
                format_timestamp(&created_at),
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(NotesError::Conflict("Email or Username Already in use".to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        fetch_user(&conn, id)?
            .ok_or_else(|| NotesError::NotFound(format!("User {} does not exist", id)))
    }

    pub fn get_user_by_username(&self, username: &str) -> NotesResult<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                [username],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// List all users ordered by id
    pub fn list_users(&self) -> NotesResult<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// Check a username/password pair. Unknown users, wrong passwords and
    /// deactivated accounts are indistinguishable to the caller.
    pub fn verify_credentials(&self, username: &str, password: &str) -> NotesResult<User> {
        let conn = self.conn()?;
        let found: Option<(UserId, String, bool)> = conn
            .query_row(
                "SELECT id, password_hash, is_active FROM users WHERE username = ?1",
                [username],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let rejected =
            || NotesError::Unauthenticated("No active account found with the given credentials".to_string());

        let (id, hash, is_active) = found.ok_or_else(rejected)?;
        if !is_active || !password::verify_password(password, &hash)? {
            return Err(rejected());
        }

        fetch_user(&conn, id)?.ok_or_else(rejected)
    }

    /// Enable or disable login for an account.
    pub fn set_user_active(&self, user_id: UserId, active: bool) -> NotesResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE users SET is_active = ?1 WHERE id = ?2",
            params![active, user_id],
        )?;
        Ok(rows > 0)
    }
}
