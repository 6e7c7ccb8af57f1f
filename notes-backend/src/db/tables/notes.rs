//! Note rows and the `note_accessible_users` share relation.
//!
//! These functions take a plain `&Connection` so they compose inside a
//! caller-owned transaction. None of them check access; that is layered on
//! top by `crate::notes`.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::sqlite::{format_timestamp, parse_timestamp};
use crate::models::{ActorFields, AuditFields, Note, UserId};

const NOTE_COLUMNS: &str =
    "id, title, description, created_by, updated_by, version, created_at, updated_at";

/// Map a row (without share list) into a note; callers fill `accessible_users`.
fn row_to_note(row: &Row<'_>) -> rusqlite::Result<Note> {
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        actors: ActorFields {
            created_by: row.get(3)?,
            updated_by: row.get(4)?,
        },
        version: row.get(5)?,
        audit: AuditFields {
            created_at: parse_timestamp(6, &created_at)?,
            updated_at: parse_timestamp(7, &updated_at)?,
        },
        accessible_users: Vec::new(),
    })
}

pub fn insert_note(conn: &Connection, note: &Note) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO notes (id, title, description, created_by, updated_by, version, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            note.id,
            note.title,
            note.description,
            note.actors.created_by,
            note.actors.updated_by,
            note.version,
            format_timestamp(&note.audit.created_at),
            format_timestamp(&note.audit.updated_at),
        ],
    )?;
    Ok(())
}

/// Load a note together with its share list.
pub fn fetch_note(conn: &Connection, note_id: &str) -> rusqlite::Result<Option<Note>> {
    let note = conn
        .query_row(
            &format!("SELECT {} FROM notes WHERE id = ?1", NOTE_COLUMNS),
            [note_id],
            row_to_note,
        )
        .optional()?;

    match note {
        Some(mut note) => {
            note.accessible_users = fetch_accessible_users(conn, note_id)?;
            Ok(Some(note))
        }
        None => Ok(None),
    }
}

/// Persist the mutable columns of `note`. `created_by` and `created_at` are
/// never written after insert. Returns the number of rows touched.
pub fn write_note(conn: &Connection, note: &Note) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE notes SET title = ?1, description = ?2, updated_by = ?3, version = ?4, updated_at = ?5
         WHERE id = ?6",
        params![
            note.title,
            note.description,
            note.actors.updated_by,
            note.version,
            format_timestamp(&note.audit.updated_at),
            note.id,
        ],
    )
}

/// Delete a note; history and share rows go with it via `ON DELETE CASCADE`.
pub fn delete_note(conn: &Connection, note_id: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM notes WHERE id = ?1", [note_id])?;
    Ok(rows > 0)
}

pub fn fetch_accessible_users(conn: &Connection, note_id: &str) -> rusqlite::Result<Vec<UserId>> {
    let mut stmt = conn.prepare(
        "SELECT user_id FROM note_accessible_users WHERE note_id = ?1 ORDER BY user_id",
    )?;
    let rows = stmt.query_map([note_id], |row| row.get(0))?;
    rows.collect()
}

/// Union `user_ids` into the share list. Already-shared users are ignored.
/// Returns how many new share rows were created.
pub fn add_accessible_users(
    conn: &Connection,
    note_id: &str,
    user_ids: &[UserId],
) -> rusqlite::Result<usize> {
    let mut stmt = conn
        .prepare("INSERT OR IGNORE INTO note_accessible_users (note_id, user_id) VALUES (?1, ?2)")?;
    let mut added = 0;
    for &user_id in user_ids {
        added += stmt.execute(params![note_id, user_id])?;
    }
    Ok(added)
}

/// Notes owned by or shared with `user_id`, most recently updated first.
pub fn list_notes_for_user(conn: &Connection, user_id: UserId) -> rusqlite::Result<Vec<Note>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM notes
         WHERE created_by = ?1
            OR id IN (SELECT note_id FROM note_accessible_users WHERE user_id = ?1)
         ORDER BY updated_at DESC, id",
        NOTE_COLUMNS
    ))?;
    let notes = stmt
        .query_map([user_id], row_to_note)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    notes
        .into_iter()
        .map(|mut note| -> rusqlite::Result<Note> {
            note.accessible_users = fetch_accessible_users(conn, &note.id)?;
            Ok(note)
        })
        .collect()
}
