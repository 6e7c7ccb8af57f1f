//! `note_history` rows. Inserts happen only through the change tracker.

use rusqlite::{params, Connection, Row};

use crate::db::sqlite::{format_timestamp, parse_timestamp};
use crate::models::{HistoryEntry, UserId};
use crate::notes::tracker::TrackedField;

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<HistoryEntry> {
    let field: String = row.get(3)?;
    let created_at: String = row.get(7)?;
    Ok(HistoryEntry {
        id: row.get(0)?,
        note_id: row.get(1)?,
        updated_by: row.get(2)?,
        field: field.parse::<TrackedField>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        old_value: row.get(4)?,
        new_value: row.get(5)?,
        activity: row.get(6)?,
        created_at: parse_timestamp(7, &created_at)?,
    })
}

pub(crate) struct NewHistoryRow<'a> {
    pub note_id: &'a str,
    pub updated_by: UserId,
    pub field: TrackedField,
    pub old_value: &'a str,
    pub new_value: &'a str,
    pub activity: &'a str,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub(crate) fn insert_history(conn: &Connection, row: &NewHistoryRow<'_>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO note_history (note_id, updated_by, field, old_value, new_value, activity, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            row.note_id,
            row.updated_by,
            row.field.as_ref(),
            row.old_value,
            row.new_value,
            row.activity,
            format_timestamp(&row.created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// History for a note in insertion order.
pub fn list_history(conn: &Connection, note_id: &str) -> rusqlite::Result<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, note_id, updated_by, field, old_value, new_value, activity, created_at
         FROM note_history WHERE note_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([note_id], row_to_entry)?;
    rows.collect()
}

#[cfg(test)]
pub fn count_history(conn: &Connection, note_id: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM note_history WHERE note_id = ?1",
        [note_id],
        |row| row.get(0),
    )
}
