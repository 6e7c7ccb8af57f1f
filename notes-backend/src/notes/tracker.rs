//! Field-level change tracking.
//!
//! Tracked fields are an explicit enumeration. Saving an updated note goes
//! through [`save_tracked`], which diffs it against the stored state and
//! appends one history row per changed field on the same connection, so the
//! note write and its audit rows commit or roll back together.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::db::tables::{history, notes, users};
use crate::error::{NotesError, NotesResult};
use crate::models::Note;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::EnumString,
    strum::AsRefStr,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrackedField {
    Title,
    Description,
}

/// One `(field, old, new)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: TrackedField,
    pub old_value: String,
    pub new_value: String,
}

impl FieldChange {
    pub fn activity(&self, actor: &str) -> String {
        format!(
            "{} updated {} from {} to {}",
            actor, self.field, self.old_value, self.new_value
        )
    }
}

/// Changes between two versions of a note, in `TrackedField` order.
/// Actor and timestamp columns are not tracked.
pub fn diff(before: &Note, after: &Note) -> Vec<FieldChange> {
    TrackedField::iter()
        .filter_map(|field| {
            let old = before.field_value(field);
            let new = after.field_value(field);
            (old != new).then(|| FieldChange {
                field,
                old_value: old.to_string(),
                new_value: new.to_string(),
            })
        })
        .collect()
}

/// Record the diff between `before` and `after` and persist `after`.
///
/// Must run on a transaction: a failing history insert or a failing note
/// write leaves an error that the caller propagates, and dropping the
/// transaction discards everything written here.
pub fn save_tracked(conn: &Connection, before: &Note, after: &Note) -> NotesResult<Vec<FieldChange>> {
    debug_assert_eq!(before.id, after.id);

    let changes = diff(before, after);
    if !changes.is_empty() {
        let actor = after.actors.updated_by;
        let actor_name = users::display_name(conn, actor)?;

        for change in &changes {
            let activity = change.activity(&actor_name);
            history::insert_history(
                conn,
                &history::NewHistoryRow {
                    note_id: &after.id,
                    updated_by: actor,
                    field: change.field,
                    old_value: &change.old_value,
                    new_value: &change.new_value,
                    activity: &activity,
                    created_at: after.audit.updated_at,
                },
            )?;
        }
    }

    if notes::write_note(conn, after)? == 0 {
        return Err(NotesError::note_not_found(&after.id));
    }

    log::debug!(
        "[NOTES] note {} saved by {} with {} tracked change(s)",
        after.id,
        after.actors.updated_by,
        changes.len()
    );
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::now;
    use crate::db::{test_db, test_user};
    use crate::models::{ActorFields, AuditFields, NotePatch};

    fn note(owner: i64) -> Note {
        Note {
            id: "n1".to_string(),
            title: "Test Note".to_string(),
            description: "desc".to_string(),
            actors: ActorFields::new(owner),
            audit: AuditFields::new(now()),
            accessible_users: vec![],
            version: 1,
        }
    }

    #[test]
    fn test_field_names() {
        assert_eq!(TrackedField::Title.to_string(), "title");
        assert_eq!(TrackedField::Description.as_ref(), "description");
        assert_eq!("description".parse::<TrackedField>().unwrap(), TrackedField::Description);
        assert!("updated_by".parse::<TrackedField>().is_err());
    }

    #[test]
    fn test_diff_only_changed_fields() {
        let before = note(1);
        let after = before.patched(&NotePatch::description("new"), 2, now()).unwrap();

        let changes = diff(&before, &after);
        assert_eq!(
            changes,
            vec![FieldChange {
                field: TrackedField::Description,
                old_value: "desc".to_string(),
                new_value: "new".to_string(),
            }]
        );
    }

    #[test]
    fn test_diff_ignores_actor_only_change() {
        let before = note(1);
        let after = before.patched(&NotePatch::default(), 2, now()).unwrap();
        assert!(diff(&before, &after).is_empty());
    }

    #[test]
    fn test_diff_both_fields_in_order() {
        let before = note(1);
        let patch = NotePatch {
            title: Some("Renamed".to_string()),
            description: Some("other".to_string()),
            expected_version: None,
        };
        let after = before.patched(&patch, 1, now()).unwrap();
        let fields: Vec<TrackedField> = diff(&before, &after).into_iter().map(|c| c.field).collect();
        assert_eq!(fields, vec![TrackedField::Title, TrackedField::Description]);
    }

    #[test]
    fn test_activity_line() {
        let change = FieldChange {
            field: TrackedField::Description,
            old_value: "desc".to_string(),
            new_value: "new".to_string(),
        };
        assert_eq!(change.activity("bob"), "bob updated description from desc to new");
    }

    #[test]
    fn test_save_tracked_writes_history_and_note() {
        let (_dir, db) = test_db();
        let alice = test_user(&db, "alice");
        let before = note(alice.id);
        notes::insert_note(&db.conn().unwrap(), &before).unwrap();

        let after = before.patched(&NotePatch::description("new"), alice.id, now()).unwrap();
        let changes = db.transaction(|tx| save_tracked(tx, &before, &after)).unwrap();
        assert_eq!(changes.len(), 1);

        let conn = db.conn().unwrap();
        let entries = history::list_history(&conn, "n1").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].old_value, "desc");
        assert_eq!(entries[0].new_value, "new");
        assert_eq!(entries[0].activity, "alice updated description from desc to new");
        assert_eq!(notes::fetch_note(&conn, "n1").unwrap().unwrap().description, "new");
    }

    #[test]
    fn test_failed_history_insert_rolls_back_note() {
        let (_dir, db) = test_db();
        let alice = test_user(&db, "alice");
        let before = note(alice.id);
        let conn = db.conn().unwrap();
        notes::insert_note(&conn, &before).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER reject_history BEFORE INSERT ON note_history
             BEGIN SELECT RAISE(ABORT, 'history unavailable'); END;",
        )
        .unwrap();
        drop(conn);

        let after = before.patched(&NotePatch::description("new"), alice.id, now()).unwrap();
        let result = db.transaction(|tx| save_tracked(tx, &before, &after));
        assert!(matches!(result, Err(NotesError::Storage(_))));

        let conn = db.conn().unwrap();
        assert_eq!(notes::fetch_note(&conn, "n1").unwrap().unwrap(), before);
        assert_eq!(history::count_history(&conn, "n1").unwrap(), 0);
    }

    #[test]
    fn test_save_tracked_missing_note() {
        let (_dir, db) = test_db();
        let alice = test_user(&db, "alice");
        let before = note(alice.id);
        let after = before.patched(&NotePatch::default(), alice.id, now()).unwrap();
        let result = db.transaction(|tx| save_tracked(tx, &before, &after));
        assert!(matches!(result, Err(NotesError::NotFound(_))));
    }
}
