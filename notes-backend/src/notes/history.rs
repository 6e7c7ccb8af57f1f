use super::access::{self, NoteAction};
use super::NoteStore;
use crate::db::tables::{history, notes};
use crate::error::{NotesError, NotesResult};
use crate::models::{HistoryEntry, UserId};

impl NoteStore {
    /// Audit trail of a note, oldest first.
    pub fn list_history(&self, note_id: &str, actor: UserId) -> NotesResult<Vec<HistoryEntry>> {
        let conn = self.db.conn()?;
        let note = notes::fetch_note(&conn, note_id)?
            .ok_or_else(|| NotesError::note_not_found(note_id))?;
        access::authorize(actor, &note, NoteAction::ReadHistory)?;
        Ok(history::list_history(&conn, note_id)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_user;
    use crate::error::NotesError;
    use crate::models::NotePatch;
    use crate::notes::store::tests::{share_with, test_store};
    use crate::notes::tracker::TrackedField;

    #[test]
    fn test_history_starts_empty() {
        let (_dir, store) = test_store();
        let alice = test_user(store.database(), "alice");
        let note = store.create_note(alice.id, "Test Note", "desc").unwrap();
        assert!(store.list_history(&note.id, alice.id).unwrap().is_empty());
    }

    #[test]
    fn test_history_in_insertion_order() {
        let (_dir, store) = test_store();
        let alice = test_user(store.database(), "alice");
        let bob = test_user(store.database(), "bob");
        let note = store.create_note(alice.id, "Test Note", "one").unwrap();
        share_with(&store, &note, &bob);

        store.update_note(&note.id, alice.id, &NotePatch::description("two")).unwrap();
        store.update_note(&note.id, bob.id, &NotePatch::description("three")).unwrap();
        let patch = NotePatch {
            title: Some("Renamed".to_string()),
            description: Some("four".to_string()),
            expected_version: None,
        };
        store.update_note(&note.id, alice.id, &patch).unwrap();

        let entries = store.list_history(&note.id, bob.id).unwrap();
        let values: Vec<(TrackedField, &str, &str)> = entries
            .iter()
            .map(|e| (e.field, e.old_value.as_str(), e.new_value.as_str()))
            .collect();
        assert_eq!(
            values,
            vec![
                (TrackedField::Description, "one", "two"),
                (TrackedField::Description, "two", "three"),
                (TrackedField::Title, "Test Note", "Renamed"),
                (TrackedField::Description, "three", "four"),
            ]
        );
        assert!(entries.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(entries[1].updated_by, bob.id);
        assert!(entries.iter().all(|e| e.note_id == note.id));
    }

    #[test]
    fn test_history_access() {
        let (_dir, store) = test_store();
        let alice = test_user(store.database(), "alice");
        let mallory = test_user(store.database(), "mallory");
        let note = store.create_note(alice.id, "Test Note", "desc").unwrap();

        assert!(matches!(
            store.list_history(&note.id, mallory.id),
            Err(NotesError::Forbidden(_))
        ));
        assert!(matches!(
            store.list_history("missing", alice.id),
            Err(NotesError::NotFound(_))
        ));
    }
}
