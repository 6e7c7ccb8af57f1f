//! NoteStore: access-controlled note operations
//!
//! Wraps the shared `Database` and layers the access evaluator and the change
//! tracker over the raw row functions in `db::tables`. Every mutating call
//! loads, authorizes, writes and audits inside one transaction.

use std::sync::Arc;

use uuid::Uuid;

use super::access::{self, NoteAction};
use super::tracker;
use crate::db::sqlite::now;
use crate::db::tables::notes;
use crate::db::Database;
use crate::error::{NotesError, NotesResult};
use crate::models::{
    validate_description, validate_title, ActorFields, AuditFields, Note, NotePatch, UserId,
};

#[derive(Clone)]
pub struct NoteStore {
    pub(super) db: Arc<Database>,
}

impl NoteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Create a note owned by `actor`. Creation is not recorded in history.
    pub fn create_note(&self, actor: UserId, title: &str, description: &str) -> NotesResult<Note> {
        validate_title(title)?;
        validate_description(description)?;

        let note = Note {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: description.to_string(),
            actors: ActorFields::new(actor),
            audit: AuditFields::new(now()),
            accessible_users: Vec::new(),
            version: 1,
        };

        let conn = self.db.conn()?;
        notes::insert_note(&conn, &note)?;

        log::info!("[NOTES] user {} created note {}", actor, note.id);
        Ok(note)
    }

    pub fn get_note(&self, note_id: &str, actor: UserId) -> NotesResult<Note> {
        let conn = self.db.conn()?;
        let note = notes::fetch_note(&conn, note_id)?
            .ok_or_else(|| NotesError::note_not_found(note_id))?;
        access::authorize(actor, &note, NoteAction::Read)?;
        Ok(note)
    }

    /// Notes `actor` owns or that have been shared with them.
    pub fn list_notes(&self, actor: UserId) -> NotesResult<Vec<Note>> {
        let conn = self.db.conn()?;
        Ok(notes::list_notes_for_user(&conn, actor)?)
    }

    /// Apply `patch` as `actor`. Each changed tracked field gets one history
    /// entry, committed together with the note or not at all.
    pub fn update_note(&self, note_id: &str, actor: UserId, patch: &NotePatch) -> NotesResult<Note> {
        let updated = self.db.transaction(|tx| {
            let current = notes::fetch_note(tx, note_id)?
                .ok_or_else(|| NotesError::note_not_found(note_id))?;
            access::authorize(actor, &current, NoteAction::Update)?;

            if let Some(expected) = patch.expected_version {
                if expected != current.version {
                    return Err(NotesError::Conflict(format!(
                        "Note {} is at version {}, not {}",
                        note_id, current.version, expected
                    )));
                }
            }

            let next = current.patched(patch, actor, now())?;
            tracker::save_tracked(tx, &current, &next)?;
            Ok(next)
        })?;

        log::info!(
            "[NOTES] user {} updated note {} (version {})",
            actor,
            note_id,
            updated.version
        );
        Ok(updated)
    }

    /// Delete a note. History and share rows are removed with it.
    pub fn delete_note(&self, note_id: &str, actor: UserId) -> NotesResult<()> {
        self.db.transaction(|tx| {
            let note = notes::fetch_note(tx, note_id)?
                .ok_or_else(|| NotesError::note_not_found(note_id))?;
            access::authorize(actor, &note, NoteAction::Delete)?;

            if !notes::delete_note(tx, note_id)? {
                return Err(NotesError::note_not_found(note_id));
            }
            Ok(())
        })?;

        log::info!("[NOTES] user {} deleted note {}", actor, note_id);
        Ok(())
    }
}
