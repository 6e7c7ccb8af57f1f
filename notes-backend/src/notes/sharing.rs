use super::access::{self, NoteAction};
use super::NoteStore;
use crate::db::tables::{notes, users};
use crate::error::{NotesError, NotesResult};
use crate::models::UserId;

impl NoteStore {
    /// Grant share-level access on a note to `user_ids`. Owner only.
    ///
    /// The note and the caller's ownership are checked first, so only the
    /// owner learns whether the given user ids exist. Users that already
    /// have access, and the owner, are skipped. Returns how many users were
    /// newly added.
    pub fn share_note(&self, note_id: &str, actor: UserId, user_ids: &[UserId]) -> NotesResult<usize> {
        let added = self.db.transaction(|tx| {
            let note = notes::fetch_note(tx, note_id)?
                .ok_or_else(|| NotesError::note_not_found(note_id))?;
            access::authorize(actor, &note, NoteAction::Share)?;

            let missing = users::missing_user_ids(tx, user_ids)?;
            if !missing.is_empty() {
                let ids: Vec<String> = missing.iter().map(|id| id.to_string()).collect();
                return Err(NotesError::Validation(format!(
                    "Invalid user id(s): {}",
                    ids.join(", ")
                )));
            }

            let mut targets: Vec<UserId> = user_ids
                .iter()
                .copied()
                .filter(|&id| !note.is_owner(id))
                .collect();
            targets.sort_unstable();
            targets.dedup();

            Ok(notes::add_accessible_users(tx, note_id, &targets)?)
        })?;

        log::info!(
            "[NOTES] user {} shared note {} ({} new user(s))",
            actor,
            note_id,
            added
        );
        Ok(added)
    }
}
