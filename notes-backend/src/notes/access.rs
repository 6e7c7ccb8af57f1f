//! Access control for notes.
//!
//! Two policies exist: owner-only and owner-or-shared. Every protected
//! operation names a [`NoteAction`]. Delete is the one action without a
//! named policy; it goes through the explicit [`can_delete`] rule.
//! Evaluation is pure and runs against the note state loaded inside the
//! operation's own transaction.

use crate::error::{NotesError, NotesResult};
use crate::models::{Note, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Only the note's creator.
    OwnerOnly,
    /// The creator or anyone in `accessible_users`.
    OwnerOrShared,
}

impl AccessPolicy {
    pub fn permits(self, actor: UserId, note: &Note) -> bool {
        match self {
            AccessPolicy::OwnerOnly => note.is_owner(actor),
            AccessPolicy::OwnerOrShared => note.is_owner(actor) || note.is_shared_with(actor),
        }
    }
}

/// Operations that need an access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteAction {
    Read,
    Update,
    Delete,
    Share,
    ReadHistory,
}

impl NoteAction {
    /// Named policy guarding this action, `None` for delete.
    pub fn policy(self) -> Option<AccessPolicy> {
        match self {
            NoteAction::Read | NoteAction::Update | NoteAction::ReadHistory => {
                Some(AccessPolicy::OwnerOrShared)
            }
            NoteAction::Share => Some(AccessPolicy::OwnerOnly),
            NoteAction::Delete => None,
        }
    }
}

/// Explicit delete rule: the owner, or a user the note is shared with.
pub fn can_delete(actor: UserId, note: &Note) -> bool {
    note.is_owner(actor) || note.is_shared_with(actor)
}

pub fn is_allowed(actor: UserId, note: &Note, action: NoteAction) -> bool {
    match action.policy() {
        Some(policy) => policy.permits(actor, note),
        None => can_delete(actor, note),
    }
}

/// Like [`is_allowed`], but as a `Forbidden` error for `?` chains.
pub fn authorize(actor: UserId, note: &Note, action: NoteAction) -> NotesResult<()> {
    if is_allowed(actor, note, action) {
        Ok(())
    } else {
        log::debug!(
            "[NOTES] user {} denied {:?} on note {}",
            actor,
            action,
            note.id
        );
        Err(NotesError::forbidden())
    }
}
