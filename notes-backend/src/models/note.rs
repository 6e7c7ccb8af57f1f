use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NotesError, NotesResult};
use crate::notes::tracker::TrackedField;

use super::UserId;

/// Maximum title length, in characters.
pub const TITLE_MAX_CHARS: usize = 255;

/// Creation / last-write timestamps carried by every audited record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuditFields {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`; `created_at` never moves.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// Who created a record and who last wrote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorFields {
    pub created_by: UserId,
    pub updated_by: UserId,
}

impl ActorFields {
    pub fn new(actor: UserId) -> Self {
        Self {
            created_by: actor,
            updated_by: actor,
        }
    }

    /// Record `actor` as the last writer; `created_by` never moves.
    pub fn stamp(&mut self, actor: UserId) {
        self.updated_by = actor;
    }
}

/// A text note owned by `actors.created_by` and optionally shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(flatten)]
    pub actors: ActorFields,
    #[serde(flatten)]
    pub audit: AuditFields,
    /// Users with share-level access, ascending. Never contains the owner.
    pub accessible_users: Vec<UserId>,
    pub version: i64,
}

impl Note {
    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.actors.created_by == user_id
    }

    pub fn is_shared_with(&self, user_id: UserId) -> bool {
        self.accessible_users.binary_search(&user_id).is_ok()
    }

    /// Current text of a tracked field.
    pub fn field_value(&self, field: TrackedField) -> &str {
        match field {
            TrackedField::Title => &self.title,
            TrackedField::Description => &self.description,
        }
    }

    /// Apply a patch to a copy of this note, stamping the actor and time.
    /// The version is bumped; validation happens before anything changes.
    pub fn patched(&self, patch: &NotePatch, actor: UserId, now: DateTime<Utc>) -> NotesResult<Note> {
        let mut next = self.clone();
        if let Some(title) = &patch.title {
            validate_title(title)?;
            next.title = title.clone();
        }
        if let Some(description) = &patch.description {
            validate_description(description)?;
            next.description = description.clone();
        }
        next.actors.stamp(actor);
        next.audit.touch(now);
        next.version += 1;
        Ok(next)
    }
}

/// Fields a caller may change on an existing note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    /// When set, the update only applies if the stored version matches.
    pub expected_version: Option<i64>,
}

impl NotePatch {
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }
}

pub fn validate_title(title: &str) -> NotesResult<()> {
    if title.trim().is_empty() {
        return Err(NotesError::Validation("title may not be blank".to_string()));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(NotesError::Validation(format!(
            "title may not exceed {} characters",
            TITLE_MAX_CHARS
        )));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> NotesResult<()> {
    if description.trim().is_empty() {
        return Err(NotesError::Validation("description may not be blank".to_string()));
    }
    Ok(())
}

/// One immutable field-level change to a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    #[serde(rename = "note")]
    pub note_id: String,
    pub updated_by: UserId,
    pub field: TrackedField,
    pub old_value: String,
    pub new_value: String,
    pub activity: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_note() -> Note {
        let now = Utc::now();
        Note {
            id: "n1".to_string(),
            title: "Test Note".to_string(),
            description: "desc".to_string(),
            actors: ActorFields::new(1),
            audit: AuditFields::new(now),
            accessible_users: vec![2, 5],
            version: 1,
        }
    }

    #[test]
    fn test_patched_keeps_creator_and_created_at() {
        let note = sample_note();
        let later = note.audit.created_at + chrono::Duration::seconds(5);
        let next = note.patched(&NotePatch::description("new"), 2, later).unwrap();

        assert_eq!(next.description, "new");
        assert_eq!(next.title, "Test Note");
        assert_eq!(next.actors.created_by, 1);
        assert_eq!(next.actors.updated_by, 2);
        assert_eq!(next.audit.created_at, note.audit.created_at);
        assert_eq!(next.audit.updated_at, later);
        assert_eq!(next.version, 2);
    }

    #[test]
    fn test_patched_rejects_blank_fields() {
        let note = sample_note();
        let err = note.patched(&NotePatch::description("   "), 1, Utc::now()).unwrap_err();
        assert!(matches!(err, NotesError::Validation(_)));

        let patch = NotePatch {
            title: Some(String::new()),
            ..NotePatch::default()
        };
        assert!(note.patched(&patch, 1, Utc::now()).is_err());
    }

    #[test]
    fn test_title_length_limit() {
        assert!(validate_title(&"a".repeat(TITLE_MAX_CHARS)).is_ok());
        assert!(validate_title(&"a".repeat(TITLE_MAX_CHARS + 1)).is_err());
    }

    #[test]
    fn test_share_membership() {
        let note = sample_note();
        assert!(note.is_owner(1));
        assert!(!note.is_shared_with(1));
        assert!(note.is_shared_with(5));
        assert!(!note.is_shared_with(3));
    }

    #[test]
    fn test_serializes_flat_actor_and_audit_fields() {
        let json = serde_json::to_value(sample_note()).unwrap();
        assert_eq!(json["created_by"], 1);
        assert_eq!(json["updated_by"], 1);
        assert!(json.get("created_at").is_some());
        assert!(json.get("actors").is_none());
    }
}
