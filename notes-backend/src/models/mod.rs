mod note;
mod user;

pub use note::{
    validate_description, validate_title, ActorFields, AuditFields, HistoryEntry, Note, NotePatch,
};
pub use user::{NewUser, Session, User};

/// Identifier of a registered user (SQLite rowid).
pub type UserId = i64;
