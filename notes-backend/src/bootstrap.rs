//! Seed-data commands: default staff accounts, random users, dummy notes,
//! plus account activation for operators.

use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::defaults;
use crate::db::Database;
use crate::error::{NotesError, NotesResult};
use crate::models::{NewUser, Note, User};
use crate::notes::NoteStore;

/// Staff accounts every dummy note gets shared with.
pub const DEFAULT_USERNAMES: [&str; 2] = ["system", "admin"];

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn dummy_user(username: &str, privileged: bool) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: defaults::BOOTSTRAP_PASSWORD.to_string(),
        first_name: "Dummy".to_string(),
        last_name: "User".to_string(),
        is_superuser: privileged,
        is_staff: privileged,
    }
}

fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn random_letters(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .filter_map(|_| LETTERS.choose(&mut rng).copied().map(char::from))
        .collect()
}

/// Create the `system` and `admin` superuser accounts. Existing ones are left alone.
pub fn create_default_users(db: &Database) -> NotesResult<Vec<User>> {
    let mut created = Vec::new();
    for username in DEFAULT_USERNAMES {
        if db.get_user_by_username(username)?.is_some() {
            log::info!("[BOOTSTRAP] User {} already exists, skipping", username);
            continue;
        }
        let user = db.create_user(&dummy_user(username, true))?;
        log::info!("[BOOTSTRAP] Created superuser {} ({})", user.username, user.id);
        created.push(user);
    }
    Ok(created)
}

/// Create `count` users with random 10-character usernames.
pub fn create_random_users(db: &Database, count: usize) -> NotesResult<Vec<User>> {
    let mut created = Vec::with_capacity(count);
    for _ in 0..count {
        let username = random_alphanumeric(10);
        match db.create_user(&dummy_user(&username, false)) {
            Ok(user) => created.push(user),
            Err(NotesError::Conflict(_)) => {
                log::warn!("[BOOTSTRAP] Username {} collided, skipping", username);
            }
            Err(e) => return Err(e),
        }
    }
    log::info!("[BOOTSTRAP] Created {} random user(s)", created.len());
    Ok(created)
}

/// Enable or disable login for `username`. Disabling also invalidates the
/// account's existing sessions, since validation requires an active user.
pub fn set_user_active(db: &Database, username: &str, active: bool) -> NotesResult<User> {
    let user = db
        .get_user_by_username(username)?
        .ok_or_else(|| NotesError::NotFound(format!("User {} does not exist", username)))?;
    db.set_user_active(user.id, active)?;
    log::info!(
        "[BOOTSTRAP] User {} is now {}",
        username,
        if active { "active" } else { "inactive" }
    );
    Ok(User {
        is_active: active,
        ..user
    })
}

/// Give every regular user one random note, shared with the default accounts.
pub fn create_dummy_notes(store: &NoteStore) -> NotesResult<Vec<Note>> {
    let db = store.database();
    let mut staff = Vec::with_capacity(DEFAULT_USERNAMES.len());
    for username in DEFAULT_USERNAMES {
        let user = db.get_user_by_username(username)?.ok_or_else(|| {
            NotesError::NotFound(format!(
                "User {} does not exist, run create-default-users first",
                username
            ))
        })?;
        staff.push(user.id);
    }

    let mut notes = Vec::new();
    for user in db.list_users()? {
        if DEFAULT_USERNAMES.contains(&user.username.as_str()) {
            continue;
        }
        let note = store.create_note(user.id, &random_letters(10), &random_letters(50))?;
        store.share_note(&note.id, user.id, &staff)?;
        notes.push(store.get_note(&note.id, user.id)?);
    }
    log::info!("[BOOTSTRAP] Created {} dummy note(s)", notes.len());
    Ok(notes)
}
