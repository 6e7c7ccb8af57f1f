pub mod sqlite;
pub mod tables;

pub use sqlite::{Database, DbConn};

/// Fresh database in a temporary directory. Keep the `TempDir` alive for
/// as long as the database is used.
#[cfg(test)]
pub fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("notes.db");
    let config = crate::config::Config::for_database(path.to_string_lossy());
    let db = Database::new(&config).expect("Failed to open database");
    (dir, db)
}

/// Register a user with password `password123` for tests.
#[cfg(test)]
pub fn test_user(db: &Database, username: &str) -> crate::models::User {
    db.create_user(&crate::models::NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: "password123".to_string(),
        first_name: String::new(),
        last_name: String::new(),
        is_superuser: false,
        is_staff: false,
    })
    .expect("Failed to create user")
}
