//! Table-level database operations.
//!
//! `users` and `auth_sessions` add `impl Database` blocks; `notes` and
//! `history` expose connection-level functions that compose inside a
//! single transaction.

pub mod auth_sessions;
pub mod history;
pub mod notes;
pub mod users;
