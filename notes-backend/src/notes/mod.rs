//! Notes system: owned, shareable notes with a field-level audit trail
//!
//! `NoteStore` is the entry point the HTTP layer calls. Access decisions live
//! in `access`, change recording in `tracker`.

pub mod access;
mod history;
mod sharing;
pub mod store;
pub mod tracker;

pub use store::NoteStore;
