//! Error taxonomy shared by the store, the access evaluator and the HTTP layer.
//!
//! Every variant maps to one HTTP status and one stable `code` string; the
//! JSON body is always `{"error": ..., "code": ...}`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum NotesError {
    /// Malformed or empty required field.
    #[error("{0}")]
    Validation(String),
    /// Referenced entity absent.
    #[error("{0}")]
    NotFound(String),
    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),
    /// No valid identity on the request.
    #[error("{0}")]
    Unauthenticated(String),
    /// Duplicate unique field or stale version.
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

pub type NotesResult<T> = Result<T, NotesError>;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl NotesError {
    pub fn note_not_found(note_id: &str) -> Self {
        NotesError::NotFound(format!("Note {} does not exist", note_id))
    }

    pub fn forbidden() -> Self {
        NotesError::Forbidden("You do not have the permission to perform this action.".to_string())
    }

    /// Machine-readable kind, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            NotesError::Validation(_) => "validation_error",
            NotesError::NotFound(_) => "not_found",
            NotesError::Forbidden(_) => "forbidden",
            NotesError::Unauthenticated(_) => "unauthenticated",
            NotesError::Conflict(_) => "conflict",
            NotesError::Storage(_) | NotesError::Pool(_) | NotesError::PasswordHash(_) => {
                "storage_error"
            }
        }
    }

    pub fn is_storage(&self) -> bool {
        self.code() == "storage_error"
    }
}

impl ResponseError for NotesError {
    fn status_code(&self) -> StatusCode {
        match self {
            NotesError::Validation(_) => StatusCode::BAD_REQUEST,
            NotesError::NotFound(_) => StatusCode::NOT_FOUND,
            NotesError::Forbidden(_) => StatusCode::FORBIDDEN,
            NotesError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            NotesError::Conflict(_) => StatusCode::CONFLICT,
            NotesError::Storage(_) | NotesError::Pool(_) | NotesError::PasswordHash(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Internal details stay in the log, not in the response.
        let message = if self.is_storage() {
            log::error!("[NOTES] {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: message,
            code: self.code(),
        })
    }
}

/// True when a SQLite error is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(NotesError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(NotesError::note_not_found("abc").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(NotesError::forbidden().status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            NotesError::Unauthenticated("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(NotesError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            NotesError::Storage(rusqlite::Error::QueryReturnedNoRows).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(NotesError::Validation("x".into()).code(), "validation_error");
        assert_eq!(NotesError::forbidden().code(), "forbidden");
        assert_eq!(NotesError::PasswordHash("x".into()).code(), "storage_error");
        assert!(NotesError::Storage(rusqlite::Error::InvalidQuery).is_storage());
        assert!(!NotesError::Conflict("x".into()).is_storage());
    }

    #[test]
    fn test_unique_violation_detection() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err = conn.execute("INSERT INTO t VALUES ('a')", []).unwrap_err();
        assert!(is_unique_violation(&err));
        assert!(!is_unique_violation(&rusqlite::Error::QueryReturnedNoRows));
    }
}
