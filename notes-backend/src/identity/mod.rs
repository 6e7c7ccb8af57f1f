//! Request identity: bearer session tokens resolved to a user id.

pub mod password;

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};

use crate::db::Database;
use crate::error::{NotesError, NotesResult};
use crate::models::UserId;
use crate::AppState;

/// The authenticated user of a request.
///
/// List it before any body extractor: arguments are extracted in order, so
/// a request without a valid session is rejected with 401 before its body
/// is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub UserId);

impl FromRequest for Caller {
    type Error = NotesError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<AppState>>() {
            Some(state) => authenticate(&state.db, req, state.config.session_ttl_hours).map(Caller),
            None => {
                log::error!("[AUTH] AppState missing from app data");
                Err(NotesError::Unauthenticated(
                    "Authentication is not available".to_string(),
                ))
            }
        };
        ready(result)
    }
}

/// Token from an `Authorization: Bearer <token>` header, if present.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the caller of `req`. A valid session has its expiry pushed out.
pub fn authenticate(db: &Database, req: &HttpRequest, ttl_hours: i64) -> NotesResult<UserId> {
    let token = bearer_token(req).ok_or_else(|| {
        NotesError::Unauthenticated("Authentication credentials were not provided.".to_string())
    })?;

    match db.validate_session(token, ttl_hours)? {
        Some(session) => Ok(session.user_id),
        None => Err(NotesError::Unauthenticated(
            "Invalid or expired session".to_string(),
        )),
    }
}
