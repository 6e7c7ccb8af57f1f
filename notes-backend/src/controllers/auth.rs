use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NotesError, NotesResult};
use crate::identity;
use crate::models::{NewUser, Session};
use crate::AppState;

#[derive(Deserialize)]
struct TokenRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshRequest {
    token: String,
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

impl From<Session> for TokenResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            expires_at: session.expires_at,
        }
    }
}

fn invalid_session() -> NotesError {
    NotesError::Unauthenticated("Invalid or expired session".to_string())
}

async fn signup(state: web::Data<AppState>, body: web::Json<NewUser>) -> NotesResult<HttpResponse> {
    let mut new_user = body.into_inner();
    // Staff and superuser accounts only come from the bootstrap commands
    new_user.is_staff = false;
    new_user.is_superuser = false;

    let user = state.db.create_user(&new_user)?;
    log::info!("[AUTH] Registered user {} ({})", user.username, user.id);
    Ok(HttpResponse::Created().json(user))
}

async fn obtain_token(
    state: web::Data<AppState>,
    body: web::Json<TokenRequest>,
) -> NotesResult<HttpResponse> {
    let user = state.db.verify_credentials(&body.username, &body.password)?;
    let session = state.db.create_session(user.id, state.config.session_ttl_hours)?;
    log::info!("[AUTH] User {} logged in", user.id);
    Ok(HttpResponse::Ok().json(TokenResponse::from(session)))
}

async fn refresh_token(
    state: web::Data<AppState>,
    body: web::Json<RefreshRequest>,
) -> NotesResult<HttpResponse> {
    let session = state
        .db
        .validate_session(&body.token, state.config.session_ttl_hours)?
        .ok_or_else(invalid_session)?;
    Ok(HttpResponse::Ok().json(TokenResponse::from(session)))
}

async fn logout(state: web::Data<AppState>, req: HttpRequest) -> NotesResult<HttpResponse> {
    let token = identity::bearer_token(&req).ok_or_else(invalid_session)?;
    if !state.db.delete_session(token)? {
        return Err(invalid_session());
    }
    Ok(HttpResponse::NoContent().finish())
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/signup").route(web::post().to(signup)));
    cfg.service(
        web::resource("/api/token")
            .route(web::post().to(obtain_token))
            .route(web::delete().to(logout)),
    );
    cfg.service(web::resource("/api/token/refresh").route(web::post().to(refresh_token)));
}
