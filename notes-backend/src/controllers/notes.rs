use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::{NotesError, NotesResult};
use crate::identity::Caller;
use crate::models::{NotePatch, UserId};
use crate::AppState;

#[derive(Deserialize)]
struct CreateNoteRequest {
    title: String,
    description: String,
}

/// Only the description is editable over HTTP; a `title` in the body is ignored.
#[derive(Deserialize)]
struct UpdateNoteRequest {
    description: String,
    #[serde(default)]
    version: Option<i64>,
}

#[derive(Deserialize)]
struct ShareNoteRequest {
    #[serde(default)]
    note_id: Option<String>,
    users: Vec<UserId>,
}

async fn list_notes(Caller(actor): Caller, state: web::Data<AppState>) -> NotesResult<HttpResponse> {
    let notes = state.notes.list_notes(actor)?;
    Ok(HttpResponse::Ok().json(notes))
}

async fn create_note(
    Caller(actor): Caller,
    state: web::Data<AppState>,
    body: web::Json<CreateNoteRequest>,
) -> NotesResult<HttpResponse> {
    let note = state.notes.create_note(actor, &body.title, &body.description)?;
    Ok(HttpResponse::Created().json(note))
}

async fn get_note(
    Caller(actor): Caller,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> NotesResult<HttpResponse> {
    let note = state.notes.get_note(&path.into_inner(), actor)?;
    Ok(HttpResponse::Ok().json(note))
}

async fn update_note(
    Caller(actor): Caller,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateNoteRequest>,
) -> NotesResult<HttpResponse> {
    let body = body.into_inner();
    let patch = NotePatch {
        title: None,
        description: Some(body.description),
        expected_version: body.version,
    };
    let note = state.notes.update_note(&path.into_inner(), actor, &patch)?;
    Ok(HttpResponse::Ok().json(note))
}

async fn delete_note(
    Caller(actor): Caller,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> NotesResult<HttpResponse> {
    state.notes.delete_note(&path.into_inner(), actor)?;
    Ok(HttpResponse::NoContent().finish())
}

async fn share_note(
    Caller(actor): Caller,
    state: web::Data<AppState>,
    body: web::Json<ShareNoteRequest>,
) -> NotesResult<HttpResponse> {
    let note_id = body
        .note_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| NotesError::Validation("note_id is required".to_string()))?;

    state.notes.share_note(note_id, actor, &body.users)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Note shared successfully"
    })))
}

async fn version_history(
    Caller(actor): Caller,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> NotesResult<HttpResponse> {
    let entries = state.notes.list_history(&path.into_inner(), actor)?;
    Ok(HttpResponse::Ok().json(entries))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    // Fixed paths first so they never fall through to `/{id}`
    cfg.service(
        web::scope("/notes")
            .route("", web::get().to(list_notes))
            .route("/create", web::post().to(create_note))
            .route("/share", web::post().to(share_note))
            .route("/version-history/{id}", web::get().to(version_history))
            .route("/{id}", web::get().to(get_note))
            .route("/{id}", web::put().to(update_note))
            .route("/{id}", web::delete().to(delete_note)),
    );
}
