//! Notes pages
//!
//! `/notes/` is public. Everything else needs a login; notes of other users
//! answer 404.

use axum::{
    extract::{Path, State},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};

use crate::api::middleware::{redirect, require_login, ApiError, AppState};
use crate::api::responses::{
    FormContext, MessagePage, NoteDeletePage, NoteDetailPage, NoteFormPage, NoteListPage,
    NotesHomePage,
};
use crate::models::{Identity, NoteInput};
use crate::services::ServiceError;

/// Page shown after any successful write
pub const DONE_URL: &str = "/notes/done/";

/// Build the notes router
pub fn router(state: AppState) -> Router<AppState> {
    let member_routes = Router::new()
        .route("/notes/list/", get(list))
        .route("/notes/add/", get(add_page).post(add))
        .route("/notes/done/", get(done))
        .route("/notes/note/{slug}/", get(detail))
        .route("/notes/edit/{slug}/", get(edit_page).post(edit))
        .route(
            "/notes/delete/{slug}/",
            get(delete_page).post(delete).delete(delete),
        )
        .route_layer(axum_middleware::from_fn_with_state(state, require_login));

    Router::new()
        .route("/notes/", get(home))
        .merge(member_routes)
}

/// GET /notes/
async fn home(identity: Identity) -> Json<NotesHomePage> {
    Json(NotesHomePage {
        authenticated: identity.is_authenticated(),
        username: identity.user().map(|u| u.username.clone()),
    })
}

/// GET /notes/list/
async fn list(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<NoteListPage>, ApiError> {
    let object_list = state.note_service.list(&identity).await?;
    Ok(Json(NoteListPage { object_list }))
}

/// GET /notes/add/
async fn add_page() -> Json<NoteFormPage> {
    Json(NoteFormPage {
        form: FormContext::blank(NoteInput::default()),
        note: None,
    })
}

/// POST /notes/add/
async fn add(
    State(state): State<AppState>,
    identity: Identity,
    Form(input): Form<NoteInput>,
) -> Result<Response, ApiError> {
    match state.note_service.create(&identity, input.clone()).await {
        Ok(_) => Ok(redirect(DONE_URL)),
        Err(ServiceError::Validation(errors)) => Ok(Json(NoteFormPage {
            form: FormContext::invalid(input, errors),
            note: None,
        })
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// GET /notes/done/
async fn done() -> Json<MessagePage> {
    Json(MessagePage::new("Успех!"))
}

/// GET /notes/note/{slug}/
async fn detail(
    State(state): State<AppState>,
    identity: Identity,
    Path(slug): Path<String>,
) -> Result<Json<NoteDetailPage>, ApiError> {
    let note = state.note_service.get_for_action(&slug, &identity).await?;
    Ok(Json(NoteDetailPage { note }))
}

/// GET /notes/edit/{slug}/
async fn edit_page(
    State(state): State<AppState>,
    identity: Identity,
    Path(slug): Path<String>,
) -> Result<Json<NoteFormPage>, ApiError> {
    let note = state.note_service.get_for_action(&slug, &identity).await?;
    let form = FormContext::blank(NoteInput::new(
        note.title.clone(),
        note.text.clone(),
        note.slug.clone(),
    ));
    Ok(Json(NoteFormPage {
        form,
        note: Some(note),
    }))
}

/// POST /notes/edit/{slug}/
async fn edit(
    State(state): State<AppState>,
    identity: Identity,
    Path(slug): Path<String>,
    Form(input): Form<NoteInput>,
) -> Result<Response, ApiError> {
    match state
        .note_service
        .update(&slug, &identity, input.clone())
        .await
    {
        Ok(_) => Ok(redirect(DONE_URL)),
        Err(ServiceError::Validation(errors)) => {
            let note = state.note_service.get_for_action(&slug, &identity).await?;
            Ok(Json(NoteFormPage {
                form: FormContext::invalid(input, errors),
                note: Some(note),
            })
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /notes/delete/{slug}/ - confirmation page
async fn delete_page(
    State(state): State<AppState>,
    identity: Identity,
    Path(slug): Path<String>,
) -> Result<Json<NoteDeletePage>, ApiError> {
    let note = state.note_service.get_for_action(&slug, &identity).await?;
    Ok(Json(NoteDeletePage { note }))
}

/// POST|DELETE /notes/delete/{slug}/
async fn delete(
    State(state): State<AppState>,
    identity: Identity,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    state.note_service.delete(&slug, &identity).await?;
    Ok(redirect(DONE_URL))
}
