//! News pages
//!
//! Public:
//! - GET /news/ - Feed, newest first
//! - GET /news/{id}/ - Item with comments; the comment form for logged-in users
//! - POST /news/{id}/ - Post a comment (anonymous callers go to login)
//!
//! Author only (anonymous callers go to login, others get 404):
//! - GET|POST /news/edit_comment/{id}/
//! - GET|POST|DELETE /news/delete_comment/{id}/

use axum::{
    extract::{Query, State},
    http::Uri,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{
    login_redirect, redirect, require_login, ApiError, AppState, EntityId,
};
use crate::api::responses::{
    CommentDeletePage, CommentEditPage, FormContext, NewsDetailPage, NewsListPage,
};
use crate::models::{CommentInput, Identity};
use crate::services::ServiceError;

/// Build the news router
pub fn router(state: AppState) -> Router<AppState> {
    let author_routes = Router::new()
        .route(
            "/news/edit_comment/{id}/",
            get(edit_comment_page).post(edit_comment),
        )
        .route(
            "/news/delete_comment/{id}/",
            get(delete_comment_page)
                .post(delete_comment)
                .delete(delete_comment),
        )
        .route_layer(axum_middleware::from_fn_with_state(state, require_login));

    Router::new()
        .route("/news/", get(home))
        .route("/news/{id}/", get(detail).post(create_comment))
        .merge(author_routes)
}

/// Where a comment lands after a successful write
fn comments_anchor(news_id: i64) -> String {
    format!("/news/{}/#comments", news_id)
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// GET /news/
async fn home(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<NewsListPage>, ApiError> {
    let result = state.news_service.list(query.page.unwrap_or(1)).await?;
    Ok(Json(result.into()))
}

/// GET /news/{id}/
async fn detail(
    State(state): State<AppState>,
    identity: Identity,
    EntityId(id): EntityId,
) -> Result<Json<NewsDetailPage>, ApiError> {
    let detail = state.news_service.detail(id).await?;
    let form = identity
        .is_authenticated()
        .then(|| FormContext::blank(CommentInput::default()));

    Ok(Json(NewsDetailPage {
        news: detail.news,
        comments: detail.comments,
        form,
    }))
}

/// POST /news/{id}/
async fn create_comment(
    State(state): State<AppState>,
    identity: Identity,
    uri: Uri,
    EntityId(id): EntityId,
    Form(input): Form<CommentInput>,
) -> Result<Response, ApiError> {
    match state
        .comment_service
        .create(&identity, id, input.clone())
        .await
    {
        Ok(comment) => Ok(redirect(&comments_anchor(comment.news_id))),
        Err(ServiceError::Unauthenticated) => {
            let next = uri.path_and_query().map_or(uri.path(), |pq| pq.as_str());
            Ok(login_redirect(&state.auth.login_url, next))
        }
        Err(ServiceError::Validation(errors)) => {
            let detail = state.news_service.detail(id).await?;
            Ok(Json(NewsDetailPage {
                news: detail.news,
                comments: detail.comments,
                form: Some(FormContext::invalid(input, errors)),
            })
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /news/edit_comment/{id}/
async fn edit_comment_page(
    State(state): State<AppState>,
    identity: Identity,
    EntityId(id): EntityId,
) -> Result<Json<CommentEditPage>, ApiError> {
    let comment = state.comment_service.get_for_action(id, &identity).await?;
    let form = FormContext::blank(CommentInput::new(comment.text.clone()));
    Ok(Json(CommentEditPage { comment, form }))
}

/// POST /news/edit_comment/{id}/
async fn edit_comment(
    State(state): State<AppState>,
    identity: Identity,
    EntityId(id): EntityId,
    Form(input): Form<CommentInput>,
) -> Result<Response, ApiError> {
    match state
        .comment_service
        .update(id, &identity, input.clone())
        .await
    {
        Ok(comment) => Ok(redirect(&comments_anchor(comment.news_id))),
        Err(ServiceError::Validation(errors)) => {
            let comment = state.comment_service.get_for_action(id, &identity).await?;
            Ok(Json(CommentEditPage {
                comment,
                form: FormContext::invalid(input, errors),
            })
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /news/delete_comment/{id}/ - confirmation page
async fn delete_comment_page(
    State(state): State<AppState>,
    identity: Identity,
    EntityId(id): EntityId,
) -> Result<Json<CommentDeletePage>, ApiError> {
    let comment = state.comment_service.get_for_action(id, &identity).await?;
    Ok(Json(CommentDeletePage { comment }))
}

/// POST|DELETE /news/delete_comment/{id}/
async fn delete_comment(
    State(state): State<AppState>,
    identity: Identity,
    EntityId(id): EntityId,
) -> Result<Response, ApiError> {
    let comment = state.comment_service.delete(id, &identity).await?;
    Ok(redirect(&comments_anchor(comment.news_id)))
}
