//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error body
//! - Identity resolution (session token to `Identity`)
//! - The login gate that redirects anonymous callers

use axum::{
    extract::{FromRequestParts, Path, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::{AuthConfig, Config};
use crate::db::repositories::{
    SqlxCommentRepository, SqlxNewsRepository, SqlxNoteRepository, SqlxSessionRepository,
    SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::Identity;
use crate::services::{
    CommentService, ContentPolicy, NewsService, NoteService, ServiceError, UserService,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub news_service: Arc<NewsService>,
    pub comment_service: Arc<CommentService>,
    pub note_service: Arc<NoteService>,
    pub auth: Arc<AuthConfig>,
    /// Lifetime of the session cookie
    pub session_max_age_secs: i64,
}

impl AppState {
    /// Wire repositories and services over one pool
    pub fn from_config(pool: DynDatabasePool, config: &Config) -> Self {
        let policy = Arc::new(ContentPolicy::new(&config.moderation, &config.notes));
        let news_repo = SqlxNewsRepository::boxed(pool.clone());
        let comment_repo = SqlxCommentRepository::boxed(pool.clone());

        Self {
            user_service: Arc::new(UserService::with_session_expiration(
                SqlxUserRepository::boxed(pool.clone()),
                SqlxSessionRepository::boxed(pool.clone()),
                config.session.expiration_days,
            )),
            news_service: Arc::new(NewsService::new(
                news_repo.clone(),
                comment_repo.clone(),
                config.news.home_page_size,
            )),
            comment_service: Arc::new(CommentService::new(
                comment_repo,
                news_repo,
                policy.clone(),
            )),
            note_service: Arc::new(NoteService::new(SqlxNoteRepository::boxed(pool), policy)),
            auth: Arc::new(config.auth.clone()),
            session_max_age_secs: config.session.expiration_days * 24 * 60 * 60,
        }
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn not_found() -> Self {
        Self::new("NOT_FOUND", "Not found")
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound => ApiError::not_found(),
            ServiceError::Unauthenticated => ApiError::new("UNAUTHORIZED", "Authentication required"),
            ServiceError::Validation(_) => ApiError::validation_error(err.to_string()),
            ServiceError::InternalError(e) => {
                tracing::error!(error = ?e, "request failed");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

/// Session token from `Authorization: Bearer` or the `session` cookie.
/// The bearer header wins when both are present.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| cookie.trim().strip_prefix("session=").map(str::to_string))
        .filter(|token| !token.is_empty())
}

/// Resolve the caller and store their `Identity` in the request extensions.
///
/// Lookup failures are logged and treated as anonymous.
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_session_token(request.headers());
    let identity = match state.user_service.current_identity(token.as_deref()).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::error!(error = %e, "session lookup failed");
            Identity::Anonymous
        }
    };
    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Let authenticated callers through; send everyone else to the login page
/// with the current path in `next`.
pub async fn require_login(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let authenticated = request
        .extensions()
        .get::<Identity>()
        .is_some_and(Identity::is_authenticated);
    if authenticated {
        return next.run(request).await;
    }

    let original = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    tracing::debug!(path = original, "anonymous request redirected to login");
    login_redirect(&state.auth.login_url, original)
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Identity>().cloned().unwrap_or_default())
    }
}

/// Numeric id from the route path. A segment that is not an `i64` answers
/// the same 404 as a missing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for EntityId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::not_found())?;
        raw.parse::<i64>()
            .map(EntityId)
            .map_err(|_| ApiError::not_found())
    }
}

/// `302 Found` to `location`
pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// `302 Found` to `login_url?next=<next>`
pub fn login_redirect(login_url: &str, next: &str) -> Response {
    redirect(&login_url_with_next(login_url, next))
}

/// Login URL carrying `next`, percent-encoded except for `/`
pub fn login_url_with_next(login_url: &str, next: &str) -> String {
    let encoded = urlencoding::encode(next).replace("%2F", "/");
    format!("{}?next={}", login_url, encoded)
}

/// Whether `next` stays on this site
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}

/// `Set-Cookie` value carrying a session token
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token, max_age_secs
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};

    fn headers_of(request: Request<Body>) -> HeaderMap {
        request.headers().clone()
    }

    #[test]
    fn test_extract_session_token_from_bearer() {
        let request = Request::builder()
            .header(header::AUTHORIZATION, "Bearer test-token-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            extract_session_token(&headers_of(request)),
            Some("test-token-123".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_from_cookie() {
        let request = Request::builder()
            .header(header::COOKIE, "theme=dark; session=test-token-456")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            extract_session_token(&headers_of(request)),
            Some("test-token-456".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_bearer_priority() {
        let request = Request::builder()
            .header(header::AUTHORIZATION, "Bearer bearer-token")
            .header(header::COOKIE, "session=cookie-token")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            extract_session_token(&headers_of(request)),
            Some("bearer-token".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_none() {
        let request = Request::builder()
            .header(header::AUTHORIZATION, "Basic invalid")
            .header(header::COOKIE, "session=")
            .body(Body::empty())
            .unwrap();
        assert!(extract_session_token(&headers_of(request)).is_none());
    }

    #[test]
    fn test_login_url_keeps_slashes() {
        assert_eq!(
            login_url_with_next("/auth/login/", "/news/edit_comment/1/"),
            "/auth/login/?next=/news/edit_comment/1/"
        );
        assert_eq!(
            login_url_with_next("/auth/login/", "/news/?page=2"),
            "/auth/login/?next=/news/%3Fpage%3D2"
        );
    }

    #[test]
    fn test_safe_next() {
        assert!(is_safe_next("/notes/add/"));
        assert!(!is_safe_next("//evil.example/"));
        assert!(!is_safe_next("https://evil.example/"));
        assert!(!is_safe_next("/\\evil"));
    }

    #[test]
    fn test_not_found_body() {
        let body = serde_json::to_value(ApiError::not_found()).unwrap();
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "Not found");
    }

    #[test]
    fn test_service_error_mapping() {
        let status = |e: ServiceError| ApiError::from(e).into_response().status();
        assert_eq!(status(ServiceError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status(ServiceError::InternalError(anyhow::anyhow!("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
