//! Authentication pages
//!
//! - GET|POST /auth/signup/ - Account creation
//! - GET|POST /auth/login/ - Login, honoring a local `next`
//! - GET|POST /auth/logout/ - Logout
//!
//! All three are reachable anonymously.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{
    extract_session_token, is_safe_next, redirect, session_cookie, ApiError, AppState,
};
use crate::api::responses::{
    FormContext, LoginForm, LoginFormData, LoginPage, MessagePage, SignupFormData, SignupPage,
};
use crate::models::{Credentials, SignupInput};
use crate::services::{FieldError, UserServiceError, ValidationKind};

const INVALID_LOGIN_MESSAGE: &str = "Пожалуйста, введите правильные имя пользователя и пароль. \
Оба поля могут быть чувствительны к регистру.";

/// Build the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup/", get(signup_page).post(signup))
        .route("/auth/login/", get(login_page).post(login))
        .route("/auth/logout/", get(logout).post(logout))
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// GET /auth/signup/
async fn signup_page() -> Json<SignupPage> {
    Json(SignupPage {
        form: FormContext::blank(SignupFormData::default()),
    })
}

/// POST /auth/signup/ - redirects to the login page on success
async fn signup(
    State(state): State<AppState>,
    Form(input): Form<SignupInput>,
) -> Result<Response, ApiError> {
    let username = input.username.clone();
    match state.user_service.signup(input).await {
        Ok(_) => Ok(redirect(&state.auth.login_url)),
        Err(UserServiceError::Validation(errors)) => Ok(Json(SignupPage {
            form: FormContext::invalid(SignupFormData { username }, errors),
        })
        .into_response()),
        Err(e) => {
            tracing::error!(error = %e, "signup failed");
            Err(ApiError::internal_error("Internal server error"))
        }
    }
}

/// GET /auth/login/
async fn login_page(Query(query): Query<NextQuery>) -> Json<LoginPage> {
    Json(LoginPage {
        form: FormContext::blank(LoginFormData::default()),
        next: query.next,
    })
}

/// POST /auth/login/ - sets the session cookie and redirects
async fn login(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let next = form.next.or(query.next).filter(|n| !n.is_empty());
    let credentials = Credentials::new(form.username.clone(), form.password);

    match state.user_service.login(credentials).await {
        Ok(session) => {
            let target = next
                .as_deref()
                .filter(|n| is_safe_next(n))
                .unwrap_or(state.auth.login_redirect_url.as_str());
            let cookie = session_cookie(&session.id, state.session_max_age_secs);
            Ok(([(header::SET_COOKIE, cookie)], redirect(target)).into_response())
        }
        Err(UserServiceError::AuthenticationError(_)) => {
            let error = FieldError::new(
                "__all__",
                ValidationKind::InvalidCredentials,
                INVALID_LOGIN_MESSAGE,
            );
            Ok(Json(LoginPage {
                form: FormContext::invalid(
                    LoginFormData {
                        username: form.username,
                    },
                    vec![error],
                ),
                next,
            })
            .into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "login failed");
            Err(ApiError::internal_error("Internal server error"))
        }
    }
}

/// GET|POST /auth/logout/ - closes the session and clears the cookie
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    if let Some(token) = extract_session_token(&headers) {
        state.user_service.logout(&token).await.map_err(|e| {
            tracing::error!(error = %e, "logout failed");
            ApiError::internal_error("Internal server error")
        })?;
    }

    Ok((
        [(header::SET_COOKIE, session_cookie("", 0))],
        Json(MessagePage::new("Вы вышли из своей учётной записи.")),
    )
        .into_response())
}
