//! API layer - HTTP handlers and routing
//!
//! Every page answers a JSON page context. It includes:
//! - Auth pages (signup, login, logout)
//! - News feed, news detail and comment editing
//! - The private notebook

pub mod auth;
pub mod middleware;
pub mod news;
pub mod notes;
pub mod responses;


use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState};

/// Build the page routes
pub fn build_page_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(news::router(state.clone()))
        .merge(notes::router(state))
        .fallback(not_found)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Ok(build_page_router(state.clone())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    middleware::resolve_identity,
                )),
        )
        .with_state(state))
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}
