//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod account;
pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - JSON API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    let api = Router::new()
        .route("/health", get(http::http_health))
        // Content
        .route("/languages", get(http::http_languages))
        .route("/languages/:language/levels", get(http::http_levels))
        .route("/courses", get(http::http_courses))
        .route("/courses/:language/:level", get(http::http_course_detail))
        .route("/lessons/:id", get(http::http_lesson_detail))
        .route("/lessons/:id/vocabulary", get(http::http_lesson_vocabulary))
        .route("/lessons/:id/quiz", get(http::http_get_quiz).post(http::http_post_quiz))
        .route("/vocabulary/search", get(http::http_search))
        // Accounts
        .route("/auth/register", post(account::http_register))
        .route("/auth/login", post(account::http_login))
        .route("/progress", get(account::http_get_progress).post(account::http_post_progress))
        .route("/dashboard", get(account::http_dashboard))
        // Assistant
        .route("/ai/explain", post(http::http_post_explain))
        .route("/ai/chat", post(http::http_post_chat));

    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .nest("/api/v1", api)
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
