//! URL shortener: turns long URLs into 6-character codes, redirects codes back
//! to their destination and counts accesses.

pub mod config;
pub mod generator;
pub mod handlers;
pub mod models;
pub mod recorder;
pub mod service;
pub mod storage;
pub mod validate;

use axum::{
    error_handling::HandleErrorLayer,
    http::{header, Method, StatusCode},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use config::AppConfig;
use service::MappingService;

// ── Shared application state ───────────────────────────────────────────────

pub struct AppState {
    pub service: MappingService,
    pub config: AppConfig,
}

// ── Router ─────────────────────────────────────────────────────────────────

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    let request_timeout = state.config.request_timeout;

    Router::new()
        // Liveness probe, no store access
        .route("/health", get(|| async { StatusCode::OK }))
        .route("/shorten", post(handlers::api::create))
        .route(
            "/shorten/:code",
            get(handlers::api::get)
                .put(handlers::api::update)
                .delete(handlers::api::delete),
        )
        .route("/shorten/:code/stats", get(handlers::api::stats))
        // Short-link redirect
        .route("/s/:code", get(handlers::redirect::redirect))
        .with_state(state)
        // An elapsed deadline drops the handler future and answers a JSON 500
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handlers::middleware_error))
                .timeout(request_timeout),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
