use super::error_response;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

/// GET /s/:code
///
/// 1. Resolve the short code through the service (one store lookup).
/// 2. The service queues the access-count increment for the background
///    recorder, so the redirect is not blocked by the write.
/// 3. Return a 307 redirect to the original URL.
pub async fn redirect(State(state): State<Arc<AppState>>, Path(code): Path<String>) -> Response {
    match state.service.redirect(&code).await {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(e) => error_response(e, &state.config.base_url),
    }
}
