use super::{error_response, json_error};
use crate::{
    models::{MappingResponse, UrlRequest},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// POST /shorten
pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UrlRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => return invalid_json(e),
    };

    match state.service.create(&req.url).await {
        Ok(mapping) => (
            StatusCode::CREATED,
            Json(MappingResponse::new(mapping, &state.config.base_url)),
        )
            .into_response(),
        Err(e) => error_response(e, &state.config.base_url),
    }
}

/// GET /shorten/:code
pub async fn get(State(state): State<Arc<AppState>>, Path(code): Path<String>) -> Response {
    match state.service.get(&code).await {
        Ok(mapping) => Json(MappingResponse::new(mapping, &state.config.base_url)).into_response(),
        Err(e) => error_response(e, &state.config.base_url),
    }
}

/// PUT /shorten/:code
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    payload: Result<Json<UrlRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => return invalid_json(e),
    };

    match state.service.update(&code, &req.url).await {
        Ok(mapping) => Json(MappingResponse::new(mapping, &state.config.base_url)).into_response(),
        Err(e) => error_response(e, &state.config.base_url),
    }
}

/// DELETE /shorten/:code
pub async fn delete(State(state): State<Arc<AppState>>, Path(code): Path<String>) -> Response {
    match state.service.delete(&code).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e, &state.config.base_url),
    }
}

/// GET /shorten/:code/stats
pub async fn stats(State(state): State<Arc<AppState>>, Path(code): Path<String>) -> Response {
    match state.service.stats(&code).await {
        Ok(mapping) => Json(MappingResponse::new(mapping, &state.config.base_url)).into_response(),
        Err(e) => error_response(e, &state.config.base_url),
    }
}

fn invalid_json(rejection: JsonRejection) -> Response {
    tracing::debug!("Rejected request body: {}", rejection.body_text());
    json_error(StatusCode::BAD_REQUEST, "Invalid JSON payload")
}
