pub mod api;
pub mod redirect;

use crate::{
    models::{ErrorResponse, MappingResponse},
    service::ServiceError,
};
use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    BoxError, Json,
};

/// Translate a service error into its HTTP response.
///
/// A conflict is answered with the mapping that already owns the URL, so the
/// caller still gets the resource.
pub fn error_response(err: ServiceError, base_url: &str) -> Response {
    match err {
        ServiceError::InvalidInput(_) => json_error(StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::NotFound => json_error(StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::Conflict(existing) => (
            StatusCode::CONFLICT,
            Json(MappingResponse::new(*existing, base_url)),
        )
            .into_response(),
        ServiceError::ExhaustedRetries(_) => {
            tracing::error!("Create failed: {}", err);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        ServiceError::StorageFailure(e) => {
            tracing::error!("Storage error: {:?}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Answer errors raised by the middleware stack rather than by a handler.
/// The request deadline is the only one in the stack.
pub async fn middleware_error(method: Method, uri: Uri, err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::error!("{} {} exceeded the request deadline", method, uri);
    } else {
        tracing::error!("{} {} failed in middleware: {}", method, uri, err);
    }
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
