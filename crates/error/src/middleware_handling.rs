use axum::{
    Json,
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::{debug, error};

use crate::ErrorResponse;

/// Replaces bare framework failures with the JSON error envelope used by
/// `AppError`. Covers oversized bodies and any 5xx produced inside it, such as
/// panics turned into responses by a `CatchPanicLayer` placed beneath it.
pub async fn error_handling_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let path = req.uri().path().to_owned();
    let method = req.method().clone();

    let response = next.run(req).await;

    debug!(
        "Request completed: {} {} - Status: {} - Time: {:?}",
        method,
        path,
        response.status(),
        start.elapsed()
    );

    let status = response.status();
    let is_json = response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        return response;
    }

    if status == StatusCode::PAYLOAD_TOO_LARGE {
        error!("Request body too large: {}", status);

        let body = ErrorResponse {
            status: status.to_string(),
            message: "The request body exceeds the maximum allowed size".to_string(),
            code: "PAYLOAD_TOO_LARGE".to_string(),
            details: Some("Please reduce the size of your request and try again".to_string()),
            help: None,
        };
        return (status, Json(body)).into_response();
    }

    if status.is_server_error() {
        error!("Server error occurred: {}", status);

        let body = ErrorResponse {
            status: StatusCode::INTERNAL_SERVER_ERROR.to_string(),
            message: "An internal server error occurred".to_string(),
            code: "SERVER_ERROR".to_string(),
            details: None,
            help: Some(
                "Please try again later or contact support if the issue persists".to_string(),
            ),
        };
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    }

    response
}
