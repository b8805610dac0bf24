use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use rickshaw_core::DomainError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InsufficientStock(shortfalls) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": format!("insufficient stock: {shortfalls}"),
                "shortfalls": shortfalls,
            })),
        )
            .into_response(),
        DomainError::Configuration(msg) => {
            tracing::error!(error = %msg, "configuration error surfaced to a request");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", msg)
        }
        DomainError::Io(msg) => json_error(StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
