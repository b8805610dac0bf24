use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use rickshaw_infra::LedgerService;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/increment", post(increment))
        .route("/decrement", post(decrement))
}

pub async fn increment(
    Extension(service): Extension<Arc<LedgerService>>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let selector = match body.selector() {
        Ok(s) => s,
        Err(res) => return res,
    };

    match service.submit_increment(selector, body.quantity) {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn decrement(
    Extension(service): Extension<Arc<LedgerService>>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let selector = match body.selector() {
        Ok(s) => s,
        Err(res) => return res,
    };

    match service.submit_decrement(selector, body.quantity) {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
