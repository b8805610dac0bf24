use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use rickshaw_infra::LedgerService;

use crate::app::{dto, errors};

pub async fn record_build(
    Extension(service): Extension<Arc<LedgerService>>,
    Json(body): Json<dto::RecordBuildRequest>,
) -> axum::response::Response {
    match service.submit_build(&body.model, body.count, body.variant) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
