use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use rickshaw_infra::LedgerService;

use crate::app::{dto, errors};

pub async fn get_snapshot(
    Extension(service): Extension<Arc<LedgerService>>,
    Query(query): Query<dto::SnapshotQuery>,
) -> axum::response::Response {
    let band = match query.band() {
        Ok(b) => b,
        Err(res) => return res,
    };

    (StatusCode::OK, Json(service.snapshot(band))).into_response()
}

pub async fn get_replenishment(
    Extension(service): Extension<Arc<LedgerService>>,
    Query(query): Query<dto::ReplenishmentQuery>,
) -> axum::response::Response {
    let Some(threshold) = query.threshold else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "threshold query parameter is required",
        );
    };

    match service.replenishment_advisory(threshold) {
        Ok(needs) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "threshold": threshold,
                "needs": needs,
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_models(Extension(service): Extension<Arc<LedgerService>>) -> impl IntoResponse {
    Json(serde_json::json!({ "models": service.models() }))
}

pub async fn get_coverage(
    Extension(service): Extension<Arc<LedgerService>>,
    Path(model): Path<String>,
    Query(query): Query<dto::CoverageQuery>,
) -> axum::response::Response {
    let band = match query.band() {
        Ok(b) => b,
        Err(res) => return res,
    };

    match service.part_coverage(&model, query.variant.as_deref(), band) {
        Ok(coverage) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "model": model,
                "variant": query.variant,
                "coverage": coverage,
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
