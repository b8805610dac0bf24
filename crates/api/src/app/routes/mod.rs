use axum::{
    routing::{get, post},
    Router,
};

pub mod builds;
pub mod ledger;
pub mod stock;
pub mod system;

/// Router for every ledger endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/snapshot", get(ledger::get_snapshot))
        .route("/replenishment", get(ledger::get_replenishment))
        .route("/models", get(ledger::list_models))
        .route("/models/:model/coverage", get(ledger::get_coverage))
        .route("/builds", post(builds::record_build))
        .nest("/stock", stock::router())
}
