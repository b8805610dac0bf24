//! HTTP application wiring (Axum router + service wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and their mapping onto ledger operations
//! - `errors.rs`: consistent error responses
//! - `middleware.rs`: request logging

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use rickshaw_infra::LedgerService;

pub mod dto;
pub mod errors;
pub mod middleware;
pub mod routes;

/// Build the full HTTP router around a ledger service.
pub fn build_app(service: Arc<LedgerService>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::log_requests))
                .layer(Extension(service)),
        )
}
