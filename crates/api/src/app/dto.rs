use axum::http::StatusCode;
use serde::Deserialize;

use rickshaw_inventory::{PartSelector, StockBand};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RecordBuildRequest {
    pub model: String,
    pub count: i64,
    #[serde(default)]
    pub variant: Option<String>,
}

/// Body of `/stock/increment` and `/stock/decrement`.
///
/// Either `all: true` (the "All stock" selector) or a list of part names.
#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    #[serde(default)]
    pub all: bool,
    #[serde(default)]
    pub parts: Vec<String>,
    #[serde(default)]
    pub variant: Option<String>,
    pub quantity: i64,
}

impl AdjustStockRequest {
    pub fn selector(&self) -> Result<PartSelector, axum::response::Response> {
        let selector = match (self.all, self.parts.is_empty()) {
            (true, true) => PartSelector::all(),
            (false, _) => PartSelector::named(self.parts.iter().cloned()),
            (true, false) => {
                return Err(errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    "select either all parts or a list of parts, not both",
                ));
            }
        };
        Ok(match self.variant.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => selector.in_variant(v),
            _ => selector,
        })
    }
}

// -------------------------
// Query parameters
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct SnapshotQuery {
    pub band: Option<String>,
}

impl SnapshotQuery {
    pub fn band(&self) -> Result<Option<StockBand>, axum::response::Response> {
        parse_band(self.band.as_deref())
    }
}

fn parse_band(raw: Option<&str>) -> Result<Option<StockBand>, axum::response::Response> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(errors::domain_error_to_response),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReplenishmentQuery {
    pub threshold: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CoverageQuery {
    pub variant: Option<String>,
    pub band: Option<String>,
}

impl CoverageQuery {
    pub fn band(&self) -> Result<Option<StockBand>, axum::response::Response> {
        parse_band(self.band.as_deref())
    }
}
