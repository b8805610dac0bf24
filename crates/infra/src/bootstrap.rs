//! Starting stock used when no table has been persisted yet.

use rickshaw_core::{DomainResult, PartKey};
use rickshaw_inventory::StockSnapshot;

/// Default part list and opening quantity per part.
pub const DEFAULT_STOCK: &[(&str, u64)] = &[
    ("Motor", 10),
    ("Battery", 10),
    ("Controller", 10),
    ("Throttle", 10),
    ("Brake", 10),
    ("Frame", 10),
    ("Charger", 10),
    ("Seat", 10),
    ("Suspension", 10),
    ("Wheels", 40),
];

/// Seed snapshot: every default part once, or once per variant when variants
/// are given.
pub fn default_snapshot(variants: &[String]) -> DomainResult<StockSnapshot> {
    let rows: Vec<(PartKey, u64)> = if variants.is_empty() {
        DEFAULT_STOCK
            .iter()
            .map(|(name, qty)| (PartKey::new(*name), *qty))
            .collect()
    } else {
        variants
            .iter()
            .flat_map(|v| {
                DEFAULT_STOCK
                    .iter()
                    .map(move |(name, qty)| (PartKey::with_variant(*name, v.as_str()), *qty))
            })
            .collect()
    };
    StockSnapshot::from_rows(rows)
}
