//! Inventory ledger domain module.
//!
//! This crate contains the stock ledger and the producibility engine, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod band;
pub mod ledger;
pub mod producibility;
pub mod selector;
pub mod snapshot;

pub use band::{BandThresholds, StockBand};
pub use ledger::{
    BuildRecorded, LedgerCommand, LedgerEvent, ReceiveStock, RecordBuild, RemoveStock,
    StockChange, StockLedger, StockReceived, StockRemoved,
};
pub use producibility::{
    part_coverage, producible, recompute_producibility, replenishment_needs, PartCoverage,
    Producibility, ProducibilityFigure, Producible, ReplenishmentNeed,
};
pub use selector::{PartScope, PartSelector};
pub use snapshot::{PartRow, StockSnapshot};
