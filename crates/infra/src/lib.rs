//! Infrastructure layer: configuration, the persisted stock table, and the
//! ledger service that ties validation, persistence and recompute together.

pub mod bootstrap;
pub mod config;
pub mod service;
pub mod store;

pub use config::LedgerConfig;
pub use service::{BandedCoverage, BandedFigure, CommitReceipt, LedgerService, LedgerView};
pub use store::{CsvStockStore, InMemoryStockStore, StockColumns, StockStore};
