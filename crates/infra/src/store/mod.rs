//! Persistence of the stock table.

use std::sync::Arc;

use rickshaw_core::DomainResult;
use rickshaw_inventory::StockSnapshot;

pub mod csv_file;
pub mod in_memory;

pub use csv_file::CsvStockStore;
pub use in_memory::InMemoryStockStore;

/// Durable home of the ledger snapshot.
///
/// `save` is a blocking write of the whole snapshot; it either fully succeeds or
/// leaves the previously persisted table in place.
pub trait StockStore: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> DomainResult<Option<StockSnapshot>>;
    fn save(&self, snapshot: &StockSnapshot) -> DomainResult<()>;
    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    fn load(&self) -> DomainResult<Option<StockSnapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &StockSnapshot) -> DomainResult<()> {
        (**self).save(snapshot)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Column naming of the stock table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockColumns {
    pub part_column: String,
    pub variant_column: Option<String>,
    pub stock_column: String,
}

impl Default for StockColumns {
    fn default() -> Self {
        Self {
            part_column: "Parts".to_string(),
            variant_column: None,
            stock_column: "Stock".to_string(),
        }
    }
}
