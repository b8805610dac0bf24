//! Process configuration read from `LEDGER_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use rickshaw_bom::{BomTableLayout, ModelColumns};
use rickshaw_core::{DomainError, DomainResult};
use rickshaw_inventory::BandThresholds;

use crate::store::StockColumns;

pub const STOCK_FILE: &str = "LEDGER_STOCK_FILE";
pub const BOM_FILE: &str = "LEDGER_BOM_FILE";
pub const PART_COLUMN: &str = "LEDGER_PART_COLUMN";
pub const VARIANT_COLUMN: &str = "LEDGER_VARIANT_COLUMN";
pub const STOCK_COLUMN: &str = "LEDGER_STOCK_COLUMN";
pub const MODEL_COLUMNS: &str = "LEDGER_MODEL_COLUMNS";
pub const NON_MODEL_COLUMNS: &str = "LEDGER_NON_MODEL_COLUMNS";
pub const BAND_CRITICAL: &str = "LEDGER_BAND_CRITICAL";
pub const BAND_LOW: &str = "LEDGER_BAND_LOW";
pub const DEFAULT_VARIANTS: &str = "LEDGER_DEFAULT_VARIANTS";
pub const BIND_ADDR: &str = "LEDGER_BIND_ADDR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub stock_path: PathBuf,
    pub bom_path: PathBuf,
    pub stock_columns: StockColumns,
    pub bom_layout: BomTableLayout,
    pub bands: BandThresholds,
    /// Variants the default stock is seeded with on first start.
    pub default_variants: Vec<String>,
    pub bind_addr: SocketAddr,
}

impl LedgerConfig {
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let part_column = get_or(PART_COLUMN, "Parts");
        let variant_column = get(VARIANT_COLUMN);
        let stock_column = get_or(STOCK_COLUMN, "Stock");

        let model_columns = match get(MODEL_COLUMNS) {
            Some(list) => ModelColumns::Explicit(split_list(&list)),
            None => {
                let mut skip = match get(NON_MODEL_COLUMNS) {
                    Some(list) => split_list(&list),
                    None => rickshaw_bom::table::DEFAULT_NON_MODEL_COLUMNS
                        .iter()
                        .map(|c| c.to_string())
                        .collect(),
                };
                // A combined file carries the stock column next to the models.
                if !skip.contains(&stock_column) {
                    skip.push(stock_column.clone());
                }
                ModelColumns::AllExcept(skip)
            }
        };
        if matches!(&model_columns, ModelColumns::Explicit(cols) if cols.is_empty()) {
            return Err(DomainError::configuration(format!("{MODEL_COLUMNS} names no columns")));
        }

        let bands = BandThresholds::new(
            parse_number(BAND_CRITICAL, get(BAND_CRITICAL), 100)?,
            parse_number(BAND_LOW, get(BAND_LOW), 200)?,
        )?;

        let bind_addr = get_or(BIND_ADDR, "0.0.0.0:8080");
        let bind_addr = bind_addr.parse::<SocketAddr>().map_err(|e| {
            DomainError::configuration(format!("{BIND_ADDR} '{bind_addr}' is not a socket address: {e}"))
        })?;

        Ok(Self {
            stock_path: PathBuf::from(get_or(STOCK_FILE, "stock.csv")),
            bom_path: PathBuf::from(get_or(BOM_FILE, "parts.csv")),
            stock_columns: StockColumns {
                part_column: part_column.clone(),
                variant_column: variant_column.clone(),
                stock_column,
            },
            bom_layout: BomTableLayout {
                part_column,
                variant_column,
                model_columns,
            },
            bands,
            default_variants: get(DEFAULT_VARIANTS).map(|v| split_list(&v)).unwrap_or_default(),
            bind_addr,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number(key: &str, raw: Option<String>, default: u64) -> DomainResult<u64> {
    match raw {
        None => Ok(default),
        Some(v) => v.parse::<u64>().map_err(|_| {
            DomainError::configuration(format!("{key} must be a non-negative integer (got '{v}')"))
        }),
    }
}
