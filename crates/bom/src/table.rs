//! CSV parsing for the BOM table.
//!
//! The table has one row per part and one column per model holding the per-unit
//! requirement. Other columns (serial number, unit, stock) may sit alongside.

use std::io::Read;

use rickshaw_core::{DomainError, DomainResult, ModelName, PartKey};

use crate::registry::{BomRegistry, Requirements};

/// Columns in a BOM table that are never models.
pub const DEFAULT_NON_MODEL_COLUMNS: &[&str] = &["S No", "Unit", "Stock", "Required per vehicle"];

/// Which header columns hold per-model requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelColumns {
    /// Exactly these columns, in this order. Each must exist in the header.
    Explicit(Vec<String>),
    /// Every column except the part/variant columns and the ones listed here.
    AllExcept(Vec<String>),
}

/// Column naming for a BOM table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BomTableLayout {
    pub part_column: String,
    pub variant_column: Option<String>,
    pub model_columns: ModelColumns,
}

impl Default for BomTableLayout {
    fn default() -> Self {
        Self {
            part_column: "Parts".to_string(),
            variant_column: None,
            model_columns: ModelColumns::AllExcept(
                DEFAULT_NON_MODEL_COLUMNS.iter().map(|c| c.to_string()).collect(),
            ),
        }
    }
}

/// Load every model's requirements from a CSV table.
///
/// Fails with `Configuration` when the key column is missing, no model column
/// exists, a cell is not a non-negative whole number, or a part appears twice.
/// A read failure of the underlying source is reported as `Io`.
pub fn load_requirements<R: Read>(reader: R, layout: &BomTableLayout) -> DomainResult<BomRegistry> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().map_err(csv_error)?.clone();
    let find = |name: &str| headers.iter().position(|h| h == name);

    let part_idx = find(layout.part_column.as_str()).ok_or_else(|| {
        DomainError::configuration(format!(
            "BOM table has no '{}' column",
            layout.part_column
        ))
    })?;

    let variant_idx = match &layout.variant_column {
        Some(col) => Some(find(col.as_str()).ok_or_else(|| {
            DomainError::configuration(format!("BOM table has no '{col}' column"))
        })?),
        None => None,
    };

    let model_idx: Vec<(ModelName, usize)> = match &layout.model_columns {
        ModelColumns::Explicit(cols) => cols
            .iter()
            .map(|c| {
                find(c.as_str())
                    .map(|i| (ModelName::new(c.clone()), i))
                    .ok_or_else(|| DomainError::configuration(format!("BOM table has no '{c}' column")))
            })
            .collect::<DomainResult<_>>()?,
        ModelColumns::AllExcept(skip) => headers
            .iter()
            .enumerate()
            .filter(|(i, h)| {
                *i != part_idx
                    && Some(*i) != variant_idx
                    && !h.is_empty()
                    && !skip.iter().any(|s| s == h)
            })
            .map(|(i, h)| (ModelName::new(h), i))
            .collect(),
    };

    if model_idx.is_empty() {
        return Err(DomainError::configuration("BOM table has no model columns"));
    }

    let mut columns: Vec<Vec<(PartKey, u64)>> = vec![Vec::new(); model_idx.len()];

    for (row_no, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_error)?;
        // Header is line 1.
        let line = row_no + 2;

        if record.iter().all(str::is_empty) {
            continue;
        }

        let name = record.get(part_idx).unwrap_or("");
        let variant = variant_idx.and_then(|i| record.get(i));
        let part = PartKey::from_cells(name, variant).map_err(|_| {
            DomainError::configuration(format!(
                "line {line}: '{}' cell is empty",
                layout.part_column
            ))
        })?;

        for (slot, (model, idx)) in model_idx.iter().enumerate() {
            let cell = record.get(*idx).unwrap_or("");
            let qty = parse_quantity(cell).map_err(|reason| {
                DomainError::configuration(format!(
                    "line {line}, column '{model}': {reason} ('{cell}')"
                ))
            })?;
            columns[slot].push((part.clone(), qty));
        }
    }

    let mut models = Vec::with_capacity(model_idx.len());
    for ((model, _), pairs) in model_idx.into_iter().zip(columns) {
        let reqs = Requirements::from_pairs(pairs)
            .map_err(|e| DomainError::configuration(format!("model '{model}': {e}")))?;
        models.push((model, reqs));
    }

    let registry = BomRegistry::new(models)?;
    tracing::debug!(models = registry.len(), "loaded bill of materials");
    Ok(registry)
}

/// Parse a requirement cell.
///
/// Blank is 0. Whole numbers are accepted, including a spreadsheet-style `2.0`.
/// Anything fractional, negative or non-numeric is refused rather than coerced.
pub fn parse_quantity(cell: &str) -> Result<u64, &'static str> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(0);
    }
    if let Ok(v) = cell.parse::<u64>() {
        return Ok(v);
    }
    if cell.parse::<i64>().is_ok() {
        return Err("negative quantity");
    }

    // Largest integer an f64 holds exactly.
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;

    match cell.parse::<f64>() {
        Ok(v) if !v.is_finite() => Err("not a number"),
        Ok(v) if v < 0.0 => Err("negative quantity"),
        Ok(v) if v.fract() != 0.0 => Err("fractional quantity"),
        Ok(v) if v > EXACT_LIMIT => Err("quantity out of range"),
        Ok(v) => Ok(v as u64),
        Err(_) => Err("not a number"),
    }
}

fn csv_error(err: csv::Error) -> DomainError {
    if err.is_io_error() {
        DomainError::io(err.to_string())
    } else {
        DomainError::configuration(format!("malformed BOM table: {err}"))
    }
}
