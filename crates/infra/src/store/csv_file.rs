//! CSV-backed stock table.
//!
//! The file is read and written as a whole. Columns other than the part,
//! variant and stock columns are carried through untouched, so the stock table
//! may share a file with the BOM (`S No, Parts, Unit, Stock, <models...>`).

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use atomicwrites::{AtomicFile, OverwriteBehavior};

use rickshaw_bom::table::parse_quantity;
use rickshaw_core::{DomainError, DomainResult, PartKey};
use rickshaw_inventory::StockSnapshot;

use super::{StockColumns, StockStore};

/// Shape of the file as last read or written.
#[derive(Debug, Clone)]
struct TableLayout {
    headers: Vec<String>,
    part_idx: usize,
    variant_idx: Option<usize>,
    stock_idx: usize,
    rows: Vec<(PartKey, Vec<String>)>,
}

impl TableLayout {
    fn fresh(columns: &StockColumns) -> Self {
        let mut headers = vec![columns.part_column.clone()];
        let variant_idx = columns.variant_column.as_ref().map(|v| {
            headers.push(v.clone());
            headers.len() - 1
        });
        headers.push(columns.stock_column.clone());
        Self {
            stock_idx: headers.len() - 1,
            headers,
            part_idx: 0,
            variant_idx,
            rows: Vec::new(),
        }
    }

    fn new_row(&self, part: &PartKey) -> DomainResult<Vec<String>> {
        let mut cells = vec![String::new(); self.headers.len()];
        cells[self.part_idx] = part.name().to_string();
        match (self.variant_idx, part.variant()) {
            (Some(idx), Some(v)) => cells[idx] = v.to_string(),
            (None, Some(_)) => {
                return Err(DomainError::configuration(format!(
                    "cannot persist '{part}': stock table has no variant column"
                )));
            }
            _ => {}
        }
        Ok(cells)
    }

    /// Layout with every stock cell taken from `snapshot`; parts new to the
    /// table are appended in key order.
    fn with_stock(&self, snapshot: &StockSnapshot) -> DomainResult<Self> {
        let mut next = self.clone();
        for (part, cells) in next.rows.iter_mut() {
            if let Some(stock) = snapshot.get(part) {
                cells[self.stock_idx] = stock.to_string();
            }
        }
        for (part, stock) in snapshot.iter() {
            if next.rows.iter().any(|(k, _)| k == part) {
                continue;
            }
            let mut cells = next.new_row(part)?;
            cells[next.stock_idx] = stock.to_string();
            next.rows.push((part.clone(), cells));
        }
        Ok(next)
    }

    fn to_csv(&self) -> DomainResult<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(&self.headers).map_err(write_error)?;
        for (_, cells) in &self.rows {
            wtr.write_record(cells).map_err(write_error)?;
        }
        wtr.into_inner()
            .map_err(|e| DomainError::io(format!("failed to flush stock table: {e}")))
    }
}

fn write_error(err: csv::Error) -> DomainError {
    DomainError::io(format!("failed to encode stock table: {err}"))
}

fn read_error(path: &Path, err: csv::Error) -> DomainError {
    if err.is_io_error() {
        DomainError::io(format!("failed to read {}: {err}", path.display()))
    } else {
        DomainError::configuration(format!("malformed stock table {}: {err}", path.display()))
    }
}

/// Stock table persisted as a CSV file, replaced atomically on every save.
#[derive(Debug)]
pub struct CsvStockStore {
    path: PathBuf,
    columns: StockColumns,
    layout: Mutex<Option<TableLayout>>,
}

impl CsvStockStore {
    pub fn new(path: impl Into<PathBuf>, columns: StockColumns) -> Self {
        Self {
            path: path.into(),
            columns,
            layout: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, file: File) -> DomainResult<(StockSnapshot, TableLayout)> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(file);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| read_error(&self.path, e))?
            .iter()
            .map(str::to_string)
            .collect();
        let find = |name: &str| headers.iter().position(|h| h == name);
        let missing = |name: &str| {
            DomainError::configuration(format!(
                "stock table {} has no '{name}' column",
                self.path.display()
            ))
        };

        let part_idx = find(self.columns.part_column.as_str())
            .ok_or_else(|| missing(&self.columns.part_column))?;
        let stock_idx = find(self.columns.stock_column.as_str())
            .ok_or_else(|| missing(&self.columns.stock_column))?;
        let variant_idx = match &self.columns.variant_column {
            Some(col) => Some(find(col.as_str()).ok_or_else(|| missing(col))?),
            None => None,
        };

        let mut rows = Vec::new();
        for (row_no, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| read_error(&self.path, e))?;
            let line = row_no + 2;
            if record.iter().all(str::is_empty) {
                continue;
            }

            let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
            cells.resize(headers.len(), String::new());

            let part = PartKey::from_cells(&cells[part_idx], variant_idx.map(|i| cells[i].as_str()))
                .map_err(|_| {
                    DomainError::configuration(format!(
                        "{} line {line}: part cell is empty",
                        self.path.display()
                    ))
                })?;
            let stock = parse_quantity(&cells[stock_idx]).map_err(|reason| {
                DomainError::configuration(format!(
                    "{} line {line}: {reason} in '{}' ('{}')",
                    self.path.display(),
                    self.columns.stock_column,
                    cells[stock_idx]
                ))
            })?;
            rows.push((part, stock, cells));
        }

        let snapshot = StockSnapshot::from_rows(rows.iter().map(|(p, s, _)| (p.clone(), *s)))?;
        let layout = TableLayout {
            headers,
            part_idx,
            variant_idx,
            stock_idx,
            rows: rows.into_iter().map(|(p, _, cells)| (p, cells)).collect(),
        };
        Ok((snapshot, layout))
    }

    fn write_atomically(&self, bytes: &[u8]) -> DomainResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                DomainError::io(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        AtomicFile::new(&self.path, OverwriteBehavior::AllowOverwrite)
            .write(|f| {
                f.write_all(bytes)?;
                f.flush()
            })
            .map_err(|e| DomainError::io(format!("failed to write {}: {e}", self.path.display())))
    }
}

impl StockStore for CsvStockStore {
    fn load(&self) -> DomainResult<Option<StockSnapshot>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DomainError::io(format!(
                    "failed to open {}: {e}",
                    self.path.display()
                )));
            }
        };

        let (snapshot, layout) = self.parse(file)?;
        tracing::debug!(path = %self.path.display(), parts = snapshot.len(), "loaded stock table");

        let mut guard = self.layout.lock().unwrap_or_else(|p| p.into_inner());
        *guard = Some(layout);
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &StockSnapshot) -> DomainResult<()> {
        let mut guard = self.layout.lock().unwrap_or_else(|p| p.into_inner());
        let base = guard.clone().unwrap_or_else(|| TableLayout::fresh(&self.columns));

        let next = base.with_stock(snapshot)?;
        self.write_atomically(&next.to_csv()?)?;

        // Only a confirmed write moves the remembered layout forward.
        *guard = Some(next);
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
