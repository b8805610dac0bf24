//! Ledger service: the single writer in front of the stock ledger.
//!
//! Every mutation runs against a staged copy of the ledger, is persisted, and
//! only then replaces the live ledger. A failed validation or a failed write
//! leaves both the in-memory state and the persisted table as they were.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rickshaw_bom::BomRegistry;
use rickshaw_core::{AggregateRoot, DomainError, DomainResult, ModelName};
use rickshaw_events::{Event, EventEnvelope};
use rickshaw_inventory::{
    BandThresholds, LedgerCommand, LedgerEvent, PartCoverage, PartRow, PartSelector,
    Producibility, ProducibilityFigure, Producible, ReceiveStock, RecordBuild, RemoveStock,
    ReplenishmentNeed, StockBand, StockLedger, StockSnapshot, part_coverage,
};

use crate::store::StockStore;

const AGGREGATE_TYPE: &str = "stock_ledger";

/// A producibility figure with its band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandedFigure {
    #[serde(flatten)]
    pub figure: ProducibilityFigure,
    pub band: StockBand,
}

/// Units one part alone supports, with its band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandedCoverage {
    #[serde(flatten)]
    pub coverage: PartCoverage,
    pub band: StockBand,
}

/// Read-only view of the ledger at one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerView {
    pub version: u64,
    pub parts: Vec<PartRow>,
    pub producibility: Vec<BandedFigure>,
    pub bands: BandThresholds,
    pub taken_at: DateTime<Utc>,
}

/// Outcome of a committed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub operation_id: Uuid,
    pub version: u64,
    pub events: Vec<EventEnvelope<LedgerEvent>>,
    pub producibility: Vec<BandedFigure>,
}

#[derive(Debug)]
struct LedgerState {
    ledger: StockLedger,
    producibility: Producibility,
}

pub struct LedgerService {
    state: Mutex<LedgerState>,
    store: Arc<dyn StockStore>,
    bands: BandThresholds,
}

impl core::fmt::Debug for LedgerService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LedgerService")
            .field("store", &self.store.describe())
            .field("bands", &self.bands)
            .finish_non_exhaustive()
    }
}

impl LedgerService {
    /// Load the persisted stock table, or seed and persist one when the store
    /// is empty.
    pub fn open<F>(
        registry: Arc<BomRegistry>,
        store: Arc<dyn StockStore>,
        bands: BandThresholds,
        seed: F,
    ) -> DomainResult<Self>
    where
        F: FnOnce() -> DomainResult<StockSnapshot>,
    {
        let stock = match store.load()? {
            Some(stock) => {
                tracing::info!(store = %store.describe(), parts = stock.len(), "stock table loaded");
                stock
            }
            None => {
                let stock = seed()?;
                store.save(&stock)?;
                tracing::info!(store = %store.describe(), parts = stock.len(), "stock table seeded with defaults");
                stock
            }
        };

        for (model, reqs) in registry.iter() {
            for line in reqs.iter() {
                if !stock.keys().any(|k| k.name() == line.part.name()) {
                    tracing::warn!(model = %model, part = %line.part, "BOM part has no stock row");
                }
            }
        }

        let ledger = StockLedger::new(registry, stock);
        let producibility = ledger.recompute_producibility();
        Ok(Self {
            state: Mutex::new(LedgerState {
                ledger,
                producibility,
            }),
            store,
            bands,
        })
    }

    pub fn models(&self) -> Vec<ModelName> {
        self.lock().ledger.registry().models().cloned().collect()
    }

    /// Current stock and producibility, optionally only figures in `band`.
    pub fn snapshot(&self, band: Option<StockBand>) -> LedgerView {
        let state = self.lock();
        LedgerView {
            version: state.ledger.version(),
            parts: state.ledger.stock().rows(),
            producibility: self
                .banded(&state.producibility)
                .into_iter()
                .filter(|f| band.is_none_or(|b| f.band == b))
                .collect(),
            bands: self.bands,
            taken_at: Utc::now(),
        }
    }

    /// Record `count` finished units of `model`, consuming their parts.
    pub fn submit_build(
        &self,
        model: &str,
        count: i64,
        variant: Option<String>,
    ) -> DomainResult<CommitReceipt> {
        let model: ModelName = model.parse()?;
        self.commit(LedgerCommand::RecordBuild(RecordBuild {
            model,
            count,
            variant,
            occurred_at: Utc::now(),
        }))
    }

    pub fn submit_increment(
        &self,
        selector: PartSelector,
        quantity: i64,
    ) -> DomainResult<CommitReceipt> {
        self.commit(LedgerCommand::ReceiveStock(ReceiveStock {
            selector,
            quantity,
            occurred_at: Utc::now(),
        }))
    }

    pub fn submit_decrement(
        &self,
        selector: PartSelector,
        quantity: i64,
    ) -> DomainResult<CommitReceipt> {
        self.commit(LedgerCommand::RemoveStock(RemoveStock {
            selector,
            quantity,
            occurred_at: Utc::now(),
        }))
    }

    pub fn replenishment_advisory(&self, threshold: i64) -> DomainResult<Vec<ReplenishmentNeed>> {
        self.lock().ledger.find_replenishment_needs(threshold)
    }

    /// Units each BOM part of `model` alone could support, optionally only the
    /// parts in `band`.
    pub fn part_coverage(
        &self,
        model: &str,
        variant: Option<&str>,
        band: Option<StockBand>,
    ) -> DomainResult<Vec<BandedCoverage>> {
        let model: ModelName = model.parse()?;
        let state = self.lock();
        let ledger = &state.ledger;
        let requirements = ledger.registry().require(&model)?;

        let variant = variant.map(str::trim).filter(|v| !v.is_empty());
        if let Some(v) = variant {
            if !ledger.stock().variants().iter().any(|known| known == v) {
                return Err(DomainError::validation(format!("unknown variant '{v}'")));
            }
        }
        Ok(part_coverage(requirements, variant, ledger.stock())
            .into_iter()
            .map(|coverage| BandedCoverage {
                band: self.bands.classify(&Producible::Units(coverage.units)),
                coverage,
            })
            .filter(|c| band.is_none_or(|b| c.band == b))
            .collect())
    }

    fn commit(&self, command: LedgerCommand) -> DomainResult<CommitReceipt> {
        let operation = operation_name(&command);
        let mut state = self.lock();

        let mut staged = state.ledger.clone();
        let events = match staged.execute(&command) {
            Ok(events) => events,
            Err(err) => {
                tracing::warn!(operation, error = %err, "operation rejected");
                return Err(err);
            }
        };

        if let Err(err) = self.store.save(staged.stock()) {
            tracing::error!(
                operation,
                store = %self.store.describe(),
                error = %err,
                "failed to persist stock table; operation rolled back"
            );
            return Err(err);
        }

        let base_version = state.ledger.version();
        state.producibility = staged.recompute_producibility();
        state.ledger = staged;

        let operation_id = Uuid::now_v7();
        let version = state.ledger.version();
        let events: Vec<EventEnvelope<LedgerEvent>> = events
            .into_iter()
            .enumerate()
            .map(|(i, event)| {
                EventEnvelope::new(Uuid::now_v7(), AGGREGATE_TYPE, base_version + i as u64 + 1, event)
            })
            .collect();

        for envelope in &events {
            tracing::info!(
                %operation_id,
                event = %envelope.payload().schema(),
                sequence = envelope.sequence_number(),
                parts = envelope.payload().deltas().len(),
                "operation committed"
            );
        }

        Ok(CommitReceipt {
            operation_id,
            version,
            events,
            producibility: self.banded(&state.producibility),
        })
    }

    fn banded(&self, figures: &Producibility) -> Vec<BandedFigure> {
        figures
            .iter()
            .map(|figure| BandedFigure {
                band: self.bands.classify(&figure.producible),
                figure: figure.clone(),
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        // State is only replaced wholesale after a successful save, so a
        // poisoned lock still guards a consistent ledger.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn operation_name(command: &LedgerCommand) -> &'static str {
    match command {
        LedgerCommand::RecordBuild(_) => "record_build",
        LedgerCommand::ReceiveStock(_) => "increment_stock",
        LedgerCommand::RemoveStock(_) => "decrement_stock",
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use rickshaw_core::PartKey;

    use super::*;
    use crate::bootstrap::default_snapshot;
    use crate::store::InMemoryStockStore;

    fn registry() -> Arc<BomRegistry> {
        Arc::new(
            BomRegistry::from_models([(
                ModelName::new("ModelA"),
                vec![(PartKey::new("Motor"), 1), (PartKey::new("Wheels"), 4)],
            )])
            .unwrap(),
        )
    }

    fn service_with(rows: &[(&str, u64)]) -> (LedgerService, Arc<InMemoryStockStore>) {
        let snap = StockSnapshot::from_rows(rows.iter().map(|(n, q)| (PartKey::new(*n), *q))).unwrap();
        let store = Arc::new(InMemoryStockStore::with_snapshot(snap));
        let service = LedgerService::open(
            registry(),
            store.clone(),
            BandThresholds::default(),
            || unreachable!("store already holds a table"),
        )
        .unwrap();
        (service, store)
    }

    fn units(service: &LedgerService) -> Producible {
        service.snapshot(None).producibility[0].figure.producible
    }

    fn stock(service: &LedgerService, name: &str) -> u64 {
        service
            .snapshot(None)
            .parts
            .iter()
            .find(|r| r.part == PartKey::new(name))
            .map(|r| r.stock)
            .unwrap()
    }

    #[test]
    fn empty_store_is_seeded_and_persisted() {
        let store = Arc::new(InMemoryStockStore::new());
        let service = LedgerService::open(registry(), store.clone(), BandThresholds::default(), || {
            default_snapshot(&[])
        })
        .unwrap();

        assert_eq!(store.save_count(), 1);
        assert_eq!(stock(&service, "Wheels"), 40);
        assert_eq!(units(&service), Producible::Units(10));
    }

    #[test]
    fn build_then_advisory() {
        let (service, store) = service_with(&[("Motor", 10), ("Wheels", 40)]);

        let receipt = service.submit_build("ModelA", 3, None).unwrap();
        assert_eq!(receipt.version, 1);
        assert_eq!(receipt.events.len(), 1);
        assert_eq!(receipt.events[0].sequence_number(), 1);
        assert_eq!(receipt.events[0].payload().event_type(), "ledger.build_recorded");
        assert_eq!(receipt.producibility[0].figure.producible, Producible::Units(7));
        assert_eq!(receipt.producibility[0].band, StockBand::Critical);

        let persisted = store.persisted().unwrap();
        assert_eq!(persisted.get(&PartKey::new("Wheels")), Some(28));

        let needs = service.replenishment_advisory(100).unwrap();
        let got: Vec<_> = needs.iter().map(|n| (n.part.name(), n.quantity)).collect();
        assert_eq!(got, vec![("Motor", 93), ("Wheels", 372)]);
    }

    #[test]
    fn insufficient_build_changes_nothing() {
        let (service, store) = service_with(&[("Motor", 10), ("Wheels", 40)]);

        let err = service.submit_build("ModelA", 11, None).unwrap_err();
        match err {
            DomainError::InsufficientStock(shortfalls) => {
                assert_eq!(shortfalls.len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stock(&service, "Motor"), 10);
        assert_eq!(service.snapshot(None).version, 0);
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn decrement_all_is_all_or_nothing() {
        let (service, _) = service_with(&[("Motor", 1), ("Wheels", 10)]);

        let err = service.submit_decrement(PartSelector::all(), 5).unwrap_err();
        assert!(err.is_insufficient_stock());
        assert_eq!(stock(&service, "Motor"), 1);
        assert_eq!(stock(&service, "Wheels"), 10);

        service.submit_decrement(PartSelector::all(), 1).unwrap();
        assert_eq!(stock(&service, "Motor"), 0);
        assert_eq!(stock(&service, "Wheels"), 9);
    }

    #[test]
    fn failed_save_rolls_back() {
        let (service, store) = service_with(&[("Motor", 10), ("Wheels", 40)]);
        store.set_fail_writes(true);

        let err = service.submit_increment(PartSelector::named(["Motor"]), 5).unwrap_err();
        assert!(matches!(err, DomainError::Io(_)));
        assert_eq!(stock(&service, "Motor"), 10);
        assert_eq!(service.snapshot(None).version, 0);
        assert_eq!(units(&service), Producible::Units(10));

        store.set_fail_writes(false);
        service.submit_increment(PartSelector::named(["Motor"]), 5).unwrap();
        assert_eq!(stock(&service, "Motor"), 15);
        assert_eq!(store.persisted().unwrap().get(&PartKey::new("Motor")), Some(15));
    }

    #[test]
    fn concurrent_decrements_never_oversell() {
        let (service, store) = service_with(&[("Motor", 5), ("Wheels", 5)]);

        let committed: usize = thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| s.spawn(|| service.submit_decrement(PartSelector::all(), 1).is_ok()))
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });

        assert_eq!(committed, 5);
        assert_eq!(stock(&service, "Motor"), 0);
        assert_eq!(service.snapshot(None).version, 5);
        assert_eq!(store.save_count(), 5);
    }

    #[test]
    fn snapshot_filters_by_band() {
        let (service, _) = service_with(&[("Motor", 150), ("Wheels", 600)]);
        assert_eq!(service.snapshot(Some(StockBand::Low)).producibility.len(), 1);
        assert!(service.snapshot(Some(StockBand::Critical)).producibility.is_empty());
    }

    #[test]
    fn validation_errors() {
        let (service, _) = service_with(&[("Motor", 10), ("Wheels", 40)]);
        assert!(service.submit_build("Unknown", 1, None).unwrap_err().is_validation());
        assert!(service.submit_build("ModelA", 0, None).unwrap_err().is_validation());
        assert!(service.submit_increment(PartSelector::named(["Horn"]), 1).unwrap_err().is_validation());
        assert!(service.submit_decrement(PartSelector::all(), -2).unwrap_err().is_validation());
        assert!(service.replenishment_advisory(-1).unwrap_err().is_validation());
        assert!(service.part_coverage("ModelA", Some("Green"), None).unwrap_err().is_validation());
    }

    #[test]
    fn coverage_per_part() {
        let (service, _) = service_with(&[("Motor", 7), ("Wheels", 30)]);
        let cov = service.part_coverage("ModelA", None, None).unwrap();
        assert_eq!(cov.iter().map(|c| c.coverage.units).collect::<Vec<_>>(), vec![7, 7]);
        assert!(cov.iter().all(|c| c.band == StockBand::Critical));
    }

    #[test]
    fn coverage_is_banded_per_part() {
        let (service, _) = service_with(&[("Motor", 150), ("Wheels", 1_000)]);

        let cov = service.part_coverage("ModelA", None, None).unwrap();
        let bands: Vec<_> = cov.iter().map(|c| (c.coverage.part.name(), c.band)).collect();
        assert_eq!(bands, vec![("Motor", StockBand::Low), ("Wheels", StockBand::Healthy)]);

        let healthy = service.part_coverage("ModelA", None, Some(StockBand::Healthy)).unwrap();
        assert_eq!(healthy.len(), 1);
        assert_eq!(healthy[0].coverage.part, PartKey::new("Wheels"));
    }
}
