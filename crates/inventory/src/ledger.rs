use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rickshaw_bom::BomRegistry;
use rickshaw_core::{
    Aggregate, AggregateRoot, DomainError, DomainResult, ModelName, PartKey, Shortfall,
};
use rickshaw_events::Event;

use crate::producibility::{self, Producibility, ReplenishmentNeed};
use crate::selector::PartSelector;
use crate::snapshot::StockSnapshot;

/// Aggregate root: the stock ledger.
///
/// Holds stock on hand for every part and validates each operation against the
/// BOM registry. `handle` checks a whole command before anything changes; the
/// resulting event is then applied as one state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLedger {
    registry: Arc<BomRegistry>,
    stock: StockSnapshot,
    version: u64,
}

impl StockLedger {
    pub fn new(registry: Arc<BomRegistry>, stock: StockSnapshot) -> Self {
        Self {
            registry,
            stock,
            version: 0,
        }
    }

    pub fn registry(&self) -> &BomRegistry {
        &self.registry
    }

    pub fn stock(&self) -> &StockSnapshot {
        &self.stock
    }

    /// Validate and apply a command, returning the events it produced.
    ///
    /// On error the ledger is untouched.
    pub fn execute(&mut self, command: &LedgerCommand) -> DomainResult<Vec<LedgerEvent>> {
        let events = self.handle(command)?;
        for event in &events {
            self.apply(event);
        }
        Ok(events)
    }

    pub fn recompute_producibility(&self) -> Producibility {
        producibility::recompute_producibility(&self.registry, &self.stock)
    }

    /// Advisory reorder list for every model below `threshold` producible units.
    pub fn find_replenishment_needs(&self, threshold: i64) -> DomainResult<Vec<ReplenishmentNeed>> {
        let threshold = u64::try_from(threshold).map_err(|_| {
            DomainError::validation(format!("threshold cannot be negative (got {threshold})"))
        })?;
        let figures = self.recompute_producibility();
        Ok(producibility::replenishment_needs(
            &self.registry,
            &self.stock,
            &figures,
            threshold,
        ))
    }
}

impl AggregateRoot for StockLedger {
    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RecordBuild (consume one BOM's worth of parts per unit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBuild {
    pub model: ModelName,
    pub count: i64,
    /// Variant scope (e.g. color) the parts are drawn from.
    pub variant: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReceiveStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveStock {
    pub selector: PartSelector,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveStock {
    pub selector: PartSelector,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    RecordBuild(RecordBuild),
    ReceiveStock(ReceiveStock),
    RemoveStock(RemoveStock),
}

/// Quantity of one part moved by an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChange {
    pub part: PartKey,
    pub quantity: u64,
}

/// Event: BuildRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecorded {
    pub model: ModelName,
    pub count: u64,
    pub variant: Option<String>,
    pub consumed: Vec<StockChange>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReceived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReceived {
    pub added: Vec<StockChange>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRemoved {
    pub removed: Vec<StockChange>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    BuildRecorded(BuildRecorded),
    StockReceived(StockReceived),
    StockRemoved(StockRemoved),
}

impl LedgerEvent {
    /// Signed per-part movement carried by this event.
    pub fn deltas(&self) -> Vec<(PartKey, i128)> {
        match self {
            LedgerEvent::BuildRecorded(e) => e
                .consumed
                .iter()
                .map(|c| (c.part.clone(), -(c.quantity as i128)))
                .collect(),
            LedgerEvent::StockReceived(e) => e
                .added
                .iter()
                .map(|c| (c.part.clone(), c.quantity as i128))
                .collect(),
            LedgerEvent::StockRemoved(e) => e
                .removed
                .iter()
                .map(|c| (c.part.clone(), -(c.quantity as i128)))
                .collect(),
        }
    }
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::BuildRecorded(_) => "ledger.build_recorded",
            LedgerEvent::StockReceived(_) => "ledger.stock_received",
            LedgerEvent::StockRemoved(_) => "ledger.stock_removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::BuildRecorded(e) => e.occurred_at,
            LedgerEvent::StockReceived(e) => e.occurred_at,
            LedgerEvent::StockRemoved(e) => e.occurred_at,
        }
    }
}

impl Aggregate for StockLedger {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::BuildRecorded(e) => {
                for c in &e.consumed {
                    self.stock.remove(&c.part, c.quantity);
                }
            }
            LedgerEvent::StockReceived(e) => {
                for c in &e.added {
                    self.stock.add(&c.part, c.quantity);
                }
            }
            LedgerEvent::StockRemoved(e) => {
                for c in &e.removed {
                    self.stock.remove(&c.part, c.quantity);
                }
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LedgerCommand::RecordBuild(cmd) => self.handle_build(cmd),
            LedgerCommand::ReceiveStock(cmd) => self.handle_receive(cmd),
            LedgerCommand::RemoveStock(cmd) => self.handle_remove(cmd),
        }
    }
}

fn positive(value: i64, what: &str) -> DomainResult<u64> {
    if value <= 0 {
        return Err(DomainError::validation(format!(
            "{what} must be positive (got {value})"
        )));
    }
    Ok(value as u64)
}

impl StockLedger {
    fn ensure_variant(&self, variant: Option<&str>) -> DomainResult<()> {
        if let Some(v) = variant {
            if !self.stock.variants().iter().any(|known| known == v) {
                return Err(DomainError::validation(format!("unknown variant '{v}'")));
            }
        }
        Ok(())
    }

    fn handle_build(&self, cmd: &RecordBuild) -> DomainResult<Vec<LedgerEvent>> {
        let count = positive(cmd.count, "count")?;
        let requirements = self.registry.require(&cmd.model)?;
        let variant = cmd.variant.as_deref().map(str::trim).filter(|v| !v.is_empty());
        self.ensure_variant(variant)?;
        if variant.is_none() && requirements.is_variant_specific() {
            return Err(DomainError::validation(format!(
                "model '{}' has per-variant parts; a variant is required",
                cmd.model
            )));
        }

        let mut consumed = Vec::with_capacity(requirements.len());
        let mut shortfalls = Vec::new();

        for line in requirements.in_scope(variant) {
            let part = self.stock.resolve(&line.part, variant).ok_or_else(|| {
                DomainError::validation(format!(
                    "part '{}' required by model '{}' is not in the ledger",
                    line.part.scoped(variant),
                    cmd.model
                ))
            })?;
            let required = line.quantity.checked_mul(count).ok_or_else(|| {
                DomainError::validation(format!("count {count} is too large for part '{part}'"))
            })?;
            let available = self.stock.stock_of(&part);

            if available < required {
                shortfalls.push(Shortfall {
                    part: part.clone(),
                    required,
                    available,
                });
            }
            consumed.push(StockChange {
                part,
                quantity: required,
            });
        }

        if !shortfalls.is_empty() {
            return Err(DomainError::insufficient_stock(shortfalls));
        }

        Ok(vec![LedgerEvent::BuildRecorded(BuildRecorded {
            model: cmd.model.clone(),
            count,
            variant: variant.map(str::to_string),
            consumed,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_receive(&self, cmd: &ReceiveStock) -> DomainResult<Vec<LedgerEvent>> {
        let quantity = positive(cmd.quantity, "quantity")?;
        let parts = cmd.selector.resolve(&self.stock)?;

        let mut added = Vec::with_capacity(parts.len());
        for part in parts {
            if self.stock.stock_of(&part).checked_add(quantity).is_none() {
                return Err(DomainError::validation(format!(
                    "adding {quantity} to '{part}' overflows its stock"
                )));
            }
            added.push(StockChange { part, quantity });
        }

        Ok(vec![LedgerEvent::StockReceived(StockReceived {
            added,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove(&self, cmd: &RemoveStock) -> DomainResult<Vec<LedgerEvent>> {
        let quantity = positive(cmd.quantity, "quantity")?;
        let parts = cmd.selector.resolve(&self.stock)?;

        let shortfalls: Vec<Shortfall> = parts
            .iter()
            .filter_map(|part| {
                let available = self.stock.stock_of(part);
                (available < quantity).then(|| Shortfall {
                    part: part.clone(),
                    required: quantity,
                    available,
                })
            })
            .collect();

        if !shortfalls.is_empty() {
            return Err(DomainError::insufficient_stock(shortfalls));
        }

        Ok(vec![LedgerEvent::StockRemoved(StockRemoved {
            removed: parts
                .into_iter()
                .map(|part| StockChange { part, quantity })
                .collect(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
