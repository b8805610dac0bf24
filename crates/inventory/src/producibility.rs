//! Producibility engine: how many finished vehicles current stock supports, and
//! what to reorder to reach a target.
//!
//! For a model M in variant scope V:
//!
//! ```text
//! producible(M, V) = min over (part, qty) in BOM(M), qty > 0 of floor(stock(part in V) / qty)
//! ```
//!
//! Division is integer (floor) division. A part missing from the ledger counts
//! as zero stock. An empty BOM has no limiting part and is `Unbounded`.

use serde::{Deserialize, Serialize};

use rickshaw_bom::{BomRegistry, Requirements};
use rickshaw_core::{ModelName, PartKey};

use crate::snapshot::StockSnapshot;

/// Whole units of a model that can still be built.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "units", rename_all = "snake_case")]
pub enum Producible {
    Units(u64),
    /// The model requires no parts at all.
    Unbounded,
}

impl Producible {
    pub fn is_below(&self, threshold: u64) -> bool {
        matches!(self, Producible::Units(u) if *u < threshold)
    }
}

impl core::fmt::Display for Producible {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Producible::Units(u) => write!(f, "{u}"),
            Producible::Unbounded => f.write_str("unbounded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducibilityFigure {
    pub model: ModelName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub producible: Producible,
    /// First part (in BOM order) that limits the figure.
    pub bottleneck: Option<PartKey>,
}

/// Figures for every (model, variant) pair, models in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Producibility {
    figures: Vec<ProducibilityFigure>,
}

impl Producibility {
    pub fn figures(&self) -> &[ProducibilityFigure] {
        &self.figures
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProducibilityFigure> {
        self.figures.iter()
    }

    pub fn get(&self, model: &ModelName, variant: Option<&str>) -> Option<&ProducibilityFigure> {
        self.figures
            .iter()
            .find(|f| &f.model == model && f.variant.as_deref() == variant)
    }

    pub fn len(&self) -> usize {
        self.figures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }
}

/// Units one part alone could support for a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartCoverage {
    pub part: PartKey,
    pub stock: u64,
    pub per_unit: u64,
    pub units: u64,
}

/// Advisory line: order `quantity` more of `part` so `model` reaches the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplenishmentNeed {
    pub model: ModelName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub part: PartKey,
    pub quantity: u64,
}

fn ledger_key(stock: &StockSnapshot, part: &PartKey, variant: Option<&str>) -> PartKey {
    stock
        .resolve(part, variant)
        .unwrap_or_else(|| part.scoped(variant))
}

/// Variant scopes figures are computed for: every variant in the ledger, or a
/// single unscoped pass when the ledger has none.
fn variant_scopes(stock: &StockSnapshot) -> Vec<Option<String>> {
    let variants = stock.variants();
    if variants.is_empty() {
        vec![None]
    } else {
        variants.into_iter().map(Some).collect()
    }
}

/// Producible units of one BOM in a variant scope, with the limiting part.
pub fn producible(
    requirements: &Requirements,
    variant: Option<&str>,
    stock: &StockSnapshot,
) -> (Producible, Option<PartKey>) {
    let mut best: Option<(u64, PartKey)> = None;

    for line in requirements.in_scope(variant) {
        // Zero means "not required".
        if line.quantity == 0 {
            continue;
        }
        let key = ledger_key(stock, &line.part, variant);
        let units = stock.stock_of(&key) / line.quantity;
        let lower = match &best {
            Some((b, _)) => units < *b,
            None => true,
        };
        if lower {
            best = Some((units, key));
        }
    }

    match best {
        Some((units, key)) => (Producible::Units(units), Some(key)),
        None => (Producible::Unbounded, None),
    }
}

/// Per-part breakdown of a model's producibility in a variant scope.
pub fn part_coverage(
    requirements: &Requirements,
    variant: Option<&str>,
    stock: &StockSnapshot,
) -> Vec<PartCoverage> {
    requirements
        .in_scope(variant)
        .filter(|line| line.quantity > 0)
        .map(|line| {
            let part = ledger_key(stock, &line.part, variant);
            let on_hand = stock.stock_of(&part);
            PartCoverage {
                part,
                stock: on_hand,
                per_unit: line.quantity,
                units: on_hand / line.quantity,
            }
        })
        .collect()
}

/// Compute every figure. Pure: reads the registry and stock, mutates nothing.
pub fn recompute_producibility(registry: &BomRegistry, stock: &StockSnapshot) -> Producibility {
    let scopes = variant_scopes(stock);
    let mut figures = Vec::with_capacity(registry.len() * scopes.len());

    for (model, reqs) in registry.iter() {
        for scope in &scopes {
            let (producible, bottleneck) = producible(reqs, scope.as_deref(), stock);
            figures.push(ProducibilityFigure {
                model: model.clone(),
                variant: scope.clone(),
                producible,
                bottleneck,
            });
        }
    }

    Producibility { figures }
}

/// Parts to reorder so every model reaches `threshold` producible units.
///
/// For a figure below the threshold, each BOM part contributes
/// `(threshold - producible) * qty_per_unit`. Unbounded figures never need
/// anything.
pub fn replenishment_needs(
    registry: &BomRegistry,
    stock: &StockSnapshot,
    figures: &Producibility,
    threshold: u64,
) -> Vec<ReplenishmentNeed> {
    let mut needs = Vec::new();

    for figure in figures.iter() {
        if !figure.producible.is_below(threshold) {
            continue;
        }
        let Producible::Units(units) = figure.producible else {
            continue;
        };
        let Some(reqs) = registry.requirements(&figure.model) else {
            continue;
        };
        let gap = threshold - units;

        for line in reqs.in_scope(figure.variant.as_deref()) {
            let quantity = gap.saturating_mul(line.quantity);
            if quantity == 0 {
                continue;
            }
            needs.push(ReplenishmentNeed {
                model: figure.model.clone(),
                variant: figure.variant.clone(),
                part: ledger_key(stock, &line.part, figure.variant.as_deref()),
                quantity,
            });
        }
    }

    needs
}
