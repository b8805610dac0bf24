use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use rickshaw_core::{DomainError, DomainResult, PartKey};

/// One ledger row as it is persisted and reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRow {
    pub part: PartKey,
    pub stock: u64,
}

/// Stock on hand for every part: the unit of persistence and of atomic mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockSnapshot {
    parts: BTreeMap<PartKey, u64>,
}

impl StockSnapshot {
    /// Build a snapshot from rows. Each key must appear exactly once.
    pub fn from_rows(rows: impl IntoIterator<Item = (PartKey, u64)>) -> DomainResult<Self> {
        let mut parts = BTreeMap::new();
        for (part, stock) in rows {
            if parts.contains_key(&part) {
                return Err(DomainError::configuration(format!(
                    "part '{part}' appears more than once in the stock table"
                )));
            }
            parts.insert(part, stock);
        }
        Ok(Self { parts })
    }

    pub fn get(&self, part: &PartKey) -> Option<u64> {
        self.parts.get(part).copied()
    }

    /// Stock of a part, counting an unknown part as empty.
    pub fn stock_of(&self, part: &PartKey) -> u64 {
        self.get(part).unwrap_or(0)
    }

    pub fn contains(&self, part: &PartKey) -> bool {
        self.parts.contains_key(part)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PartKey, u64)> {
        self.parts.iter().map(|(k, v)| (k, *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &PartKey> {
        self.parts.keys()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Distinct variant tags present in the ledger, sorted.
    pub fn variants(&self) -> Vec<String> {
        self.parts
            .keys()
            .filter_map(|k| k.variant().map(str::to_string))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Find the stocked key a (possibly variant-less) part resolves to within a
    /// variant scope.
    ///
    /// The scoped key wins (`Motor` in `Blue` is `Motor/Blue`); otherwise a shared
    /// variant-less row (`Frame`) is used.
    pub fn resolve(&self, part: &PartKey, variant: Option<&str>) -> Option<PartKey> {
        let scoped = part.scoped(variant);
        if self.contains(&scoped) {
            return Some(scoped);
        }
        if self.contains(part) {
            return Some(part.clone());
        }
        None
    }

    pub fn rows(&self) -> Vec<PartRow> {
        self.parts
            .iter()
            .map(|(part, stock)| PartRow {
                part: part.clone(),
                stock: *stock,
            })
            .collect()
    }

    pub(crate) fn add(&mut self, part: &PartKey, quantity: u64) {
        let slot = self.parts.entry(part.clone()).or_insert(0);
        *slot = slot.saturating_add(quantity);
    }

    pub(crate) fn remove(&mut self, part: &PartKey, quantity: u64) {
        if let Some(slot) = self.parts.get_mut(part) {
            *slot = slot.saturating_sub(quantity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_rows_are_rejected() {
        let err = StockSnapshot::from_rows([(PartKey::new("Motor"), 1), (PartKey::new("Motor"), 2)])
            .unwrap_err();
        assert!(matches!(err, DomainError::Configuration(_)));
    }

    #[test]
    fn resolve_prefers_scoped_then_shared_rows() {
        let snap = StockSnapshot::from_rows([
            (PartKey::with_variant("Motor", "Blue"), 3),
            (PartKey::new("Frame"), 5),
        ])
        .unwrap();

        assert_eq!(
            snap.resolve(&PartKey::new("Motor"), Some("Blue")),
            Some(PartKey::with_variant("Motor", "Blue"))
        );
        assert_eq!(snap.resolve(&PartKey::new("Frame"), Some("Blue")), Some(PartKey::new("Frame")));
        assert_eq!(snap.resolve(&PartKey::new("Motor"), Some("Red")), None);
        assert_eq!(snap.resolve(&PartKey::new("Motor"), None), None);
    }

    #[test]
    fn variants_are_distinct_and_sorted() {
        let snap = StockSnapshot::from_rows([
            (PartKey::with_variant("Motor", "Red"), 1),
            (PartKey::with_variant("Seat", "Blue"), 1),
            (PartKey::with_variant("Motor", "Blue"), 1),
            (PartKey::new("Frame"), 1),
        ])
        .unwrap();

        assert_eq!(snap.variants(), vec!["Blue".to_string(), "Red".to_string()]);
    }
}
