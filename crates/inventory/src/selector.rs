use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use rickshaw_core::{DomainError, DomainResult, PartKey};

use crate::snapshot::StockSnapshot;

/// Which parts a stock adjustment targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartScope {
    /// Every stocked part (within the selector's variant, if any).
    All,
    /// Named parts. Entries may be plain names (`Motor`) or composite keys
    /// (`Motor/Blue`).
    Named(Vec<String>),
}

/// A part scope, optionally restricted to one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSelector {
    pub scope: PartScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl PartSelector {
    pub fn all() -> Self {
        Self {
            scope: PartScope::All,
            variant: None,
        }
    }

    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scope: PartScope::Named(names.into_iter().map(Into::into).collect()),
            variant: None,
        }
    }

    pub fn in_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Resolve the selector to the concrete ledger keys it targets.
    ///
    /// Named entries that resolve to the same key are collapsed, so a part is
    /// never adjusted twice by one operation. Any unknown part fails the whole
    /// selection.
    pub fn resolve(&self, stock: &StockSnapshot) -> DomainResult<Vec<PartKey>> {
        let variant = self.variant.as_deref().map(str::trim).filter(|v| !v.is_empty());

        let keys: Vec<PartKey> = match &self.scope {
            PartScope::All => stock
                .keys()
                .filter(|k| variant.is_none() || k.variant() == variant)
                .cloned()
                .collect(),
            PartScope::Named(names) => {
                if names.is_empty() {
                    return Err(DomainError::validation("no parts selected"));
                }
                let mut seen = BTreeSet::new();
                let mut keys = Vec::with_capacity(names.len());
                for name in names {
                    let part: PartKey = name.parse()?;
                    let key = stock.resolve(&part, variant).ok_or_else(|| {
                        DomainError::validation(format!("unknown part '{}'", part.scoped(variant)))
                    })?;
                    if seen.insert(key.clone()) {
                        keys.push(key);
                    }
                }
                keys
            }
        };

        if keys.is_empty() {
            return Err(match variant {
                Some(v) => DomainError::validation(format!("no parts stocked in variant '{v}'")),
                None => DomainError::validation("ledger has no parts"),
            });
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colored() -> StockSnapshot {
        StockSnapshot::from_rows([
            (PartKey::with_variant("Motor", "Blue"), 10),
            (PartKey::with_variant("Motor", "Red"), 10),
            (PartKey::with_variant("Wheels", "Blue"), 40),
            (PartKey::with_variant("Wheels", "Red"), 40),
        ])
        .unwrap()
    }

    #[test]
    fn all_within_variant_only_selects_that_variant() {
        let keys = PartSelector::all().in_variant("Red").resolve(&colored()).unwrap();
        assert_eq!(
            keys,
            vec![
                PartKey::with_variant("Motor", "Red"),
                PartKey::with_variant("Wheels", "Red")
            ]
        );
    }

    #[test]
    fn all_without_variant_selects_everything() {
        assert_eq!(PartSelector::all().resolve(&colored()).unwrap().len(), 4);
    }

    #[test]
    fn named_entries_are_deduplicated() {
        let keys = PartSelector::named(["Motor", "Motor/Blue", "Motor"])
            .in_variant("Blue")
            .resolve(&colored())
            .unwrap();
        assert_eq!(keys, vec![PartKey::with_variant("Motor", "Blue")]);
    }

    #[test]
    fn unknown_part_rejects_the_selection() {
        let err = PartSelector::named(["Motor", "Horn"])
            .in_variant("Blue")
            .resolve(&colored())
            .unwrap_err();
        assert_eq!(err, DomainError::validation("unknown part 'Horn/Blue'"));
    }

    #[test]
    fn empty_selection_is_rejected() {
        let none: [&str; 0] = [];
        assert!(PartSelector::named(none).resolve(&colored()).unwrap_err().is_validation());
        assert!(PartSelector::all().in_variant("Green").resolve(&colored()).unwrap_err().is_validation());
    }
}
