use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use rickshaw_core::{DomainError, DomainResult, ModelName, PartKey};

/// One BOM line: `quantity` units of `part` per finished vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementLine {
    pub part: PartKey,
    pub quantity: u64,
}

/// Ordered per-unit requirements of one model.
///
/// Only positive quantities are kept; a zero requirement means "not required"
/// and is dropped on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Requirements {
    lines: Vec<RequirementLine>,
}

impl Requirements {
    /// Build requirements from (part, quantity) pairs in table order.
    ///
    /// Zero quantities are skipped. A part listed twice is a configuration error.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (PartKey, u64)>) -> DomainResult<Self> {
        let mut seen: BTreeSet<PartKey> = BTreeSet::new();
        let mut lines: Vec<RequirementLine> = Vec::new();
        for (part, quantity) in pairs {
            if !seen.insert(part.clone()) {
                return Err(DomainError::configuration(format!(
                    "part '{part}' is listed more than once"
                )));
            }
            if quantity == 0 {
                continue;
            }
            lines.push(RequirementLine { part, quantity });
        }
        Ok(Self { lines })
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequirementLine> {
        self.lines.iter()
    }

    /// Lines that apply to a build in `variant`.
    ///
    /// A variant-less line applies to every variant; a line keyed to a variant
    /// (`Motor/Blue`) applies only to that variant. With no variant every line
    /// applies.
    pub fn in_scope<'a>(
        &'a self,
        variant: Option<&'a str>,
    ) -> impl Iterator<Item = &'a RequirementLine> + 'a {
        self.lines.iter().filter(move |l| match (l.part.variant(), variant) {
            (Some(own), Some(scope)) => own == scope,
            _ => true,
        })
    }

    /// True when any line is keyed to a specific variant.
    pub fn is_variant_specific(&self) -> bool {
        self.lines.iter().any(|l| l.part.variant().is_some())
    }

    pub fn quantity_of(&self, part: &PartKey) -> Option<u64> {
        self.lines.iter().find(|l| &l.part == part).map(|l| l.quantity)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Per-model BOMs, in the order the models were declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BomRegistry {
    models: Vec<(ModelName, Requirements)>,
}

impl BomRegistry {
    /// Build a registry from already-validated per-model requirements.
    pub fn new(models: impl IntoIterator<Item = (ModelName, Requirements)>) -> DomainResult<Self> {
        let mut out: Vec<(ModelName, Requirements)> = Vec::new();
        for (model, reqs) in models {
            if out.iter().any(|(m, _)| m == &model) {
                return Err(DomainError::configuration(format!(
                    "model '{model}' is declared more than once"
                )));
            }
            out.push((model, reqs));
        }
        Ok(Self { models: out })
    }

    /// Convenience constructor from plain (model, [(part, qty)]) data.
    pub fn from_models<M, P>(models: M) -> DomainResult<Self>
    where
        M: IntoIterator<Item = (ModelName, P)>,
        P: IntoIterator<Item = (PartKey, u64)>,
    {
        let mut built = Vec::new();
        for (model, pairs) in models {
            built.push((model, Requirements::from_pairs(pairs)?));
        }
        Self::new(built)
    }

    pub fn requirements(&self, model: &ModelName) -> Option<&Requirements> {
        self.models.iter().find(|(m, _)| m == model).map(|(_, r)| r)
    }

    /// Like [`requirements`](Self::requirements), but an unknown model is a caller error.
    pub fn require(&self, model: &ModelName) -> DomainResult<&Requirements> {
        self.requirements(model)
            .ok_or_else(|| DomainError::validation(format!("unknown model '{model}'")))
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelName> {
        self.models.iter().map(|(m, _)| m)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModelName, &Requirements)> {
        self.models.iter().map(|(m, r)| (m, r))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
