//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Separator used in the textual form of a composite part key (`Motor/Blue`).
pub const VARIANT_SEPARATOR: char = '/';

/// Identity of a stocked part: its name, optionally composed with a variant tag
/// such as a color.
///
/// Ordering is by name, then variant (`None` first), which keeps ledger rows and
/// reports grouped by part.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartKey {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variant: Option<String>,
}

impl PartKey {
    /// A part key without a variant.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: None,
        }
    }

    pub fn with_variant(name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: Some(variant.into()),
        }
    }

    /// Build a key from raw table cells, trimming whitespace and treating a blank
    /// variant as "no variant".
    pub fn from_cells(name: &str, variant: Option<&str>) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("part name cannot be empty"));
        }
        let variant = variant
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Ok(Self {
            name: name.to_string(),
            variant,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// Resolve this key within a variant scope.
    ///
    /// Keys that already carry a variant are returned unchanged; variant-less keys
    /// adopt the given scope.
    pub fn scoped(&self, variant: Option<&str>) -> PartKey {
        match (&self.variant, variant) {
            (Some(_), _) | (None, None) => self.clone(),
            (None, Some(v)) => PartKey::with_variant(self.name.clone(), v),
        }
    }
}

impl core::fmt::Display for PartKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.variant {
            Some(v) => write!(f, "{}{}{}", self.name, VARIANT_SEPARATOR, v),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for PartKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(VARIANT_SEPARATOR) {
            Some((name, variant)) => PartKey::from_cells(name, Some(variant)),
            None => PartKey::from_cells(s, None),
        }
    }
}

/// Identity of a vehicle model (a BOM column header).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelName(String);

impl ModelName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ModelName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ModelName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::validation("model name cannot be empty"));
        }
        Ok(Self(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_composite_key() {
        let key: PartKey = "Motor/Blue".parse().unwrap();
        assert_eq!(key.name(), "Motor");
        assert_eq!(key.variant(), Some("Blue"));
        assert_eq!(key.to_string(), "Motor/Blue");
    }

    #[test]
    fn blank_variant_cell_means_no_variant() {
        let key = PartKey::from_cells(" Frame ", Some("  ")).unwrap();
        assert_eq!(key, PartKey::new("Frame"));
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(PartKey::from_cells("   ", None).unwrap_err().is_validation());
        assert!("".parse::<ModelName>().is_err());
    }

    #[test]
    fn scoping_keeps_explicit_variant() {
        let plain = PartKey::new("Seat");
        let red = PartKey::with_variant("Seat", "Red");

        assert_eq!(plain.scoped(Some("Blue")), PartKey::with_variant("Seat", "Blue"));
        assert_eq!(plain.scoped(None), plain);
        assert_eq!(red.scoped(Some("Blue")), red);
    }

    #[test]
    fn variant_is_omitted_from_json_when_absent() {
        let json = serde_json::to_value(PartKey::new("Brake")).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Brake" }));
    }
}
