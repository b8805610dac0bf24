//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::PartKey;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// A single part that cannot cover the requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub part: PartKey,
    pub required: u64,
    pub available: u64,
}

impl core::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}: needs {}, has {}",
            self.part, self.required, self.available
        )
    }
}

/// Every deficient part of a rejected operation, in the order they were checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shortfalls(pub Vec<Shortfall>);

impl Shortfalls {
    pub fn iter(&self) -> impl Iterator<Item = &Shortfall> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Display for Shortfalls {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, s) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            core::fmt::Display::fmt(s, f)?;
        }
        Ok(())
    }
}

/// Domain-level error.
///
/// Each variant is a distinct failure kind callers are expected to branch on:
/// bad input, a stock-level rejection, broken configuration data, or a failed
/// read/write of the persisted table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Caller input was malformed or out of range (non-positive count,
    /// unknown part or model, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Stock cannot cover the requested operation. Nothing was changed.
    #[error("insufficient stock: {0}")]
    InsufficientStock(Shortfalls),

    /// BOM / stock table / environment configuration is malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The backing store could not be read or written.
    #[error("io error: {0}")]
    Io(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn insufficient_stock(shortfalls: Vec<Shortfall>) -> Self {
        Self::InsufficientStock(Shortfalls(shortfalls))
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_insufficient_stock(&self) -> bool {
        matches!(self, Self::InsufficientStock(_))
    }
}

impl From<std::io::Error> for DomainError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}
