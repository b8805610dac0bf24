//! Coarse "needs replenishment" classification of producibility figures.

use serde::{Deserialize, Serialize};

use rickshaw_core::{DomainError, DomainResult};

use crate::producibility::Producible;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockBand {
    /// At or below the critical threshold.
    Critical,
    /// Above critical, at or below the low threshold.
    Low,
    Healthy,
}

impl StockBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockBand::Critical => "critical",
            StockBand::Low => "low",
            StockBand::Healthy => "healthy",
        }
    }
}

impl core::str::FromStr for StockBand {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(StockBand::Critical),
            "low" => Ok(StockBand::Low),
            "healthy" => Ok(StockBand::Healthy),
            other => Err(DomainError::validation(format!(
                "band must be one of: critical, low, healthy (got '{other}')"
            ))),
        }
    }
}

/// Upper bounds (inclusive) of the critical and low bands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandThresholds {
    critical: u64,
    low: u64,
}

impl BandThresholds {
    pub fn new(critical: u64, low: u64) -> DomainResult<Self> {
        if critical > low {
            return Err(DomainError::configuration(format!(
                "critical band ({critical}) must not exceed low band ({low})"
            )));
        }
        Ok(Self { critical, low })
    }

    pub fn critical(&self) -> u64 {
        self.critical
    }

    pub fn low(&self) -> u64 {
        self.low
    }

    pub fn classify(&self, producible: &Producible) -> StockBand {
        match producible {
            Producible::Unbounded => StockBand::Healthy,
            Producible::Units(u) if *u <= self.critical => StockBand::Critical,
            Producible::Units(u) if *u <= self.low => StockBand::Low,
            Producible::Units(_) => StockBand::Healthy,
        }
    }
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            critical: 100,
            low: 200,
        }
    }
}
