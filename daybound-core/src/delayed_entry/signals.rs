//! Typed inputs from upstream predictors.
//!
//! The engine sees only these scalars; how they were produced is opaque.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::features::ContinuationFeatures;
use crate::domain::{Direction, RowId};

/// Primary directional class emitted by the upstream classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryClass {
    Up,
    Down,
    Flat,
}

/// One backtest row as handed to the delayed-entry engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRow {
    pub id: RowId,
    pub entry_utc: DateTime<Utc>,
    /// Reference price at the entry instant (typically the session open).
    pub entry_price: f64,
    pub primary_class: PrimaryClass,
    /// Sub-signal consulted only when the primary class is `Flat`.
    pub tie_break: Option<Direction>,
    /// Upstream "elevated risk" flag for the day.
    pub elevated_risk: bool,
    /// Volatility estimate as a fraction of price (e.g. ATR / close).
    pub volatility_estimate: Option<f64>,
}

impl DecisionRow {
    /// Direction gate: primary class first, tie-break only on `Flat`.
    pub fn direction(&self) -> Option<Direction> {
        match self.primary_class {
            PrimaryClass::Up => Some(Direction::Long),
            PrimaryClass::Down => Some(Direction::Short),
            PrimaryClass::Flat => self.tie_break,
        }
    }
}

/// Answer of the continuation model for one row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContinuationSignal {
    /// Probability that the move continues in the wanted direction.
    pub probability: f64,
    /// The model's own go/no-go decision.
    pub proceed: bool,
}

/// External continuation-probability model.
pub trait ContinuationModel: Send + Sync {
    /// Human-readable name (e.g., "precomputed", "fixed").
    fn name(&self) -> &str;

    /// Score a row given features built only from candles before its entry.
    fn predict(
        &self,
        row: &DecisionRow,
        direction: Direction,
        features: &ContinuationFeatures,
    ) -> ContinuationSignal;
}

/// Returns the same signal for every row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedContinuation(pub ContinuationSignal);

impl FixedContinuation {
    pub fn always(probability: f64) -> Self {
        Self(ContinuationSignal {
            probability,
            proceed: true,
        })
    }
}

impl ContinuationModel for FixedContinuation {
    fn name(&self) -> &str {
        "fixed"
    }

    fn predict(
        &self,
        _row: &DecisionRow,
        _direction: Direction,
        _features: &ContinuationFeatures,
    ) -> ContinuationSignal {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(primary_class: PrimaryClass, tie_break: Option<Direction>) -> DecisionRow {
        DecisionRow {
            id: RowId(1),
            entry_utc: Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap(),
            entry_price: 100.0,
            primary_class,
            tie_break,
            elevated_risk: true,
            volatility_estimate: None,
        }
    }

    #[test]
    fn primary_class_decides_direction() {
        assert_eq!(row(PrimaryClass::Up, Some(Direction::Short)).direction(), Some(Direction::Long));
        assert_eq!(row(PrimaryClass::Down, Some(Direction::Long)).direction(), Some(Direction::Short));
    }

    #[test]
    fn tie_break_only_applies_when_flat() {
        assert_eq!(row(PrimaryClass::Flat, Some(Direction::Short)).direction(), Some(Direction::Short));
        assert_eq!(row(PrimaryClass::Flat, None).direction(), None);
    }
}
