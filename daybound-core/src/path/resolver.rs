//! First-touch resolver over a half-open time window.
//!
//! The window `[from, to)` is located with two lower-bound binary searches
//! and scanned once. Nothing outside that slice is read: this is what keeps
//! outcomes for day D independent of every candle after D's exit boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::trigger::PriceTrigger;
use crate::domain::{Candle, CandleSeries, WindowCursor};

/// Result of a first-touch scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathOutcome {
    /// Trigger `index` (position in the caller's slice) fired first, on the
    /// candle opening at `time`.
    FirstTrigger { index: usize, time: DateTime<Utc> },
    /// Several triggers fired within the candle opening at `time`; OHLC data
    /// cannot tell which came first.
    Ambiguous { time: DateTime<Utc> },
    /// No trigger fired before the window ended.
    None,
}

impl PathOutcome {
    /// Open time of the deciding candle, if any.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        match self {
            PathOutcome::FirstTrigger { time, .. } | PathOutcome::Ambiguous { time } => Some(*time),
            PathOutcome::None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("expected 1 or 2 triggers, got {0}")]
    TriggerCount(usize),
    #[error("trigger {index} has non-finite or non-positive level {level}")]
    InvalidLevel { index: usize, level: f64 },
}

/// Scan `series` over `[from, to)` for the first trigger touch.
pub fn resolve_first_touch(
    series: &CandleSeries,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    triggers: &[PriceTrigger],
) -> Result<PathOutcome, ResolveError> {
    validate_triggers(triggers)?;
    Ok(scan(series.window(from, to), triggers))
}

/// Same as [`resolve_first_touch`], reusing the cursor's located bounds.
pub fn resolve_with_cursor(
    cursor: &mut WindowCursor<'_>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    triggers: &[PriceTrigger],
) -> Result<PathOutcome, ResolveError> {
    validate_triggers(triggers)?;
    Ok(scan(cursor.window(from, to), triggers))
}

/// Scan an already-located window. The caller guarantees the slice is the
/// exact window; this function never looks beyond it.
pub fn resolve_in_window(
    window: &[Candle],
    triggers: &[PriceTrigger],
) -> Result<PathOutcome, ResolveError> {
    validate_triggers(triggers)?;
    Ok(scan(window, triggers))
}

fn validate_triggers(triggers: &[PriceTrigger]) -> Result<(), ResolveError> {
    if !(1..=2).contains(&triggers.len()) {
        return Err(ResolveError::TriggerCount(triggers.len()));
    }
    for (index, trigger) in triggers.iter().enumerate() {
        if !trigger.level.is_finite() || trigger.level <= 0.0 {
            return Err(ResolveError::InvalidLevel {
                index,
                level: trigger.level,
            });
        }
    }
    Ok(())
}

fn scan(window: &[Candle], triggers: &[PriceTrigger]) -> PathOutcome {
    for candle in window {
        let mut fired = triggers
            .iter()
            .enumerate()
            .filter(|(_, trigger)| trigger.fires_on(candle))
            .map(|(index, _)| index);

        match (fired.next(), fired.next()) {
            (None, _) => continue,
            (Some(index), None) => {
                return PathOutcome::FirstTrigger {
                    index,
                    time: candle.open_time,
                }
            }
            (Some(_), Some(_)) => {
                return PathOutcome::Ambiguous {
                    time: candle.open_time,
                }
            }
        }
    }
    PathOutcome::None
}
