//! Delayed-entry parameters (the `[delayed_entry]` table of a run config).

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path::GapPolicy;

pub const DEFAULT_DIP_FRACTION: f64 = 0.005;
pub const DEFAULT_MAX_DELAY_HOURS: f64 = 6.0;
pub const DEFAULT_TAKE_PROFIT_PCT: f64 = 0.01;
pub const DEFAULT_STOP_LOSS_PCT: f64 = 0.01;
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.55;
pub const DEFAULT_CONFIRMATION_LOOKBACK_MINUTES: i64 = 60;

/// Longest allowed fill delay: one week.
pub const MAX_DELAY_HOURS: f64 = 24.0 * 7.0;
/// Longest allowed confirmation lookback: one day.
pub const MAX_CONFIRMATION_LOOKBACK_MINUTES: i64 = 24 * 60;
/// Cap on a volatility-widened take-profit fraction.
pub const MAX_WIDENED_TAKE_PROFIT_PCT: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DelayedEntryConfigError {
    #[error("{name} must be in (0, 1), got {value}")]
    FractionOutOfRange { name: &'static str, value: f64 },
    #[error("{name} must be finite and non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("{name} must be at most {max}, got {value}")]
    TooLarge {
        name: &'static str,
        value: f64,
        max: f64,
    },
    #[error("min_confidence must be in [0, 1], got {0}")]
    ConfidenceOutOfRange(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayedEntryConfig {
    /// Dip (long) or rally (short) distance from the entry price.
    pub dip_fraction: f64,
    /// How long after entry the deferred fill may still happen.
    pub max_delay_hours: f64,
    pub take_profit_pct: f64,
    pub stop_loss_pct: f64,
    /// Take-profit distance is at least `vol_tp_multiplier * volatility`,
    /// capped at [`MAX_WIDENED_TAKE_PROFIT_PCT`]. Zero disables widening.
    pub vol_tp_multiplier: f64,
    /// Minimum continuation probability to use the mechanism.
    pub min_confidence: f64,
    /// Length of the pre-entry slice the confirmation features are built from.
    pub confirmation_lookback_minutes: i64,
    pub gap_policy: GapPolicy,
}

impl Default for DelayedEntryConfig {
    fn default() -> Self {
        Self {
            dip_fraction: DEFAULT_DIP_FRACTION,
            max_delay_hours: DEFAULT_MAX_DELAY_HOURS,
            take_profit_pct: DEFAULT_TAKE_PROFIT_PCT,
            stop_loss_pct: DEFAULT_STOP_LOSS_PCT,
            vol_tp_multiplier: 0.0,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            confirmation_lookback_minutes: DEFAULT_CONFIRMATION_LOOKBACK_MINUTES,
            gap_policy: GapPolicy::FillAtTrigger,
        }
    }
}

impl DelayedEntryConfig {
    pub fn validate(&self) -> Result<(), DelayedEntryConfigError> {
        for (name, value) in [
            ("dip_fraction", self.dip_fraction),
            ("take_profit_pct", self.take_profit_pct),
            ("stop_loss_pct", self.stop_loss_pct),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(DelayedEntryConfigError::FractionOutOfRange { name, value });
            }
        }
        for (name, value) in [
            ("max_delay_hours", self.max_delay_hours),
            ("vol_tp_multiplier", self.vol_tp_multiplier),
            (
                "confirmation_lookback_minutes",
                self.confirmation_lookback_minutes as f64,
            ),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(DelayedEntryConfigError::Negative { name, value });
            }
        }
        for (name, value, max) in [
            ("max_delay_hours", self.max_delay_hours, MAX_DELAY_HOURS),
            (
                "confirmation_lookback_minutes",
                self.confirmation_lookback_minutes as f64,
                MAX_CONFIRMATION_LOOKBACK_MINUTES as f64,
            ),
        ] {
            if value > max {
                return Err(DelayedEntryConfigError::TooLarge { name, value, max });
            }
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(DelayedEntryConfigError::ConfidenceOutOfRange(self.min_confidence));
        }
        Ok(())
    }

    /// Saturates at `Duration::MAX` for values `validate` would reject.
    pub fn max_delay(&self) -> Duration {
        Duration::try_milliseconds((self.max_delay_hours * 3_600_000.0).round() as i64)
            .unwrap_or(Duration::MAX)
    }

    /// Saturates at `Duration::MAX` for values `validate` would reject.
    pub fn confirmation_lookback(&self) -> Duration {
        Duration::try_minutes(self.confirmation_lookback_minutes).unwrap_or(Duration::MAX)
    }

    /// Take-profit fraction after volatility widening. Never narrower than
    /// `take_profit_pct`, and the widened part never exceeds
    /// [`MAX_WIDENED_TAKE_PROFIT_PCT`], so a short's TP level stays positive.
    pub fn effective_take_profit(&self, volatility_estimate: Option<f64>) -> f64 {
        let widened = volatility_estimate
            .filter(|v| v.is_finite() && *v > 0.0)
            .map(|v| (v * self.vol_tp_multiplier).min(MAX_WIDENED_TAKE_PROFIT_PCT))
            .unwrap_or(0.0);
        self.take_profit_pct.max(widened)
    }
}
