//! Confirmation features built from candles strictly before the entry.

use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Direction};

/// Summary of the lookback candles that closed before the entry.
///
/// All fields are zero when the slice is empty.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContinuationFeatures {
    pub candle_count: usize,
    /// `last close / first open - 1`.
    pub lookback_return: f64,
    /// Lookback return signed so that positive favours `direction`.
    pub directional_return: f64,
    /// `(max high - min low) / entry price`.
    pub range_pct: f64,
    /// `last close / entry price - 1`.
    pub last_close_vs_entry: f64,
}

impl ContinuationFeatures {
    pub fn from_window(window: &[Candle], entry_price: f64, direction: Direction) -> Self {
        let (Some(first), Some(last)) = (window.first(), window.last()) else {
            return Self::default();
        };

        let high = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let lookback_return = last.close / first.open - 1.0;

        Self {
            candle_count: window.len(),
            lookback_return,
            directional_return: lookback_return * direction.sign(),
            range_pct: (high - low) / entry_price,
            last_close_vs_entry: last.close / entry_price - 1.0,
        }
    }
}
