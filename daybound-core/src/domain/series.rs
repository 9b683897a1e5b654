//! Immutable candle series snapshot with binary-search window lookup.
//!
//! A `CandleSeries` is validated once at construction and then shared by
//! reference (or cheap `Arc` clone) across every row evaluation. Nothing in
//! the engine copies candles per row.

use std::ops::Range;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use super::candle::Candle;

/// Integrity failures detected while building a series. Always fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("{symbol}: candle interval must be positive, got {interval_secs}s")]
    NonPositiveInterval { symbol: String, interval_secs: i64 },

    #[error("{symbol}: duplicate candle timestamp {time} at index {index}")]
    DuplicateTimestamp {
        symbol: String,
        index: usize,
        time: DateTime<Utc>,
    },

    #[error("{symbol}: candle {index} at {time} is not after previous candle at {previous}")]
    NotAscending {
        symbol: String,
        index: usize,
        previous: DateTime<Utc>,
        time: DateTime<Utc>,
    },

    #[error("{symbol}: candle {index} at {time} has void or inconsistent OHLC")]
    InvalidCandle {
        symbol: String,
        index: usize,
        time: DateTime<Utc>,
    },
}

/// A window the engine must read is not fully covered by the series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error(
        "{symbol}: no coverage for requested range [{requested_from}, {requested_to}); \
         available {}",
        format_available(.available)
    )]
    MissingCoverage {
        symbol: String,
        requested_from: DateTime<Utc>,
        requested_to: DateTime<Utc>,
        available: Option<(DateTime<Utc>, DateTime<Utc>)>,
    },
}

fn format_available(available: &Option<(DateTime<Utc>, DateTime<Utc>)>) -> String {
    match available {
        Some((from, to)) => format!("[{from}, {to})"),
        None => "nothing (empty series)".to_string(),
    }
}

/// Validated, strictly ascending candle series for one symbol and timeframe.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    symbol: String,
    interval: Duration,
    candles: Arc<[Candle]>,
}

impl CandleSeries {
    /// Build a series, failing fast on any ordering or OHLC violation.
    pub fn new(
        symbol: impl Into<String>,
        interval: Duration,
        candles: Vec<Candle>,
    ) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if interval <= Duration::zero() {
            return Err(SeriesError::NonPositiveInterval {
                symbol,
                interval_secs: interval.num_seconds(),
            });
        }

        for (index, candle) in candles.iter().enumerate() {
            if !candle.is_sane() {
                return Err(SeriesError::InvalidCandle {
                    symbol,
                    index,
                    time: candle.open_time,
                });
            }
            if index == 0 {
                continue;
            }
            let previous = candles[index - 1].open_time;
            if candle.open_time == previous {
                return Err(SeriesError::DuplicateTimestamp {
                    symbol,
                    index,
                    time: candle.open_time,
                });
            }
            if candle.open_time < previous {
                return Err(SeriesError::NotAscending {
                    symbol,
                    index,
                    previous,
                    time: candle.open_time,
                });
            }
        }

        Ok(Self {
            symbol,
            interval,
            candles: candles.into(),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Index of the first candle whose open time is `>= t`.
    pub fn lower_bound(&self, t: DateTime<Utc>) -> usize {
        self.candles.partition_point(|c| c.open_time < t)
    }

    /// Index range of candles with `from <= open_time < to`.
    ///
    /// An inverted window (`to <= from`) yields an empty range.
    pub fn window_bounds(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Range<usize> {
        let start = self.lower_bound(from);
        let end = self.lower_bound(to).max(start);
        start..end
    }

    /// Candles with `from <= open_time < to`.
    pub fn window(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> &[Candle] {
        &self.candles[self.window_bounds(from, to)]
    }

    /// Candles with `from <= open_time` that have closed by `to`
    /// (`open_time + interval <= to`).
    pub fn closed_window(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> &[Candle] {
        let start = self.lower_bound(from);
        let end = self
            .candles
            .partition_point(|c| c.open_time + self.interval <= to)
            .max(start);
        &self.candles[start..end]
    }

    /// `[first open, last open + interval)`, or `None` for an empty series.
    pub fn available_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.candles.first()?;
        let last = self.candles.last()?;
        Some((first.open_time, last.open_time + self.interval))
    }

    /// Fail unless the series spans the whole of `[from, to)`.
    ///
    /// Empty or inverted windows need no data and always pass.
    pub fn require_coverage(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<(), DataError> {
        if to <= from {
            return Ok(());
        }
        let available = self.available_range();
        match available {
            Some((start, end)) if start <= from && to <= end => Ok(()),
            _ => Err(DataError::MissingCoverage {
                symbol: self.symbol.clone(),
                requested_from: from,
                requested_to: to,
                available,
            }),
        }
    }
}

/// Reuses the previously located lower bound for ascending, contiguous queries.
///
/// Callers walking rows in time order over one series pay one full binary
/// search and then only search the tail past the last window start.
#[derive(Debug)]
pub struct WindowCursor<'a> {
    series: &'a CandleSeries,
    last_from: Option<DateTime<Utc>>,
    last_start: usize,
}

impl<'a> WindowCursor<'a> {
    pub fn new(series: &'a CandleSeries) -> Self {
        Self {
            series,
            last_from: None,
            last_start: 0,
        }
    }

    pub fn series(&self) -> &'a CandleSeries {
        self.series
    }

    /// Same result as [`CandleSeries::window_bounds`].
    pub fn window_bounds(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Range<usize> {
        let candles = self.series.candles();
        let start = match self.last_from {
            Some(prev) if from >= prev => {
                let base = self.last_start;
                base + candles[base..].partition_point(|c| c.open_time < from)
            }
            _ => self.series.lower_bound(from),
        };
        self.last_from = Some(from);
        self.last_start = start;

        let end = start + candles[start..].partition_point(|c| c.open_time < to);
        start..end
    }

    pub fn window(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> &'a [Candle] {
        let range = self.window_bounds(from, to);
        &self.series.candles()[range]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap() + Duration::minutes(minute)
    }

    fn candle(minute: i64) -> Candle {
        Candle {
            open_time: t(minute),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
        }
    }

    fn series(minutes: &[i64]) -> CandleSeries {
        CandleSeries::new(
            "SPY",
            Duration::minutes(1),
            minutes.iter().map(|&m| candle(m)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let err = CandleSeries::new("SPY", Duration::minutes(1), vec![candle(0), candle(0)])
            .unwrap_err();
        assert!(matches!(err, SeriesError::DuplicateTimestamp { index: 1, .. }));
    }

    #[test]
    fn rejects_descending_timestamps() {
        let err = CandleSeries::new("SPY", Duration::minutes(1), vec![candle(5), candle(1)])
            .unwrap_err();
        assert!(matches!(err, SeriesError::NotAscending { index: 1, .. }));
    }

    #[test]
    fn rejects_void_candle() {
        let mut bad = candle(1);
        bad.close = f64::NAN;
        let err = CandleSeries::new("SPY", Duration::minutes(1), vec![candle(0), bad]).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidCandle { index: 1, .. }));
    }

    #[test]
    fn rejects_zero_interval() {
        let err = CandleSeries::new("SPY", Duration::zero(), vec![]).unwrap_err();
        assert!(matches!(err, SeriesError::NonPositiveInterval { .. }));
    }

    #[test]
    fn window_is_half_open() {
        let s = series(&[0, 1, 2, 3, 4]);
        let w = s.window(t(1), t(3));
        assert_eq!(w.len(), 2);
        assert_eq!(w[0].open_time, t(1));
        assert_eq!(w[1].open_time, t(2));
    }

    #[test]
    fn window_between_candles_uses_lower_bound() {
        let s = series(&[0, 2, 4, 6]);
        let from = t(1) + Duration::seconds(30);
        let to = t(4) + Duration::seconds(1);
        let w = s.window(from, to);
        assert_eq!(w.iter().map(|c| c.open_time).collect::<Vec<_>>(), vec![t(2), t(4)]);
    }

    #[test]
    fn closed_window_drops_candle_still_open() {
        let s = series(&[0, 1, 2, 3]);
        let mid_bar = t(2) + Duration::seconds(30);
        let opens: Vec<_> = s.closed_window(t(0), mid_bar).iter().map(|c| c.open_time).collect();
        assert_eq!(opens, vec![t(0), t(1)]);
        // On a bar edge it matches the half-open window.
        assert_eq!(s.closed_window(t(0), t(3)), s.window(t(0), t(3)));
    }

    #[test]
    fn closed_window_on_coarse_bars() {
        let candles = vec![candle(0), candle(15), candle(30)];
        let s = CandleSeries::new("SPY", Duration::minutes(15), candles).unwrap();
        assert_eq!(s.closed_window(t(0), t(40)).len(), 2);
        assert_eq!(s.window(t(0), t(40)).len(), 3);
        assert!(s.closed_window(t(0), t(10)).is_empty());
    }

    #[test]
    fn inverted_window_is_empty() {
        let s = series(&[0, 1, 2]);
        assert!(s.window(t(2), t(1)).is_empty());
        assert_eq!(s.window_bounds(t(2), t(1)).len(), 0);
    }

    #[test]
    fn coverage_reports_available_range() {
        let s = series(&[0, 1, 2]);
        assert!(s.require_coverage(t(0), t(3)).is_ok());
        let err = s.require_coverage(t(1), t(10)).unwrap_err();
        let DataError::MissingCoverage {
            symbol, available, ..
        } = &err;
        assert_eq!(symbol, "SPY");
        assert_eq!(*available, Some((t(0), t(3))));
        assert!(err.to_string().contains("SPY"));
    }

    #[test]
    fn coverage_of_empty_series_fails() {
        let s = series(&[]);
        assert!(s.require_coverage(t(0), t(1)).is_err());
        assert!(s.require_coverage(t(1), t(1)).is_ok());
    }

    #[test]
    fn cursor_matches_fresh_search() {
        let s = series(&(0..50).step_by(2).collect::<Vec<_>>());
        let mut cursor = WindowCursor::new(&s);
        let queries = [(0, 7), (3, 11), (3, 4), (20, 41), (1, 5), (48, 60)];
        for (from, to) in queries {
            assert_eq!(
                cursor.window_bounds(t(from), t(to)),
                s.window_bounds(t(from), t(to)),
                "query [{from}, {to})"
            );
        }
    }

    #[test]
    fn clones_share_the_snapshot() {
        let s = series(&[0, 1, 2]);
        let c = s.clone();
        assert!(std::ptr::eq(s.candles().as_ptr(), c.candles().as_ptr()));
    }
}
