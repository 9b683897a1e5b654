//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use daybound_core::delayed_entry::{DecisionRow, PrimaryClass};
use daybound_core::domain::{Candle, CandleSeries, RowId};

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// Session open (09:30 EST) of a January 2024 day, in UTC.
pub fn jan_open(day: u32) -> DateTime<Utc> {
    utc(2024, 1, day, 14, 30)
}

/// Deterministic 1-minute series over `[start, end)`: a slow sine swing of
/// ±1.5% around 100 plus a small deterministic wiggle.
pub fn wave_series(symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> CandleSeries {
    let mut candles = Vec::new();
    let mut t = start;
    let mut i: u64 = 0;
    while t < end {
        let phase = (t - start).num_minutes() as f64 / 37.0;
        let noise = ((i.wrapping_mul(2862933555777941757).wrapping_add(3037000493) >> 33) % 100)
            as f64
            / 1000.0
            - 0.05;
        let open = 100.0 + 1.5 * phase.sin() + noise;
        let close = 100.0 + 1.5 * (phase + 1.0 / 37.0).sin() - noise;
        candles.push(Candle {
            open_time: t,
            open,
            high: open.max(close) + 0.05,
            low: open.min(close) - 0.05,
            close,
        });
        t += Duration::minutes(1);
        i += 1;
    }
    CandleSeries::new(symbol, Duration::minutes(1), candles).unwrap()
}

/// Series whose candles sit flat at 100 except where `shape` overrides
/// `(low, high)` at a given instant.
pub fn shaped_series(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    shape: &[(DateTime<Utc>, f64, f64)],
) -> CandleSeries {
    let mut candles = Vec::new();
    let mut t = start;
    while t < end {
        let (low, high) = shape
            .iter()
            .find(|(at, _, _)| *at == t)
            .map(|&(_, l, h)| (l, h))
            .unwrap_or((99.9, 100.1));
        let mid = (low + high) / 2.0;
        candles.push(Candle {
            open_time: t,
            open: mid,
            high,
            low,
            close: mid,
        });
        t += Duration::minutes(1);
    }
    CandleSeries::new("SPY", Duration::minutes(1), candles).unwrap()
}

/// Rebuild `series` with `f` applied to every candle whose open time is at
/// or after `from`.
pub fn mutate_from(
    series: &CandleSeries,
    from: DateTime<Utc>,
    mut f: impl FnMut(&mut Candle),
) -> CandleSeries {
    let candles = series
        .candles()
        .iter()
        .map(|c| {
            let mut c = *c;
            if c.open_time >= from {
                f(&mut c);
            }
            c
        })
        .collect();
    CandleSeries::new(series.symbol(), series.interval(), candles).unwrap()
}

/// Push a candle to an extreme but still sane range.
pub fn spike(c: &mut Candle) {
    c.open = 150.0;
    c.close = 50.0;
    c.high = 200.0;
    c.low = 1.0;
}

pub fn risky_long(id: u64, entry_utc: DateTime<Utc>, entry_price: f64) -> DecisionRow {
    DecisionRow {
        id: RowId(id),
        entry_utc,
        entry_price,
        primary_class: PrimaryClass::Up,
        tie_break: None,
        elevated_risk: true,
        volatility_estimate: None,
    }
}
