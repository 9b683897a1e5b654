//! CSV snapshot loading: fine-grained candles and upstream signal rows.
//!
//! Candle files: `open_time,open,high,low,close`, one line per candle,
//! timestamps in RFC 3339 with a zero UTC offset.
//!
//! Row files: `row_id,entry_time,entry_price,primary_class,tie_break,
//! elevated_risk,volatility,continuation_probability,continuation_proceed`.
//! Optional columns may be left empty.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;

use daybound_core::delayed_entry::{ContinuationSignal, DecisionRow, PrimaryClass};
use daybound_core::domain::{Candle, CandleSeries, Direction, RowId, SeriesError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: invalid timestamp '{value}'")]
    InvalidTimestamp { line: u64, value: String },

    #[error("line {line}: timestamp '{value}' is not in UTC")]
    NonUtcTimestamp { line: u64, value: String },

    #[error("invalid series: {0}")]
    Series(#[from] SeriesError),

    #[error("duplicate {0}")]
    DuplicateRowId(RowId),

    #[error("{row} needs confirmation but carries no continuation_probability")]
    MissingContinuation { row: RowId },
}

/// Options controlling how signal rows are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLoadOptions {
    /// Reject rows that reach the confirmation gate without a continuation
    /// score. Batch runs need this; classification does not.
    pub require_scores: bool,
}

impl Default for RowLoadOptions {
    fn default() -> Self {
        Self {
            require_scores: true,
        }
    }
}

/// A decision row together with the upstream continuation score, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub row: DecisionRow,
    pub continuation: Option<ContinuationSignal>,
}

impl SignalRow {
    /// Rows that reach the confirmation gate must carry a score.
    fn needs_continuation(&self) -> bool {
        self.row.elevated_risk && self.row.direction().is_some()
    }
}

#[derive(Debug, Deserialize)]
struct RawCandle {
    open_time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    row_id: u64,
    entry_time: String,
    entry_price: f64,
    primary_class: PrimaryClass,
    tie_break: Option<Direction>,
    elevated_risk: bool,
    volatility: Option<f64>,
    continuation_probability: Option<f64>,
    continuation_proceed: Option<bool>,
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Parse an RFC 3339 timestamp, rejecting any non-zero offset.
fn parse_utc(value: &str, line: u64) -> Result<DateTime<Utc>, LoadError> {
    let parsed =
        DateTime::parse_from_rfc3339(value).map_err(|_| LoadError::InvalidTimestamp {
            line,
            value: value.to_string(),
        })?;
    if parsed.offset().local_minus_utc() != 0 {
        return Err(LoadError::NonUtcTimestamp {
            line,
            value: value.to_string(),
        });
    }
    Ok(parsed.with_timezone(&Utc))
}

fn line_of(record: usize) -> u64 {
    // Header is line 1.
    record as u64 + 2
}

pub fn load_candles(
    path: &Path,
    symbol: &str,
    interval: Duration,
) -> Result<CandleSeries, LoadError> {
    read_candles(open(path)?, symbol, interval)
}

/// Read a candle snapshot and validate it into a series.
pub fn read_candles<R: Read>(
    reader: R,
    symbol: &str,
    interval: Duration,
) -> Result<CandleSeries, LoadError> {
    let mut rdr = csv_reader(reader);
    let mut candles = Vec::new();
    for (i, raw) in rdr.deserialize::<RawCandle>().enumerate() {
        let raw = raw?;
        candles.push(Candle {
            open_time: parse_utc(&raw.open_time, line_of(i))?,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
        });
    }
    Ok(CandleSeries::new(symbol, interval, candles)?)
}

pub fn load_rows(path: &Path) -> Result<Vec<SignalRow>, LoadError> {
    load_rows_with(path, RowLoadOptions::default())
}

pub fn load_rows_with(path: &Path, opts: RowLoadOptions) -> Result<Vec<SignalRow>, LoadError> {
    read_rows_with(open(path)?, opts)
}

/// Read signal rows for a batch run, keeping file order.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<SignalRow>, LoadError> {
    read_rows_with(reader, RowLoadOptions::default())
}

pub fn read_rows_with<R: Read>(reader: R, opts: RowLoadOptions) -> Result<Vec<SignalRow>, LoadError> {
    let mut rdr = csv_reader(reader);
    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for (i, raw) in rdr.deserialize::<RawRow>().enumerate() {
        let raw = raw?;
        let id = RowId(raw.row_id);
        if !seen.insert(id) {
            return Err(LoadError::DuplicateRowId(id));
        }
        let continuation = raw.continuation_probability.map(|probability| ContinuationSignal {
            probability,
            proceed: raw.continuation_proceed.unwrap_or(true),
        });
        let row = SignalRow {
            row: DecisionRow {
                id,
                entry_utc: parse_utc(&raw.entry_time, line_of(i))?,
                entry_price: raw.entry_price,
                primary_class: raw.primary_class,
                tie_break: raw.tie_break,
                elevated_risk: raw.elevated_risk,
                volatility_estimate: raw.volatility,
            },
            continuation,
        };
        if opts.require_scores && row.continuation.is_none() && row.needs_continuation() {
            return Err(LoadError::MissingContinuation { row: id });
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const CANDLES: &str = "\
open_time,open,high,low,close
2024-01-02T14:30:00Z,100.0,100.2,99.8,100.1
2024-01-02T14:31:00Z,100.1,100.3,99.9,100.2
";

    const ROWS: &str = "\
row_id,entry_time,entry_price,primary_class,tie_break,elevated_risk,volatility,continuation_probability,continuation_proceed
1,2024-01-02T14:30:00Z,100.0,up,,true,0.012,0.7,true
2,2024-01-03T14:30:00Z,101.0,flat,short,false,,,
3,2024-01-04T14:30:00Z,102.0,flat,,true,,,
";

    #[test]
    fn reads_candles() {
        let series = read_candles(CANDLES.as_bytes(), "SPY", Duration::minutes(1)).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.candles()[0].open_time,
            Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap()
        );
        assert_eq!(series.candles()[1].close, 100.2);
    }

    #[test]
    fn offset_timestamps_are_rejected() {
        let csv = CANDLES.replace("2024-01-02T14:31:00Z", "2024-01-02T09:31:00-05:00");
        let err = read_candles(csv.as_bytes(), "SPY", Duration::minutes(1)).unwrap_err();
        assert!(matches!(err, LoadError::NonUtcTimestamp { line: 3, .. }));
    }

    #[test]
    fn garbage_timestamp_is_reported_with_line() {
        let csv = CANDLES.replace("2024-01-02T14:30:00Z", "yesterday");
        let err = read_candles(csv.as_bytes(), "SPY", Duration::minutes(1)).unwrap_err();
        assert!(matches!(err, LoadError::InvalidTimestamp { line: 2, .. }));
    }

    #[test]
    fn unordered_candles_fail_series_validation() {
        let csv = "\
open_time,open,high,low,close
2024-01-02T14:31:00Z,100.0,100.2,99.8,100.1
2024-01-02T14:30:00Z,100.1,100.3,99.9,100.2
";
        let err = read_candles(csv.as_bytes(), "SPY", Duration::minutes(1)).unwrap_err();
        assert!(matches!(err, LoadError::Series(_)));
    }

    #[test]
    fn reads_rows_with_optional_columns() {
        let rows = read_rows(ROWS.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].row.primary_class, PrimaryClass::Up);
        assert_eq!(rows[0].row.volatility_estimate, Some(0.012));
        assert_eq!(
            rows[0].continuation,
            Some(ContinuationSignal {
                probability: 0.7,
                proceed: true
            })
        );

        assert_eq!(rows[1].row.tie_break, Some(Direction::Short));
        assert!(!rows[1].row.elevated_risk);
        assert!(rows[1].continuation.is_none());

        // Flat without tie-break never reaches confirmation.
        assert_eq!(rows[2].row.direction(), None);
    }

    #[test]
    fn risky_directional_row_without_score_is_rejected() {
        let csv = ROWS.replace("0.012,0.7,true", "0.012,,");
        let err = read_rows(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingContinuation { row } if row == RowId(1)));
    }

    #[test]
    fn unscored_rows_load_for_classification() {
        let csv = ROWS.replace("0.012,0.7,true", "0.012,,");
        let opts = RowLoadOptions {
            require_scores: false,
        };
        let rows = read_rows_with(csv.as_bytes(), opts).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].continuation.is_none());
        assert!(rows[0].row.elevated_risk);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let csv = ROWS.replace("\n3,", "\n1,");
        assert!(matches!(
            read_rows(csv.as_bytes()),
            Err(LoadError::DuplicateRowId(RowId(1)))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_rows(Path::new("/nonexistent/rows.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
