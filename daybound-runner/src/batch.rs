//! Batch evaluation: classify and run every row through the delayed-entry
//! engine, in parallel, against one immutable candle snapshot.
//!
//! Rows are independent. Results come back in input order and are identical
//! for any thread count. The first data-integrity error aborts the batch.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use daybound_core::delayed_entry::{DelayedEntryEngine, DelayedExecutionRecord, EvaluateError};
use daybound_core::domain::{CandleSeries, RowId};
use daybound_core::{Classifier, EntryClassification, Partition};

use crate::config::{ConfigError, RunConfig, RunId};
use crate::continuation::PrecomputedContinuation;
use crate::data_loader::SignalRow;
use crate::summary::RunSummary;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("row evaluation failed: {0}")]
    Evaluate(#[from] EvaluateError),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// One row's classification and engine record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedRow {
    pub row_id: RowId,
    pub entry_utc: DateTime<Utc>,
    pub exit_utc: Option<DateTime<Utc>>,
    pub classification: EntryClassification,
    pub record: DelayedExecutionRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub run_id: RunId,
    /// Same order as the input rows.
    pub rows: Vec<EvaluatedRow>,
    pub partition: Partition,
    pub summary: RunSummary,
    /// blake3 over the rows sorted by id; independent of input order and threads.
    pub digest: String,
}

/// Evaluate `rows` against `fine` under `config`.
pub fn run_batch(
    config: &RunConfig,
    fine: &CandleSeries,
    rows: &[SignalRow],
) -> Result<BatchResult, RunError> {
    config.validate()?;
    let calendar = config.session_calendar()?;
    let classifier = Classifier::new(calendar, config.train_cutoff());
    let model = PrecomputedContinuation::from_rows(rows);
    let engine = DelayedEntryEngine::new(calendar, config.delayed_entry.clone(), &model);

    info!(
        run_id = %config.run_id(),
        symbol = fine.symbol(),
        candles = fine.len(),
        rows = rows.len(),
        threads = config.run.threads,
        "starting batch"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.run.threads)
        .build()?;
    let evaluated = pool.install(|| {
        rows.par_iter()
            .map(|row| evaluate_row(&classifier, &engine, fine, row))
            .collect::<Result<Vec<_>, _>>()
    })?;

    let partition = classifier.partition(rows.iter().map(|r| (r.row.id, r.row.entry_utc)));
    let summary = RunSummary::from_rows(&evaluated);
    let digest = digest_rows(&evaluated);

    info!(
        train = partition.train.len(),
        out_of_sample = partition.out_of_sample.len(),
        excluded = partition.excluded.len(),
        executed = summary.executed(),
        digest = %digest,
        "batch complete"
    );

    Ok(BatchResult {
        run_id: config.run_id(),
        rows: evaluated,
        partition,
        summary,
        digest,
    })
}

fn evaluate_row(
    classifier: &Classifier,
    engine: &DelayedEntryEngine<'_>,
    fine: &CandleSeries,
    signal: &SignalRow,
) -> Result<EvaluatedRow, EvaluateError> {
    let row = &signal.row;
    let boundary = classifier.calendar().compute_exit_boundary(row.entry_utc);
    let record = engine.evaluate(row, fine).map_err(|e| {
        debug!(row = %row.id, entry = %row.entry_utc, error = %e, "row evaluation failed");
        e
    })?;
    Ok(EvaluatedRow {
        row_id: row.id,
        entry_utc: row.entry_utc,
        exit_utc: boundary.exit_utc,
        classification: classifier.classify_entry(row.entry_utc),
        record,
    })
}

/// Order-independent fingerprint of a batch's rows.
pub fn digest_rows(rows: &[EvaluatedRow]) -> String {
    let mut sorted: Vec<&EvaluatedRow> = rows.iter().collect();
    sorted.sort_by_key(|r| r.row_id);
    let mut hasher = blake3::Hasher::new();
    for row in sorted {
        let json = serde_json::to_string(row).expect("EvaluatedRow serialization failed");
        hasher.update(json.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}
