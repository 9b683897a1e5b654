//! Daybound Runner — batch orchestration over the daybound engine.
//!
//! This crate builds on `daybound-core` to provide:
//! - TOML run configuration with a content-addressed run id
//! - CSV loading of candle snapshots and upstream signal rows
//! - A continuation model backed by precomputed scores
//! - Parallel, order-preserving batch evaluation
//! - Status tallies per train/out-of-sample bucket, CSV/JSON export

pub mod batch;
pub mod config;
pub mod continuation;
pub mod data_loader;
pub mod export;
pub mod summary;

pub use batch::{digest_rows, run_batch, BatchResult, EvaluatedRow, RunError};
pub use config::{ConfigError, RunConfig, RunId, RunSection, SplitConfig};
pub use continuation::PrecomputedContinuation;
pub use data_loader::{
    load_candles, load_rows, load_rows_with, read_candles, read_rows, read_rows_with, LoadError,
    RowLoadOptions, SignalRow,
};
pub use export::{export_json, export_rows_csv, save_artifacts};
pub use summary::{BucketSummary, RunSummary};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn batch_types_are_send_sync() {
        assert_send::<BatchResult>();
        assert_sync::<BatchResult>();
        assert_send::<EvaluatedRow>();
        assert_sync::<EvaluatedRow>();
    }

    #[test]
    fn model_is_send_sync() {
        assert_send::<PrecomputedContinuation>();
        assert_sync::<PrecomputedContinuation>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<SignalRow>();
        assert_sync::<SignalRow>();
    }
}
