//! Delayed-entry decision engine.
//!
//! On days flagged risky, instead of entering at the open the engine waits
//! for a better price (a dip for longs, a rally for shorts) and then
//! resolves the take-profit / stop-loss race on fine-grained candles.

pub mod config;
pub mod engine;
pub mod features;
pub mod record;
pub mod signals;

pub use config::{DelayedEntryConfig, DelayedEntryConfigError};
pub use engine::{DelayedEntryEngine, EvaluateError};
pub use features::ContinuationFeatures;
pub use record::{
    DelayedExecutionRecord, DelayedStatus, IntradayResult, NotExecutedReason, NotUsedReason,
};
pub use signals::{
    ContinuationModel, ContinuationSignal, DecisionRow, FixedContinuation, PrimaryClass,
};
