//! Daybound Core — causal temporal boundaries and path-based outcomes.
//!
//! This crate contains the engine and nothing else:
//! - Domain types (candles, validated candle series, row ids)
//! - Trading calendar mapping an entry instant to its exit boundary
//! - First-touch resolver over a half-open window of candles
//! - Boundary classifier (Train / OutOfSample / Excluded keyed on exit time)
//! - Delayed-entry decision engine chaining upstream signals with the resolver
//!
//! Everything here is a pure function of immutable inputs: no I/O, no
//! logging, no shared mutable state.

pub mod calendar;
pub mod classify;
pub mod delayed_entry;
pub mod domain;
pub mod path;

pub use calendar::{CalendarConfig, CalendarError, SessionCalendar, TradingDayBoundary};
pub use classify::{Classifier, EntryClassification, Partition, TrainCutoff};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: every type handed across rayon workers is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Candle>();
        require_sync::<domain::Candle>();
        require_send::<domain::CandleSeries>();
        require_sync::<domain::CandleSeries>();
        require_send::<SessionCalendar>();
        require_sync::<SessionCalendar>();
        require_send::<Classifier>();
        require_sync::<Classifier>();
        require_send::<path::PathOutcome>();
        require_sync::<path::PathOutcome>();
        require_send::<delayed_entry::DecisionRow>();
        require_sync::<delayed_entry::DecisionRow>();
        require_send::<delayed_entry::DelayedExecutionRecord>();
        require_sync::<delayed_entry::DelayedExecutionRecord>();
        require_sync::<delayed_entry::DelayedEntryEngine<'static>>();
    }

    /// Architecture contract: the continuation model only sees pre-entry
    /// features, never the series itself.
    #[test]
    fn continuation_model_has_no_series_parameter() {
        fn _check_trait_object_builds(
            model: &dyn delayed_entry::ContinuationModel,
            row: &delayed_entry::DecisionRow,
            features: &delayed_entry::ContinuationFeatures,
        ) -> delayed_entry::ContinuationSignal {
            model.predict(row, domain::Direction::Long, features)
        }
    }
}
