//! Delayed-entry decision pipeline.
//!
//! Gates run in a fixed order and the first failing gate is terminal:
//! calendar → direction → risk → confirmation → fill scan → outcome scan.
//! Every scan reads only candles inside its own window, and no window
//! extends past the row's exit boundary.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use super::config::DelayedEntryConfig;
use super::features::ContinuationFeatures;
use super::record::{
    DelayedExecutionRecord, DelayedStatus, IntradayResult, NotExecutedReason, NotUsedReason,
};
use super::signals::{ContinuationModel, DecisionRow};
use crate::calendar::SessionCalendar;
use crate::domain::{CandleSeries, DataError, Direction, RowId};
use crate::path::{fill_price, resolve_in_window, PathOutcome, PriceTrigger, ResolveError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluateError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("{row}: {source}")]
    Resolve {
        row: RowId,
        #[source]
        source: ResolveError,
    },
    #[error("{row}: entry price must be finite and positive, got {price}")]
    InvalidEntryPrice { row: RowId, price: f64 },
    #[error("{row}: scan window around {entry} is out of the representable time range")]
    WindowOverflow { row: RowId, entry: DateTime<Utc> },
}

pub struct DelayedEntryEngine<'a> {
    calendar: SessionCalendar,
    config: DelayedEntryConfig,
    model: &'a dyn ContinuationModel,
}

impl<'a> DelayedEntryEngine<'a> {
    pub fn new(
        calendar: SessionCalendar,
        config: DelayedEntryConfig,
        model: &'a dyn ContinuationModel,
    ) -> Self {
        Self {
            calendar,
            config,
            model,
        }
    }

    pub fn config(&self) -> &DelayedEntryConfig {
        &self.config
    }

    pub fn calendar(&self) -> &SessionCalendar {
        &self.calendar
    }

    /// Run one row through the pipeline against the fine-grained series.
    ///
    /// Business outcomes (including every rejection) come back as a record;
    /// only data-integrity problems are errors.
    pub fn evaluate(
        &self,
        row: &DecisionRow,
        fine: &CandleSeries,
    ) -> Result<DelayedExecutionRecord, EvaluateError> {
        let record = DelayedExecutionRecord::new(
            row.id,
            self.config.effective_take_profit(row.volatility_estimate),
            self.config.stop_loss_pct,
        );

        let boundary = self.calendar.compute_exit_boundary(row.entry_utc);
        let Some(window_end) = boundary.exit_utc else {
            return Ok(record.finish(DelayedStatus::Excluded));
        };

        let Some(direction) = row.direction() else {
            return Ok(record.finish(DelayedStatus::NotAsked));
        };
        let mut record = DelayedExecutionRecord {
            asked: true,
            direction: Some(direction),
            ..record
        };

        if !row.elevated_risk {
            return Ok(record.finish(DelayedStatus::NotUsed(NotUsedReason::RiskNotElevated)));
        }

        if !(row.entry_price.is_finite() && row.entry_price > 0.0) {
            return Err(EvaluateError::InvalidEntryPrice {
                row: row.id,
                price: row.entry_price,
            });
        }

        let overflow = || EvaluateError::WindowOverflow {
            row: row.id,
            entry: row.entry_utc,
        };
        let lookback_start = row
            .entry_utc
            .checked_sub_signed(self.config.confirmation_lookback())
            .ok_or_else(overflow)?;
        fine.require_coverage(lookback_start, row.entry_utc)?;
        // A candle still open at the entry instant is not yet observable.
        let features = ContinuationFeatures::from_window(
            fine.closed_window(lookback_start, row.entry_utc),
            row.entry_price,
            direction,
        );
        let signal = self.model.predict(row, direction, &features);
        if !signal.proceed {
            return Ok(record.finish(DelayedStatus::NotUsed(NotUsedReason::ModelDeclined)));
        }
        // NaN probabilities fail this comparison too.
        if !(signal.probability >= self.config.min_confidence) {
            return Ok(record.finish(DelayedStatus::NotUsed(NotUsedReason::LowConfidence)));
        }
        record.used = true;

        let trigger = entry_trigger(direction, row.entry_price, self.config.dip_fraction);
        let deadline = row
            .entry_utc
            .checked_add_signed(self.config.max_delay())
            .ok_or_else(overflow)?
            .min(window_end);
        record.trigger_price = Some(trigger.level);
        record.deadline = Some(deadline);

        let Some((fill_time, entry_price)) =
            self.scan_fill(row.id, fine, row.entry_utc, deadline, window_end, &trigger)?
        else {
            return Ok(record.finish(DelayedStatus::NotExecuted(NotExecutedReason::NoTrigger)));
        };
        record.executed_at = Some(fill_time);
        record.entry_price = Some(entry_price);

        let exits = exit_triggers(direction, entry_price, record.tp_pct, record.sl_pct);
        fine.require_coverage(fill_time, window_end)?;
        let outcome = resolve_in_window(fine.window(fill_time, window_end), &exits)
            .map_err(|source| EvaluateError::Resolve { row: row.id, source })?;

        record.outcome_at = outcome.time();
        record.intraday_result = match outcome {
            PathOutcome::FirstTrigger { index: 0, .. } => IntradayResult::TpFirst,
            PathOutcome::FirstTrigger { .. } => IntradayResult::SlFirst,
            PathOutcome::Ambiguous { .. } => IntradayResult::Ambiguous,
            PathOutcome::None => IntradayResult::None,
        };
        Ok(record.finish(DelayedStatus::Executed))
    }

    /// Fill time (candle open) and fill price, or `None` if the level was
    /// never touched in `[from, deadline]`.
    ///
    /// The candle opening at the deadline is scanned unless the deadline is
    /// the exit boundary, which stays exclusive.
    fn scan_fill(
        &self,
        row: RowId,
        fine: &CandleSeries,
        from: DateTime<Utc>,
        deadline: DateTime<Utc>,
        window_end: DateTime<Utc>,
        trigger: &PriceTrigger,
    ) -> Result<Option<(DateTime<Utc>, f64)>, EvaluateError> {
        let scan_end = if deadline < window_end {
            deadline + Duration::nanoseconds(1)
        } else {
            deadline
        };
        fine.require_coverage(from, scan_end)?;
        let window = fine.window(from, scan_end);
        let outcome = resolve_in_window(window, std::slice::from_ref(trigger))
            .map_err(|source| EvaluateError::Resolve { row, source })?;

        let Some(time) = outcome.time() else {
            return Ok(None);
        };
        let position = window.partition_point(|c| c.open_time < time);
        let price = window
            .get(position)
            .map(|candle| fill_price(trigger, candle, self.config.gap_policy))
            .unwrap_or(trigger.level);
        Ok(Some((time, price)))
    }
}

/// Dip below entry for longs, rally above entry for shorts.
fn entry_trigger(direction: Direction, entry_price: f64, dip_fraction: f64) -> PriceTrigger {
    match direction {
        Direction::Long => PriceTrigger::downward(entry_price * (1.0 - dip_fraction)),
        Direction::Short => PriceTrigger::upward(entry_price * (1.0 + dip_fraction)),
    }
}

/// `[take_profit, stop_loss]`, in that order.
fn exit_triggers(direction: Direction, fill: f64, tp_pct: f64, sl_pct: f64) -> [PriceTrigger; 2] {
    match direction {
        Direction::Long => [
            PriceTrigger::upward(fill * (1.0 + tp_pct)),
            PriceTrigger::downward(fill * (1.0 - sl_pct)),
        ],
        Direction::Short => [
            PriceTrigger::downward(fill * (1.0 - tp_pct)),
            PriceTrigger::upward(fill * (1.0 + sl_pct)),
        ],
    }
}
