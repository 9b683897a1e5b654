//! Per-row output of the delayed-entry engine.
//!
//! Every terminal state carries a stable tag; downstream reporting
//! partitions its statistics by exactly these tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Direction, RowId};

/// First-touch result of the outcome scan after a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntradayResult {
    TpFirst,
    SlFirst,
    /// TP and SL both touched within one candle.
    Ambiguous,
    /// Filled, but neither level touched before the exit boundary.
    None,
    /// No fill, so no outcome scan.
    NotReached,
}

impl IntradayResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntradayResult::TpFirst => "tp_first",
            IntradayResult::SlFirst => "sl_first",
            IntradayResult::Ambiguous => "ambiguous",
            IntradayResult::None => "none",
            IntradayResult::NotReached => "not_reached",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotUsedReason {
    /// Risk flag was not raised for the day.
    RiskNotElevated,
    /// Continuation model said no.
    ModelDeclined,
    /// Continuation probability under `min_confidence`.
    LowConfidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotExecutedReason {
    /// Dip/rally level not touched before the deadline.
    NoTrigger,
}

/// Terminal state of the per-row pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DelayedStatus {
    /// Entry on a non-trading day; no boundary.
    Excluded,
    NotAsked,
    NotUsed(NotUsedReason),
    NotExecuted(NotExecutedReason),
    Executed,
}

impl DelayedStatus {
    pub fn tag(&self) -> &'static str {
        match self {
            DelayedStatus::Excluded => "excluded",
            DelayedStatus::NotAsked => "not_asked",
            DelayedStatus::NotUsed(NotUsedReason::RiskNotElevated) => "not_used:risk_flag",
            DelayedStatus::NotUsed(NotUsedReason::ModelDeclined) => "not_used:model_declined",
            DelayedStatus::NotUsed(NotUsedReason::LowConfidence) => "not_used:low_confidence",
            DelayedStatus::NotExecuted(NotExecutedReason::NoTrigger) => "not_executed:no_trigger",
            DelayedStatus::Executed => "executed",
        }
    }

    /// Every tag, in pipeline order.
    pub const ALL: [DelayedStatus; 7] = [
        DelayedStatus::Excluded,
        DelayedStatus::NotAsked,
        DelayedStatus::NotUsed(NotUsedReason::RiskNotElevated),
        DelayedStatus::NotUsed(NotUsedReason::ModelDeclined),
        DelayedStatus::NotUsed(NotUsedReason::LowConfidence),
        DelayedStatus::NotExecuted(NotExecutedReason::NoTrigger),
        DelayedStatus::Executed,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayedExecutionRecord {
    pub row_id: RowId,
    pub status: DelayedStatus,
    /// A direction was wanted.
    pub asked: bool,
    /// Risk and confirmation gates passed; a deferred order was placed.
    pub used: bool,
    pub direction: Option<Direction>,
    /// Dip/rally level the deferred order waited for.
    pub trigger_price: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
    /// Open time of the candle that filled the order.
    pub executed_at: Option<DateTime<Utc>>,
    pub entry_price: Option<f64>,
    /// Effective take-profit fraction (after volatility widening).
    pub tp_pct: f64,
    pub sl_pct: f64,
    pub intraday_result: IntradayResult,
    /// Open time of the candle that decided `intraday_result`.
    pub outcome_at: Option<DateTime<Utc>>,
}

impl DelayedExecutionRecord {
    pub(crate) fn new(row_id: RowId, tp_pct: f64, sl_pct: f64) -> Self {
        Self {
            row_id,
            status: DelayedStatus::NotAsked,
            asked: false,
            used: false,
            direction: None,
            trigger_price: None,
            deadline: None,
            executed_at: None,
            entry_price: None,
            tp_pct,
            sl_pct,
            intraday_result: IntradayResult::NotReached,
            outcome_at: None,
        }
    }

    pub(crate) fn finish(mut self, status: DelayedStatus) -> Self {
        self.status = status;
        self
    }

    pub fn executed(&self) -> bool {
        self.executed_at.is_some()
    }

    pub fn tag(&self) -> &'static str {
        self.status.tag()
    }
}
