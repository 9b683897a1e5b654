//! Status tallies per classification.
//!
//! Every tag appears in every bucket, zero or not, so two summaries
//! always have the same shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use daybound_core::delayed_entry::{DelayedStatus, IntradayResult, NotExecutedReason};
use daybound_core::EntryClassification;

use crate::batch::EvaluatedRow;

const CLASSIFICATIONS: [EntryClassification; 3] = [
    EntryClassification::Train,
    EntryClassification::OutOfSample,
    EntryClassification::Excluded,
];

const RESULTS: [IntradayResult; 4] = [
    IntradayResult::TpFirst,
    IntradayResult::SlFirst,
    IntradayResult::Ambiguous,
    IntradayResult::None,
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketSummary {
    pub rows: usize,
    /// Status tag → count.
    pub statuses: BTreeMap<String, usize>,
    /// Intraday result → count, executed rows only.
    pub outcomes: BTreeMap<String, usize>,
}

impl BucketSummary {
    fn empty() -> Self {
        Self {
            rows: 0,
            statuses: DelayedStatus::ALL
                .iter()
                .map(|s| (s.tag().to_string(), 0))
                .collect(),
            outcomes: RESULTS.iter().map(|r| (r.as_str().to_string(), 0)).collect(),
        }
    }

    pub fn count(&self, status: DelayedStatus) -> usize {
        self.statuses.get(status.tag()).copied().unwrap_or(0)
    }

    /// Executed over used; `None` when nothing was used.
    pub fn fill_rate(&self) -> Option<f64> {
        let executed = self.count(DelayedStatus::Executed);
        let used = executed + self.count(DelayedStatus::NotExecuted(NotExecutedReason::NoTrigger));
        (used > 0).then(|| executed as f64 / used as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    /// Keyed by classification (`train`, `out_of_sample`, `excluded`).
    pub buckets: BTreeMap<String, BucketSummary>,
}

impl RunSummary {
    pub fn from_rows(rows: &[EvaluatedRow]) -> Self {
        let mut buckets: BTreeMap<String, BucketSummary> = CLASSIFICATIONS
            .iter()
            .map(|c| (c.as_str().to_string(), BucketSummary::empty()))
            .collect();

        for row in rows {
            let bucket = buckets
                .entry(row.classification.as_str().to_string())
                .or_insert_with(BucketSummary::empty);
            bucket.rows += 1;
            *bucket.statuses.entry(row.record.tag().to_string()).or_insert(0) += 1;
            if row.record.executed() {
                *bucket
                    .outcomes
                    .entry(row.record.intraday_result.as_str().to_string())
                    .or_insert(0) += 1;
            }
        }

        Self {
            total: rows.len(),
            buckets,
        }
    }

    pub fn bucket(&self, classification: EntryClassification) -> Option<&BucketSummary> {
        self.buckets.get(classification.as_str())
    }

    /// Executed rows across all buckets.
    pub fn executed(&self) -> usize {
        self.buckets
            .values()
            .map(|b| b.count(DelayedStatus::Executed))
            .sum()
    }
}
