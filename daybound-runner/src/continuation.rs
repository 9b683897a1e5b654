//! Continuation model backed by scores the upstream predictor already wrote.

use std::collections::HashMap;

use daybound_core::delayed_entry::{
    ContinuationFeatures, ContinuationModel, ContinuationSignal, DecisionRow,
};
use daybound_core::domain::{Direction, RowId};

use crate::data_loader::SignalRow;

/// Looks up each row's score by id. Rows without a score are declined.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedContinuation {
    scores: HashMap<RowId, ContinuationSignal>,
}

impl PrecomputedContinuation {
    pub fn from_rows(rows: &[SignalRow]) -> Self {
        let scores = rows
            .iter()
            .filter_map(|r| r.continuation.map(|signal| (r.row.id, signal)))
            .collect();
        Self { scores }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl ContinuationModel for PrecomputedContinuation {
    fn name(&self) -> &str {
        "precomputed"
    }

    fn predict(
        &self,
        row: &DecisionRow,
        _direction: Direction,
        _features: &ContinuationFeatures,
    ) -> ContinuationSignal {
        self.scores
            .get(&row.id)
            .copied()
            .unwrap_or(ContinuationSignal {
                probability: 0.0,
                proceed: false,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::read_rows;

    #[test]
    fn returns_stored_score_or_declines() {
        let csv = "\
row_id,entry_time,entry_price,primary_class,tie_break,elevated_risk,volatility,continuation_probability,continuation_proceed
7,2024-01-02T14:30:00Z,100.0,down,,true,,0.62,false
8,2024-01-03T14:30:00Z,100.0,up,,false,,,
";
        let rows = read_rows(csv.as_bytes()).unwrap();
        let model = PrecomputedContinuation::from_rows(&rows);
        assert_eq!(model.len(), 1);

        let features = ContinuationFeatures::default();
        let hit = model.predict(&rows[0].row, Direction::Short, &features);
        assert_eq!(hit.probability, 0.62);
        assert!(!hit.proceed);

        let miss = model.predict(&rows[1].row, Direction::Long, &features);
        assert!(!miss.proceed);
    }
}
