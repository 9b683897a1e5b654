use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one backtest row (one entry instant of the daily signal).
///
/// Assigned by the upstream collaborator; ordering by id is the canonical
/// output order of every partition and batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl From<u64> for RowId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row-{}", self.0)
    }
}
