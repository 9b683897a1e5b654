//! Boundary classifier — Train / OutOfSample / Excluded keyed on exit time.
//!
//! A row entered on day D only finishes resolving at its exit boundary, so
//! the split compares the exit boundary (not the entry instant) against the
//! cutoff. Every aggregate that needs a split must go through
//! [`Classifier`]; there is no second classification path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::SessionCalendar;
use crate::domain::RowId;

/// Last exit boundary that still counts as training data.
///
/// Expressed in exit-boundary space, fixed once per run and passed
/// explicitly to every consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainCutoff(DateTime<Utc>);

impl TrainCutoff {
    pub fn new(exit_boundary: DateTime<Utc>) -> Self {
        Self(exit_boundary)
    }

    /// Cutoff that keeps exactly the rows whose exit is at or before that of
    /// a row entered at `last_train_entry`.
    ///
    /// Returns `None` when that entry has no defined boundary.
    pub fn from_last_train_entry(
        calendar: &SessionCalendar,
        last_train_entry: DateTime<Utc>,
    ) -> Option<Self> {
        calendar
            .compute_exit_boundary(last_train_entry)
            .exit_utc
            .map(Self)
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryClassification {
    Train,
    OutOfSample,
    Excluded,
}

impl EntryClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryClassification::Train => "train",
            EntryClassification::OutOfSample => "out_of_sample",
            EntryClassification::Excluded => "excluded",
        }
    }
}

/// Row ids split three ways, each list sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub train: Vec<RowId>,
    pub out_of_sample: Vec<RowId>,
    pub excluded: Vec<RowId>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.train.len() + self.out_of_sample.len() + self.excluded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Where `id` landed, if it was classified at all.
    pub fn classification_of(&self, id: RowId) -> Option<EntryClassification> {
        if self.train.binary_search(&id).is_ok() {
            Some(EntryClassification::Train)
        } else if self.out_of_sample.binary_search(&id).is_ok() {
            Some(EntryClassification::OutOfSample)
        } else if self.excluded.binary_search(&id).is_ok() {
            Some(EntryClassification::Excluded)
        } else {
            None
        }
    }
}

/// The single train/out-of-sample classification function of a run.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    calendar: SessionCalendar,
    cutoff: TrainCutoff,
}

impl Classifier {
    pub fn new(calendar: SessionCalendar, cutoff: TrainCutoff) -> Self {
        Self { calendar, cutoff }
    }

    pub fn calendar(&self) -> &SessionCalendar {
        &self.calendar
    }

    pub fn cutoff(&self) -> TrainCutoff {
        self.cutoff
    }

    pub fn classify_entry(&self, entry_utc: DateTime<Utc>) -> EntryClassification {
        match self.calendar.compute_exit_boundary(entry_utc).exit_utc {
            None => EntryClassification::Excluded,
            Some(exit) if exit <= self.cutoff.0 => EntryClassification::Train,
            Some(_) => EntryClassification::OutOfSample,
        }
    }

    /// Classify `(id, entry)` rows. The result does not depend on input order.
    pub fn partition<I>(&self, rows: I) -> Partition
    where
        I: IntoIterator<Item = (RowId, DateTime<Utc>)>,
    {
        let mut partition = Partition::default();
        for (id, entry) in rows {
            match self.classify_entry(entry) {
                EntryClassification::Train => partition.train.push(id),
                EntryClassification::OutOfSample => partition.out_of_sample.push(id),
                EntryClassification::Excluded => partition.excluded.push(id),
            }
        }
        partition.train.sort_unstable();
        partition.out_of_sample.sort_unstable();
        partition.excluded.sort_unstable();
        partition
    }
}
