// src/engine/aggregator.rs
use std::collections::{BTreeMap, BTreeSet};
use parking_lot::Mutex;

use crate::osint::{Category, ExtractionResult};
use crate::reporting::{RunInfo, Snapshot};

/// Owns the run-wide findings. Merges are linearized by one lock held only
/// for the set unions.
#[derive(Debug, Default)]
pub struct Aggregator {
    report: Mutex<BTreeMap<Category, BTreeSet<String>>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union every category of `result` into the report
    pub fn merge(&self, result: ExtractionResult) {
        let mut report = self.report.lock();
        for (category, values) in result.into_inner() {
            report.entry(category).or_default().extend(values);
        }
    }

    /// Distinct findings merged so far
    pub fn total(&self) -> usize {
        self.report.lock().values().map(BTreeSet::len).sum()
    }

    /// Consume the aggregator; nothing can be merged afterwards
    pub fn finalize(self, run: RunInfo) -> Snapshot {
        Snapshot::new(run, self.report.into_inner())
    }
}
