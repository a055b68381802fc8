// src/reporting/model.rs
use std::collections::{BTreeMap, BTreeSet};
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::TargetKind;
use crate::osint::Category;

/// Settled task counts for one engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineTally {
    pub succeeded: usize,
    pub failed: usize,
}

/// Bookkeeping for one hunt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: Uuid,
    pub target: String,
    pub target_kind: TargetKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tasks_total: usize,
    pub tasks_succeeded: usize,
    pub tasks_failed: usize,
    /// The run stopped admitting tasks before the plan was exhausted
    pub cancelled: bool,
    #[serde(default)]
    pub engines: BTreeMap<String, EngineTally>,
}

impl RunInfo {
    pub fn new(target: &str, target_kind: TargetKind, tasks_total: usize) -> Self {
        let now = Utc::now();

        Self {
            run_id: Uuid::new_v4(),
            target: target.to_string(),
            target_kind,
            started_at: now,
            finished_at: now,
            tasks_total,
            tasks_succeeded: 0,
            tasks_failed: 0,
            cancelled: false,
            engines: BTreeMap::new(),
        }
    }

    /// Count one settled task against its engine and the run totals
    pub fn record(&mut self, engine: &str, succeeded: bool) {
        let tally = self.engines.entry(engine.to_string()).or_default();
        if succeeded {
            tally.succeeded += 1;
            self.tasks_succeeded += 1;
        } else {
            tally.failed += 1;
            self.tasks_failed += 1;
        }
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Finalized, read-only findings of a run.
///
/// Every category list is sorted and duplicate free. Categories without
/// findings are left out of `findings`; `get` returns an empty slice for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub run: RunInfo,
    findings: BTreeMap<Category, Vec<String>>,
    total_count: usize,
}

impl Snapshot {
    pub fn new(run: RunInfo, findings: BTreeMap<Category, BTreeSet<String>>) -> Self {
        let findings: BTreeMap<Category, Vec<String>> = findings
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(category, values)| (category, values.into_iter().collect()))
            .collect();
        let total_count = findings.values().map(Vec::len).sum();

        Self {
            run,
            findings,
            total_count,
        }
    }

    pub fn get(&self, category: Category) -> &[String] {
        self.findings.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Non-empty categories in their fixed order
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[String])> {
        self.findings.iter().map(|(category, values)| (*category, values.as_slice()))
    }

    pub fn findings(&self) -> &BTreeMap<Category, Vec<String>> {
        &self.findings
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}
