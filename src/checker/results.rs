// src/checker/results.rs
// =============================================================================
// The result table: every verdict, grouped by the origin that produced it.
//
// Workers record into it concurrently, in whatever order their probes finish.
// Once the dispatcher has joined every worker, the caller reads it back in
// ascending origin order (line 0, line 1, ...).
//
// Origins may be sparse (crawl mode skips anchors without href), so the table
// is a BTreeMap rather than a Vec indexed by line number.
// =============================================================================

use super::extract::CandidateUrl;
use super::probe::ProbeOutcome;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// The final word on one candidate URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub origin_key: usize,
    #[serde(skip)]
    pub position: usize,
    pub url: String,
    pub alive: bool,
    /// HTTP status, or -1 when nothing answered
    pub status_code: i32,
}

impl Verdict {
    pub fn new(candidate: CandidateUrl, outcome: ProbeOutcome) -> Self {
        Self {
            origin_key: candidate.origin_key,
            position: candidate.position,
            url: candidate.url,
            alive: outcome.alive,
            status_code: outcome.status_code,
        }
    }
}

/// Thread-safe origin_key -> verdicts table
#[derive(Debug, Default)]
pub struct ResultTable {
    inner: Mutex<BTreeMap<usize, Vec<Verdict>>>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    // Adds one verdict. Verdicts of the same origin stay sorted by position,
    // whatever order they arrive in.
    pub fn record(&self, verdict: Verdict) {
        let mut table = self.lock();
        let verdicts = table.entry(verdict.origin_key).or_default();
        let at = verdicts.partition_point(|v| v.position <= verdict.position);
        verdicts.insert(at, verdict);
    }

    pub fn verdicts_for(&self, origin_key: usize) -> Vec<Verdict> {
        self.lock().get(&origin_key).cloned().unwrap_or_default()
    }

    /// Origins with at least one verdict, ascending
    pub fn origin_keys(&self) -> Vec<usize> {
        self.lock().keys().copied().collect()
    }

    pub fn all(&self) -> BTreeMap<usize, Vec<Verdict>> {
        self.lock().clone()
    }

    /// Total number of verdicts across all origins
    pub fn len(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    pub fn dead_count(&self) -> usize {
        self.lock().values().flatten().filter(|v| !v.alive).count()
    }

    // A panic while holding the lock cannot leave the map half-written
    // (insert either happened or not), so a poisoned lock is still usable
    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<usize, Vec<Verdict>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
