//! In-memory record store with guarded mutations.

use crate::types::{CoverageRange, Record, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Deduplicated mapping from page URL to record, plus the coverage marker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStore {
    /// All records by URL.
    records: HashMap<String, Record>,

    /// Time range already discovered and ingested.
    coverage: CoverageRange,
}

impl RecordStore {
    /// Create an empty store with absent coverage.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records by URL.
    pub fn records(&self) -> &HashMap<String, Record> {
        &self.records
    }

    pub fn coverage(&self) -> CoverageRange {
        self.coverage
    }

    pub fn contains(&self, url: &str) -> bool {
        self.records.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<&Record> {
        self.records.get(url)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a record unless its URL is already present.
    ///
    /// The first write wins: an existing record is never overwritten.
    /// Returns whether the record was added.
    pub fn insert(&mut self, record: Record) -> bool {
        if self.records.contains_key(&record.url) {
            return false;
        }
        self.records.insert(record.url.clone(), record);
        true
    }

    /// Raise the end of coverage to `new_end` if it is later.
    ///
    /// Sets the end when absent. Never touches the start. Returns whether
    /// the end changed.
    pub fn extend_coverage(&mut self, new_end: Timestamp) -> bool {
        match self.coverage.end {
            Some(end) if end >= new_end => false,
            _ => {
                self.coverage.end = Some(new_end);
                true
            }
        }
    }

    /// Mark `start` as the beginning of the window a run is about to ingest.
    ///
    /// Sets the start when it has never been set. A window that begins after
    /// the end of coverage leaves a gap that was never queried, so the start
    /// moves up to `start` and the covered range stays contiguous. The end is
    /// left alone. Returns whether the start changed.
    pub fn anchor_coverage(&mut self, start: Timestamp) -> bool {
        let disjoint = self.coverage.end.map_or(false, |end| start > end);
        if self.coverage.start.is_some() && !disjoint {
            return false;
        }
        self.coverage.start = Some(start);
        true
    }

    /// Records sorted newest first, ties broken by URL.
    pub fn newest_first(&self) -> Vec<&Record> {
        let mut sorted: Vec<&Record> = self.records.values().collect();
        sorted.sort_by(|a, b| {
            b.captured_at
                .cmp(&a.captured_at)
                .then_with(|| a.url.cmp(&b.url))
        });
        sorted
    }

    /// Number of records whose page had content.
    pub fn valid_count(&self) -> usize {
        self.records.values().filter(|r| r.valid).count()
    }
}
