//! One incremental update run.
//!
//! Load the store, skip already-covered history, list new snapshots, merge
//! them in, and save. The store on disk only changes through
//! [`save_store`], so a failed run leaves the previous state intact (apart
//! from checkpoints, when enabled).

use crate::archive::{MetadataFetcher, SnapshotLister};
use crate::config::{CheckpointPolicy, LedgerConfig, DEFAULT_STORE_KEY, DEFAULT_URL_PATTERN};
use crate::coverage::plan;
use crate::error::Result;
use crate::ingest::{ingest, ingest_with_checkpoint, IngestReport};
use crate::records::RecordStore;
use crate::storage::{load_store, save_store, DurableStorage};
use crate::types::Timestamp;
use tracing::info;

/// Result of a completed run.
#[derive(Clone, Debug)]
pub struct UpdateOutcome {
    /// The store as saved at the end of the run.
    pub store: RecordStore,
    /// Where the archive query actually started.
    pub effective_since: Timestamp,
    pub report: IngestReport,
}

/// Wires the persistence boundary, planner, lister, fetcher and ingestor.
pub struct Updater<'a> {
    storage: &'a dyn DurableStorage,
    lister: &'a dyn SnapshotLister,
    fetcher: &'a dyn MetadataFetcher,
    store_key: String,
    url_pattern: String,
    checkpoint: CheckpointPolicy,
}

impl<'a> Updater<'a> {
    pub fn new(
        storage: &'a dyn DurableStorage,
        lister: &'a dyn SnapshotLister,
        fetcher: &'a dyn MetadataFetcher,
    ) -> Self {
        Self {
            storage,
            lister,
            fetcher,
            store_key: DEFAULT_STORE_KEY.to_string(),
            url_pattern: DEFAULT_URL_PATTERN.to_string(),
            checkpoint: CheckpointPolicy::default(),
        }
    }

    /// Take key, pattern and checkpoint policy from `config`.
    pub fn from_config(
        config: &LedgerConfig,
        storage: &'a dyn DurableStorage,
        lister: &'a dyn SnapshotLister,
        fetcher: &'a dyn MetadataFetcher,
    ) -> Self {
        Self::new(storage, lister, fetcher)
            .with_store_key(config.store_key.clone())
            .with_url_pattern(config.url_pattern.clone())
            .with_checkpoint(config.checkpoint)
    }

    pub fn with_store_key(mut self, key: impl Into<String>) -> Self {
        self.store_key = key.into();
        self
    }

    pub fn with_url_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.url_pattern = pattern.into();
        self
    }

    pub fn with_checkpoint(mut self, policy: CheckpointPolicy) -> Self {
        self.checkpoint = policy;
        self
    }

    /// Run one update covering `[requested_since, until]`.
    pub fn run(&self, requested_since: Timestamp, until: Timestamp) -> Result<UpdateOutcome> {
        let mut store = load_store(self.storage, &self.store_key)?;
        let coverage = store.coverage();
        info!(
            records = store.len(),
            coverage_start = ?coverage.start,
            coverage_end = ?coverage.end,
            "loaded record store"
        );

        let effective_since = plan(requested_since, &coverage);
        if effective_since != requested_since {
            info!(
                requested = %requested_since,
                resume_from = %effective_since,
                "history already covered, resuming from frontier"
            );
        }

        let candidates = self
            .lister
            .list_snapshots(&self.url_pattern, effective_since, until)?;
        info!(
            candidates = candidates.len(),
            since = %effective_since,
            until = %until,
            "listed archived snapshots"
        );

        if store.anchor_coverage(effective_since) && coverage.start.is_some() {
            info!(
                previous_start = ?coverage.start,
                start = %effective_since,
                "window starts past covered range, re-anchoring coverage"
            );
        }

        let report = match self.checkpoint {
            CheckpointPolicy::EndOfRun => ingest(&mut store, candidates, self.fetcher)?,
            CheckpointPolicy::EveryExtension => {
                ingest_with_checkpoint(&mut store, candidates, self.fetcher, |checkpoint| {
                    save_store(self.storage, &self.store_key, checkpoint)
                })?
            }
        };

        save_store(self.storage, &self.store_key, &store)?;
        info!(
            candidates = report.candidates,
            inserted = report.inserted,
            duplicates = report.duplicates,
            invalid = report.invalid,
            records = store.len(),
            valid = store.valid_count(),
            "saved record store"
        );

        Ok(UpdateOutcome {
            store,
            effective_since,
            report,
        })
    }
}
