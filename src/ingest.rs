//! Snapshot ingestion.
//!
//! Merges newly discovered snapshots into a [`RecordStore`], fetching
//! metadata only for URLs the store has never seen.

use crate::archive::MetadataFetcher;
use crate::error::Result;
use crate::records::RecordStore;
use crate::types::{Record, Snapshot, Timestamp};
use tracing::{debug, info, warn};

/// Counters describing one ingestion pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Candidates received from the lister.
    pub candidates: usize,
    /// Candidates skipped because their URL was already stored.
    pub duplicates: usize,
    /// New records added to the store.
    pub inserted: usize,
    /// New records whose page had no content.
    pub invalid: usize,
    /// End of coverage after the pass.
    pub coverage_end: Option<Timestamp>,
}

/// Ingest `candidates` into `store`.
///
/// A fetch failure aborts the pass and is returned as-is; records merged
/// before the failure stay in the in-memory store.
pub fn ingest<F>(store: &mut RecordStore, candidates: Vec<Snapshot>, fetcher: &F) -> Result<IngestReport>
where
    F: MetadataFetcher + ?Sized,
{
    ingest_with_checkpoint(store, candidates, fetcher, |_| Ok(()))
}

/// Ingest `candidates`, calling `checkpoint` whenever a new record raises
/// the end of coverage.
///
/// Candidates are processed oldest first (stable, so equal timestamps keep
/// their listing order), which keeps every checkpoint a consistent prefix
/// of the run.
pub fn ingest_with_checkpoint<F, C>(
    store: &mut RecordStore,
    mut candidates: Vec<Snapshot>,
    fetcher: &F,
    mut checkpoint: C,
) -> Result<IngestReport>
where
    F: MetadataFetcher + ?Sized,
    C: FnMut(&RecordStore) -> Result<()>,
{
    let mut report = IngestReport {
        candidates: candidates.len(),
        ..Default::default()
    };

    candidates.sort_by_key(|snapshot| snapshot.captured_at);

    for snapshot in candidates {
        if store.contains(&snapshot.url) {
            debug!(url = %snapshot.url, "skipping known page");
            report.duplicates += 1;
            continue;
        }

        info!(url = %snapshot.url, captured_at = %snapshot.captured_at, "retrieving metadata");
        let captured_at = snapshot.captured_at;
        let meta = fetcher.fetch(&snapshot.url)?;
        let record = Record::new(snapshot.url, meta, captured_at);

        if !record.valid {
            warn!(url = %record.url, "page has no description, storing as invalid");
            report.invalid += 1;
        }

        store.insert(record);
        report.inserted += 1;

        if store.extend_coverage(captured_at) {
            checkpoint(store)?;
        }
    }

    report.coverage_end = store.coverage().end;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::types::PageMeta;
    use std::cell::RefCell;

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_ymd_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn describe(url: &str) -> Result<PageMeta> {
        Ok(PageMeta::new(format!("prompt for {url}"), format!("{url}.png")))
    }

    #[test]
    fn test_ingest_into_empty_store() {
        let mut store = RecordStore::new();
        let candidates = vec![
            Snapshot::new("https://x/s/b", ts(2022, 2, 1)),
            Snapshot::new("https://x/s/a", ts(2022, 1, 1)),
        ];

        let report = ingest(&mut store, candidates, &describe).unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.duplicates, 0);
        assert_eq!(store.len(), 2);
        assert_eq!(store.coverage().end, Some(ts(2022, 2, 1)));
        assert!(store.records().values().all(|r| r.valid));
    }

    #[test]
    fn test_fetches_in_chronological_order() {
        let seen = RefCell::new(Vec::new());
        let fetcher = |url: &str| {
            seen.borrow_mut().push(url.to_string());
            describe(url)
        };

        let candidates = vec![
            Snapshot::new("https://x/s/c", ts(2022, 3, 1)),
            Snapshot::new("https://x/s/a", ts(2022, 1, 1)),
            Snapshot::new("https://x/s/tie2", ts(2022, 2, 1)),
            Snapshot::new("https://x/s/tie1", ts(2022, 2, 1)),
        ];
        let mut store = RecordStore::new();
        ingest(&mut store, candidates, &fetcher).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec!["https://x/s/a", "https://x/s/tie2", "https://x/s/tie1", "https://x/s/c"]
        );
    }

    #[test]
    fn test_duplicate_within_batch_fetched_once() {
        let calls = RefCell::new(0usize);
        let fetcher = |url: &str| {
            *calls.borrow_mut() += 1;
            describe(url)
        };

        let candidates = vec![
            Snapshot::new("https://x/s/a", ts(2022, 1, 1)),
            Snapshot::new("https://x/s/a", ts(2022, 5, 1)),
        ];
        let mut store = RecordStore::new();
        let report = ingest(&mut store, candidates, &fetcher).unwrap();

        assert_eq!(*calls.borrow(), 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(store.get("https://x/s/a").unwrap().captured_at, ts(2022, 1, 1));
        // The later capture of a known page does not extend coverage.
        assert_eq!(store.coverage().end, Some(ts(2022, 1, 1)));
    }

    #[test]
    fn test_empty_description_stored_invalid() {
        let fetcher = |url: &str| -> Result<PageMeta> {
            if url.ends_with("gone") {
                Ok(PageMeta::new("", ""))
            } else {
                describe(url)
            }
        };
        let candidates = vec![
            Snapshot::new("https://x/s/gone", ts(2022, 1, 1)),
            Snapshot::new("https://x/s/cat", ts(2022, 1, 2)),
        ];
        let mut store = RecordStore::new();
        let report = ingest(&mut store, candidates, &fetcher).unwrap();

        assert_eq!(report.invalid, 1);
        assert!(!store.get("https://x/s/gone").unwrap().valid);
        assert!(store.get("https://x/s/cat").unwrap().valid);
    }

    #[test]
    fn test_fetch_failure_aborts_pass() {
        let fetcher = |url: &str| -> Result<PageMeta> {
            if url.ends_with("broken") {
                Err(LedgerError::HttpStatus {
                    url: url.to_string(),
                    status: 503,
                })
            } else {
                describe(url)
            }
        };
        let candidates = vec![
            Snapshot::new("https://x/s/a", ts(2022, 1, 1)),
            Snapshot::new("https://x/s/broken", ts(2022, 1, 2)),
            Snapshot::new("https://x/s/c", ts(2022, 1, 3)),
        ];
        let mut store = RecordStore::new();
        let result = ingest(&mut store, candidates, &fetcher);

        assert!(matches!(result, Err(LedgerError::HttpStatus { status: 503, .. })));
        assert!(store.contains("https://x/s/a"));
        assert!(!store.contains("https://x/s/c"));
        assert_eq!(store.coverage().end, Some(ts(2022, 1, 1)));
    }

    #[test]
    fn test_checkpoint_called_per_extension() {
        let mut store = RecordStore::new();
        store.insert(Record::new("https://x/s/known", PageMeta::new("old", ""), ts(2021, 1, 1)));
        store.extend_coverage(ts(2022, 6, 1));

        let candidates = vec![
            Snapshot::new("https://x/s/known", ts(2022, 7, 1)),
            Snapshot::new("https://x/s/late", ts(2022, 5, 1)),
            Snapshot::new("https://x/s/new1", ts(2022, 7, 1)),
            Snapshot::new("https://x/s/new2", ts(2022, 8, 1)),
        ];

        let mut checkpoints = Vec::new();
        ingest_with_checkpoint(&mut store, candidates, &describe, |s: &RecordStore| {
            checkpoints.push((s.len(), s.coverage().end));
            Ok(())
        })
        .unwrap();

        assert_eq!(
            checkpoints,
            vec![(3, Some(ts(2022, 7, 1))), (4, Some(ts(2022, 8, 1)))]
        );
    }
}
