//! Remote collaborators: listing archived snapshots and scraping page
//! metadata.
//!
//! The ingestion core only sees the [`SnapshotLister`] and
//! [`MetadataFetcher`] traits; the Wayback CDX and Open Graph
//! implementations live in the submodules.

mod cdx;
mod page;

pub use cdx::{CdxLister, DEFAULT_CDX_ENDPOINT};
pub use page::{parse_page_meta, OgMetaFetcher};

use crate::error::Result;
use crate::types::{PageMeta, Snapshot, Timestamp};
use reqwest::blocking::Client;
use std::time::Duration;

/// Lists archived captures of pages matching a URL pattern.
///
/// Results may contain the same page more than once and need not be sorted.
pub trait SnapshotLister {
    fn list_snapshots(&self, url_pattern: &str, since: Timestamp, until: Timestamp) -> Result<Vec<Snapshot>>;
}

/// Fetches metadata for a single page.
///
/// A page without usable content yields an empty description; only
/// transport failures are errors.
pub trait MetadataFetcher {
    fn fetch(&self, url: &str) -> Result<PageMeta>;
}

impl<F> MetadataFetcher for F
where
    F: Fn(&str) -> Result<PageMeta>,
{
    fn fetch(&self, url: &str) -> Result<PageMeta> {
        self(url)
    }
}

impl<F> SnapshotLister for F
where
    F: Fn(&str, Timestamp, Timestamp) -> Result<Vec<Snapshot>>,
{
    fn list_snapshots(&self, url_pattern: &str, since: Timestamp, until: Timestamp) -> Result<Vec<Snapshot>> {
        self(url_pattern, since, until)
    }
}

/// Build the blocking HTTP client shared by the lister and fetcher.
pub fn http_client(user_agent: &str, timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder().user_agent(user_agent);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}
