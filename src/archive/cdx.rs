//! Wayback Machine CDX snapshot listing.

use super::SnapshotLister;
use crate::error::{LedgerError, Result};
use crate::types::{Snapshot, Timestamp};
use reqwest::blocking::Client;
use tracing::debug;

/// Default public CDX endpoint.
pub const DEFAULT_CDX_ENDPOINT: &str = "http://web.archive.org/cdx/search/cdx";

/// One page of CDX results.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct CdxPage {
    pub snapshots: Vec<Snapshot>,
    pub resume_key: Option<String>,
}

/// Lists snapshots through the CDX server API, following resume keys.
pub struct CdxLister {
    client: Client,
    endpoint: String,
    page_size: usize,
}

impl CdxLister {
    pub fn new(client: Client, endpoint: impl Into<String>, page_size: usize) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            page_size: page_size.max(1),
        }
    }

    fn fetch_page(
        &self,
        url_pattern: &str,
        since: Timestamp,
        until: Timestamp,
        resume_key: Option<&str>,
    ) -> Result<CdxPage> {
        let mut query: Vec<(&str, String)> = vec![
            ("url", url_pattern.to_string()),
            ("from", since.to_wayback()),
            ("to", until.to_wayback()),
            ("output", "json".to_string()),
            ("fl", "timestamp,original".to_string()),
            ("showResumeKey", "true".to_string()),
            ("limit", self.page_size.to_string()),
        ];
        if let Some(key) = resume_key {
            query.push(("resumeKey", key.to_string()));
        }

        let response = self.client.get(&self.endpoint).query(&query).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::HttpStatus {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        parse_cdx_page(&response.text()?)
    }
}

impl SnapshotLister for CdxLister {
    fn list_snapshots(&self, url_pattern: &str, since: Timestamp, until: Timestamp) -> Result<Vec<Snapshot>> {
        let mut snapshots = Vec::new();
        let mut resume_key: Option<String> = None;

        loop {
            let page = self.fetch_page(url_pattern, since, until, resume_key.as_deref())?;
            debug!(
                rows = page.snapshots.len(),
                more = page.resume_key.is_some(),
                "received CDX page"
            );
            snapshots.extend(page.snapshots);

            match page.resume_key {
                // A repeated key would loop forever.
                Some(key) if resume_key.as_deref() != Some(key.as_str()) => resume_key = Some(key),
                _ => break,
            }
        }

        Ok(snapshots)
    }
}

/// Parse a JSON CDX response.
///
/// The first row names the columns. With `showResumeKey` the data rows are
/// followed by an empty row and a single-element row holding the key.
pub(crate) fn parse_cdx_page(body: &str) -> Result<CdxPage> {
    if body.trim().is_empty() {
        return Ok(CdxPage::default());
    }

    let rows: Vec<Vec<String>> = serde_json::from_str(body)
        .map_err(|e| LedgerError::Listing(format!("malformed CDX response: {e}")))?;

    let mut rows = rows.into_iter();
    let header = match rows.next() {
        Some(header) => header,
        None => return Ok(CdxPage::default()),
    };
    let column = |name: &str| {
        header
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| LedgerError::Listing(format!("CDX response has no {name} column")))
    };
    let timestamp_col = column("timestamp")?;
    let original_col = column("original")?;

    let mut page = CdxPage::default();
    let mut after_gap = false;
    for row in rows {
        if row.is_empty() {
            after_gap = true;
            continue;
        }
        if after_gap {
            page.resume_key = row.into_iter().next();
            break;
        }
        let (Some(timestamp), Some(original)) = (row.get(timestamp_col), row.get(original_col)) else {
            return Err(LedgerError::Listing(format!("short CDX row: {row:?}")));
        };
        page.snapshots
            .push(Snapshot::new(original.clone(), Timestamp::parse_wayback(timestamp)?));
    }

    Ok(page)
}
