//! Run configuration.

use crate::archive::DEFAULT_CDX_ENDPOINT;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Pages published on the image sharing site, one image per page.
pub const DEFAULT_URL_PATTERN: &str = "https://labs.openai.com/s/*";

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.1 (Windows NT 5.1; rv:40.0) Gecko/20100101 Firefox/40.0";

/// Default store key.
pub const DEFAULT_STORE_KEY: &str = "records";

/// When the record store is written back during a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CheckpointPolicy {
    /// Save once after ingestion completes.
    #[default]
    EndOfRun,

    /// Also save after every new record that raised the end of coverage,
    /// so an interrupted run keeps its progress.
    EveryExtension,
}

impl FromStr for CheckpointPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "end-of-run" => Ok(CheckpointPolicy::EndOfRun),
            "every-extension" => Ok(CheckpointPolicy::EveryExtension),
            other => Err(format!(
                "unknown checkpoint policy {other:?} (expected end-of-run or every-extension)"
            )),
        }
    }
}

/// Ledger configuration.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// Directory holding ledger files.
    pub store_dir: PathBuf,

    /// Name of the record store inside `store_dir`.
    pub store_key: String,

    /// Archive URL pattern to discover.
    pub url_pattern: String,

    /// User agent for archive and page requests.
    pub user_agent: String,

    /// CDX server endpoint.
    pub cdx_endpoint: String,

    /// Rows requested per CDX page.
    pub cdx_page_size: usize,

    /// Per-request timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,

    pub checkpoint: CheckpointPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("."),
            store_key: DEFAULT_STORE_KEY.to_string(),
            url_pattern: DEFAULT_URL_PATTERN.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cdx_endpoint: DEFAULT_CDX_ENDPOINT.to_string(),
            cdx_page_size: 5000,
            request_timeout: Some(Duration::from_secs(30)),
            checkpoint: CheckpointPolicy::EndOfRun,
        }
    }
}
