use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use archive_ledger::archive::{self, CdxLister, OgMetaFetcher, DEFAULT_CDX_ENDPOINT};
use archive_ledger::config::{
    CheckpointPolicy, LedgerConfig, DEFAULT_STORE_KEY, DEFAULT_URL_PATTERN,
};
use archive_ledger::render::{render_markdown, DEFAULT_TITLE};
use archive_ledger::{load_store, FileStorage, Timestamp, Updater};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "archive-ledger",
    about = "Discover newly archived pages and export them as a markdown digest"
)]
struct Cli {
    /// Export records captured since this date (YYYY-MM-DD or YYYY-MM-DDThh:mm:ss).
    #[arg(short, long, env = "ARCHIVE_LEDGER_SINCE", default_value = "2020-01-01")]
    since: Timestamp,

    /// Output file for the markdown digest.
    #[arg(short = 'f', long, env = "ARCHIVE_LEDGER_OUTPUT", default_value = "dallelinks.md")]
    output: PathBuf,

    /// Directory holding the record store.
    #[arg(long, env = "ARCHIVE_LEDGER_STORE_DIR", default_value = ".")]
    store_dir: PathBuf,

    /// Record store name inside the store directory.
    #[arg(long, env = "ARCHIVE_LEDGER_STORE_KEY", default_value = DEFAULT_STORE_KEY)]
    store_key: String,

    /// Archive URL pattern to discover.
    #[arg(long, env = "ARCHIVE_LEDGER_URL_PATTERN", default_value = DEFAULT_URL_PATTERN)]
    url_pattern: String,

    /// CDX server endpoint.
    #[arg(long, env = "ARCHIVE_LEDGER_CDX_ENDPOINT", default_value = DEFAULT_CDX_ENDPOINT)]
    cdx_endpoint: String,

    /// Document heading.
    #[arg(long, default_value = DEFAULT_TITLE)]
    title: String,

    /// Per-request timeout in seconds; 0 waits indefinitely.
    #[arg(long, env = "ARCHIVE_LEDGER_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// When to save the store: end-of-run or every-extension.
    #[arg(long, env = "ARCHIVE_LEDGER_CHECKPOINT", default_value = "end-of-run")]
    checkpoint: CheckpointPolicy,

    /// Render from the saved store without querying the archive.
    #[arg(long, default_value_t = false)]
    skip_update: bool,
}

impl Cli {
    fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            store_dir: self.store_dir.clone(),
            store_key: self.store_key.clone(),
            url_pattern: self.url_pattern.clone(),
            cdx_endpoint: self.cdx_endpoint.clone(),
            request_timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
            checkpoint: self.checkpoint,
            ..LedgerConfig::default()
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.ledger_config();
    let storage = FileStorage::new(&config.store_dir);

    let store = if cli.skip_update {
        load_store(&storage, &config.store_key)
            .with_context(|| format!("failed to load store from {}", storage.dir().display()))?
    } else {
        let client = archive::http_client(&config.user_agent, config.request_timeout)
            .context("failed to build HTTP client")?;
        let lister = CdxLister::new(client.clone(), config.cdx_endpoint.clone(), config.cdx_page_size);
        let fetcher = OgMetaFetcher::new(client);

        Updater::from_config(&config, &storage, &lister, &fetcher)
            .run(cli.since, Timestamp::now())
            .context("update run failed")?
            .store
    };

    let document = render_markdown(&store, cli.since, &cli.title);
    fs::write(&cli.output, document)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    info!(output = %cli.output.display(), records = store.len(), "markdown saved");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
