//! # Archive Ledger
//!
//! Incrementally discovers archived snapshots of a URL pattern, scrapes
//! metadata for pages it has not seen before, and accumulates them in a
//! durable, deduplicated record store keyed by original URL.
//!
//! ## Core Concepts
//!
//! - **Records**: One per page URL; the first write wins and records are
//!   never replaced
//! - **Coverage**: The time range already ingested; its end only moves forward
//! - **Planning**: Runs that start inside the covered range resume from its end
//! - **Ingestion**: New snapshots are merged oldest first, skipping known pages
//!
//! ## Example
//!
//! ```ignore
//! use archive_ledger::{archive, FileStorage, Timestamp, Updater};
//!
//! let client = archive::http_client(archive_ledger::config::DEFAULT_USER_AGENT, None)?;
//! let lister = archive::CdxLister::new(client.clone(), archive::DEFAULT_CDX_ENDPOINT, 5000);
//! let fetcher = archive::OgMetaFetcher::new(client);
//! let storage = FileStorage::new("./ledger");
//!
//! let outcome = Updater::new(&storage, &lister, &fetcher)
//!     .run("2022-06-01".parse()?, Timestamp::now())?;
//! println!("{} records", outcome.store.len());
//! ```

pub mod archive;
pub mod config;
pub mod coverage;
pub mod error;
pub mod ingest;
pub mod records;
pub mod render;
pub mod storage;
pub mod types;
pub mod update;

// Re-exports
pub use archive::{CdxLister, MetadataFetcher, OgMetaFetcher, SnapshotLister};
pub use config::{CheckpointPolicy, LedgerConfig};
pub use coverage::plan;
pub use error::{LedgerError, Result};
pub use ingest::{ingest, ingest_with_checkpoint, IngestReport};
pub use records::RecordStore;
pub use render::render_markdown;
pub use storage::{load_store, save_store, DurableStorage, FileStorage, MemoryStorage};
pub use types::*;
pub use update::{UpdateOutcome, Updater};
