//! Error types for the archive ledger.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage unavailable at {}: {source}", .path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Storage is locked by another writer: {}", .0.display())]
    Locked(PathBuf),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid ledger format: {0}")]
    InvalidFormat(String),

    #[error("Checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: u32, got: u32 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Snapshot listing failed: {0}")]
    Listing(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl LedgerError {
    /// Whether a later run may succeed without intervention.
    ///
    /// Remote failures abort the run but leave persisted state intact.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LedgerError::Http(_) | LedgerError::HttpStatus { .. } | LedgerError::Listing(_)
        )
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Deserialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for LedgerError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for LedgerError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        LedgerError::Deserialization(e.to_string())
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
