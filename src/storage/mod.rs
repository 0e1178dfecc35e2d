//! Durable storage for the record store.
//!
//! Storage backends move opaque bytes under a key; [`load_store`] and
//! [`save_store`] encode the [`RecordStore`] with MessagePack on top.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::{LedgerError, Result};
use crate::records::RecordStore;
use tracing::debug;

/// Key-value persistence keyed by store name.
pub trait DurableStorage {
    /// Read the bytes saved under `key`, or `None` if nothing was saved.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the bytes saved under `key`.
    fn save(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Load the store saved under `key`.
///
/// Missing state yields an empty store with absent coverage.
pub fn load_store<S>(storage: &S, key: &str) -> Result<RecordStore>
where
    S: DurableStorage + ?Sized,
{
    match storage.load(key)? {
        Some(bytes) => {
            let store: RecordStore = rmp_serde::from_slice(&bytes)?;
            debug!(key, records = store.len(), "loaded record store");
            Ok(store)
        }
        None => {
            debug!(key, "no saved record store, starting empty");
            Ok(RecordStore::new())
        }
    }
}

/// Save `store` under `key`, replacing any previous state.
pub fn save_store<S>(storage: &S, key: &str, store: &RecordStore) -> Result<()>
where
    S: DurableStorage + ?Sized,
{
    let bytes = rmp_serde::to_vec_named(store)?;
    storage.save(key, &bytes)?;
    debug!(key, records = store.len(), bytes = bytes.len(), "saved record store");
    Ok(())
}

/// Keys become file names, so they must be plain names.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains(|c: char| c == '/' || c == '\\' || c == '\0');
    if valid {
        Ok(())
    } else {
        Err(LedgerError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PageMeta, Record, Timestamp};

    fn sample_store() -> RecordStore {
        let at = Timestamp::from_ymd_hms(2022, 6, 1, 12, 0, 0).unwrap();
        let mut store = RecordStore::new();
        store.insert(Record::new("https://x/s/a", PageMeta::new("a cat", "https://i/a.png"), at));
        store.insert(Record::new("https://x/s/b", PageMeta::new("", ""), at));
        store.anchor_coverage(Timestamp::from_ymd_hms(2022, 1, 1, 0, 0, 0).unwrap());
        store.extend_coverage(at);
        store
    }

    #[test]
    fn test_load_missing_is_empty() {
        let storage = MemoryStorage::new();
        let store = load_store(&storage, "records").unwrap();
        assert!(store.is_empty());
        assert_eq!(store.coverage().start, None);
        assert_eq!(store.coverage().end, None);
    }

    #[test]
    fn test_save_then_load() {
        let storage = MemoryStorage::new();
        let store = sample_store();

        save_store(&storage, "records", &store).unwrap();
        let loaded = load_store(&storage, "records").unwrap();

        assert_eq!(loaded, store);
        assert!(!loaded.get("https://x/s/b").unwrap().valid);
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let storage = MemoryStorage::new();
        storage.save("records", b"not messagepack").unwrap();
        assert!(matches!(
            load_store(&storage, "records"),
            Err(LedgerError::Deserialization(_))
        ));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("records").is_ok());
        assert!(validate_key("dalle-2022").is_ok());
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            assert!(matches!(validate_key(bad), Err(LedgerError::InvalidKey(_))), "{bad}");
        }
    }
}
