//! In-process storage backend.

use super::{validate_key, DurableStorage};
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Vec<u8>>,
    saves: usize,
}

/// Storage that keeps saved bytes in memory. Used for dry runs and tests.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.inner.lock().saves
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }
}

impl DurableStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.inner.lock().entries.get(key).cloned())
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        validate_key(key)?;
        let mut inner = self.inner.lock();
        inner.entries.insert(key.to_string(), bytes.to_vec());
        inner.saves += 1;
        Ok(())
    }
}
