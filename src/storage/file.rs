//! File-backed storage.
//!
//! Each key is one file `<dir>/<key>.ledger`:
//!
//! ```text
//! magic "LDG\0" | version u8 | payload length u64 LE | payload | crc32 u32 LE
//! ```
//!
//! Saves write a temp file and rename it over the target while holding an
//! exclusive lock on `<dir>/<key>.lock`, so a crash never leaves a torn
//! ledger behind.

use super::{validate_key, DurableStorage};
use crate::error::{LedgerError, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// Magic bytes for ledger files.
const LEDGER_MAGIC: &[u8; 4] = b"LDG\0";

/// Current ledger format version.
const LEDGER_VERSION: u8 = 1;

/// Header bytes before the payload.
const HEADER_LEN: u64 = 4 + 1 + 8;

/// Directory of ledger files.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the ledger file for `key`.
    pub fn ledger_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.ledger"))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.lock"))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.ledger.tmp"))
    }

    fn acquire_lock(&self, key: &str) -> Result<File> {
        let lock_path = self.lock_path(key);
        let lock_file = File::create(&lock_path).map_err(|source| LedgerError::StorageUnavailable {
            path: lock_path.clone(),
            source,
        })?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| LedgerError::Locked(lock_path))?;

        Ok(lock_file)
    }

    fn write_ledger(path: &Path, payload: &[u8]) -> Result<()> {
        let mut file = File::create(path)?;

        file.write_all(LEDGER_MAGIC)?;
        file.write_all(&[LEDGER_VERSION])?;
        file.write_all(&(payload.len() as u64).to_le_bytes())?;
        file.write_all(payload)?;

        let checksum = crc32fast::hash(payload);
        file.write_all(&checksum.to_le_bytes())?;

        file.sync_all()?;
        Ok(())
    }

    fn read_ledger(mut file: File) -> Result<Vec<u8>> {
        let file_len = file.metadata()?.len();

        let mut magic = [0u8; 4];
        read_exact(&mut file, &mut magic)?;
        if &magic != LEDGER_MAGIC {
            return Err(LedgerError::InvalidFormat("Invalid ledger magic".into()));
        }

        let mut version = [0u8; 1];
        read_exact(&mut file, &mut version)?;
        if version[0] != LEDGER_VERSION {
            return Err(LedgerError::InvalidFormat(format!(
                "Unsupported ledger version: {}",
                version[0]
            )));
        }

        let mut len_bytes = [0u8; 8];
        read_exact(&mut file, &mut len_bytes)?;
        let len = u64::from_le_bytes(len_bytes);
        if len.checked_add(HEADER_LEN + 4).map_or(true, |n| n > file_len) {
            return Err(LedgerError::InvalidFormat(format!(
                "Ledger payload length {len} exceeds file size {file_len}"
            )));
        }

        let mut payload = vec![0u8; len as usize];
        read_exact(&mut file, &mut payload)?;

        let mut checksum_bytes = [0u8; 4];
        read_exact(&mut file, &mut checksum_bytes)?;
        let expected = u32::from_le_bytes(checksum_bytes);
        let got = crc32fast::hash(&payload);
        if expected != got {
            return Err(LedgerError::ChecksumMismatch { expected, got });
        }

        Ok(payload)
    }
}

fn read_exact(file: &mut File, buf: &mut [u8]) -> Result<()> {
    file.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => LedgerError::InvalidFormat("Truncated ledger file".into()),
        _ => LedgerError::Io(e),
    })
}

impl DurableStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        let path = self.ledger_path(key);

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(LedgerError::StorageUnavailable { path, source }),
        };

        Self::read_ledger(file).map(Some)
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        validate_key(key)?;
        fs::create_dir_all(&self.dir).map_err(|source| LedgerError::StorageUnavailable {
            path: self.dir.clone(),
            source,
        })?;

        // Held until the end of this scope.
        let _lock = self.acquire_lock(key)?;

        let temp = self.temp_path(key);
        if let Err(e) = Self::write_ledger(&temp, bytes) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }
        if let Err(e) = fs::rename(&temp, self.ledger_path(key)) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        Ok(())
    }
}
