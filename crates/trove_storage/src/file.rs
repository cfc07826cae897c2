//! File-based storage backend for persistent storage.
//!
//! Directory layout:
//!
//! ```text
//! <dir>/
//! ├─ LOCK            # Advisory lock for single-process access
//! ├─ items.json      # One file per key
//! ├─ offline_queue.json
//! └─ ...
//! ```
//!
//! The LOCK file ensures only one process uses the store directory at a
//! time. Writes go through a temp file followed by a rename, so a crash
//! mid-write leaves the previous value intact.

use crate::backend::{validate_key, StorageBackend};
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const VALUE_EXT: &str = "json";

/// A file-based storage backend.
///
/// Each key is stored as `<dir>/<key>.json`. Data survives process
/// restarts.
///
/// # Durability
///
/// `write` creates `<key>.json.tmp`, writes the full value, calls
/// `sync_all`, then renames over `<key>.json`. Readers never observe a
/// partial value.
///
/// # Thread Safety
///
/// The backend is thread-safe; a single internal mutex serializes writes
/// to the directory.
///
/// # Example
///
/// ```no_run
/// use trove_storage::{FileBackend, StorageBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new("trove_data")).unwrap();
/// backend.write("items", b"[]").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
    write_lock: Mutex<()>,
    /// Lock file handle, held for the lifetime of the backend.
    _lock_file: File,
}

impl FileBackend {
    /// Opens or creates a storage directory at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - The path exists but is not a directory
    /// - Another process holds the LOCK file (returns [`StorageError::Locked`])
    pub fn open(dir: &Path) -> StorageResult<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        if !dir.is_dir() {
            return Err(StorageError::Corrupted(format!(
                "path is not a directory: {}",
                dir.display()
            )));
        }

        let lock_path = dir.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked);
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            write_lock: Mutex::new(()),
            _lock_file: lock_file,
        })
    }

    /// Returns the storage directory path.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{VALUE_EXT}"))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        match fs::read(self.value_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        let _guard = self.write_lock.lock();

        let final_path = self.value_path(key);
        let tmp_path = self.dir.join(format!("{key}.{VALUE_EXT}.tmp"));

        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(value)?;
        tmp.sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let _guard = self.write_lock.lock();
        match fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(stem) = name.strip_suffix(&format!(".{VALUE_EXT}")) {
                if validate_key(stem).is_ok() {
                    keys.push(stem.to_string());
                }
            }
        }
        Ok(keys)
    }
}
