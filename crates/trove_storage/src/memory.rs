//! In-memory storage backend for testing.

use crate::backend::{validate_key, StorageBackend};
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory storage backend.
///
/// This backend stores all values in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use trove_storage::{MemoryBackend, StorageBackend};
///
/// let backend = MemoryBackend::new();
/// backend.write("items", b"[]").unwrap();
/// assert_eq!(backend.read("items").unwrap(), Some(b"[]".to_vec()));
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-populated with values.
    ///
    /// Useful for testing reopen/recovery scenarios.
    #[must_use]
    pub fn with_values(values: HashMap<String, Vec<u8>>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    /// Returns a copy of all stored values.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn values(&self) -> HashMap<String, Vec<u8>> {
        self.values.read().clone()
    }

    /// Clears all values.
    pub fn clear(&self) {
        self.values.write().clear();
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.values.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        self.values.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.values.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.values.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    #[test]
    fn write_and_read() {
        let backend = MemoryBackend::new();
        backend.write("items", b"hello").unwrap();
        assert_eq!(backend.read("items").unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn missing_key_is_none() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.read("items").unwrap(), None);
    }

    #[test]
    fn remove_and_clear() {
        let backend = MemoryBackend::new();
        backend.write("a1", b"1").unwrap();
        backend.write("b2", b"2").unwrap();

        backend.remove("a1").unwrap();
        assert_eq!(backend.read("a1").unwrap(), None);
        assert_eq!(backend.read("b2").unwrap(), Some(b"2".to_vec()));

        backend.clear();
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn with_values_prepopulates() {
        let mut seed = HashMap::new();
        seed.insert("items".to_string(), b"[7]".to_vec());

        let backend = MemoryBackend::with_values(seed);
        assert_eq!(backend.read("items").unwrap(), Some(b"[7]".to_vec()));
    }

    #[test]
    fn invalid_key_rejected() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            backend.read("No Good"),
            Err(StorageError::InvalidKey { .. })
        ));
    }

    #[test]
    fn shared_across_threads() {
        use std::sync::Arc;
        use std::thread;

        let backend = Arc::new(MemoryBackend::new());
        let writer = Arc::clone(&backend);

        let handle = thread::spawn(move || {
            writer.write("items", b"[1]").unwrap();
        });
        handle.join().unwrap();

        assert_eq!(backend.read("items").unwrap(), Some(b"[1]".to_vec()));
    }
}
