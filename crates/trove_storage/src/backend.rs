//! Storage backend trait definition.

use crate::error::{StorageError, StorageResult};

/// A keyed blob store for Trove.
///
/// Storage backends are **opaque keyed byte stores**. They provide whole-value
/// operations on named keys. The engine owns all document interpretation -
/// backends do not understand collections, records, or queue entries.
///
/// # Invariants
///
/// - `read` returns exactly the bytes most recently written for that key
/// - `write` fully replaces the key's value or fails; no partial value is
///   ever observable
/// - After `write` returns, the value survives process termination (for
///   persistent backends)
/// - Backends must be `Send + Sync`; the Local Store and the Offline Queue
///   share one backend instance
///
/// # Implementors
///
/// - [`super::MemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns `None` if the key has never been written or was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// After this returns successfully the new value is durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the write fails. On error
    /// the previous value (if any) is still intact.
    fn write(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Removes the value stored under `key`. No-op if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the removal fails.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Returns all keys that currently hold a value, in unspecified order.
    ///
    /// # Errors
    ///
    /// Returns an error if the key listing fails.
    fn keys(&self) -> StorageResult<Vec<String>>;
}

/// Validates a storage key.
///
/// Keys name files on disk for the file backend, so they are restricted to
/// lowercase alphanumerics and underscores.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidKey { key: key.into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_keys() {
        assert!(validate_key("items").is_ok());
        assert!(validate_key("offline_queue").is_ok());
        assert!(validate_key("search_history").is_ok());
        assert!(validate_key("v2").is_ok());
    }

    #[test]
    fn invalid_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key("Items").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key("with space").is_err());
        assert!(validate_key("dot.json").is_err());
    }
}
