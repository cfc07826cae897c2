//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Another process holds the storage directory lock.
    #[error("storage locked: another process has exclusive access")]
    Locked,

    /// The key is not usable as a storage key.
    #[error("invalid storage key: {key:?}")]
    InvalidKey {
        /// The offending key.
        key: String,
    },

    /// The storage directory is in an unusable state.
    #[error("storage corrupted: {0}")]
    Corrupted(String),
}
