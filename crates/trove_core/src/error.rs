//! Error types for Trove core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core store and queue operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] trove_storage::StorageError),

    /// JSON encode/decode error.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A document passed to `put` was not a JSON object.
    #[error("document for collection {collection} is not an object")]
    NotAnObject {
        /// The target collection key.
        collection: String,
    },

    /// A document passed to `put` had no integer `id` field.
    #[error("document for collection {collection} has no integer id")]
    MissingId {
        /// The target collection key.
        collection: String,
    },

    /// An item lookup by id found nothing.
    #[error("item not found: {id}")]
    ItemNotFound {
        /// The id that was looked up.
        id: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::ItemNotFound { id: 42 };
        assert_eq!(err.to_string(), "item not found: 42");

        let err = CoreError::MissingId {
            collection: "items".into(),
        };
        assert!(err.to_string().contains("items"));
    }

    #[test]
    fn storage_error_converts() {
        let storage = trove_storage::StorageError::Locked;
        let err = CoreError::from(storage);
        assert!(matches!(err, CoreError::Storage(_)));
    }
}
