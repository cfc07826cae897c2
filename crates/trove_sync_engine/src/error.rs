//! Error types for the sync engine.

use thiserror::Error;
use trove_core::ItemId;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Result type for remote gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors reported by a [`crate::RemoteGateway`].
///
/// Gateway failures are recoverable from the engine's point of view: a
/// failed remote call degrades to the offline path (the mutation is
/// queued), it does not fail the user-visible operation.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Network-level failure: unreachable, timeout, connection reset.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The remote rejected an update/delete because the target no longer
    /// exists remotely.
    ///
    /// The coordinator treats this exactly like a retryable transport
    /// failure (a documented gap); the retry ceiling keeps a permanently
    /// conflicted entry from looping forever.
    #[error("conflict: remote record {id} no longer exists")]
    Conflict {
        /// The id the remote did not recognize.
        id: ItemId,
    },

    /// The remote rejected the request outright (auth, validation).
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The response could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl GatewayError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if a retry could plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Transport { retryable, .. } => *retryable,
            GatewayError::Conflict { .. } => true,
            GatewayError::Rejected(_) => false,
            GatewayError::Protocol(_) => false,
        }
    }
}

/// Errors that can occur in coordinator operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local persistence failed - fatal to the triggering call, surfaced to
    /// the caller; no partial write occurred.
    #[error("persistence error: {0}")]
    Persistence(#[from] trove_core::CoreError),

    /// A mutation targeted an item the local store does not hold.
    #[error("unknown item: {id}")]
    UnknownItem {
        /// The id the caller passed.
        id: ItemId,
    },

    /// A gateway call failed in a context where it cannot degrade to
    /// queueing (e.g. a manual refresh pull).
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(GatewayError::transport_retryable("connection reset").is_retryable());
        assert!(!GatewayError::transport_fatal("bad certificate").is_retryable());
        assert!(GatewayError::Conflict { id: 7 }.is_retryable());
        assert!(!GatewayError::Rejected("invalid payload".into()).is_retryable());
        assert!(!GatewayError::Protocol("truncated body".into()).is_retryable());
    }

    #[test]
    fn error_display() {
        let err = GatewayError::Conflict { id: 42 };
        assert_eq!(err.to_string(), "conflict: remote record 42 no longer exists");

        let err = SyncError::UnknownItem { id: 9 };
        assert_eq!(err.to_string(), "unknown item: 9");
    }

    #[test]
    fn core_error_converts() {
        let core = trove_core::CoreError::ItemNotFound { id: 1 };
        let err = SyncError::from(core);
        assert!(matches!(err, SyncError::Persistence(_)));
    }
}
