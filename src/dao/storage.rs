use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or rejected the request outright.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The compare-and-swap precondition failed: the stored record changed
    /// since the writer read it. The proposed write was discarded, never
    /// partially applied.
    #[error("conflicting write on room `{code}`: record changed since read")]
    Conflict {
        /// Join code of the contended room.
        code: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a conflict error for the given room code.
    pub fn conflict(code: impl Into<String>) -> Self {
        StorageError::Conflict { code: code.into() }
    }
}
