//! Errors shared by every snapshot store.

use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by snapshot stores regardless of the underlying medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing medium could not be read, written or decoded.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What the store was doing, including the path for file stores.
        message: String,
        /// Underlying I/O or encoding failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A writer panicked while holding the store lock.
    #[error("storage lock poisoned by a panicked writer")]
    Poisoned,
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
