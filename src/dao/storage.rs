use std::error::Error;
use thiserror::Error;

/// Result alias for arena store operations.
pub type StorageResult<T> = Result<T, StorageError>;

type BoxedCause = Box<dyn Error + Send + Sync>;

/// Backend-agnostic failure of an arena store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or answered with an error.
    #[error("{backend} unavailable")]
    Unavailable {
        backend: &'static str,
        #[source]
        cause: BoxedCause,
    },
    /// The backend answered but refused the write.
    #[error("{backend} rejected the write: {reason}")]
    Rejected {
        backend: &'static str,
        reason: String,
    },
}

impl StorageError {
    /// Wrap a backend failure that leaves the store unusable for now.
    pub fn unavailable(backend: &'static str, cause: impl Error + Send + Sync + 'static) -> Self {
        Self::Unavailable {
            backend,
            cause: Box::new(cause),
        }
    }

    /// A write the backend refused while otherwise healthy.
    pub fn rejected(backend: &'static str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            backend,
            reason: reason.into(),
        }
    }

    /// Whether the failure points at the backend being down.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
