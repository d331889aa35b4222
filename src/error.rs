//! Error types for the history store.

use thiserror::Error;

/// Failures surfaced by the history store and its query helpers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An operation ran against a store that was never opened or was already closed.
    #[error("{op}: history store is not initialized")]
    NotInitialized { op: &'static str },

    /// The database file could not be opened, read, or written.
    #[error("{op}: storage unavailable")]
    StorageUnavailable {
        op: &'static str,
        #[source]
        source: StorageCause,
    },

    /// A caller-supplied parameter violates a precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Underlying cause of a [`StoreError::StorageUnavailable`].
#[derive(Debug, Error)]
pub enum StorageCause {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn storage(op: &'static str, source: impl Into<StorageCause>) -> Self {
        StoreError::StorageUnavailable {
            op,
            source: source.into(),
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        StoreError::InvalidArgument(msg.into())
    }

    /// True for caller mistakes rather than environment failures.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, StoreError::InvalidArgument(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Tag a fallible storage call with the operation it belongs to.
pub(crate) trait StorageContext<T> {
    fn during(self, op: &'static str) -> Result<T>;
}

impl<T, E: Into<StorageCause>> StorageContext<T> for std::result::Result<T, E> {
    fn during(self, op: &'static str) -> Result<T> {
        self.map_err(|e| StoreError::storage(op, e))
    }
}
