// src/infra/errors.rs - Error types for the storage layer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The database could not be opened or created, or the store server
    /// has shut down.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// SQLite rejected a read, write or delete.
    #[error("Transaction failed: {0}")]
    Transaction(#[from] rusqlite::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::StorageUnavailable(message.into())
    }

    /// True when retrying later may succeed without any change to the data.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::StorageUnavailable(_) | StoreError::Transaction(_)
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
