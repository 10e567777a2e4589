//! Per-run batch reports shared by the pipelines.

use carpark_core::{DocumentStoreError, FieldPathError};
use thiserror::Error;

/// Why a single facility or availability row could not be applied.
#[derive(Debug, Error)]
pub enum ItemError {
    /// The document store rejected the write.
    #[error(transparent)]
    Store(#[from] DocumentStoreError),
    /// The document could not be encoded as JSON.
    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
    /// The target field path was invalid.
    #[error(transparent)]
    Path(#[from] FieldPathError),
}

/// One item that failed, keyed by facility code.
#[derive(Debug)]
pub struct ItemFailure {
    /// Facility code the item was destined for.
    pub key: String,
    /// What went wrong.
    pub error: ItemError,
}

impl ItemFailure {
    /// Record a failure for `key`.
    pub fn new(key: impl Into<String>, error: impl Into<ItemError>) -> Self {
        Self {
            key: key.into(),
            error: error.into(),
        }
    }
}
