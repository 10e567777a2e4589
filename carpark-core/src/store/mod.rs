//! Persistence seam for facility documents.
//!
//! The [`DocumentStore`] trait models a keyed document database with
//! partial-update semantics. Pipelines depend on the trait only; the CLI
//! wires in [`SqliteDocumentStore`] and tests use the in-memory double from
//! `test_support`.

#[cfg(feature = "store-sqlite")]
use std::path::PathBuf;

use serde_json::{Map, Value};
use thiserror::Error;

mod merge;
mod path;
#[cfg(feature = "store-sqlite")]
mod sqlite;

pub(crate) use merge::{merge_top_level, set_nested};
pub use path::{FieldPath, FieldPathError};
#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteDocumentStore;

/// Collection holding one document per car-park facility.
pub const CAR_PARKS: &str = "car_parks";

/// JSON object stored per key.
///
/// `serde_json` is built without `preserve_order`, so maps are key-sorted and
/// serialise deterministically.
pub type Document = Map<String, Value>;

/// Errors raised by [`DocumentStore`] implementations.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// A partial update targeted a document that does not exist.
    #[error("document {collection}/{key} does not exist")]
    NotFound {
        /// Collection that was searched.
        collection: String,
        /// Missing document key.
        key: String,
    },
    /// The backing database could not be opened or initialised.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to open document store at {path}: {source}")]
    Open {
        /// Location of the database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A backend query failed.
    #[cfg(feature = "store-sqlite")]
    #[error("SQLite operation on {key} failed: {source}")]
    Sql {
        /// Document key being read or written.
        key: String,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A document could not be encoded for storage.
    #[error("failed to serialise document {key}: {source}")]
    Serialize {
        /// Document key being written.
        key: String,
        /// JSON encoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A stored body was not a JSON object.
    #[error("stored document {key} is corrupt: {reason}")]
    Corrupt {
        /// Document key being read.
        key: String,
        /// Description of the problem.
        reason: String,
    },
    /// A failure injected by a test double.
    #[cfg(any(test, feature = "test-support"))]
    #[error("write to {key} rejected: {message}")]
    Injected {
        /// Document key the failure was configured for.
        key: String,
        /// Configured failure message.
        message: String,
    },
}

impl DocumentStoreError {
    /// Whether the error reports a missing document.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Keyed document storage with field-level merge semantics.
///
/// Writes take `&mut self`: implementations are used from a single
/// run-to-completion task and backends such as SQLite need exclusive access
/// for transactions.
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "store-sqlite")]
/// # fn main() -> Result<(), carpark_core::DocumentStoreError> {
/// use carpark_core::{CAR_PARKS, Document, DocumentStore, FieldPath, SqliteDocumentStore};
/// use serde_json::json;
///
/// let mut store = SqliteDocumentStore::open_in_memory()?;
/// let mut fields = Document::new();
/// fields.insert("carpark".into(), json!({"code": "A0004"}));
/// store.set_document(CAR_PARKS, "A0004", &fields)?;
///
/// let path = FieldPath::from_segments(["availability", "C", "lotsAvailable"])
///     .expect("non-empty path");
/// store.update_field(CAR_PARKS, "A0004", &path, json!(12))?;
///
/// let document = store.get_document(CAR_PARKS, "A0004")?.expect("stored");
/// assert_eq!(document["availability"]["C"]["lotsAvailable"], 12);
/// assert_eq!(document["carpark"]["code"], "A0004");
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "store-sqlite"))]
/// # fn main() {}
/// ```
pub trait DocumentStore {
    /// Upsert `fields` into the document at `key`.
    ///
    /// Each top-level field in `fields` replaces the stored field of the same
    /// name. Stored top-level fields absent from `fields` are preserved.
    fn set_document(
        &mut self,
        collection: &str,
        key: &str,
        fields: &Document,
    ) -> Result<(), DocumentStoreError>;

    /// Set one nested field of an existing document.
    ///
    /// Intermediate maps are created as needed. Returns
    /// [`DocumentStoreError::NotFound`] when no document exists at `key`.
    fn update_field(
        &mut self,
        collection: &str,
        key: &str,
        path: &FieldPath,
        value: Value,
    ) -> Result<(), DocumentStoreError>;

    /// Read back the document at `key`, if any.
    fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, DocumentStoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &mut S {
    fn set_document(
        &mut self,
        collection: &str,
        key: &str,
        fields: &Document,
    ) -> Result<(), DocumentStoreError> {
        (**self).set_document(collection, key, fields)
    }

    fn update_field(
        &mut self,
        collection: &str,
        key: &str,
        path: &FieldPath,
        value: Value,
    ) -> Result<(), DocumentStoreError> {
        (**self).update_field(collection, key, path, value)
    }

    fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, DocumentStoreError> {
        (**self).get_document(collection, key)
    }
}
