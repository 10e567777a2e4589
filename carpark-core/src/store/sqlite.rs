//! SQLite-backed document store.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use log::debug;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde_json::Value;

use super::{
    Document, DocumentStore, DocumentStoreError, FieldPath, merge_top_level, set_nested,
};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    key TEXT NOT NULL,
    body TEXT NOT NULL,
    PRIMARY KEY (collection, key)
)";

/// Document store persisting JSON bodies in a single SQLite table.
///
/// Every write is a read-modify-write inside one immediate transaction, so a
/// partial update never observes or leaves a half-merged document, and
/// concurrent writers on separate connections wait on the busy timeout
/// instead of failing the lock upgrade.
pub struct SqliteDocumentStore {
    connection: Connection,
    path: Option<PathBuf>,
}

impl fmt::Debug for SqliteDocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDocumentStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteDocumentStore {
    /// Open or create the database at `path` and ensure the schema exists.
    ///
    /// The parent directory must already exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocumentStoreError> {
        let path = path.as_ref();
        let open_error = |source| DocumentStoreError::Open {
            path: path.to_path_buf(),
            source,
        };
        let connection = Connection::open(path).map_err(open_error)?;
        connection.execute(SCHEMA, []).map_err(open_error)?;
        debug!("opened document store at {}", path.display());
        Ok(Self {
            connection,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a transient in-memory database.
    pub fn open_in_memory() -> Result<Self, DocumentStoreError> {
        let open_error = |source| DocumentStoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        };
        let connection = Connection::open_in_memory().map_err(open_error)?;
        connection.execute(SCHEMA, []).map_err(open_error)?;
        Ok(Self {
            connection,
            path: None,
        })
    }

    /// Number of documents stored in `collection`.
    pub fn count(&self, collection: &str) -> Result<usize, DocumentStoreError> {
        let count: i64 = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![collection],
                |row| row.get(0),
            )
            .map_err(|source| DocumentStoreError::Sql {
                key: collection.to_owned(),
                source,
            })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn modify<F>(
        &mut self,
        collection: &str,
        key: &str,
        create_missing: bool,
        apply: F,
    ) -> Result<(), DocumentStoreError>
    where
        F: FnOnce(&mut Document),
    {
        let sql_error = |source| DocumentStoreError::Sql {
            key: key.to_owned(),
            source,
        };
        let transaction = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(sql_error)?;
        let mut document = match read_body(&transaction, collection, key)? {
            Some(document) => document,
            None if create_missing => Document::new(),
            None => {
                return Err(DocumentStoreError::NotFound {
                    collection: collection.to_owned(),
                    key: key.to_owned(),
                });
            }
        };
        apply(&mut document);

        let body = serde_json::to_string(&document).map_err(|source| {
            DocumentStoreError::Serialize {
                key: key.to_owned(),
                source,
            }
        })?;
        transaction
            .execute(
                "INSERT INTO documents (collection, key, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT (collection, key) DO UPDATE SET body = excluded.body",
                params![collection, key, body],
            )
            .map_err(sql_error)?;
        transaction.commit().map_err(sql_error)
    }
}

fn read_body(
    connection: &Connection,
    collection: &str,
    key: &str,
) -> Result<Option<Document>, DocumentStoreError> {
    let body: Option<String> = connection
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND key = ?2",
            params![collection, key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| DocumentStoreError::Sql {
            key: key.to_owned(),
            source,
        })?;

    body.map(|text| decode_body(key, &text)).transpose()
}

fn decode_body(key: &str, text: &str) -> Result<Document, DocumentStoreError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(other) => Err(DocumentStoreError::Corrupt {
            key: key.to_owned(),
            reason: format!("expected a JSON object, found {other}"),
        }),
        Err(err) => Err(DocumentStoreError::Corrupt {
            key: key.to_owned(),
            reason: err.to_string(),
        }),
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn set_document(
        &mut self,
        collection: &str,
        key: &str,
        fields: &Document,
    ) -> Result<(), DocumentStoreError> {
        self.modify(collection, key, true, |document| {
            merge_top_level(document, fields);
        })
    }

    fn update_field(
        &mut self,
        collection: &str,
        key: &str,
        path: &FieldPath,
        value: Value,
    ) -> Result<(), DocumentStoreError> {
        self.modify(collection, key, false, |document| {
            set_nested(document, path, value);
        })
    }

    fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, DocumentStoreError> {
        read_body(&self.connection, collection, key)
    }
}
