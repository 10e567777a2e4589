//! Test-only, in-memory `DocumentStore` implementation used by unit and
//! behaviour tests across the workspace.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::store::{merge_top_level, set_nested};
use crate::{Document, DocumentStore, DocumentStoreError, FieldPath};

/// In-memory `DocumentStore` keyed by `(collection, key)`.
///
/// Individual keys can be configured to reject writes so callers can
/// exercise per-item failure handling.
#[derive(Default, Debug, Clone)]
pub struct MemoryDocumentStore {
    documents: BTreeMap<(String, String), Document>,
    failing_keys: BTreeSet<String>,
    writes: usize,
}

impl MemoryDocumentStore {
    /// Create a store whose writes to `key` fail with
    /// [`DocumentStoreError::Injected`].
    #[must_use]
    pub fn failing_on(mut self, key: impl Into<String>) -> Self {
        self.failing_keys.insert(key.into());
        self
    }

    /// Seed a document directly, bypassing merge semantics.
    pub fn insert(&mut self, collection: &str, key: &str, document: Document) {
        self.documents
            .insert((collection.to_owned(), key.to_owned()), document);
    }

    /// Keys stored in `collection`, in sorted order.
    pub fn keys(&self, collection: &str) -> Vec<String> {
        self.documents
            .keys()
            .filter(|(stored, _)| stored == collection)
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Number of successful writes performed so far.
    #[must_use]
    pub const fn write_count(&self) -> usize {
        self.writes
    }

    fn check_writable(&self, key: &str) -> Result<(), DocumentStoreError> {
        if self.failing_keys.contains(key) {
            return Err(DocumentStoreError::Injected {
                key: key.to_owned(),
                message: "configured to fail".to_owned(),
            });
        }
        Ok(())
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn set_document(
        &mut self,
        collection: &str,
        key: &str,
        fields: &Document,
    ) -> Result<(), DocumentStoreError> {
        self.check_writable(key)?;
        let document = self
            .documents
            .entry((collection.to_owned(), key.to_owned()))
            .or_default();
        merge_top_level(document, fields);
        self.writes += 1;
        Ok(())
    }

    fn update_field(
        &mut self,
        collection: &str,
        key: &str,
        path: &FieldPath,
        value: Value,
    ) -> Result<(), DocumentStoreError> {
        self.check_writable(key)?;
        let document = self
            .documents
            .get_mut(&(collection.to_owned(), key.to_owned()))
            .ok_or_else(|| DocumentStoreError::NotFound {
                collection: collection.to_owned(),
                key: key.to_owned(),
            })?;
        set_nested(document, path, value);
        self.writes += 1;
        Ok(())
    }

    fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, DocumentStoreError> {
        Ok(self
            .documents
            .get(&(collection.to_owned(), key.to_owned()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CAR_PARKS;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn injected_failure_leaves_other_keys_writable() {
        let mut store = MemoryDocumentStore::default().failing_on("BAD");
        let mut fields = Document::new();
        fields.insert("carpark".into(), json!({}));

        let err = store
            .set_document(CAR_PARKS, "BAD", &fields)
            .expect_err("configured failure");
        assert!(matches!(err, DocumentStoreError::Injected { .. }));
        store
            .set_document(CAR_PARKS, "GOOD", &fields)
            .expect("other keys accept writes");
        assert_eq!(store.keys(CAR_PARKS), vec!["GOOD".to_owned()]);
        assert_eq!(store.write_count(), 1);
    }
}
