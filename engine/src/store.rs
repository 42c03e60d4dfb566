//! Document store gateway.
//!
//! The reconciler only talks to the remote store through [`DocumentStore`].
//! The HTTP implementation lives with the command-line front end; this
//! module ships [`MemoryStore`], an in-process store with the same revision
//! semantics, for tests and benchmarks.

use crate::document::{ID_FIELD, REVISION_FIELD};
use crate::{CollectionName, Document, DocumentId, Error, Result, Revision, Value};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// Entry filter for [`DocumentStore::fetch_entries`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryQuery {
    /// Exact field matches, all of which must hold
    pub filter: Vec<(String, Value)>,
    /// Maximum number of entries; `None` means the store's default
    pub limit: Option<usize>,
}

impl EntryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact match on `_id`, at most one entry.
    pub fn by_id(id: &str) -> Self {
        Self::new().with_filter(ID_FIELD, Value::from(id)).with_limit(1)
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filter.push((field.into(), value));
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether an entry satisfies every filter term.
    pub fn matches(&self, entry: &Value) -> bool {
        self.filter
            .iter()
            .all(|(field, expected)| entry.get(field) == Some(expected))
    }
}

/// Access to a remote collection-based document store.
///
/// Calls block until the store answers or the implementation's timeout
/// expires. Implementations never retry; a failed call is returned as is.
pub trait DocumentStore {
    /// Names of all collections, in the store's order.
    fn list_collections(&self) -> Result<Vec<CollectionName>>;

    /// Raw entries of a collection.
    fn fetch_entries(&self, collection: &str, query: &EntryQuery) -> Result<Vec<Value>>;

    /// Save a document, returning the revision the store assigned.
    ///
    /// The content must carry `_id`.
    fn save_document(&self, collection: &str, content: &Value) -> Result<Revision>;

    /// Fetch a single document by exact ID.
    fn fetch_document(&self, collection: &str, id: &str) -> Result<Document> {
        let entry = self
            .fetch_entries(collection, &EntryQuery::by_id(id))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        Document::from_content(entry)
    }

    /// Human-readable target of a save, shown in dry-run plans.
    fn save_target(&self, collection: &str) -> String {
        format!("save {}", collection)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn list_collections(&self) -> Result<Vec<CollectionName>> {
        (**self).list_collections()
    }

    fn fetch_entries(&self, collection: &str, query: &EntryQuery) -> Result<Vec<Value>> {
        (**self).fetch_entries(collection, query)
    }

    fn save_document(&self, collection: &str, content: &Value) -> Result<Revision> {
        (**self).save_document(collection, content)
    }

    fn fetch_document(&self, collection: &str, id: &str) -> Result<Document> {
        (**self).fetch_document(collection, id)
    }

    fn save_target(&self, collection: &str) -> String {
        (**self).save_target(collection)
    }
}

/// Require a non-empty `_id` on content about to be saved.
pub fn require_id(content: &Value) -> Result<&str> {
    content
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::Validation(format!("document is missing {} field", ID_FIELD)))
}

/// A collection of documents keyed by ID.
type Collection = BTreeMap<DocumentId, Value>;

/// In-process document store.
///
/// Each save assigns one past the highest revision the store has seen,
/// writes it into `_modified`, and replaces the stored entry.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RefCell<BTreeMap<CollectionName, Collection>>,
    last_revision: Cell<Revision>,
    saves: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty collection.
    pub fn with_collection(self, name: impl Into<CollectionName>) -> Self {
        self.collections.borrow_mut().entry(name.into()).or_default();
        self
    }

    /// Seed a document as-is, keeping its `_modified`.
    pub fn insert(&self, collection: impl Into<CollectionName>, content: Value) -> Result<()> {
        let doc = Document::from_content(content)?;
        self.last_revision
            .set(self.last_revision.get().max(doc.revision()));
        self.collections
            .borrow_mut()
            .entry(collection.into())
            .or_default()
            .insert(doc.id().to_string(), doc.into_content());
        Ok(())
    }

    /// Current stored content of a document.
    pub fn get(&self, collection: &str, id: &str) -> Option<Value> {
        self.collections.borrow().get(collection)?.get(id).cloned()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl DocumentStore for MemoryStore {
    fn list_collections(&self) -> Result<Vec<CollectionName>> {
        Ok(self.collections.borrow().keys().cloned().collect())
    }

    fn fetch_entries(&self, collection: &str, query: &EntryQuery) -> Result<Vec<Value>> {
        let collections = self.collections.borrow();
        let entries = collections
            .get(collection)
            .ok_or_else(|| Error::Transport(format!("unknown collection: {}", collection)))?;

        Ok(entries
            .values()
            .filter(|entry| query.matches(entry))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn save_document(&self, collection: &str, content: &Value) -> Result<Revision> {
        let id = require_id(content)?.to_string();

        let mut collections = self.collections.borrow_mut();
        let entries = collections
            .get_mut(collection)
            .ok_or_else(|| Error::Transport(format!("unknown collection: {}", collection)))?;

        let revision = self.last_revision.get() + 1;
        let mut stored = content.clone();
        if let Some(map) = stored.as_object_mut() {
            map.insert(REVISION_FIELD, Value::from(revision));
        }
        entries.insert(id, stored);

        self.last_revision.set(revision);
        self.saves.set(self.saves.get() + 1);
        Ok(revision)
    }

    fn save_target(&self, collection: &str) -> String {
        format!("memory://{}", collection)
    }
}
