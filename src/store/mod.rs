//! # Document Store
//!
//! The persistence collaborator: per-collection document storage with
//! filter queries and identity assignment on insert. Consistency for
//! concurrent writes to the same entity is the store's responsibility;
//! nothing above this layer takes locks across await points.

pub mod memory;

use serde_json::Value;

use crate::error::AppResult;
use crate::query::FilterSet;

pub use memory::MemoryStore;

/// Collection-oriented document storage
pub trait DocumentStore: Send + Sync {
    /// Insert a document, assigning a fresh identity. Returns the stored
    /// document including its new `id`.
    fn insert(&self, collection: &str, doc: Value) -> AppResult<Value>;

    /// All documents in a collection, in insertion order
    fn scan(&self, collection: &str) -> AppResult<Vec<Value>>;

    /// Documents matching every filter, in insertion order
    fn find(&self, collection: &str, filters: &FilterSet) -> AppResult<Vec<Value>>;

    /// Fetch one document by identity
    fn find_by_id(&self, collection: &str, id: &str) -> AppResult<Option<Value>>;

    /// Merge a partial update into an existing document. Returns the
    /// updated document, or None when the identity is absent.
    fn update_by_id(&self, collection: &str, id: &str, patch: Value)
        -> AppResult<Option<Value>>;

    /// Remove a document. Returns the removed document, or None when the
    /// identity is absent.
    fn delete_by_id(&self, collection: &str, id: &str) -> AppResult<Option<Value>>;
}
