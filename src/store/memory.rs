//! # In-Memory Document Store
//!
//! `RwLock<HashMap<collection, Vec<document>>>` storage. Identities are
//! v4 UUID strings assigned on insert; updates merge object fields.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::query::FilterSet;
use crate::schema::IDENTITY_FIELD;

use super::DocumentStore;

/// In-memory store; the default persistence layer for the dev server and
/// for tests.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<std::sync::RwLockReadGuard<'_, HashMap<String, Vec<Value>>>> {
        self.data
            .read()
            .map_err(|_| AppError::Internal("store lock poisoned".into()))
    }

    fn write(&self) -> AppResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Vec<Value>>>> {
        self.data
            .write()
            .map_err(|_| AppError::Internal("store lock poisoned".into()))
    }
}

fn doc_id(doc: &Value) -> Option<&str> {
    doc.get(IDENTITY_FIELD).and_then(Value::as_str)
}

impl DocumentStore for MemoryStore {
    fn insert(&self, collection: &str, mut doc: Value) -> AppResult<Value> {
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| AppError::validation("document must be a JSON object"))?;
        obj.insert(
            IDENTITY_FIELD.to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );

        let mut store = self.write()?;
        store
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());

        Ok(doc)
    }

    fn scan(&self, collection: &str) -> AppResult<Vec<Value>> {
        Ok(self.read()?.get(collection).cloned().unwrap_or_default())
    }

    fn find(&self, collection: &str, filters: &FilterSet) -> AppResult<Vec<Value>> {
        Ok(self
            .read()?
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filters.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    fn find_by_id(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
        Ok(self
            .read()?
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| doc_id(d) == Some(id)).cloned()))
    }

    fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
    ) -> AppResult<Option<Value>> {
        let mut store = self.write()?;
        let Some(docs) = store.get_mut(collection) else {
            return Ok(None);
        };
        let Some(doc) = docs.iter_mut().find(|d| doc_id(d) == Some(id)) else {
            return Ok(None);
        };

        if let (Some(target), Some(changes)) = (doc.as_object_mut(), patch.as_object()) {
            for (key, value) in changes {
                target.insert(key.clone(), value.clone());
            }
        }

        Ok(Some(doc.clone()))
    }

    fn delete_by_id(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
        let mut store = self.write()?;
        let Some(docs) = store.get_mut(collection) else {
            return Ok(None);
        };
        let Some(idx) = docs.iter().position(|d| doc_id(d) == Some(id)) else {
            return Ok(None);
        };

        Ok(Some(docs.remove(idx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FilterExpr;
    use serde_json::json;

    #[test]
    fn test_insert_assigns_identity() {
        let store = MemoryStore::new();
        let doc = store.insert("tours", json!({"name": "Test"})).unwrap();

        let id = doc["id"].as_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_find_by_id_roundtrip() {
        let store = MemoryStore::new();
        let doc = store.insert("tours", json!({"name": "Test"})).unwrap();
        let id = doc["id"].as_str().unwrap();

        let found = store.find_by_id("tours", id).unwrap().unwrap();
        assert_eq!(found["name"], "Test");

        assert!(store.find_by_id("tours", "missing").unwrap().is_none());
    }

    #[test]
    fn test_find_with_filters() {
        let store = MemoryStore::new();
        store.insert("tours", json!({"price": 100})).unwrap();
        store.insert("tours", json!({"price": 300})).unwrap();

        let filters = FilterSet::new().and(FilterExpr::gte("price", json!(200)));
        let found = store.find("tours", &filters).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["price"], 300);
    }

    #[test]
    fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let doc = store
            .insert("tours", json!({"name": "Old", "price": 100}))
            .unwrap();
        let id = doc["id"].as_str().unwrap();

        let updated = store
            .update_by_id("tours", id, json!({"name": "New"}))
            .unwrap()
            .unwrap();
        assert_eq!(updated["name"], "New");
        assert_eq!(updated["price"], 100);
    }

    #[test]
    fn test_update_missing_returns_none() {
        let store = MemoryStore::new();
        assert!(store
            .update_by_id("tours", "nope", json!({}))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_removes() {
        let store = MemoryStore::new();
        let doc = store.insert("tours", json!({"name": "Gone"})).unwrap();
        let id = doc["id"].as_str().unwrap();

        assert!(store.delete_by_id("tours", id).unwrap().is_some());
        assert!(store.find_by_id("tours", id).unwrap().is_none());
        assert!(store.delete_by_id("tours", id).unwrap().is_none());
    }
}
