//! # Resource Handler Factory
//!
//! One generic implementation of the five CRUD operations, parameterized
//! by a resource schema, population rules, base filters, and explicit
//! lifecycle hooks. Every resource endpoint is built from this; there is
//! no per-resource CRUD code anywhere else.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::query::{self, executor, FilterExpr, FilterSet};
use crate::schema::{validate_create, validate_update, ResourceSchema, IDENTITY_FIELD};
use crate::store::DocumentStore;

use super::response;

/// Kind of write that just completed, passed to after-write hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
    Delete,
}

/// Mutates the payload before a create is persisted (e.g. slug assignment)
pub type BeforeCreateHook = Arc<dyn Fn(&mut Map<String, Value>) -> AppResult<()> + Send + Sync>;

/// Runs after a successful write with the written (or removed) document.
/// Hooks are plain function values wired in at construction; there is no
/// hidden registry.
pub type AfterWriteHook = Arc<dyn Fn(WriteOp, &Value) -> AppResult<()> + Send + Sync>;

/// Instruction to eagerly attach related-resource data on read-one
#[derive(Debug, Clone)]
pub enum PopulateRule {
    /// Attach every document from `collection` whose `foreign_key` points
    /// at this document (reviews onto a tour).
    Children {
        attach_as: &'static str,
        collection: &'static str,
        foreign_key: &'static str,
    },
    /// Replace a local reference field with a trimmed copy of the
    /// referenced document (user summary onto a review).
    Parent {
        field: &'static str,
        collection: &'static str,
        select: &'static [&'static str],
    },
}

/// The five generic operations over one resource type
pub struct ResourceHandler {
    schema: ResourceSchema,
    store: Arc<dyn DocumentStore>,
    populate: Vec<PopulateRule>,
    base_filters: Vec<FilterExpr>,
    before_create: Option<BeforeCreateHook>,
    after_write: Option<AfterWriteHook>,
}

impl ResourceHandler {
    pub fn new(schema: ResourceSchema, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            schema,
            store,
            populate: Vec::new(),
            base_filters: Vec::new(),
            before_create: None,
            after_write: None,
        }
    }

    pub fn with_populate(mut self, rule: PopulateRule) -> Self {
        self.populate.push(rule);
        self
    }

    /// Filter applied to every read, invisible to clients
    pub fn with_base_filter(mut self, filter: FilterExpr) -> Self {
        self.base_filters.push(filter);
        self
    }

    pub fn on_before_create(mut self, hook: BeforeCreateHook) -> Self {
        self.before_create = Some(hook);
        self
    }

    pub fn on_after_write(mut self, hook: AfterWriteHook) -> Self {
        self.after_write = Some(hook);
        self
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// List all matching documents with a result count.
    ///
    /// Extra filters let nested routes narrow the scope (reviews of one
    /// tour) without re-parsing criteria.
    pub fn list_all(
        &self,
        criteria: &HashMap<String, String>,
        extra_filters: &[FilterExpr],
    ) -> AppResult<Value> {
        let descriptor = query::parse(criteria, &self.schema)?;
        let documents = self.store.scan(self.schema.collection)?;

        let mut filters = self.base_filters.clone();
        filters.extend_from_slice(extra_filters);

        let results = executor::execute(&documents, &descriptor, &filters);
        Ok(response::list(self.schema.collection, results))
    }

    /// Fetch one document by identity, applying population rules
    pub fn read_one(&self, id: &str) -> AppResult<Value> {
        let mut doc = self.fetch_visible(id)?;
        self.apply_populate(&mut doc)?;
        Ok(response::one(self.schema.name, self.strip_hidden(doc)))
    }

    /// Validate and persist a new document
    pub fn create(&self, mut payload: Value) -> AppResult<Value> {
        validate_create(&self.schema, &mut payload)?;

        if let Some(hook) = &self.before_create {
            let obj = payload
                .as_object_mut()
                .ok_or_else(|| AppError::Internal("validated payload not an object".into()))?;
            hook(obj)?;
        }

        let created = self.store.insert(self.schema.collection, payload)?;
        tracing::info!(
            resource = self.schema.name,
            id = created[IDENTITY_FIELD].as_str().unwrap_or_default(),
            "created"
        );

        self.fire_after_write(WriteOp::Create, &created)?;
        Ok(response::one(self.schema.name, self.strip_hidden(created)))
    }

    /// Re-validate changed fields and persist a partial update
    pub fn update_one(&self, id: &str, patch: Value) -> AppResult<Value> {
        let existing = self.fetch_visible(id)?;
        let patch = validate_update(&self.schema, &existing, &patch)?;

        let updated = self
            .store
            .update_by_id(self.schema.collection, id, patch)?
            .ok_or_else(|| AppError::not_found(self.schema.name))?;
        tracing::info!(resource = self.schema.name, id, "updated");

        self.fire_after_write(WriteOp::Update, &updated)?;
        Ok(response::one(self.schema.name, self.strip_hidden(updated)))
    }

    /// Remove a document
    pub fn delete_one(&self, id: &str) -> AppResult<Value> {
        // Resolve visibility first so base-filtered documents 404 rather
        // than silently vanish.
        self.fetch_visible(id)?;

        let removed = self
            .store
            .delete_by_id(self.schema.collection, id)?
            .ok_or_else(|| AppError::not_found(self.schema.name))?;
        tracing::info!(resource = self.schema.name, id, "deleted");

        self.fire_after_write(WriteOp::Delete, &removed)?;
        Ok(response::empty())
    }

    /// Scan the whole collection through the same visibility rules as the
    /// read operations: base filters applied, hidden fields stripped.
    /// For callers that post-process documents outside the query pipeline,
    /// such as the radius search.
    pub fn visible_documents(&self) -> AppResult<Vec<Value>> {
        let base = FilterSet {
            filters: self.base_filters.clone(),
        };
        Ok(self
            .store
            .scan(self.schema.collection)?
            .into_iter()
            .filter(|doc| base.matches(doc))
            .map(|doc| self.strip_hidden(doc))
            .collect())
    }

    /// Fetch by id, honoring base filters. Absent or filtered-out
    /// documents are NotFound, never a null-data success.
    fn fetch_visible(&self, id: &str) -> AppResult<Value> {
        let doc = self
            .store
            .find_by_id(self.schema.collection, id)?
            .ok_or_else(|| AppError::not_found(self.schema.name))?;

        let base = FilterSet {
            filters: self.base_filters.clone(),
        };
        if !base.matches(&doc) {
            return Err(AppError::not_found(self.schema.name));
        }

        Ok(doc)
    }

    fn fire_after_write(&self, op: WriteOp, doc: &Value) -> AppResult<()> {
        if let Some(hook) = &self.after_write {
            hook(op, doc)?;
        }
        Ok(())
    }

    fn apply_populate(&self, doc: &mut Value) -> AppResult<()> {
        for rule in &self.populate {
            match rule {
                PopulateRule::Children {
                    attach_as,
                    collection,
                    foreign_key,
                } => {
                    let Some(id) = doc.get(IDENTITY_FIELD).and_then(Value::as_str) else {
                        continue;
                    };
                    let filters = FilterSet::new()
                        .and(FilterExpr::eq(*foreign_key, Value::String(id.to_string())));
                    let children = self.store.find(collection, &filters)?;
                    if let Some(obj) = doc.as_object_mut() {
                        obj.insert(attach_as.to_string(), Value::Array(children));
                    }
                }
                PopulateRule::Parent {
                    field,
                    collection,
                    select,
                } => {
                    let Some(ref_id) = doc.get(*field).and_then(Value::as_str) else {
                        continue;
                    };
                    let Some(parent) = self.store.find_by_id(collection, ref_id)? else {
                        continue;
                    };

                    let trimmed: Map<String, Value> = parent
                        .as_object()
                        .map(|obj| {
                            obj.iter()
                                .filter(|(k, _)| {
                                    k.as_str() == IDENTITY_FIELD
                                        || select.contains(&k.as_str())
                                })
                                .map(|(k, v)| (k.clone(), v.clone()))
                                .collect()
                        })
                        .unwrap_or_default();

                    if let Some(obj) = doc.as_object_mut() {
                        obj.insert(field.to_string(), Value::Object(trimmed));
                    }
                }
            }
        }
        Ok(())
    }

    fn strip_hidden(&self, doc: Value) -> Value {
        let hidden = self.schema.hidden_fields();
        if hidden.is_empty() {
            return doc;
        }
        let Value::Object(obj) = doc else { return doc };
        Value::Object(
            obj.into_iter()
                .filter(|(key, _)| !hidden.contains(key))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tour_payload() -> Value {
        json!({
            "name": "The Forest Hiker",
            "duration": 5,
            "maxGroupSize": 25,
            "difficulty": "easy",
            "price": 397,
            "summary": "Breathtaking hike through the Canadian Banff National Park",
            "imageCover": "tour-1-cover.jpg"
        })
    }

    fn handler() -> ResourceHandler {
        ResourceHandler::new(catalog::tours(), Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_create_then_list() {
        let handler = handler();
        handler.create(tour_payload()).unwrap();

        let body = handler.list_all(&HashMap::new(), &[]).unwrap();
        assert_eq!(body["results"], 1);
        assert_eq!(body["data"]["tours"][0]["name"], "The Forest Hiker");
    }

    #[test]
    fn test_read_one_not_found() {
        let handler = handler();
        let err = handler.read_one("missing").unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn test_create_rejects_invalid_discount() {
        let handler = handler();
        let mut payload = tour_payload();
        payload["price"] = json!(100);
        payload["priceDiscount"] = json!(150);

        let err = handler.create(payload).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_update_and_delete() {
        let handler = handler();
        let created = handler.create(tour_payload()).unwrap();
        let id = created["data"]["tour"]["id"].as_str().unwrap().to_string();

        let updated = handler.update_one(&id, json!({"price": 297})).unwrap();
        assert_eq!(updated["data"]["tour"]["price"], 297);

        let deleted = handler.delete_one(&id).unwrap();
        assert!(deleted["data"].is_null());
        assert!(matches!(
            handler.read_one(&id),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let handler = handler();
        let err = handler.update_one("missing", json!({"price": 1})).unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn test_base_filter_hides_from_all_reads() {
        let store = Arc::new(MemoryStore::new());
        let handler = ResourceHandler::new(catalog::tours(), store.clone())
            .with_base_filter(FilterExpr::ne("secretTour", json!(true)));

        let mut secret = tour_payload();
        secret["secretTour"] = json!(true);
        let created = handler.create(secret).unwrap();
        let id = created["data"]["tour"]["id"].as_str().unwrap().to_string();

        let body = handler.list_all(&HashMap::new(), &[]).unwrap();
        assert_eq!(body["results"], 0);
        assert!(matches!(
            handler.read_one(&id),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn test_visible_documents_apply_read_rules() {
        let store = Arc::new(MemoryStore::new());
        let handler = ResourceHandler::new(catalog::tours(), store.clone())
            .with_base_filter(FilterExpr::ne("secretTour", json!(true)));

        handler.create(tour_payload()).unwrap();
        let mut secret = tour_payload();
        secret["secretTour"] = json!(true);
        handler.create(secret).unwrap();

        let visible = handler.visible_documents().unwrap();
        assert_eq!(visible.len(), 1);
        assert!(visible[0].get("secretTour").is_none());
        assert!(visible[0].get("createdAt").is_none());
    }

    #[test]
    fn test_populate_children() {
        let store = Arc::new(MemoryStore::new());
        let tours = ResourceHandler::new(catalog::tours(), store.clone()).with_populate(
            PopulateRule::Children {
                attach_as: "reviews",
                collection: "reviews",
                foreign_key: "tour",
            },
        );

        let created = tours.create(tour_payload()).unwrap();
        let tour_id = created["data"]["tour"]["id"].as_str().unwrap().to_string();

        store
            .insert(
                "reviews",
                json!({"review": "Great", "rating": 5, "tour": tour_id, "user": "u1"}),
            )
            .unwrap();

        let body = tours.read_one(&tour_id).unwrap();
        let reviews = body["data"]["tour"]["reviews"].as_array().unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0]["rating"], 5);
    }

    #[test]
    fn test_populate_parent_trims_fields() {
        let store = Arc::new(MemoryStore::new());
        let user = store
            .insert(
                "users",
                json!({"name": "Ada", "email": "ada@example.com", "photo": "ada.jpg"}),
            )
            .unwrap();
        let user_id = user["id"].as_str().unwrap().to_string();

        let reviews = ResourceHandler::new(catalog::reviews(), store.clone()).with_populate(
            PopulateRule::Parent {
                field: "user",
                collection: "users",
                select: &["name", "photo"],
            },
        );

        let created = reviews
            .create(json!({"review": "Lovely", "rating": 4, "tour": "t1", "user": user_id}))
            .unwrap();
        let id = created["data"]["review"]["id"].as_str().unwrap().to_string();

        let body = reviews.read_one(&id).unwrap();
        let populated = &body["data"]["review"]["user"];
        assert_eq!(populated["name"], "Ada");
        assert!(populated.get("email").is_none());
    }

    #[test]
    fn test_hooks_fire_in_order() {
        static AFTER: AtomicUsize = AtomicUsize::new(0);

        let handler = handler()
            .on_before_create(Arc::new(|obj| {
                obj.insert("slug".to_string(), json!("the-forest-hiker"));
                Ok(())
            }))
            .on_after_write(Arc::new(|op, doc| {
                if op == WriteOp::Create {
                    assert_eq!(doc["slug"], "the-forest-hiker");
                    AFTER.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            }));

        let created = handler.create(tour_payload()).unwrap();
        assert_eq!(created["data"]["tour"]["slug"], "the-forest-hiker");
        assert_eq!(AFTER.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hidden_fields_stripped_from_single_reads() {
        let handler = handler();
        let created = handler.create(tour_payload()).unwrap();
        assert!(created["data"]["tour"].get("secretTour").is_none());
    }
}
