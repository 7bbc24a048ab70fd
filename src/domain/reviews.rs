//! # Review Controller
//!
//! Reviews populate their author on read and keep the parent tour's
//! rating statistics current: every review write recomputes the tour's
//! `ratingsQuantity` and `ratingsAverage`.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::aggregate::{Accumulator, AccumulatorOp, GroupKey, Pipeline};
use crate::error::AppResult;
use crate::query::{FilterExpr, FilterSet};
use crate::rest::{PopulateRule, ResourceHandler};
use crate::schema::catalog;
use crate::store::DocumentStore;

/// Stats a tour falls back to when it has no reviews
const DEFAULT_AVERAGE: f64 = 4.5;

/// Recompute and store a tour's rating statistics from its reviews
pub fn sync_tour_ratings(store: &Arc<dyn DocumentStore>, tour_id: &str) -> AppResult<()> {
    let filters = FilterSet::new().and(FilterExpr::eq("tour", json!(tour_id)));
    let reviews = store.find("reviews", &filters)?;

    let stats = Pipeline::builder()
        .group(
            GroupKey::All,
            "key",
            vec![
                Accumulator::new("nRating", AccumulatorOp::Count),
                Accumulator::new("avgRating", AccumulatorOp::Avg("rating".into())),
            ],
        )
        .build()?
        .execute(&reviews);

    let (quantity, average) = match stats.first() {
        Some(row) => (
            row["nRating"].as_i64().unwrap_or(0),
            row["avgRating"].as_f64().unwrap_or(DEFAULT_AVERAGE),
        ),
        None => (0, DEFAULT_AVERAGE),
    };

    let patch = json!({
        "ratingsQuantity": quantity,
        "ratingsAverage": (average * 10.0).round() / 10.0,
    });

    // A dangling tour reference is not an error here; the review write
    // already succeeded.
    store.update_by_id("tours", tour_id, patch)?;
    Ok(())
}

/// Build the review handler
pub fn handler(store: Arc<dyn DocumentStore>) -> ResourceHandler {
    let stats_store = store.clone();

    ResourceHandler::new(catalog::reviews(), store)
        .with_populate(PopulateRule::Parent {
            field: "user",
            collection: "users",
            select: &["name", "photo"],
        })
        .on_after_write(Arc::new(move |_op, doc| {
            if let Some(tour_id) = doc.get("tour").and_then(Value::as_str) {
                sync_tour_ratings(&stats_store, tour_id)?;
            }
            Ok(())
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn seed_tour(store: &Arc<dyn DocumentStore>) -> String {
        let tour = store
            .insert(
                "tours",
                json!({"name": "The Forest Hiker", "ratingsAverage": 4.5, "ratingsQuantity": 0}),
            )
            .unwrap();
        tour["id"].as_str().unwrap().to_string()
    }

    fn review(tour_id: &str, rating: f64) -> Value {
        json!({"review": "Words", "rating": rating, "tour": tour_id, "user": "u1"})
    }

    #[test]
    fn test_create_updates_tour_stats() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let tour_id = seed_tour(&store);
        let reviews = handler(store.clone());

        reviews.create(review(&tour_id, 5.0)).unwrap();
        reviews.create(review(&tour_id, 4.0)).unwrap();

        let tour = store.find_by_id("tours", &tour_id).unwrap().unwrap();
        assert_eq!(tour["ratingsQuantity"], 2);
        assert_eq!(tour["ratingsAverage"], 4.5);
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let tour_id = seed_tour(&store);
        let reviews = handler(store.clone());

        reviews.create(review(&tour_id, 5.0)).unwrap();
        reviews.create(review(&tour_id, 4.0)).unwrap();
        reviews.create(review(&tour_id, 4.0)).unwrap();

        let tour = store.find_by_id("tours", &tour_id).unwrap().unwrap();
        // 13 / 3 = 4.333..., stored as 4.3
        assert_eq!(tour["ratingsAverage"], 4.3);
    }

    #[test]
    fn test_delete_restores_defaults_when_last_review_goes() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let tour_id = seed_tour(&store);
        let reviews = handler(store.clone());

        let created = reviews.create(review(&tour_id, 2.0)).unwrap();
        let review_id = created["data"]["review"]["id"].as_str().unwrap().to_string();
        reviews.delete_one(&review_id).unwrap();

        let tour = store.find_by_id("tours", &tour_id).unwrap().unwrap();
        assert_eq!(tour["ratingsQuantity"], 0);
        assert_eq!(tour["ratingsAverage"], 4.5);
    }

    #[test]
    fn test_dangling_tour_reference_does_not_fail_write() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let reviews = handler(store);
        assert!(reviews.create(review("no-such-tour", 5.0)).is_ok());
    }
}
