//! # Tour Controller
//!
//! The tour resource: CRUD via the generic factory plus the tour-specific
//! wiring (slug assignment, the secret-tour visibility filter, eager
//! review population) and the preset top-tours listing.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::query::FilterExpr;
use crate::rest::{PopulateRule, ResourceHandler};
use crate::schema::catalog;
use crate::store::DocumentStore;

/// URL-safe slug from a tour name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    slug.trim_end_matches('-').to_string()
}

/// Preset criteria for the top-tours alias: the five best-rated tours,
/// cheapest first among equals, trimmed to the card fields.
pub fn top_tours_criteria() -> HashMap<String, String> {
    HashMap::from([
        ("limit".to_string(), "5".to_string()),
        ("sort".to_string(), "-ratingsAverage,price".to_string()),
        (
            "fields".to_string(),
            "name,price,ratingsAverage,summary,difficulty".to_string(),
        ),
    ])
}

/// Build the tour handler
pub fn handler(store: Arc<dyn DocumentStore>) -> ResourceHandler {
    ResourceHandler::new(catalog::tours(), store)
        .with_base_filter(FilterExpr::ne("secretTour", json!(true)))
        .with_populate(PopulateRule::Children {
            attach_as: "reviews",
            collection: "reviews",
            foreign_key: "tour",
        })
        .on_before_create(Arc::new(|obj| {
            if let Some(name) = obj.get("name").and_then(Value::as_str) {
                let slug = slugify(name);
                obj.insert("slug".to_string(), Value::String(slug));
            }
            Ok(())
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn tour_payload() -> Value {
        json!({
            "name": "The Forest Hiker",
            "duration": 5,
            "maxGroupSize": 25,
            "difficulty": "easy",
            "price": 397,
            "summary": "Breathtaking hike",
            "imageCover": "tour-1-cover.jpg"
        })
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("The Forest Hiker"), "the-forest-hiker");
        assert_eq!(slugify("  Wild  --  Surf!  "), "wild-surf");
        assert_eq!(slugify("Tour 2021"), "tour-2021");
    }

    #[test]
    fn test_create_assigns_slug() {
        let handler = handler(Arc::new(MemoryStore::new()));
        let created = handler.create(tour_payload()).unwrap();
        assert_eq!(created["data"]["tour"]["slug"], "the-forest-hiker");
    }

    #[test]
    fn test_secret_tours_hidden_from_listing() {
        let handler = handler(Arc::new(MemoryStore::new()));
        handler.create(tour_payload()).unwrap();

        let mut secret = tour_payload();
        secret["name"] = json!("The Hidden Valley");
        secret["secretTour"] = json!(true);
        handler.create(secret).unwrap();

        let body = handler.list_all(&HashMap::new(), &[]).unwrap();
        assert_eq!(body["results"], 1);
    }

    #[test]
    fn test_top_tours_criteria_shape() {
        let criteria = top_tours_criteria();
        assert_eq!(criteria["limit"], "5");
        assert!(criteria["sort"].starts_with("-ratingsAverage"));
    }
}
