//! # Built-in Resource Types
//!
//! The four resource types the API serves. Constraints mirror the public
//! data model: tour names are 10-40 characters, difficulty is a fixed
//! enum, ratings live in [1, 5], and a discount must undercut the price.

use serde_json::{Map, Value};

use super::types::{FieldDef, FieldKind, ResourceSchema};

/// Tour resource type
pub fn tours() -> ResourceSchema {
    ResourceSchema::new(
        "tour",
        "tours",
        vec![
            FieldDef::required("name", FieldKind::string_bounded(10, 40)),
            FieldDef::optional("slug", FieldKind::string()),
            FieldDef::required("duration", FieldKind::number()),
            FieldDef::required("maxGroupSize", FieldKind::number()),
            FieldDef::required(
                "difficulty",
                FieldKind::Enum {
                    values: &["easy", "medium", "difficult"],
                },
            ),
            FieldDef::optional("ratingsAverage", FieldKind::number_bounded(1.0, 5.0))
                .with_default(Value::from(4.5)),
            FieldDef::optional("ratingsQuantity", FieldKind::number())
                .with_default(Value::from(0)),
            FieldDef::required("price", FieldKind::number()),
            FieldDef::optional("priceDiscount", FieldKind::number()),
            FieldDef::required("summary", FieldKind::string()),
            FieldDef::optional("description", FieldKind::string()),
            FieldDef::required("imageCover", FieldKind::string()),
            FieldDef::optional("images", FieldKind::Array(Box::new(FieldKind::string()))),
            FieldDef::optional("createdAt", FieldKind::Date).hidden(),
            FieldDef::optional("startDates", FieldKind::Array(Box::new(FieldKind::Date))),
            FieldDef::optional("secretTour", FieldKind::Boolean)
                .with_default(Value::Bool(false))
                .hidden(),
            FieldDef::optional("startLocation", FieldKind::GeoPoint),
            FieldDef::optional("locations", FieldKind::Array(Box::new(FieldKind::GeoPoint))),
            FieldDef::optional(
                "guides",
                FieldKind::Array(Box::new(FieldKind::Reference { resource: "users" })),
            ),
        ],
    )
    .with_validator(discount_below_price)
}

/// Discount price must undercut the regular price.
fn discount_below_price(doc: &Map<String, Value>) -> Result<(), String> {
    let (Some(discount), Some(price)) = (
        doc.get("priceDiscount").and_then(Value::as_f64),
        doc.get("price").and_then(Value::as_f64),
    ) else {
        return Ok(());
    };

    if discount >= price {
        return Err(format!(
            "Discount price ({}) should be below regular price",
            discount
        ));
    }
    Ok(())
}

/// User resource type. Credentials and token mechanics live elsewhere;
/// this is only the profile surface the CRUD factory serves.
pub fn users() -> ResourceSchema {
    ResourceSchema::new(
        "user",
        "users",
        vec![
            FieldDef::required("name", FieldKind::string()),
            FieldDef::required("email", FieldKind::string()),
            FieldDef::optional("photo", FieldKind::string()).with_default(Value::from("default.jpg")),
            FieldDef::optional(
                "role",
                FieldKind::Enum {
                    values: &["user", "guide", "lead-guide", "admin"],
                },
            )
            .with_default(Value::from("user")),
        ],
    )
}

/// Review resource type
pub fn reviews() -> ResourceSchema {
    ResourceSchema::new(
        "review",
        "reviews",
        vec![
            FieldDef::required("review", FieldKind::string()),
            FieldDef::optional("rating", FieldKind::number_bounded(1.0, 5.0)),
            FieldDef::optional("createdAt", FieldKind::Date),
            FieldDef::required("tour", FieldKind::Reference { resource: "tours" }),
            FieldDef::required("user", FieldKind::Reference { resource: "users" }),
        ],
    )
}

/// Booking resource type
pub fn bookings() -> ResourceSchema {
    ResourceSchema::new(
        "booking",
        "bookings",
        vec![
            FieldDef::required("tour", FieldKind::Reference { resource: "tours" }),
            FieldDef::required("user", FieldKind::Reference { resource: "users" }),
            FieldDef::required("price", FieldKind::number()),
            FieldDef::optional("createdAt", FieldKind::Date),
            FieldDef::optional("paid", FieldKind::Boolean).with_default(Value::Bool(true)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names() {
        assert_eq!(tours().collection, "tours");
        assert_eq!(users().name, "user");
        assert_eq!(reviews().collection, "reviews");
        assert_eq!(bookings().name, "booking");
    }

    #[test]
    fn test_tour_hidden_fields() {
        let hidden = tours().hidden_fields();
        assert!(hidden.contains(&"createdAt".to_string()));
        assert!(hidden.contains(&"secretTour".to_string()));
        assert_eq!(hidden.len(), 2);
    }

    #[test]
    fn test_tour_has_one_cross_field_validator() {
        assert_eq!(tours().validators.len(), 1);
    }
}
