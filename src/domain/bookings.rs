//! # Booking Controller
//!
//! Bookings are created two ways: directly through factory CRUD, and by
//! the checkout flow, where a hosted payment session is opened for a tour
//! and the completion webhook writes the booking.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::payments::{
    CheckoutCompleted, CheckoutSessionRequest, LineItem, PaymentGateway,
};
use crate::query::{FilterExpr, FilterSet};
use crate::rest::ResourceHandler;
use crate::schema::catalog;
use crate::store::DocumentStore;

/// Build the booking handler
pub fn handler(store: Arc<dyn DocumentStore>) -> ResourceHandler {
    ResourceHandler::new(catalog::bookings(), store)
}

/// Open a hosted checkout session for one tour.
///
/// The tour id rides along as the session's client reference so the
/// completion webhook can reconstruct the booking.
pub async fn create_checkout_session(
    store: &Arc<dyn DocumentStore>,
    gateway: &Arc<dyn PaymentGateway>,
    config: &AppConfig,
    tour_id: &str,
    customer_email: &str,
) -> AppResult<Value> {
    let tour = store
        .find_by_id("tours", tour_id)?
        .ok_or_else(|| AppError::not_found("tour"))?;

    let name = tour["name"].as_str().unwrap_or_default();
    let summary = tour["summary"].as_str().unwrap_or_default();
    let slug = tour["slug"].as_str().unwrap_or_default();
    let price = tour["price"].as_f64().unwrap_or_default();

    let request = CheckoutSessionRequest {
        client_reference_id: tour_id.to_string(),
        customer_email: customer_email.to_string(),
        success_url: format!("{}/my-tours?alert=booking", config.public_url),
        cancel_url: format!("{}/tour/{slug}", config.public_url),
        line_item: LineItem {
            name: format!("{name} Tour"),
            description: summary.to_string(),
            amount: (price * 100.0).round() as u64,
            currency: "usd".to_string(),
            quantity: 1,
        },
    };

    let session = gateway.create_checkout_session(request).await?;
    tracing::info!(tour = tour_id, session = %session.id, "checkout session opened");

    Ok(json!({
        "status": "success",
        "session": session,
    }))
}

/// Persist the booking for a completed checkout.
///
/// The paying user is resolved by the email the gateway echoes back; an
/// unknown email rejects the event so the gateway retries it.
pub fn record_checkout(
    store: &Arc<dyn DocumentStore>,
    event: &CheckoutCompleted,
) -> AppResult<Value> {
    let filters = FilterSet::new().and(FilterExpr::eq(
        "email",
        Value::String(event.customer_email.clone()),
    ));
    let user = store
        .find("users", &filters)?
        .into_iter()
        .next()
        .ok_or_else(|| {
            AppError::Upstream(format!(
                "no user matches checkout email {}",
                event.customer_email
            ))
        })?;

    let payload = json!({
        "tour": event.tour_id,
        "user": user["id"],
        "price": event.amount_total as f64 / 100.0,
    });

    handler(store.clone()).create(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::MockGateway;
    use crate::store::MemoryStore;

    fn seed_tour(store: &Arc<dyn DocumentStore>) -> String {
        let tour = store
            .insert(
                "tours",
                json!({
                    "name": "The Forest Hiker",
                    "slug": "the-forest-hiker",
                    "summary": "Breathtaking hike",
                    "price": 397.0,
                }),
            )
            .unwrap();
        tour["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_checkout_session_envelope() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let gateway: Arc<dyn PaymentGateway> = Arc::new(MockGateway);
        let tour_id = seed_tour(&store);

        let body = create_checkout_session(
            &store,
            &gateway,
            &AppConfig::default(),
            &tour_id,
            "ada@example.com",
        )
        .await
        .unwrap();

        assert_eq!(body["status"], "success");
        assert_eq!(body["session"]["status"], "open");
    }

    #[tokio::test]
    async fn test_checkout_session_unknown_tour() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let gateway: Arc<dyn PaymentGateway> = Arc::new(MockGateway);

        let err = create_checkout_session(
            &store,
            &gateway,
            &AppConfig::default(),
            "missing",
            "ada@example.com",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn test_record_checkout_creates_booking() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let tour_id = seed_tour(&store);
        let user = store
            .insert("users", json!({"name": "Ada", "email": "ada@example.com"}))
            .unwrap();

        let event = CheckoutCompleted {
            tour_id: tour_id.clone(),
            customer_email: "ada@example.com".into(),
            amount_total: 39_700,
        };

        let body = record_checkout(&store, &event).unwrap();
        let booking = &body["data"]["booking"];
        assert_eq!(booking["tour"], tour_id.as_str());
        assert_eq!(booking["user"], user["id"]);
        assert_eq!(booking["price"], 397.0);
        assert_eq!(booking["paid"], true);
    }

    #[test]
    fn test_record_checkout_unknown_email_rejected() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let event = CheckoutCompleted {
            tour_id: "t1".into(),
            customer_email: "ghost@example.com".into(),
            amount_total: 100,
        };

        let err = record_checkout(&store, &event).unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert!(store.scan("bookings").unwrap().is_empty());
    }
}
