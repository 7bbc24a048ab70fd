//! # HTTP Routes
//!
//! Axum router and request handlers. Handlers stay thin: extract, call
//! the controller, wrap the envelope in a status code. Failures propagate
//! as [`AppError`] and render through its responder.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::aggregate;
use crate::config::AppConfig;
use crate::domain::{bookings, tours, users};
use crate::domain::reviews as reviews_domain;
use crate::error::{AppError, AppResult};
use crate::payments::{self, PaymentGateway, WebhookVerifier};
use crate::query::FilterExpr;
use crate::rest::ResourceHandler;
use crate::store::DocumentStore;

/// Signature header the payment gateway sets on webhook deliveries
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub tours: Arc<ResourceHandler>,
    pub users: Arc<ResourceHandler>,
    pub reviews: Arc<ResourceHandler>,
    pub bookings: Arc<ResourceHandler>,
    pub store: Arc<dyn DocumentStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub verifier: Arc<WebhookVerifier>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        gateway: Arc<dyn PaymentGateway>,
        config: AppConfig,
    ) -> Self {
        Self {
            tours: Arc::new(tours::handler(store.clone())),
            users: Arc::new(users::handler(store.clone())),
            reviews: Arc::new(reviews_domain::handler(store.clone())),
            bookings: Arc::new(bookings::handler(store.clone())),
            verifier: Arc::new(WebhookVerifier::new(config.webhook_secret.clone())),
            store,
            gateway,
            config: Arc::new(config),
        }
    }
}

/// Build the full application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/tours", get(list_tours).post(create_tour))
        .route("/api/v1/tours/top-5-cheap", get(top_tours))
        .route("/api/v1/tours/tour-stats", get(tour_stats))
        .route("/api/v1/tours/monthly-plan/:year", get(monthly_plan))
        .route(
            "/api/v1/tours/tours-within/:distance/center/:latlng/unit/:unit",
            get(tours_within),
        )
        .route("/api/v1/tours/distances/:latlng/unit/:unit", get(tour_distances))
        .route(
            "/api/v1/tours/:id",
            get(read_tour).patch(update_tour).delete(delete_tour),
        )
        .route(
            "/api/v1/tours/:id/reviews",
            get(list_tour_reviews).post(create_tour_review),
        )
        .route("/api/v1/users", get(list_users).post(create_user))
        .route(
            "/api/v1/users/:id",
            get(read_user).patch(update_user).delete(delete_user),
        )
        .route("/api/v1/reviews", get(list_reviews).post(create_review))
        .route(
            "/api/v1/reviews/:id",
            get(read_review).patch(update_review).delete(delete_review),
        )
        .route("/api/v1/bookings", get(list_bookings).post(create_booking))
        .route(
            "/api/v1/bookings/checkout-session/:tour_id",
            get(checkout_session),
        )
        // Mounted at the root, outside the API prefix: the gateway posts
        // here and the raw body must reach the signature check untouched.
        .route("/webhook-checkout", axum::routing::post(webhook_checkout))
        .route(
            "/api/v1/bookings/:id",
            get(read_booking).patch(update_booking).delete(delete_booking),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "success", "data": {"healthy": true}}))
}

// ---- tours ----

async fn list_tours(
    State(state): State<AppState>,
    Query(criteria): Query<HashMap<String, String>>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.tours.list_all(&criteria, &[])?))
}

async fn top_tours(State(state): State<AppState>) -> AppResult<Json<Value>> {
    Ok(Json(state.tours.list_all(&tours::top_tours_criteria(), &[])?))
}

async fn create_tour(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    Ok((StatusCode::CREATED, Json(state.tours.create(payload)?)))
}

async fn read_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.tours.read_one(&id)?))
}

async fn update_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.tours.update_one(&id, patch)?))
}

async fn delete_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.tours.delete_one(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- tour analytics ----

async fn tour_stats(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let tours = state.store.scan("tours")?;
    let stats = aggregate::ratings_summary(&tours)?;
    Ok(Json(json!({"status": "success", "data": {"stats": stats}})))
}

async fn monthly_plan(
    State(state): State<AppState>,
    Path(year): Path<String>,
) -> AppResult<Json<Value>> {
    let year: i32 = year
        .parse()
        .map_err(|_| AppError::validation("year must be a four-digit number"))?;

    let tours = state.store.scan("tours")?;
    let plan = aggregate::monthly_plan(&tours, year)?;
    Ok(Json(json!({"status": "success", "data": {"plan": plan}})))
}

async fn tours_within(
    State(state): State<AppState>,
    Path((distance, latlng, unit)): Path<(String, String, String)>,
) -> AppResult<Json<Value>> {
    let distance: f64 = distance
        .parse()
        .map_err(|_| AppError::validation("distance must be a number"))?;

    // Unlike the aggregate reports, this is a read of tour documents, so
    // the usual visibility rules apply.
    let tours = state.tours.visible_documents()?;
    let within = aggregate::tours_within(&tours, distance, &latlng, &unit)?;
    Ok(Json(json!({
        "status": "success",
        "results": within.len(),
        "data": {"tours": within},
    })))
}

async fn tour_distances(
    State(state): State<AppState>,
    Path((latlng, unit)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let tours = state.store.scan("tours")?;
    let distances = aggregate::distances(&tours, &latlng, &unit)?;
    Ok(Json(json!({
        "status": "success",
        "data": {"distances": distances},
    })))
}

// ---- nested reviews ----

async fn list_tour_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(criteria): Query<HashMap<String, String>>,
) -> AppResult<Json<Value>> {
    let scope = [FilterExpr::eq("tour", Value::String(id))];
    Ok(Json(state.reviews.list_all(&criteria, &scope)?))
}

async fn create_tour_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut payload): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    if let Some(obj) = payload.as_object_mut() {
        obj.entry("tour").or_insert_with(|| Value::String(id));
    }
    Ok((StatusCode::CREATED, Json(state.reviews.create(payload)?)))
}

// ---- users ----

async fn list_users(
    State(state): State<AppState>,
    Query(criteria): Query<HashMap<String, String>>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.users.list_all(&criteria, &[])?))
}

async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    Ok((StatusCode::CREATED, Json(state.users.create(payload)?)))
}

async fn read_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.users.read_one(&id)?))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.users.update_one(&id, patch)?))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.users.delete_one(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- reviews ----

async fn list_reviews(
    State(state): State<AppState>,
    Query(criteria): Query<HashMap<String, String>>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.reviews.list_all(&criteria, &[])?))
}

async fn create_review(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    Ok((StatusCode::CREATED, Json(state.reviews.create(payload)?)))
}

async fn read_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.reviews.read_one(&id)?))
}

async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.reviews.update_one(&id, patch)?))
}

async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.reviews.delete_one(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- bookings ----

async fn list_bookings(
    State(state): State<AppState>,
    Query(criteria): Query<HashMap<String, String>>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.bookings.list_all(&criteria, &[])?))
}

async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    Ok((StatusCode::CREATED, Json(state.bookings.create(payload)?)))
}

async fn read_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.bookings.read_one(&id)?))
}

async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.bookings.update_one(&id, patch)?))
}

async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.bookings.delete_one(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- checkout ----

async fn checkout_session(
    State(state): State<AppState>,
    Path(tour_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Value>> {
    let email = params
        .get("email")
        .ok_or_else(|| AppError::validation("Please provide the customer email"))?;

    let body = bookings::create_checkout_session(
        &state.store,
        &state.gateway,
        &state.config,
        &tour_id,
        email,
    )
    .await?;
    Ok(Json(body))
}

async fn webhook_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Upstream("missing webhook signature header".into()))?;

    state.verifier.verify(&body, signature)?;

    if let Some(event) = payments::parse_event(&body)? {
        bookings::record_checkout(&state.store, &event)?;
        tracing::info!(tour = %event.tour_id, "checkout completed");
    }

    Ok(Json(json!({"received": true})))
}
