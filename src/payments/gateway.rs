//! # Payment Gateway Client
//!
//! Checkout sessions are created against an external card-payment
//! provider. The gateway sits behind a trait so tests and the dev server
//! can run against the in-process mock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// What the customer is buying, in the provider's line-item shape
#[derive(Debug, Clone, Serialize)]
pub struct LineItem {
    pub name: String,
    pub description: String,
    /// Unit amount in the currency's smallest denomination (cents)
    pub amount: u64,
    pub currency: String,
    pub quantity: u32,
}

/// Everything the provider needs to open a hosted checkout page
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSessionRequest {
    /// Carried through to the completion webhook untouched; holds the
    /// tour id so the booking can be reconstructed.
    pub client_reference_id: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    pub line_item: LineItem,
}

/// The provider's handle for an open checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
    pub status: String,
}

/// Creates hosted checkout sessions
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession>;
}

/// Gateway talking to the real provider over HTTPS with form-encoded
/// bodies and bearer authentication.
pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpGateway {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession> {
        let form = [
            ("payment_method_types[]", "card".to_string()),
            ("mode", "payment".to_string()),
            ("client_reference_id", request.client_reference_id),
            ("customer_email", request.customer_email),
            ("success_url", request.success_url),
            ("cancel_url", request.cancel_url),
            ("line_items[0][name]", request.line_item.name),
            ("line_items[0][description]", request.line_item.description),
            ("line_items[0][amount]", request.line_item.amount.to_string()),
            ("line_items[0][currency]", request.line_item.currency),
            (
                "line_items[0][quantity]",
                request.line_item.quantity.to_string(),
            ),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("payment gateway unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "payment gateway returned {status}: {body}"
            )));
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| AppError::Upstream(format!("malformed gateway response: {e}")))
    }
}

/// In-process gateway for tests and the dev server; sessions are minted
/// locally and always open.
#[derive(Default)]
pub struct MockGateway;

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession> {
        let id = format!("cs_test_{}", Uuid::new_v4().simple());
        Ok(CheckoutSession {
            url: format!("{}?session_id={id}", request.success_url),
            id,
            status: "open".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            client_reference_id: "tour-1".into(),
            customer_email: "ada@example.com".into(),
            success_url: "https://example.com/".into(),
            cancel_url: "https://example.com/tour/forest-hiker".into(),
            line_item: LineItem {
                name: "The Forest Hiker Tour".into(),
                description: "Breathtaking hike".into(),
                amount: 39_700,
                currency: "usd".into(),
                quantity: 1,
            },
        }
    }

    #[tokio::test]
    async fn test_mock_gateway_mints_open_sessions() {
        let session = MockGateway.create_checkout_session(request()).await.unwrap();

        assert!(session.id.starts_with("cs_test_"));
        assert_eq!(session.status, "open");
        assert!(session.url.contains(&session.id));
    }

    #[tokio::test]
    async fn test_mock_gateway_sessions_are_unique() {
        let a = MockGateway.create_checkout_session(request()).await.unwrap();
        let b = MockGateway.create_checkout_session(request()).await.unwrap();
        assert_ne!(a.id, b.id);
    }
}
