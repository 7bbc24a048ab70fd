//! # Webhook Verification
//!
//! Completion events arrive as raw JSON with an HMAC-SHA256 signature
//! header. The signature is checked over the exact raw bytes before the
//! payload is parsed; a failed check rejects the event outright.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Verifies gateway signatures against a shared secret
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Check a hex-encoded HMAC-SHA256 signature over the raw body
    pub fn verify(&self, payload: &[u8], signature_hex: &str) -> AppResult<()> {
        let provided = hex::decode(signature_hex.trim())
            .map_err(|_| AppError::Upstream("Webhook signature is not valid hex".into()))?;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| AppError::Internal("webhook secret is empty".into()))?;
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        if expected.ct_eq(provided.as_slice()).into() {
            Ok(())
        } else {
            Err(AppError::Upstream("Webhook signature mismatch".into()))
        }
    }

    /// Sign a payload the way the gateway would; used by tests and the
    /// local event simulator.
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }
}

/// A completed checkout, extracted from the event payload
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutCompleted {
    /// The tour id carried through `client_reference_id`
    pub tour_id: String,
    pub customer_email: String,
    /// Total charged, in cents
    pub amount_total: u64,
}

#[derive(Deserialize)]
struct Event {
    #[serde(rename = "type")]
    kind: String,
    data: EventData,
}

#[derive(Deserialize)]
struct EventData {
    object: EventObject,
}

#[derive(Deserialize)]
struct EventObject {
    client_reference_id: Option<String>,
    customer_email: Option<String>,
    amount_total: Option<u64>,
}

/// Parse a verified event body.
///
/// Returns `Ok(None)` for event types we do not consume; those are
/// acknowledged without side effects.
pub fn parse_event(payload: &[u8]) -> AppResult<Option<CheckoutCompleted>> {
    let event: Event = serde_json::from_slice(payload)
        .map_err(|e| AppError::Upstream(format!("malformed webhook payload: {e}")))?;

    if event.kind != CHECKOUT_COMPLETED {
        return Ok(None);
    }

    let object = event.data.object;
    let missing = |field: &str| AppError::Upstream(format!("webhook event missing {field}"));

    Ok(Some(CheckoutCompleted {
        tour_id: object
            .client_reference_id
            .ok_or_else(|| missing("client_reference_id"))?,
        customer_email: object
            .customer_email
            .ok_or_else(|| missing("customer_email"))?,
        amount_total: object.amount_total.ok_or_else(|| missing("amount_total"))?,
    }))
}
