//! # Payments
//!
//! Checkout-session creation against the external card provider and
//! signed-webhook consumption for completed checkouts.

pub mod gateway;
pub mod webhook;

pub use gateway::{
    CheckoutSession, CheckoutSessionRequest, HttpGateway, LineItem, MockGateway, PaymentGateway,
};
pub use webhook::{parse_event, CheckoutCompleted, WebhookVerifier};
