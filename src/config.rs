//! Application Configuration
//!
//! Configuration for the HTTP server, CORS, and the payment gateway.
//! Values come from defaults overridden by environment variables.

use serde::{Deserialize, Serialize};

/// Server and integration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 3000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins (default: local dev servers)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Public base URL used for checkout redirect targets
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Payment provider checkout endpoint
    #[serde(default = "default_gateway_endpoint")]
    pub gateway_endpoint: String,

    /// Payment provider API key; empty selects the in-process mock
    #[serde(default)]
    pub gateway_api_key: String,

    /// Shared secret for webhook signature checks
    #[serde(default = "default_webhook_secret")]
    pub webhook_secret: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_gateway_endpoint() -> String {
    "https://api.stripe.com/v1/checkout/sessions".to_string()
}

fn default_webhook_secret() -> String {
    "whsec_dev".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            public_url: default_public_url(),
            gateway_endpoint: default_gateway_endpoint(),
            gateway_api_key: String::new(),
            webhook_secret: default_webhook_secret(),
        }
    }
}

impl AppConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Defaults overridden by `TRAILHEAD_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("TRAILHEAD_HOST") {
            config.host = host;
        }
        if let Some(port) = std::env::var("TRAILHEAD_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            config.port = port;
        }
        if let Ok(origins) = std::env::var("TRAILHEAD_CORS_ORIGINS") {
            config.cors_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(url) = std::env::var("TRAILHEAD_PUBLIC_URL") {
            config.public_url = url;
        }
        if let Ok(endpoint) = std::env::var("TRAILHEAD_GATEWAY_ENDPOINT") {
            config.gateway_endpoint = endpoint;
        }
        if let Ok(key) = std::env::var("TRAILHEAD_GATEWAY_API_KEY") {
            config.gateway_api_key = key;
        }
        if let Ok(secret) = std::env::var("TRAILHEAD_WEBHOOK_SECRET") {
            config.webhook_secret = secret;
        }

        config
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
