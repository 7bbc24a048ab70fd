//! trailhead server entry point
//!
//! Parses CLI flags, initializes tracing, wires the application state,
//! and runs the HTTP server. All logic lives in the library.

use std::sync::Arc;

use clap::Parser;

use trailhead::config::AppConfig;
use trailhead::http::{serve, AppState};
use trailhead::payments::{HttpGateway, MockGateway, PaymentGateway};
use trailhead::store::MemoryStore;

#[derive(Parser)]
#[command(name = "trailhead", about = "Tour-booking REST API server")]
struct Cli {
    /// Port to bind (overrides TRAILHEAD_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Host to bind (overrides TRAILHEAD_HOST)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trailhead=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }

    // An empty API key selects the in-process mock gateway, which keeps
    // local development free of provider credentials.
    let gateway: Arc<dyn PaymentGateway> = if config.gateway_api_key.is_empty() {
        tracing::warn!("no gateway API key configured, using mock payment gateway");
        Arc::new(MockGateway)
    } else {
        Arc::new(HttpGateway::new(
            config.gateway_endpoint.clone(),
            config.gateway_api_key.clone(),
        ))
    };

    let state = AppState::new(Arc::new(MemoryStore::new()), gateway, config);

    if let Err(e) = serve(state).await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
