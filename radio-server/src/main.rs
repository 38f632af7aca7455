use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use radio_server::client::RadioClient;
use radio_server::config::{ClientConfig, parse_mirror_list};
use radio_server::web::{AppState, create_router};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("radio_server=info")),
        )
        .init();

    if let Err(message) = run().await {
        error!(error = %message, "Server stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let config = config_from_env();
    info!(mirrors = config.providers.len(), "Starting radio directory server");

    let client = RadioClient::new(config).map_err(|e| format!("failed to create client: {e}"))?;
    let client = Arc::new(client);

    // Probe in the background; the first request waits for it.
    client.start_initialization();

    let app = create_router(AppState::new(client));

    let addr: SocketAddr = std::env::var("RADIO_BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()
        .map_err(|e| format!("invalid RADIO_BIND_ADDR: {e}"))?;

    info!("Radio directory server listening on http://{addr}");
    info!("  GET  /health                        - Health check");
    info!("  GET  /api/stations/search           - Search stations");
    info!("  GET  /api/stations/top?locale=      - Recommended stations");
    info!("  GET  /api/providers                 - Mirror status");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| format!("server error: {e}"))
}

/// Read the client configuration from the environment.
fn config_from_env() -> ClientConfig {
    let mut config = match std::env::var("RADIO_MIRRORS") {
        Ok(raw) => {
            let providers = parse_mirror_list(&raw);
            if providers.is_empty() {
                warn!("RADIO_MIRRORS is empty, using default mirrors");
                ClientConfig::default()
            } else {
                ClientConfig::new(providers)
            }
        }
        Err(_) => ClientConfig::default(),
    };

    if let Ok(user_agent) = std::env::var("RADIO_USER_AGENT") {
        config = config.with_user_agent(user_agent);
    }
    config
}
