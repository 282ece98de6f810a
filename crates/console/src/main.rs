//! Identity console server.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use identity_console::{AppState, Config, routes, session};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting identity console");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        port = config.port,
        api = %config.api_base_url,
        guard_policy = ?config.guard_policy,
        capability_default = ?config.capability_default,
        "Configuration loaded"
    );

    let state = AppState::new(&config);

    // Middleware layers (last added = first executed in request flow):
    // TraceLayer → session → routes
    let app = session::with_session_layer(routes::router(state), &config)
        .await
        .context("failed to create session layer")?
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
