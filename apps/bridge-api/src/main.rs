//! adbridge provisioning bridge
//!
//! SCIM 2.0 server translating identity-provider provisioning traffic
//! into Active Directory user-lifecycle operations, with a relational
//! cache mirroring both sides.

mod config;
mod health;
mod logging;

use axum::{routing::get, Extension, Router};
use config::Config;
use tokio::signal;
use tracing::info;

use adbridge_api_scim::{scim_resource_router, ScimConfig};

#[tokio::main]
async fn main() {
    // Load configuration (fail-fast on missing required values)
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.host,
        port = config.port,
        base_ou = %config.base_ou,
        "Starting adbridge API"
    );

    let pool = match adbridge_db::connect(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    };

    let mut scim_config = ScimConfig::new(
        pool.clone(),
        config.base_url.clone(),
        config.base_ou.clone(),
        config.default_password.clone(),
        config.api_key.clone(),
    )
    .with_powershell(config.powershell.clone());
    if let Some(server) = &config.ad_server {
        scim_config = scim_config.with_ad_server(server.clone());
    }

    let app = Router::new()
        .route("/health", get(health::health_handler))
        .nest("/scim/v2", scim_resource_router(scim_config))
        .layer(Extension(pool));

    let listener = match tokio::net::TcpListener::bind(config.bind_addr()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %config.bind_addr(), "Failed to bind");
            std::process::exit(1);
        }
    };

    info!(addr = %config.bind_addr(), "Listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Resolve when the process receives a shutdown signal.
///
/// A client that disconnects mid-request is simply dropped; in-flight
/// directory commands still complete and update the cache.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("Shutdown signal received");
}
