//! Headless server binary.
//!
//! Loads configuration, wires the QR controller and serves the HTTP API
//! until Ctrl+C.

use tracing_subscriber::EnvFilter;

use qr_studio_lib::app::SharedState;
use qr_studio_lib::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting QR studio");

    let (settings, config, dir) = qr_studio_lib::init_foundation()?;
    let state = SharedState::new(settings, config, dir);

    let server_state = state.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::start_server(server_state).await {
            tracing::error!("Server failed: {e}");
        }
    });

    tracing::info!(
        port = state.server_port(),
        "Server running. Press Ctrl+C to stop."
    );

    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = state.shutdown_token().cancelled() => {}
    }
    tracing::info!("Shutting down...");

    state.shutdown();
    if let Err(e) = server_handle.await {
        tracing::warn!("Server task ended abnormally: {e}");
    }
    Ok(())
}
