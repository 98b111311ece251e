pub mod app;
pub mod config;
pub mod controller;
pub mod render;
pub mod server;
pub mod services;

use std::path::PathBuf;

use config::{AppConfig, SettingsManager};

/// Determine the data directory for the application.
/// Priority: QR_STUDIO_DATA_DIR env var > ~/.qr-studio
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("QR_STUDIO_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".qr-studio")
}

/// Load .env from multiple candidate paths.
fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}

/// Load .env, resolve settings and prepare the data directory.
pub fn init_foundation() -> Result<(SettingsManager, AppConfig, PathBuf), anyhow::Error> {
    load_dotenv();

    let dir = data_dir();
    std::fs::create_dir_all(&dir)?;

    let sm = SettingsManager::from_env();
    let config = AppConfig::load(&sm)?;

    tracing::info!(
        port = config.server_port,
        render_mode = ?config.render_mode,
        cooldown = config.cooldown_seconds,
        "Settings loaded"
    );
    Ok((sm, config, dir))
}
