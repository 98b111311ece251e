use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::{api, websocket};
use crate::app::SharedState;

/// Create the axum router with all routes.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        // --- Core ---
        .route("/status", get(status_handler))
        .route("/ws", get(websocket::ws_handler))
        // --- QR ---
        .route("/api/qr/state", get(api::qr::get_state))
        .route("/api/qr/generate", post(api::qr::generate))
        .route("/api/qr/input", post(api::qr::input_changed))
        .route("/api/qr/download", post(api::qr::download))
        .route("/api/qr/preview", get(api::qr::preview))
        .route("/api/qr/contrast", get(api::qr::contrast))
        // --- Settings ---
        .route("/api/settings", get(api::settings::get_settings))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn status_handler() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
