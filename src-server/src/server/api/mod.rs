//! REST API handlers grouped by domain.

pub mod qr;
pub mod settings;

use axum::Json;
use axum::http::StatusCode;
use serde_json::{Value, json};

pub type ApiError = (StatusCode, Json<Value>);

/// Standard success response.
pub fn ok_json(data: Value) -> Json<Value> {
    Json(json!({ "status": "ok", "data": data }))
}

/// Standard error response.
pub fn err_json(status: u16, message: &str) -> ApiError {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(json!({ "status": "error", "error": message })),
    )
}

/// Error response carrying a machine-readable kind.
pub fn err_kind_json(status: u16, kind: &str, message: &str) -> ApiError {
    let (code, Json(mut body)) = err_json(status, message);
    body["kind"] = json!(kind);
    (code, Json(body))
}
