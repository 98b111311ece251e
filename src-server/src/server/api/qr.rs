//! QR generation API:
//!   GET  /api/qr/state     – controller snapshot + current status
//!   POST /api/qr/generate  – validate input and render a new code
//!   POST /api/qr/input     – debounced live regeneration
//!   POST /api/qr/download  – save the ready code, start the cooldown
//!   GET  /api/qr/preview   – current drawable as PNG
//!   GET  /api/qr/contrast  – contrast check for a colour pair

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use qr_engine::HexColor;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::app::SharedState;
use crate::controller::{ControlError, GenerateOptions, InputTrigger};
use crate::services::{Status, StatusReporter};

use super::{ApiError, err_json, err_kind_json};

type ApiResult = Result<Json<Value>, ApiError>;

/// Form values; anything missing falls back to the configured defaults.
#[derive(Debug, Default, Deserialize)]
pub struct QrForm {
    #[serde(default)]
    pub text: String,
    pub dark: Option<String>,
    pub light: Option<String>,
    pub size: Option<u32>,
    pub ec_level: Option<String>,
}

impl QrForm {
    fn options(&self, defaults: &GenerateOptions) -> Result<GenerateOptions, ControlError> {
        GenerateOptions::from_form(
            defaults,
            self.dark.as_deref(),
            self.light.as_deref(),
            self.size,
            self.ec_level.as_deref(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct InputBody {
    pub trigger: InputTrigger,
    #[serde(flatten)]
    pub form: QrForm,
}

#[derive(Debug, Deserialize)]
pub struct ContrastQuery {
    pub dark: Option<String>,
    pub light: Option<String>,
}

fn control_err(e: &ControlError) -> ApiError {
    let status = match e {
        ControlError::EmptyInput
        | ControlError::LowContrast { .. }
        | ControlError::InvalidSize { .. }
        | ControlError::InvalidColor(_) => 422,
        ControlError::NotReady => 409,
        ControlError::CooldownActive { .. } => 429,
        ControlError::Render(_) | ControlError::Export(_) | ControlError::Save(_) => 500,
    };
    err_kind_json(status, e.kind(), &e.to_string())
}

/// Parse form options, surfacing bad colours and sizes on the status line too.
fn form_options(state: &SharedState, form: &QrForm) -> Result<GenerateOptions, ApiError> {
    form.options(&state.default_options()).map_err(|e| {
        state.status().report(Status::rejected(e.to_string()));
        control_err(&e)
    })
}

fn state_body(state: &SharedState) -> Value {
    let mut body = json!(state.controller().snapshot());
    body["status"] = json!(state.status().current());
    body
}

/// GET /api/qr/state
pub async fn get_state(State(state): State<SharedState>) -> Json<Value> {
    Json(state_body(&state))
}

/// POST /api/qr/generate
pub async fn generate(State(state): State<SharedState>, Json(form): Json<QrForm>) -> ApiResult {
    let options = form_options(&state, &form)?;
    state
        .controller()
        .generate(&form.text, &options)
        .map_err(|e| control_err(&e))?;
    Ok(Json(state_body(&state)))
}

/// POST /api/qr/input
pub async fn input_changed(
    State(state): State<SharedState>,
    Json(body): Json<InputBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let options = form_options(&state, &body.form)?;
    let scheduled = state
        .controller()
        .schedule_regenerate(body.trigger, &body.form.text, options);
    Ok((StatusCode::ACCEPTED, Json(json!({ "scheduled": scheduled }))))
}

/// POST /api/qr/download
pub async fn download(State(state): State<SharedState>) -> ApiResult {
    let saved = state.controller().download().map_err(|e| control_err(&e))?;
    Ok(Json(json!(saved)))
}

/// GET /api/qr/preview
pub async fn preview(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let drawable = state
        .controller()
        .current_drawable()
        .ok_or_else(|| err_json(404, "No QR code displayed"))?;
    let png = drawable
        .to_png()
        .map_err(|e| err_json(500, &format!("Failed to encode preview: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        png,
    )
        .into_response())
}

/// GET /api/qr/contrast?dark=&light=
pub async fn contrast(
    State(state): State<SharedState>,
    Query(query): Query<ContrastQuery>,
) -> ApiResult {
    let defaults = state.default_options();
    let parse = |value: Option<&str>, fallback: HexColor| match value {
        Some(v) => HexColor::parse(v)
            .map_err(|e| err_kind_json(422, "invalid_color", &e.to_string())),
        None => Ok(fallback),
    };
    let dark = parse(query.dark.as_deref(), defaults.dark)?;
    let light = parse(query.light.as_deref(), defaults.light)?;

    let gate = state.controller().contrast_gate();
    let mut body = json!(gate.check(dark, light));
    body["min_ratio"] = json!(gate.min_ratio());
    Ok(Json(body))
}
