//! Settings API:
//!   GET /api/settings – effective settings with descriptions

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::app::SharedState;

use super::ok_json;

/// GET /api/settings
pub async fn get_settings(State(state): State<SharedState>) -> Json<Value> {
    let settings: BTreeMap<String, Value> = state
        .settings()
        .get_all_settings()
        .into_iter()
        .map(|(key, info)| {
            let val = json!({
                "key": info.key,
                "value": info.value,
                "description": info.description,
                "is_default": info.is_default,
            });
            (key, val)
        })
        .collect();

    ok_json(json!({
        "settings": settings,
        "data_dir": state.data_dir().display().to_string(),
    }))
}
