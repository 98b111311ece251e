//! Setting value validation.

use qr_engine::{MAX_SIZE, MIN_SIZE};
use regex::Regex;
use std::sync::LazyLock;

static RE_HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#?([0-9A-Fa-f]{3}|[0-9A-Fa-f]{6})$").unwrap());

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "SERVER_PORT" => validate_int_range(value, 1, 65535)?,
        "QR_DEFAULT_SIZE" => validate_int_range(value, MIN_SIZE.into(), MAX_SIZE.into())?,
        "QR_DEFAULT_EC_LEVEL" => {
            if !["L", "M", "Q", "H"].contains(&value.to_ascii_uppercase().as_str()) {
                return Err("must be one of L, M, Q, H".into());
            }
        }
        "QR_DARK_COLOR" | "QR_LIGHT_COLOR" => {
            if !RE_HEX_COLOR.is_match(value) {
                return Err("must be a hex color (#RGB or #RRGGBB)".into());
            }
        }
        "QR_COOLDOWN_SECONDS" => validate_int_range(value, 0, 60)?,
        "QR_DOWNLOAD_FILENAME" => {
            if value.is_empty() || value.contains(['/', '\\']) {
                return Err("must be a bare file name".into());
            }
            if !value.to_ascii_lowercase().ends_with(".png") {
                return Err("must end with .png".into());
            }
        }
        "QR_RENDER_MODE" => {
            if value != "surface" && value != "image" {
                return Err("must be 'surface' or 'image'".into());
            }
        }
        "STATUS_PRESENTATION" => {
            if value != "inline" && value != "alert" {
                return Err("must be 'inline' or 'alert'".into());
            }
        }
        "READY_POLL_INTERVAL_MS" | "READY_POLL_ATTEMPTS" => validate_int_range(value, 1, 1000)?,
        "DECODE_TIMEOUT_MS" => validate_int_range(value, 10, 60_000)?,
        "DEBOUNCE_COLOR_MS" | "DEBOUNCE_SIZE_MS" | "DEBOUNCE_EC_LEVEL_MS" => {
            validate_int_range(value, 0, 5000)?
        }
        _ => {}
    }
    Ok(())
}

fn validate_int_range(value: &str, min: i64, max: i64) -> Result<(), String> {
    let v: i64 = value.parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}
