//! All setting definitions with their default values.

use std::collections::HashMap;
use std::sync::LazyLock;

type DefTuple = (&'static str, &'static str, &'static str);

const DEFS: &[DefTuple] = &[
    ("SERVER_PORT", "8080", "HTTP server port"),
    ("QR_DEFAULT_SIZE", "320", "Default edge length of a rendered code in pixels"),
    ("QR_DEFAULT_EC_LEVEL", "H", "Default error-correction level (L, M, Q, H)"),
    ("QR_DARK_COLOR", "#000000", "Default foreground (dark module) colour"),
    ("QR_LIGHT_COLOR", "#ffffff", "Default background (light module) colour"),
    ("QR_COOLDOWN_SECONDS", "3", "Seconds to wait between downloads (0 disables)"),
    ("QR_DOWNLOAD_FILENAME", "qr-code.png", "File name suggested for downloads"),
    ("QR_OUTPUT_DIR", "", "Download directory (empty: <data dir>/downloads)"),
    ("QR_RENDER_MODE", "surface", "Drawable type produced by the renderer (surface, image)"),
    ("STATUS_PRESENTATION", "inline", "How rejected input is presented (inline, alert)"),
    ("READY_POLL_INTERVAL_MS", "50", "Interval between readiness polls"),
    ("READY_POLL_ATTEMPTS", "40", "Readiness polls before giving up"),
    ("DECODE_TIMEOUT_MS", "2000", "Maximum wait for an image drawable to decode"),
    ("DEBOUNCE_COLOR_MS", "80", "Quiet period after a colour change before regenerating"),
    ("DEBOUNCE_SIZE_MS", "80", "Quiet period after a size change before regenerating"),
    (
        "DEBOUNCE_EC_LEVEL_MS",
        "0",
        "Quiet period after an error-correction change before regenerating",
    ),
];

/// A single setting definition.
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

/// Global setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<HashMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEFS.iter()
        .map(|&(key, default, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    description,
                },
            )
        })
        .collect()
});

/// Get the default value for a setting key, or `None` if not defined.
pub fn get_default(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS.get(key).map(|d| d.default)
}
