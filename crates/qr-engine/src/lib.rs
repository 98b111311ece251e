//! QR code rendering primitives for QR Studio.
//!
//! Provides hex colour parsing, the scannability contrast gate,
//! QR rasterisation onto an exact-size canvas, and PNG / data URI export.

pub mod color;
pub mod contrast;
pub mod export;
pub mod fit;
pub mod qr;

// Re-exports for convenience
pub use color::HexColor;
pub use contrast::{ContrastGate, ContrastResult, MIN_CONTRAST_RATIO};
pub use export::{DataUri, decode_data_uri, encode_png, png_data_uri};
pub use fit::fit_to_canvas;
pub use qr::{EcLevel, RenderRequest, render_qr};

/// Default square edge length of a rendered code, in pixels.
pub const DEFAULT_SIZE: u32 = 320;

/// Smallest canvas edge accepted from user input, in pixels.
pub const MIN_SIZE: u32 = 64;

/// Largest canvas edge the rasteriser will allocate, in pixels.
pub const MAX_SIZE: u32 = 2048;

/// Errors that can occur while rendering or exporting a QR code.
#[derive(Debug, thiserror::Error)]
pub enum QrEngineError {
    #[error("Invalid color format: {0:?} (expected #RGB or #RRGGBB)")]
    InvalidColorFormat(String),

    #[error("Invalid size {width}x{height}: dimensions must be 1..={max}", max = MAX_SIZE)]
    InvalidSize { width: u32, height: u32 },

    #[error("QR encode error: {0}")]
    Encode(String),

    #[error("PNG encode error: {0}")]
    Png(#[from] image::ImageError),

    #[error("Invalid data URI")]
    InvalidDataUri,

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Result type alias for qr-engine operations.
pub type Result<T> = std::result::Result<T, QrEngineError>;
