//! PNG and data URI export.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::{QrEngineError, Result};

const PNG_MIME: &str = "image/png";

/// A decoded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Encode an RGBA raster as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(bytes)
}

/// Encode an RGBA raster as a `data:image/png;base64,...` URI.
pub fn png_data_uri(img: &RgbaImage) -> Result<String> {
    let bytes = encode_png(img)?;
    Ok(format!("data:{PNG_MIME};base64,{}", STANDARD.encode(bytes)))
}

/// Decode a base64 `data:` URI. Percent-encoded (non-base64) URIs are rejected.
pub fn decode_data_uri(uri: &str) -> Result<DataUri> {
    let rest = uri.strip_prefix("data:").ok_or(QrEngineError::InvalidDataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(QrEngineError::InvalidDataUri)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(QrEngineError::InvalidDataUri)?;

    Ok(DataUri {
        mime: if mime.is_empty() {
            "text/plain".into()
        } else {
            mime.to_string()
        },
        bytes: STANDARD.decode(payload)?,
    })
}
