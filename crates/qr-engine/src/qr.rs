//! QR code rasterisation with custom module colours.

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fit::fit_to_canvas;
use crate::{HexColor, MAX_SIZE, QrEngineError, Result};

/// Error-correction level, ordered by increasing redundancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum EcLevel {
    L,
    M,
    Q,
    #[default]
    H,
}

impl EcLevel {
    /// Lenient parse: unknown values fall back to the highest level.
    pub fn from_str_setting(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EcLevel::L => "L",
            EcLevel::M => "M",
            EcLevel::Q => "Q",
            EcLevel::H => "H",
        }
    }

    fn to_qrcode(self) -> qrcode::EcLevel {
        match self {
            EcLevel::L => qrcode::EcLevel::L,
            EcLevel::M => qrcode::EcLevel::M,
            EcLevel::Q => qrcode::EcLevel::Q,
            EcLevel::H => qrcode::EcLevel::H,
        }
    }
}

impl FromStr for EcLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(EcLevel::L),
            "M" => Ok(EcLevel::M),
            "Q" => Ok(EcLevel::Q),
            "H" => Ok(EcLevel::H),
            other => Err(format!("unknown error-correction level: {other:?}")),
        }
    }
}

impl fmt::Display for EcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the rasteriser needs for one code.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub text: String,
    pub width: u32,
    pub height: u32,
    pub dark: HexColor,
    pub light: HexColor,
    pub ec_level: EcLevel,
}

impl RenderRequest {
    /// Square request with default black-on-white colours and level H.
    pub fn square(text: impl Into<String>, size: u32) -> Self {
        Self {
            text: text.into(),
            width: size,
            height: size,
            dark: HexColor::BLACK,
            light: HexColor::WHITE,
            ec_level: EcLevel::H,
        }
    }
}

/// Render a QR code onto a `width x height` RGBA canvas.
///
/// Each module is scaled by the largest integer factor that fits both
/// dimensions; the remaining margin is filled with the light colour.
pub fn render_qr(request: &RenderRequest) -> Result<RgbaImage> {
    let valid = 1..=MAX_SIZE;
    if !valid.contains(&request.width) || !valid.contains(&request.height) {
        return Err(QrEngineError::InvalidSize {
            width: request.width,
            height: request.height,
        });
    }

    let code = QrCode::with_error_correction_level(
        request.text.as_bytes(),
        request.ec_level.to_qrcode(),
    )
    .map_err(|e| QrEngineError::Encode(e.to_string()))?;
    let modules = code.to_colors();
    let module_count = code.width() as u32;

    let scale = (request.width.min(request.height) / module_count).max(1);
    let symbol_size = module_count * scale;

    debug!(
        module_count,
        scale,
        symbol_size,
        ec_level = %request.ec_level,
        "Rasterising QR symbol"
    );

    let dark = request.dark.to_rgba();
    let mut symbol = RgbaImage::from_pixel(symbol_size, symbol_size, request.light.to_rgba());

    for (i, color) in modules.iter().enumerate() {
        if *color != qrcode::Color::Dark {
            continue;
        }
        let x = (i as u32) % module_count;
        let y = (i as u32) / module_count;
        for dy in 0..scale {
            for dx in 0..scale {
                symbol.put_pixel(x * scale + dx, y * scale + dy, dark);
            }
        }
    }

    Ok(fit_to_canvas(&symbol, request.width, request.height, request.light.to_rgba()))
}
