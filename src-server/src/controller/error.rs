use qr_engine::{MAX_SIZE, MIN_SIZE, QrEngineError};

use crate::render::RenderError;
use crate::services::SaveError;

/// Outcomes of controller operations that did not go through.
///
/// Every variant is also reported through the status line; none is fatal.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Nothing to encode")]
    EmptyInput,

    #[error("Colors too similar (contrast {ratio:.2}:1)")]
    LowContrast { ratio: f64 },

    #[error("Size {size}px is outside {min}..={max}", min = MIN_SIZE, max = MAX_SIZE)]
    InvalidSize { size: u32 },

    #[error("No QR code to download yet")]
    NotReady,

    #[error("Download cooling down, {remaining}s remaining")]
    CooldownActive { remaining: u32 },

    #[error("Invalid color: {0}")]
    InvalidColor(#[source] QrEngineError),

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("Export failed: {0}")]
    Export(#[source] QrEngineError),

    #[error("Save failed: {0}")]
    Save(#[from] SaveError),
}

impl ControlError {
    /// Stable machine-readable name.
    pub fn kind(&self) -> &'static str {
        match self {
            ControlError::EmptyInput => "empty_input",
            ControlError::LowContrast { .. } => "low_contrast",
            ControlError::InvalidSize { .. } => "invalid_size",
            ControlError::NotReady => "not_ready",
            ControlError::CooldownActive { .. } => "cooldown_active",
            ControlError::InvalidColor(_) => "invalid_color",
            ControlError::Render(_) => "render_failed",
            ControlError::Export(_) => "export_failed",
            ControlError::Save(_) => "save_failed",
        }
    }
}
