use std::sync::Arc;

use qr_engine::{RenderRequest, render_qr};

use super::{DisplayTarget, Drawable, RenderError, Renderer};

/// Rasterises synchronously; the surface is paintable as soon as it lands.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceRenderer;

impl Renderer for SurfaceRenderer {
    fn render(&self, target: DisplayTarget, request: &RenderRequest) -> Result<(), RenderError> {
        let img = render_qr(request)?;
        target.insert(Drawable::Surface(Arc::new(img)));
        Ok(())
    }
}
