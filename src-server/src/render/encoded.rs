use qr_engine::{QrEngineError, RenderRequest, decode_data_uri, png_data_uri, render_qr};
use tokio::runtime::Handle;

use super::{DecodeSignal, DisplayTarget, Drawable, ImageNode, RenderError, Renderer};

/// Inserts a PNG image node and decodes it on a blocking task.
///
/// The node is visible immediately but only becomes paintable once the
/// decode completes. Requires a Tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRenderer;

impl Renderer for ImageRenderer {
    fn render(&self, target: DisplayTarget, request: &RenderRequest) -> Result<(), RenderError> {
        let handle = Handle::try_current().map_err(|e| RenderError::Backend(e.to_string()))?;

        let src = png_data_uri(&render_qr(request)?)?;
        let (node, signal) = ImageNode::pending(src.clone());
        if !target.insert(Drawable::Image(node)) {
            return Ok(());
        }

        handle.spawn_blocking(move || decode_into(&src, signal));
        Ok(())
    }
}

fn decode_into(src: &str, signal: DecodeSignal) {
    let decoded = decode_data_uri(src)
        .and_then(|uri| image::load_from_memory(&uri.bytes).map_err(QrEngineError::from));
    match decoded {
        Ok(img) => signal.loaded(img.width(), img.height()),
        Err(e) => {
            tracing::warn!("Image drawable failed to decode: {e}");
            signal.failed(e.to_string());
        }
    }
}
