//! Renderer collaborators and the display container they draw into.
//!
//! A renderer receives a [`DisplayTarget`] bound to one generation of the
//! display and inserts exactly one [`Drawable`] through it, either right away
//! or later from a background task. Targets from superseded generations are
//! inert, so late output never reaches the display.

mod encoded;
mod surface;

pub use encoded::ImageRenderer;
pub use surface::SurfaceRenderer;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::RgbaImage;
use qr_engine::{QrEngineError, RenderRequest, decode_data_uri, encode_png, png_data_uri};
use tokio::sync::watch;

use crate::config::RenderMode;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Engine(#[from] QrEngineError),

    #[error("Renderer backend unavailable: {0}")]
    Backend(String),
}

/// Produces a drawable for a request inside the display container.
pub trait Renderer: Send + Sync {
    fn render(&self, target: DisplayTarget, request: &RenderRequest) -> Result<(), RenderError>;
}

/// Build the renderer for a configured render mode.
pub fn renderer_for(mode: RenderMode) -> Arc<dyn Renderer> {
    match mode {
        RenderMode::Surface => Arc::new(SurfaceRenderer),
        RenderMode::Image => Arc::new(ImageRenderer),
    }
}

/// Decode progress of an image drawable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeState {
    Pending,
    Loaded { width: u32, height: u32 },
    Failed(String),
}

/// An image drawable: a PNG source URI whose pixels may still be decoding.
#[derive(Debug, Clone)]
pub struct ImageNode {
    src: Arc<str>,
    state: watch::Receiver<DecodeState>,
}

/// Completes the decode of an [`ImageNode`]. Dropping it unresolved fails the node.
#[derive(Debug)]
pub struct DecodeSignal {
    tx: watch::Sender<DecodeState>,
}

impl ImageNode {
    /// A node in `Pending` state, plus the signal that completes it.
    pub fn pending(src: impl Into<String>) -> (Self, DecodeSignal) {
        let (tx, rx) = watch::channel(DecodeState::Pending);
        let src: String = src.into();
        let node = Self {
            src: Arc::from(src),
            state: rx,
        };
        (node, DecodeSignal { tx })
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn decode_state(&self) -> DecodeState {
        self.state.borrow().clone()
    }

    pub fn is_complete(&self) -> bool {
        matches!(*self.state.borrow(), DecodeState::Loaded { .. })
    }

    /// Wait until decoding has either finished or failed.
    pub async fn decoded(&self) -> DecodeState {
        let mut rx = self.state.clone();
        match rx.wait_for(|s| *s != DecodeState::Pending).await {
            Ok(state) => state.clone(),
            Err(_) => DecodeState::Failed("decoder went away".into()),
        }
    }
}

impl DecodeSignal {
    pub fn loaded(self, width: u32, height: u32) {
        let _ = self.tx.send(DecodeState::Loaded { width, height });
    }

    pub fn failed(self, reason: impl Into<String>) {
        let _ = self.tx.send(DecodeState::Failed(reason.into()));
    }
}

/// The rendered output shown in the display.
#[derive(Debug, Clone)]
pub enum Drawable {
    /// Directly paintable raster.
    Surface(Arc<RgbaImage>),
    /// Encoded image that must decode before it can be exported.
    Image(ImageNode),
}

impl Drawable {
    pub fn kind(&self) -> &'static str {
        match self {
            Drawable::Surface(_) => "surface",
            Drawable::Image(_) => "image",
        }
    }

    /// Whether the pixels are available right now.
    pub fn is_paintable(&self) -> bool {
        match self {
            Drawable::Surface(_) => true,
            Drawable::Image(node) => node.is_complete(),
        }
    }

    /// PNG data URI for download: pixel export for a surface, the source for an image.
    pub fn export_data_uri(&self) -> qr_engine::Result<String> {
        match self {
            Drawable::Surface(img) => png_data_uri(img),
            Drawable::Image(node) => Ok(node.src().to_string()),
        }
    }

    /// Raw PNG bytes for previews.
    pub fn to_png(&self) -> qr_engine::Result<Vec<u8>> {
        match self {
            Drawable::Surface(img) => encode_png(img),
            Drawable::Image(node) => Ok(decode_data_uri(node.src())?.bytes),
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    drawable: Option<Drawable>,
}

/// The single display slot a controller renders into.
#[derive(Debug, Clone, Default)]
pub struct DisplayContainer {
    slot: Arc<Mutex<Slot>>,
}

impl DisplayContainer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop the current drawable and open a new generation.
    pub fn clear(&self) -> DisplayTarget {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.drawable = None;
        DisplayTarget {
            container: self.clone(),
            generation: slot.generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn current(&self) -> Option<Drawable> {
        self.lock().drawable.clone()
    }

    /// The drawable, but only while `generation` is still current.
    pub fn current_for(&self, generation: u64) -> Option<Drawable> {
        let slot = self.lock();
        if slot.generation == generation {
            slot.drawable.clone()
        } else {
            None
        }
    }
}

/// Insertion handle for one generation of a [`DisplayContainer`].
#[derive(Debug, Clone)]
pub struct DisplayTarget {
    container: DisplayContainer,
    generation: u64,
}

impl DisplayTarget {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Insert a drawable, replacing any earlier one of the same generation.
    ///
    /// Returns `false` (and drops the drawable) when the generation is stale.
    pub fn insert(&self, drawable: Drawable) -> bool {
        let mut slot = self.container.lock();
        if slot.generation != self.generation {
            tracing::debug!(
                stale = self.generation,
                current = slot.generation,
                "Discarding drawable from superseded generation"
            );
            return false;
        }
        slot.drawable = Some(drawable);
        true
    }
}
