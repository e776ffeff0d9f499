//! Scene rendering
//!
//! Two interchangeable particle backends behind one trait: a wgpu point
//! sprite overlay and a tiny-skia software fallback. The full scene pass
//! (background, neon stroke, apex ornaments) is always CPU-rasterized by
//! `SoftwareRenderer`; the particle backend only decides where the snow and
//! sparkles land.

pub mod gpu;
pub mod software;
pub mod sprite;

pub use gpu::GpuParticles;
pub use software::{SoftwareParticles, SoftwareRenderer};
pub use sprite::{SpriteInstance, pack_sprites};

use thiserror::Error;
use tiny_skia::Pixmap;

use crate::Viewport;
use crate::sim::{SnowField, SparkleField};

/// Per-frame rendering failures
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("pixmap allocation failed for {width}x{height}")]
    PixmapAlloc { width: u32, height: u32 },
}

/// Backend initialization failures; all recoverable by falling back to the
/// software path
#[derive(Debug, Error)]
pub enum RenderInitError {
    #[error("surface creation failed: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("shader or pipeline rejected: {0}")]
    Pipeline(String),
}

/// A drift + sparkle drawing backend
pub trait ParticleRenderer {
    /// Draw the advanced particle state for this frame
    fn draw(
        &mut self,
        snow: &SnowField,
        sparkles: &SparkleField,
        time_ms: f64,
    ) -> Result<(), RenderError>;

    /// Adopt a new viewport size
    fn resize(&mut self, viewport: Viewport) -> Result<(), RenderError>;

    /// Transparent pixmap to composite into the scene pass, if this backend
    /// draws on the CPU. GPU backends present to their own surface and
    /// return `None`.
    fn overlay(&self) -> Option<&Pixmap>;
}
