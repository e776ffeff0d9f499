//! Glowspire - a glowing spiral tree in drifting snow
//!
//! Core modules:
//! - `sim`: Deterministic scene simulation (growth, illumination, particles)
//! - `renderer`: Software (tiny-skia) and GPU (WebGPU point sprite) backends
//! - `settings`: Quality/backend preferences with LocalStorage persistence

pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::{BackendPreference, QualityPreset, Settings};

/// Scene tuning constants
pub mod consts {
    /// Growth speed in progress units per second (full helix in ~4.55 s)
    pub const GROWTH_SPEED: f32 = 0.22;
    /// Frame delta clamp in seconds (tab-switch pauses must not leap growth)
    pub const MAX_FRAME_DT: f32 = 0.05;

    /// Helix placement as fractions of the viewport
    pub const CENTER_X_FRAC: f32 = 0.5;
    pub const BASE_Y_FRAC: f32 = 0.80;
    pub const HEIGHT_FRAC: f32 = 0.62;
    pub const MAX_RADIUS_FRAC: f32 = 0.28;
    /// Full revolutions base to apex
    pub const HELIX_TURNS: f32 = 7.5;
    /// Radius taper exponent (slightly super-linear pinch toward the apex)
    pub const TAPER_EXPONENT: f32 = 1.15;

    /// Flakes per layer factor unit: area / this
    pub const SNOW_DENSITY_DIVISOR: f32 = 4200.0;
    /// Off-screen wrap margin in pixels
    pub const WRAP_MARGIN: f32 = 12.0;

    /// Cluster glows along the helix
    pub const CLUSTER_COUNT: usize = 7;
    /// Sparkles hugging the helix
    pub const SPARKLE_COUNT: usize = 220;
    /// Glitter speckles per software frame
    pub const GLITTER_POINTS: usize = 160;

    /// Growth progress past which the apex lamp and star appear
    pub const APEX_REVEAL_PROGRESS: f32 = 0.92;
}

/// Display surface size in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Flakes per layer factor unit
    #[inline]
    pub fn snow_density(&self) -> f32 {
        self.width * self.height / consts::SNOW_DENSITY_DIVISOR
    }
}

/// Unnormalized Gaussian falloff, 1.0 at `x == mu`
#[inline]
pub fn gauss(x: f32, mu: f32, sigma: f32) -> f32 {
    let d = (x - mu) / sigma;
    (-0.5 * d * d).exp()
}

/// Circular distance between two positions on the unit interval
#[inline]
pub fn wrapped_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).abs();
    d.min(1.0 - d)
}
