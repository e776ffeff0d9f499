//! Neon stroke illumination
//!
//! Brightness along the helix combines three layers, all pure functions of
//! wall time and progress:
//! - a slow whole-tree breathing oscillation
//! - a narrow Gaussian pulse racing base to apex and wrapping
//! - seven seeded cluster glows, each pulsing at its own frequency
//!
//! Phase math runs in f64 milliseconds so long sessions keep trig precision,
//! narrowing to f32 only after the sine.

use rand::Rng;
use rand_pcg::Pcg32;
use std::f32::consts::TAU;

use crate::consts::CLUSTER_COUNT;
use crate::{gauss, wrapped_distance};

/// Combined intensity floor and ceiling
pub const INTENSITY_FLOOR: f32 = 0.25;
pub const INTENSITY_CEIL: f32 = 1.0;

/// Normalized width of the traveling pulse
const PULSE_SIGMA: f32 = 0.030;

/// One localized glow region on the helix
#[derive(Debug, Clone, Copy)]
pub struct ClusterGlow {
    /// Center progress in [0, 1]
    pub center: f32,
    /// Gaussian gate width in progress units
    pub width: f32,
    pub phase: f32,
    pub frequency: f32,
    pub amplitude: f32,
}

impl ClusterGlow {
    fn sample(rng: &mut Pcg32) -> Self {
        Self {
            center: rng.random_range(0.0..1.0),
            width: 0.06 + rng.random_range(0.0..1.0) * 0.10,
            phase: rng.random_range(0.0..TAU),
            frequency: 0.8 + rng.random_range(0.0..1.0) * 1.4,
            amplitude: 0.22 + rng.random_range(0.0..1.0) * 0.40,
        }
    }

    /// This cluster's contribution at progress `tt`
    fn glow(&self, time_ms: f64, tt: f32) -> f32 {
        let gate = gauss(tt, self.center, self.width);
        let pulse =
            0.60 + 0.40 * (time_ms * 0.0026 * self.frequency as f64 + self.phase as f64).sin() as f32;
        gate * pulse * self.amplitude
    }
}

/// Illumination state: the seeded cluster set
#[derive(Debug, Clone)]
pub struct Illumination {
    clusters: Vec<ClusterGlow>,
}

impl Illumination {
    pub fn new(rng: &mut Pcg32) -> Self {
        let mut illumination = Self {
            clusters: Vec::with_capacity(CLUSTER_COUNT),
        };
        illumination.reseed(rng);
        illumination
    }

    /// Resample all clusters (on resize)
    pub fn reseed(&mut self, rng: &mut Pcg32) {
        self.clusters.clear();
        self.clusters
            .extend((0..CLUSTER_COUNT).map(|_| ClusterGlow::sample(rng)));
    }

    pub fn clusters(&self) -> &[ClusterGlow] {
        &self.clusters
    }

    /// Whole-tree breathing in [0.4, 1.0]
    #[inline]
    pub fn breathing(time_ms: f64) -> f32 {
        0.70 + 0.30 * (time_ms * 0.0021).sin() as f32
    }

    /// Traveling pulse contribution at progress `tt`, peak 1 at the head
    pub fn running_glow(time_ms: f64, tt: f32) -> f32 {
        let head = (time_ms * 0.000_20).fract() as f32;
        let d = wrapped_distance(tt, head);
        gauss(d, 0.0, PULSE_SIGMA)
    }

    /// Summed cluster contribution at progress `tt`, clamped to [0, 1]
    pub fn cluster_glow(&self, time_ms: f64, tt: f32) -> f32 {
        let sum: f32 = self.clusters.iter().map(|c| c.glow(time_ms, tt)).sum();
        sum.clamp(0.0, 1.0)
    }

    /// Combined stroke intensity at progress `tt`, always in [0.25, 1.0]
    pub fn intensity(&self, time_ms: f64, tt: f32) -> f32 {
        let breathe = Self::breathing(time_ms);
        let cluster = self.cluster_glow(time_ms, tt);
        let run = Self::running_glow(time_ms, tt);
        (0.45 * breathe + 0.55 * cluster + 1.05 * run).clamp(INTENSITY_FLOOR, INTENSITY_CEIL)
    }
}
