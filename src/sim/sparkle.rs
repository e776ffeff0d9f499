//! Helix-anchored sparkles
//!
//! A fixed band of twinkling points scattered around the helix. Positions are
//! sampled once per seed/resize; the twinkle itself is a pure function of
//! wall time (phase accumulation, never stepped), so sparkles cost nothing to
//! advance.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use std::f32::consts::TAU;

use super::spiral::SpiralGeometry;

/// One twinkling point near the helix
#[derive(Debug, Clone, Copy)]
pub struct Sparkle {
    pub pos: Vec2,
    pub base_alpha: f32,
    pub size: f32,
    pub phase: f32,
    pub speed: f32,
}

impl Sparkle {
    fn spawn(rng: &mut Pcg32, spiral: &SpiralGeometry) -> Self {
        let tt = rng.random_range(0.08..0.98);
        let anchor = spiral.point_at(tt);
        Self {
            pos: anchor.pos
                + Vec2::new(rng.random_range(-18.0..18.0), rng.random_range(-16.0..16.0)),
            base_alpha: rng.random_range(0.10..0.55),
            size: rng.random_range(2.2..5.8),
            phase: rng.random_range(0.0..TAU),
            speed: rng.random_range(0.8..1.7),
        }
    }

    /// Twinkle factor in [0.25, 1.0]; `index` decorrelates neighbours
    #[inline]
    pub fn blink(&self, time_ms: f64, index: usize) -> f32 {
        let s = (time_ms * 0.006 * self.speed as f64 + self.phase as f64 + index as f64).sin();
        0.25 + 0.75 * (s as f32).max(0.0)
    }

    /// Drawn point size at the given twinkle factor
    #[inline]
    pub fn point_size(&self, blink: f32) -> f32 {
        self.size * (0.85 + 0.35 * blink)
    }

    /// Drawn alpha at the given twinkle factor
    #[inline]
    pub fn alpha(&self, blink: f32) -> f32 {
        self.base_alpha * blink
    }
}

/// The sparkle band
#[derive(Debug, Clone, Default)]
pub struct SparkleField {
    sparkles: Vec<Sparkle>,
}

impl SparkleField {
    pub fn new(rng: &mut Pcg32, spiral: &SpiralGeometry, count: usize) -> Self {
        let mut field = Self::default();
        field.reseed(rng, spiral, count);
        field
    }

    /// Resample every sparkle against the given helix (on resize)
    pub fn reseed(&mut self, rng: &mut Pcg32, spiral: &SpiralGeometry, count: usize) {
        self.sparkles.clear();
        self.sparkles
            .extend((0..count).map(|_| Sparkle::spawn(rng, spiral)));
    }

    #[inline]
    pub fn sparkles(&self) -> &[Sparkle] {
        &self.sparkles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sparkles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sparkles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Viewport;
    use rand::SeedableRng;

    fn band(seed: u64, count: usize) -> SparkleField {
        let mut rng = Pcg32::seed_from_u64(seed);
        let spiral = SpiralGeometry::of(Viewport::new(800.0, 600.0));
        SparkleField::new(&mut rng, &spiral, count)
    }

    #[test]
    fn test_parameters_in_range() {
        let field = band(21, 220);
        assert_eq!(field.len(), 220);
        for s in field.sparkles() {
            assert!((0.10..0.55).contains(&s.base_alpha));
            assert!((2.2..5.8).contains(&s.size));
            assert!((0.8..1.7).contains(&s.speed));
        }
    }

    #[test]
    fn test_anchored_to_helix_band() {
        let spiral = SpiralGeometry::of(Viewport::new(800.0, 600.0));
        let field = band(22, 220);
        // Anchors live on the helix between progress 0.08 and 0.98, so every
        // sparkle sits within jitter range of the cone's bounding box.
        let top = spiral.point_at(0.98).pos.y - 16.0;
        let bottom = spiral.point_at(0.08).pos.y + 16.0;
        let half_width = spiral.max_radius() + 18.0;
        for s in field.sparkles() {
            assert!(s.pos.y >= top && s.pos.y <= bottom);
            assert!((s.pos.x - spiral.center_x()).abs() <= half_width);
        }
    }

    #[test]
    fn test_blink_range_over_time() {
        let field = band(23, 50);
        for (i, s) in field.sparkles().iter().enumerate() {
            for step in 0..200 {
                let b = s.blink(step as f64 * 33.0, i);
                assert!((0.25..=1.0).contains(&b));
                assert!(s.alpha(b) <= s.base_alpha + 1e-6);
                assert!(s.point_size(b) <= s.size * 1.2 + 1e-6);
            }
        }
    }

    #[test]
    fn test_reseed_moves_sparkles() {
        let mut rng = Pcg32::seed_from_u64(24);
        let spiral = SpiralGeometry::of(Viewport::new(800.0, 600.0));
        let mut field = SparkleField::new(&mut rng, &spiral, 40);
        let before = field.sparkles()[0].pos;
        field.reseed(&mut rng, &spiral, 40);
        assert_eq!(field.len(), 40);
        assert_ne!(field.sparkles()[0].pos, before);
    }
}
