//! Layered drift snow
//!
//! Four independently parameterized populations, ordered back-to-front:
//! small (dense, dim, slow) through large, plus a sparse band of oversized
//! heavy flakes in front. Flakes fall with a per-frame step and a sinusoidal
//! wobble, wrapping at a 12 px margin around the viewport.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use std::f32::consts::TAU;
use std::ops::Range;

use crate::Viewport;
use crate::consts::WRAP_MARGIN;

/// One drifting flake
#[derive(Debug, Clone, Copy)]
pub struct Snowflake {
    pub pos: Vec2,
    /// Per-frame velocity, x sideways drift, y fall
    pub vel: Vec2,
    pub radius: f32,
    pub alpha: f32,
    /// Wobble phase accumulator
    pub wobble: f32,
    pub wobble_speed: f32,
}

/// Parameter block for one layer
#[derive(Debug, Clone)]
pub struct LayerSpec {
    pub name: &'static str,
    /// Flake count = snow density * this (see `Viewport::snow_density`)
    pub count_factor: f32,
    pub radius: Range<f32>,
    pub fall_speed: Range<f32>,
    pub side_speed: Range<f32>,
    pub alpha: Range<f32>,
    pub wobble_speed: Range<f32>,
    /// Draw-time dimming for depth layering
    pub alpha_mul: f32,
    /// Wobble sway multiplier
    pub drift_mul: f32,
}

/// Layer parameter rows, back-to-front
pub fn layer_specs() -> [LayerSpec; 4] {
    [
        LayerSpec {
            name: "small",
            count_factor: 4.90,
            radius: 0.14..1.05,
            fall_speed: 0.40..1.25,
            side_speed: -0.35..0.35,
            alpha: 0.08..0.38,
            wobble_speed: 1.0..4.2,
            alpha_mul: 0.65,
            drift_mul: 0.90,
        },
        LayerSpec {
            name: "medium",
            count_factor: 3.70,
            radius: 0.30..1.85,
            fall_speed: 0.55..1.85,
            side_speed: -0.55..0.55,
            alpha: 0.16..0.70,
            wobble_speed: 0.7..3.1,
            alpha_mul: 0.85,
            drift_mul: 1.00,
        },
        LayerSpec {
            name: "large",
            count_factor: 2.10,
            radius: 0.90..4.60,
            fall_speed: 0.90..2.90,
            side_speed: -0.95..0.95,
            alpha: 0.28..0.98,
            wobble_speed: 0.5..2.6,
            alpha_mul: 1.00,
            drift_mul: 1.05,
        },
        LayerSpec {
            name: "heavy",
            count_factor: 0.08,
            radius: 4.80..7.60,
            fall_speed: 1.20..2.80,
            side_speed: -1.10..1.10,
            alpha: 0.22..0.55,
            wobble_speed: 0.4..1.6,
            alpha_mul: 1.00,
            drift_mul: 1.05,
        },
    ]
}

impl Snowflake {
    fn spawn(rng: &mut Pcg32, spec: &LayerSpec, viewport: Viewport) -> Self {
        Self {
            pos: Vec2::new(
                rng.random_range(0.0..viewport.width),
                rng.random_range(0.0..viewport.height),
            ),
            vel: Vec2::new(
                rng.random_range(spec.side_speed.clone()),
                rng.random_range(spec.fall_speed.clone()),
            ),
            radius: rng.random_range(spec.radius.clone()),
            alpha: rng.random_range(spec.alpha.clone()),
            wobble: rng.random_range(0.0..TAU),
            wobble_speed: rng.random_range(spec.wobble_speed.clone()),
        }
    }
}

/// One population of flakes sharing a parameter row
#[derive(Debug, Clone)]
pub struct SnowLayer {
    pub spec: LayerSpec,
    pub flakes: Vec<Snowflake>,
}

impl SnowLayer {
    fn spawn(rng: &mut Pcg32, spec: LayerSpec, viewport: Viewport, density_scale: f32) -> Self {
        let count = (viewport.snow_density() * spec.count_factor * density_scale).floor() as usize;
        let flakes = (0..count)
            .map(|_| Snowflake::spawn(rng, &spec, viewport))
            .collect();
        Self { spec, flakes }
    }

    /// Step every flake once and wrap at the margins
    fn advance(&mut self, rng: &mut Pcg32, time_ms: f64, viewport: Viewport) {
        let drift_mul = self.spec.drift_mul;
        for flake in &mut self.flakes {
            flake.wobble += flake.wobble_speed * 0.01;
            let sway =
                (flake.wobble as f64 + time_ms * 0.001).sin() as f32 * 0.18 * drift_mul;
            flake.pos.x += flake.vel.x + sway;
            flake.pos.y += flake.vel.y;

            if flake.pos.y > viewport.height + WRAP_MARGIN {
                flake.pos.y = -WRAP_MARGIN;
                flake.pos.x = rng.random_range(0.0..viewport.width);
            }
            if flake.pos.x < -WRAP_MARGIN {
                flake.pos.x = viewport.width + WRAP_MARGIN;
            } else if flake.pos.x > viewport.width + WRAP_MARGIN {
                flake.pos.x = -WRAP_MARGIN;
            }
        }
    }
}

/// All drift layers, back-to-front
#[derive(Debug, Clone)]
pub struct SnowField {
    pub layers: Vec<SnowLayer>,
}

impl SnowField {
    pub fn new(rng: &mut Pcg32, viewport: Viewport, density_scale: f32) -> Self {
        let layers = layer_specs()
            .into_iter()
            .map(|spec| SnowLayer::spawn(rng, spec, viewport, density_scale))
            .collect();
        Self { layers }
    }

    /// Regenerate every layer for a new viewport; nothing survives a resize
    pub fn reseed(&mut self, rng: &mut Pcg32, viewport: Viewport, density_scale: f32) {
        *self = Self::new(rng, viewport, density_scale);
    }

    /// Step all layers by one frame
    pub fn advance(&mut self, rng: &mut Pcg32, time_ms: f64, viewport: Viewport) {
        for layer in &mut self.layers {
            layer.advance(rng, time_ms, viewport);
        }
    }

    /// Total flakes across layers
    pub fn total(&self) -> usize {
        self.layers.iter().map(|l| l.flakes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    const VIEW: Viewport = Viewport::new(800.0, 600.0);

    fn field(seed: u64, scale: f32) -> SnowField {
        let mut rng = Pcg32::seed_from_u64(seed);
        SnowField::new(&mut rng, VIEW, scale)
    }

    #[test]
    fn test_layer_order_and_relative_counts() {
        let field = field(1, 1.0);
        assert_eq!(field.layers.len(), 4);
        let names: Vec<_> = field.layers.iter().map(|l| l.spec.name).collect();
        assert_eq!(names, ["small", "medium", "large", "heavy"]);
        // Denser toward the back, the heavy band nearly empty
        assert!(field.layers[0].flakes.len() > field.layers[1].flakes.len());
        assert!(field.layers[1].flakes.len() > field.layers[2].flakes.len());
        assert!(field.layers[2].flakes.len() > field.layers[3].flakes.len());
        assert!(field.layers[3].flakes.len() < 20);
    }

    #[test]
    fn test_counts_scale_with_area_and_density() {
        let small_view = {
            let mut rng = Pcg32::seed_from_u64(2);
            SnowField::new(&mut rng, Viewport::new(400.0, 300.0), 1.0)
        };
        let full = field(2, 1.0);
        let half_density = field(2, 0.5);
        // Quarter area gives a quarter of the flakes, within per-layer
        // flooring slack
        let quarter_diff = (small_view.total() as i64 * 4 - full.total() as i64).abs();
        assert!(quarter_diff <= 24, "area scaling off by {quarter_diff}");
        // Density scale halves populations the same way
        let half_diff = (half_density.total() as i64 * 2 - full.total() as i64).abs();
        assert!(half_diff <= 24, "density scaling off by {half_diff}");
    }

    #[test]
    fn test_spawn_within_viewport_and_ranges() {
        let field = field(3, 1.0);
        for layer in &field.layers {
            let spec = &layer.spec;
            for flake in &layer.flakes {
                assert!((0.0..VIEW.width).contains(&flake.pos.x));
                assert!((0.0..VIEW.height).contains(&flake.pos.y));
                assert!(spec.radius.contains(&flake.radius));
                assert!(spec.fall_speed.contains(&flake.vel.y));
                assert!(spec.side_speed.contains(&flake.vel.x));
                assert!(spec.alpha.contains(&flake.alpha));
                assert!(spec.wobble_speed.contains(&flake.wobble_speed));
            }
        }
    }

    #[test]
    fn test_bottom_wrap_respawns_at_top_with_fresh_x() {
        let mut field = field(4, 1.0);
        let mut rng = Pcg32::seed_from_u64(99);
        let flake = &mut field.layers[2].flakes[0];
        flake.pos = Vec2::new(123.0, VIEW.height + WRAP_MARGIN + 0.5);
        field.advance(&mut rng, 0.0, VIEW);
        let flake = &field.layers[2].flakes[0];
        assert_eq!(flake.pos.y, -WRAP_MARGIN);
        assert!((0.0..VIEW.width + WRAP_MARGIN).contains(&flake.pos.x));
    }

    #[test]
    fn test_side_wrap() {
        let mut field = field(5, 1.0);
        let mut rng = Pcg32::seed_from_u64(99);
        {
            let flake = &mut field.layers[2].flakes[0];
            flake.pos = Vec2::new(-WRAP_MARGIN - 2.0, 50.0);
            flake.vel = Vec2::new(0.0, 0.1);
        }
        field.advance(&mut rng, 0.0, VIEW);
        assert_eq!(field.layers[2].flakes[0].pos.x, VIEW.width + WRAP_MARGIN);
    }

    proptest! {
        #[test]
        fn test_flakes_stay_inside_wrap_margins(seed in 0u64..200, steps in 1usize..60) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut field = SnowField::new(&mut rng, VIEW, 0.05);
            for step in 0..steps {
                field.advance(&mut rng, step as f64 * 16.0, VIEW);
                for layer in &field.layers {
                    for flake in &layer.flakes {
                        prop_assert!(flake.pos.x >= -WRAP_MARGIN && flake.pos.x <= VIEW.width + WRAP_MARGIN);
                        prop_assert!(flake.pos.y >= -WRAP_MARGIN && flake.pos.y <= VIEW.height + WRAP_MARGIN);
                    }
                }
            }
        }
    }
}
