//! Scene state and frame stepping
//!
//! `SceneState` owns every animated subsystem and advances them from wall
//! clock timestamps. All randomness flows through one seeded Pcg32 so a fixed
//! seed replays the same scene; renderers read this state immutably and never
//! advance particles themselves.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::glow::Illumination;
use super::growth::GrowthController;
use super::snow::SnowField;
use super::sparkle::SparkleField;
use super::spiral::SpiralGeometry;
use crate::Viewport;
use crate::consts::*;

/// One-shot notifications out of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    /// Growth progress reached 1 this frame
    GrowthComplete,
}

/// The whole animated scene
#[derive(Debug, Clone)]
pub struct SceneState {
    seed: u64,
    rng: Pcg32,
    viewport: Viewport,
    spiral: SpiralGeometry,
    growth: GrowthController,
    illumination: Illumination,
    snow: SnowField,
    sparkles: SparkleField,
    density_scale: f32,
    last_time_ms: Option<f64>,
}

impl SceneState {
    /// Build and fully seed a scene for the given viewport.
    ///
    /// `density_scale` multiplies particle populations (quality presets).
    pub fn new(seed: u64, viewport: Viewport, density_scale: f32) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let spiral = SpiralGeometry::of(viewport);
        let snow = SnowField::new(&mut rng, viewport, density_scale);
        let illumination = Illumination::new(&mut rng);
        let sparkle_count = (SPARKLE_COUNT as f32 * density_scale) as usize;
        let sparkles = SparkleField::new(&mut rng, &spiral, sparkle_count);

        Self {
            seed,
            rng,
            viewport,
            spiral,
            growth: GrowthController::new(),
            illumination,
            snow,
            sparkles,
            density_scale,
            last_time_ms: None,
        }
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn spiral(&self) -> &SpiralGeometry {
        &self.spiral
    }

    #[inline]
    pub fn growth(&self) -> &GrowthController {
        &self.growth
    }

    #[inline]
    pub fn illumination(&self) -> &Illumination {
        &self.illumination
    }

    #[inline]
    pub fn snow(&self) -> &SnowField {
        &self.snow
    }

    #[inline]
    pub fn sparkles(&self) -> &SparkleField {
        &self.sparkles
    }

    /// Advance one frame from a monotonic wall-clock timestamp (ms).
    ///
    /// The first call establishes the time base (dt 0); afterwards dt is the
    /// elapsed time clamped to `[0, MAX_FRAME_DT]`. Returns the one-shot
    /// completion event on the frame growth finishes.
    pub fn tick(&mut self, timestamp_ms: f64) -> Option<SceneEvent> {
        let dt = match self.last_time_ms {
            Some(last) => (((timestamp_ms - last) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT),
            None => 0.0,
        };
        self.last_time_ms = Some(timestamp_ms);

        let completed = self.growth.advance(dt, &self.spiral);
        self.snow
            .advance(&mut self.rng, timestamp_ms, self.viewport);

        completed.then_some(SceneEvent::GrowthComplete)
    }

    /// Re-derive all size-dependent state for a new viewport.
    ///
    /// Growth progress and the recorded polyline survive; particle layers,
    /// cluster glows, and sparkles are regenerated from scratch. Runs
    /// atomically between ticks, so no frame observes a partial re-seed.
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport.width <= 0.0 || viewport.height <= 0.0 {
            return;
        }
        self.viewport = viewport;
        self.spiral = SpiralGeometry::of(viewport);
        self.snow
            .reseed(&mut self.rng, viewport, self.density_scale);
        self.illumination.reseed(&mut self.rng);
        let sparkle_count = (SPARKLE_COUNT as f32 * self.density_scale) as usize;
        self.sparkles
            .reseed(&mut self.rng, &self.spiral, sparkle_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Viewport = Viewport::new(800.0, 600.0);

    #[test]
    fn test_first_tick_establishes_time_base() {
        let mut scene = SceneState::new(1, VIEW, 1.0);
        scene.tick(5000.0);
        // dt 0 on the first frame: progress untouched, one point recorded
        assert_eq!(scene.growth().t(), 0.0);
        assert_eq!(scene.growth().points().len(), 1);
    }

    #[test]
    fn test_one_second_of_ticks_reaches_expected_progress() {
        let mut scene = SceneState::new(2, VIEW, 1.0);
        let mut ts = 0.0;
        scene.tick(ts);
        while ts < 1000.0 {
            ts = (ts + 16.0).min(1000.0);
            scene.tick(ts);
        }
        // 1000 ms at growth speed 0.22/s
        assert!((scene.growth().t() - 0.22).abs() < 1e-3);
    }

    #[test]
    fn test_large_gap_clamps_to_max_dt() {
        let mut scene = SceneState::new(3, VIEW, 1.0);
        scene.tick(0.0);
        scene.tick(10_000.0);
        // A 10 s stall advances as a single 50 ms frame
        assert!((scene.growth().t() - MAX_FRAME_DT * GROWTH_SPEED).abs() < 1e-6);
    }

    #[test]
    fn test_backwards_timestamp_never_rolls_progress_back() {
        let mut scene = SceneState::new(4, VIEW, 1.0);
        scene.tick(0.0);
        scene.tick(500.0);
        let before = scene.growth().t();
        scene.tick(100.0);
        assert!(scene.growth().t() >= before);
    }

    #[test]
    fn test_growth_complete_event_is_one_shot() {
        let mut scene = SceneState::new(5, VIEW, 1.0);
        let mut events = 0;
        for frame in 0..600 {
            if scene.tick(frame as f64 * 16.0) == Some(SceneEvent::GrowthComplete) {
                events += 1;
            }
        }
        assert!(scene.growth().is_finished());
        assert_eq!(events, 1);
    }

    #[test]
    fn test_resize_preserves_growth_and_reseeds_particles() {
        let mut scene = SceneState::new(6, VIEW, 1.0);
        for frame in 0..30 {
            scene.tick(frame as f64 * 16.0);
        }
        let t_before = scene.growth().t();
        let points_before = scene.growth().points().len();
        let old_first = scene.snow().layers[0].flakes[0].pos;
        let old_sparkle = scene.sparkles().sparkles()[0].pos;

        let new_view = Viewport::new(1024.0, 768.0);
        scene.resize(new_view);

        assert_eq!(scene.growth().t(), t_before);
        assert_eq!(scene.growth().points().len(), points_before);
        assert_eq!(scene.viewport(), new_view);
        // Populations match the larger area
        let expected_scale = (1024.0 * 768.0) / (800.0 * 600.0);
        let grown = scene.snow().total() as f32;
        let old_area_total = SnowField::new(
            &mut rand_pcg::Pcg32::seed_from_u64(6),
            VIEW,
            1.0,
        )
        .total() as f32;
        assert!(grown > old_area_total);
        assert!((grown / old_area_total - expected_scale).abs() < 0.05);
        // Fresh spawns, not carried-over particles
        assert_ne!(scene.snow().layers[0].flakes[0].pos, old_first);
        assert_ne!(scene.sparkles().sparkles()[0].pos, old_sparkle);
        // All flakes inside the new viewport
        for layer in &scene.snow().layers {
            for flake in &layer.flakes {
                assert!(flake.pos.x >= 0.0 && flake.pos.x <= new_view.width);
                assert!(flake.pos.y >= 0.0 && flake.pos.y <= new_view.height);
            }
        }
    }

    #[test]
    fn test_fixed_seed_replays_identically() {
        let mut a = SceneState::new(7, VIEW, 1.0);
        let mut b = SceneState::new(7, VIEW, 1.0);
        for frame in 0..120 {
            let ts = frame as f64 * 16.0;
            assert_eq!(a.tick(ts), b.tick(ts));
        }
        assert_eq!(a.growth().t(), b.growth().t());
        for (la, lb) in a.snow().layers.iter().zip(b.snow().layers.iter()) {
            for (fa, fb) in la.flakes.iter().zip(lb.flakes.iter()) {
                assert_eq!(fa.pos, fb.pos);
            }
        }
    }
}
