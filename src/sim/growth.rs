//! Helix growth state
//!
//! Progress accumulates from wall-clock deltas and clamps at 1. Each growing
//! frame records the current helix point, so the polyline density follows the
//! frame rate; the recorded points are what the neon stroke renders.

use super::spiral::{SpiralGeometry, SpiralPoint};
use crate::consts::*;

/// Growth phase of the helix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthPhase {
    /// Tip still climbing, points being recorded
    Growing,
    /// Progress reached 1; the polyline is frozen
    Finished,
}

/// Owns growth progress and the recorded polyline
#[derive(Debug, Clone)]
pub struct GrowthController {
    t: f32,
    phase: GrowthPhase,
    points: Vec<SpiralPoint>,
}

impl Default for GrowthController {
    fn default() -> Self {
        Self::new()
    }
}

impl GrowthController {
    pub fn new() -> Self {
        Self {
            t: 0.0,
            phase: GrowthPhase::Growing,
            points: Vec::new(),
        }
    }

    /// Current progress in `[0, 1]`
    #[inline]
    pub fn t(&self) -> f32 {
        self.t
    }

    #[inline]
    pub fn phase(&self) -> GrowthPhase {
        self.phase
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.phase == GrowthPhase::Finished
    }

    /// Recorded tip positions, oldest first, `t` values nondecreasing
    #[inline]
    pub fn points(&self) -> &[SpiralPoint] {
        &self.points
    }

    /// Advance by `dt` seconds and record the tip point.
    ///
    /// Returns `true` exactly once: on the frame progress reaches 1. The
    /// final clamped point is still recorded that frame; afterwards the
    /// controller is inert.
    pub fn advance(&mut self, dt: f32, spiral: &SpiralGeometry) -> bool {
        if self.phase == GrowthPhase::Finished {
            return false;
        }

        self.t = (self.t + dt * GROWTH_SPEED).min(1.0);
        self.points.push(spiral.point_at(self.t));

        if self.t >= 1.0 {
            self.phase = GrowthPhase::Finished;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Viewport;

    fn geometry() -> SpiralGeometry {
        SpiralGeometry::of(Viewport::new(800.0, 600.0))
    }

    #[test]
    fn test_progress_monotonic_and_clamped() {
        let g = geometry();
        let mut growth = GrowthController::new();
        let mut prev = 0.0;
        for i in 0..400 {
            // Mix of zero, small, and clamped-size deltas
            let dt = match i % 3 {
                0 => 0.0,
                1 => 0.016,
                _ => 0.05,
            };
            growth.advance(dt, &g);
            assert!(growth.t() >= prev);
            assert!(growth.t() <= 1.0);
            prev = growth.t();
        }
        assert_eq!(growth.t(), 1.0);
    }

    #[test]
    fn test_polyline_progress_nondecreasing() {
        let g = geometry();
        let mut growth = GrowthController::new();
        for _ in 0..50 {
            growth.advance(0.016, &g);
        }
        let points = growth.points();
        assert_eq!(points.len(), 50);
        for pair in points.windows(2) {
            assert!(pair[0].t <= pair[1].t);
        }
    }

    #[test]
    fn test_completion_fires_exactly_once() {
        let g = geometry();
        let mut growth = GrowthController::new();
        let mut completions = 0;
        for _ in 0..600 {
            if growth.advance(0.016, &g) {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert!(growth.is_finished());
    }

    #[test]
    fn test_final_frame_records_clamped_point() {
        let g = geometry();
        let mut growth = GrowthController::new();
        while !growth.advance(0.05, &g) {}
        let last = growth.points().last().copied().unwrap();
        assert_eq!(last.t, 1.0);

        // Inert after finish: no further points
        let len = growth.points().len();
        assert!(!growth.advance(0.05, &g));
        assert_eq!(growth.points().len(), len);
    }
}
