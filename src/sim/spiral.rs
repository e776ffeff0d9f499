//! Conical helix geometry
//!
//! Pure functions of the viewport; nothing here holds animation state. The
//! helix runs base (progress 0) to apex (progress 1), radius tapering to an
//! exact zero at the top so the final point sits on the center line.

use glam::Vec2;
use std::f32::consts::TAU;

use crate::Viewport;
use crate::consts::*;

/// A point on the helix with the progress value that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiralPoint {
    pub pos: Vec2,
    /// Normalized position along the path, 0 = base, 1 = apex
    pub t: f32,
}

/// Viewport-derived helix parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiralGeometry {
    width: f32,
    height: f32,
}

impl SpiralGeometry {
    pub fn of(viewport: Viewport) -> Self {
        Self {
            width: viewport.width,
            height: viewport.height,
        }
    }

    /// Horizontal center of the helix axis
    #[inline]
    pub fn center_x(&self) -> f32 {
        self.width * CENTER_X_FRAC
    }

    /// Screen y of the helix base
    #[inline]
    pub fn base_y(&self) -> f32 {
        self.height * BASE_Y_FRAC
    }

    /// Vertical span base to apex
    #[inline]
    pub fn vertical_extent(&self) -> f32 {
        self.height * HEIGHT_FRAC
    }

    /// Radius at the base
    #[inline]
    pub fn max_radius(&self) -> f32 {
        self.width.min(self.height) * MAX_RADIUS_FRAC
    }

    /// Tapered radius at progress `t`; exact `max_radius` at 0, exact 0 at 1
    #[inline]
    pub fn radius_at(&self, t: f32) -> f32 {
        self.max_radius() * (1.0 - t).powf(TAPER_EXPONENT)
    }

    /// Helix point at progress `t`. Callers clamp `t` to `[0, 1]`.
    pub fn point_at(&self, t: f32) -> SpiralPoint {
        let r = self.radius_at(t);
        let angle = t * HELIX_TURNS * TAU;
        let x = self.center_x() + r * angle.cos();
        let y = self.base_y() - t * self.vertical_extent();
        SpiralPoint {
            pos: Vec2::new(x, y),
            t,
        }
    }

    /// The apex point (progress 1), where the lamp and star hang
    #[inline]
    pub fn apex(&self) -> SpiralPoint {
        self.point_at(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> SpiralGeometry {
        SpiralGeometry::of(Viewport::new(800.0, 600.0))
    }

    #[test]
    fn test_radius_endpoints_exact() {
        let g = geometry();
        // min(800, 600) * 0.28 is exact in f32
        assert_eq!(g.max_radius(), 168.0);
        assert_eq!(g.radius_at(0.0), 168.0);
        assert_eq!(g.radius_at(1.0), 0.0);
    }

    #[test]
    fn test_apex_sits_on_center_line() {
        let g = geometry();
        let apex = g.apex();
        assert_eq!(apex.pos.x, g.center_x());
        assert!((apex.pos.y - (g.base_y() - g.vertical_extent())).abs() < 1e-4);
    }

    #[test]
    fn test_path_ascends_and_tapers() {
        let g = geometry();
        let mut prev = g.point_at(0.0);
        let mut prev_r = g.radius_at(0.0);
        for i in 1..=100 {
            let t = i as f32 / 100.0;
            let p = g.point_at(t);
            let r = g.radius_at(t);
            assert!(p.pos.y < prev.pos.y, "y must strictly descend");
            assert!(r < prev_r, "radius must strictly shrink");
            prev = p;
            prev_r = r;
        }
    }

    #[test]
    fn test_point_records_progress() {
        let g = geometry();
        let p = g.point_at(0.37);
        assert_eq!(p.t, 0.37);
        assert!((p.pos.x - g.center_x()).abs() <= g.max_radius() + 1e-3);
    }

    #[test]
    fn test_winds_full_turn_count() {
        let g = geometry();
        // One full turn spans 1/7.5 of the path; points a turn apart share
        // their angular offset from the axis.
        let a = g.point_at(0.2);
        let b = g.point_at(0.2 + 1.0 / HELIX_TURNS);
        let da = a.pos.x - g.center_x();
        let db = b.pos.x - g.center_x();
        // Same side of the axis, radii in taper ratio
        assert!(da.signum() == db.signum());
        let ratio = g.radius_at(0.2 + 1.0 / HELIX_TURNS) / g.radius_at(0.2);
        assert!((db / da - ratio).abs() < 1e-3);
    }
}
