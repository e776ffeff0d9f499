//! CPU rasterization with tiny-skia
//!
//! `SoftwareRenderer` paints the whole scene into an opaque pixmap: night
//! background, ambient glow, composited particle overlay, crown halo, the
//! four-pass neon helix stroke, glitter, and the apex lamp and star once
//! growth is nearly done. `SoftwareParticles` is the CPU particle backend;
//! it draws the drift layers into a transparent pixmap the scene pass
//! composites between background and stroke.
//!
//! The scene pixmap stays fully opaque, so its premultiplied bytes blit
//! straight to an RGBA `ImageData` without conversion.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::f32::consts::{FRAC_PI_2, PI};
use tiny_skia::{
    Color, FillRule, GradientStop, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap,
    PixmapPaint, Point, RadialGradient, Rect, SpreadMode, Stroke, Transform,
};

use super::{ParticleRenderer, RenderError};
use crate::Viewport;
use crate::consts::*;
use crate::sim::{SceneState, SnowField, SparkleField, SpiralGeometry};

/// Night sky base color
const NIGHT_RGB: (u8, u8, u8) = (5, 5, 13);

/// One stroke pass of the neon helix; linear in intensity as (base, gain)
struct NeonPass {
    width: (f32, f32),
    /// Bloom stand-in: half of this widens the stroke at the pass alpha
    feather: (f32, f32),
    rgb: (u8, u8, u8),
    alpha: (f32, f32),
}

/// Wide-soft to thin-bright
const NEON_PASSES: [NeonPass; 4] = [
    NeonPass {
        width: (10.0, 10.0),
        feather: (26.0, 44.0),
        rgb: (170, 255, 210),
        alpha: (0.06, 0.18),
    },
    NeonPass {
        width: (5.2, 3.8),
        feather: (16.0, 28.0),
        rgb: (235, 255, 245),
        alpha: (0.24, 0.56),
    },
    NeonPass {
        width: (3.2, 1.8),
        feather: (10.0, 18.0),
        rgb: (245, 255, 250),
        alpha: (0.42, 0.50),
    },
    NeonPass {
        width: (1.2, 0.9),
        feather: (0.0, 0.0),
        rgb: (255, 255, 255),
        alpha: (0.40, 0.60),
    },
];

#[inline]
fn a8(alpha: f32) -> u8 {
    (alpha.clamp(0.0, 1.0) * 255.0) as u8
}

fn new_pixmap(viewport: Viewport) -> Result<Pixmap, RenderError> {
    let (w, h) = (viewport.width as u32, viewport.height as u32);
    Pixmap::new(w, h).ok_or(RenderError::PixmapAlloc {
        width: w,
        height: h,
    })
}

/// Fill a soft radial glow; the last stop must be transparent so the Pad
/// spread leaves the rest of the rect untouched
fn radial_glow(pixmap: &mut Pixmap, cx: f32, cy: f32, radius: f32, stops: Vec<GradientStop>) {
    let Some(shader) = RadialGradient::new(
        Point::from_xy(cx, cy),
        Point::from_xy(cx, cy),
        radius,
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    ) else {
        return;
    };
    let Some(rect) = Rect::from_xywh(cx - radius, cy - radius, radius * 2.0, radius * 2.0) else {
        return;
    };
    let mut paint = Paint::default();
    paint.anti_alias = true;
    paint.shader = shader;
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
}

fn fill_circle(pixmap: &mut Pixmap, cx: f32, cy: f32, radius: f32, rgb: (u8, u8, u8), alpha: f32) {
    let Some(circle) = PathBuilder::from_circle(cx, cy, radius) else {
        return;
    };
    let mut paint = Paint::default();
    paint.anti_alias = true;
    paint.set_color_rgba8(rgb.0, rgb.1, rgb.2, a8(alpha));
    pixmap.fill_path(&circle, &paint, FillRule::Winding, Transform::identity(), None);
}

fn segment_path(a: Point, b: Point) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(a.x, a.y);
    pb.line_to(b.x, b.y);
    pb.finish()
}

/// Ten-vertex star, first point up
fn star_path(cx: f32, cy: f32, outer: f32, inner: f32) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for i in 0..10 {
        let angle = (PI / 5.0) * i as f32 - FRAC_PI_2;
        let r = if i % 2 == 0 { outer } else { inner };
        let x = cx + angle.cos() * r;
        let y = cy + angle.sin() * r;
        if i == 0 {
            pb.move_to(x, y);
        } else {
            pb.line_to(x, y);
        }
    }
    pb.close();
    pb.finish()
}

/// CPU particle backend: drift layers into a transparent overlay pixmap.
///
/// Sparkles are not drawn here; the scene pass scatters glitter instead, so
/// the software path keeps its accents in one rasterizer.
pub struct SoftwareParticles {
    pixmap: Pixmap,
}

impl SoftwareParticles {
    pub fn new(viewport: Viewport) -> Result<Self, RenderError> {
        Ok(Self {
            pixmap: new_pixmap(viewport)?,
        })
    }
}

impl ParticleRenderer for SoftwareParticles {
    fn draw(
        &mut self,
        snow: &SnowField,
        _sparkles: &SparkleField,
        _time_ms: f64,
    ) -> Result<(), RenderError> {
        self.pixmap.fill(Color::TRANSPARENT);
        let mut paint = Paint::default();
        paint.anti_alias = true;
        for layer in &snow.layers {
            let alpha_mul = layer.spec.alpha_mul;
            for flake in &layer.flakes {
                let Some(circle) =
                    PathBuilder::from_circle(flake.pos.x, flake.pos.y, flake.radius)
                else {
                    continue;
                };
                paint.set_color_rgba8(255, 255, 255, a8(0.95 * flake.alpha * alpha_mul));
                self.pixmap.fill_path(
                    &circle,
                    &paint,
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
        }
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) -> Result<(), RenderError> {
        self.pixmap = new_pixmap(viewport)?;
        Ok(())
    }

    fn overlay(&self) -> Option<&Pixmap> {
        Some(&self.pixmap)
    }
}

/// Full scene rasterizer
pub struct SoftwareRenderer {
    pixmap: Pixmap,
    glitter_rng: Pcg32,
    glitter: bool,
}

impl SoftwareRenderer {
    pub fn new(viewport: Viewport, glitter_seed: u64, glitter: bool) -> Result<Self, RenderError> {
        Ok(Self {
            pixmap: new_pixmap(viewport)?,
            glitter_rng: Pcg32::seed_from_u64(glitter_seed),
            glitter,
        })
    }

    pub fn resize(&mut self, viewport: Viewport) -> Result<(), RenderError> {
        self.pixmap = new_pixmap(viewport)?;
        Ok(())
    }

    /// Finished frame pixels, opaque premultiplied RGBA
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Paint one frame. Reads the scene immutably; the only renderer state
    /// touched is the pixel buffer and the glitter RNG.
    pub fn render(&mut self, scene: &SceneState, time_ms: f64, particle_overlay: Option<&Pixmap>) {
        let spiral = *scene.spiral();

        self.draw_background(&spiral);
        if let Some(overlay) = particle_overlay {
            self.pixmap.draw_pixmap(
                0,
                0,
                overlay.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
        self.draw_crown_halo(&spiral, time_ms);
        self.draw_neon_stroke(scene, time_ms);
        if self.glitter {
            self.draw_glitter(scene, time_ms);
        }
        if scene.growth().t() > APEX_REVEAL_PROGRESS {
            self.draw_apex_ornaments(&spiral, time_ms);
        }
    }

    fn draw_background(&mut self, spiral: &SpiralGeometry) {
        self.pixmap
            .fill(Color::from_rgba8(NIGHT_RGB.0, NIGHT_RGB.1, NIGHT_RGB.2, 255));
        radial_glow(
            &mut self.pixmap,
            spiral.center_x(),
            spiral.base_y(),
            spiral.max_radius() * 2.15,
            vec![
                GradientStop::new(0.0, Color::from_rgba8(140, 255, 200, a8(0.22))),
                GradientStop::new(0.32, Color::from_rgba8(90, 255, 170, a8(0.12))),
                GradientStop::new(1.0, Color::from_rgba8(90, 255, 170, 0)),
            ],
        );
    }

    fn draw_crown_halo(&mut self, spiral: &SpiralGeometry, time_ms: f64) {
        let p = 0.55 + 0.45 * (time_ms * 0.0016).sin() as f32;
        radial_glow(
            &mut self.pixmap,
            spiral.center_x(),
            spiral.base_y() - spiral.vertical_extent() * 0.55,
            spiral.max_radius() * 1.45,
            vec![
                GradientStop::new(0.0, Color::from_rgba8(180, 255, 210, a8(0.07 + 0.06 * p))),
                GradientStop::new(0.4, Color::from_rgba8(180, 255, 210, a8(0.04 + 0.04 * p))),
                GradientStop::new(1.0, Color::from_rgba8(180, 255, 210, 0)),
            ],
        );
    }

    fn draw_neon_stroke(&mut self, scene: &SceneState, time_ms: f64) {
        let illum = scene.illumination();
        let points = scene.growth().points();

        let mut paint = Paint::default();
        paint.anti_alias = true;
        let mut stroke = Stroke {
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };

        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let intensity = illum.intensity(time_ms, (a.t + b.t) * 0.5);
            let Some(path) = segment_path(
                Point::from_xy(a.pos.x, a.pos.y),
                Point::from_xy(b.pos.x, b.pos.y),
            ) else {
                continue;
            };

            for pass in &NEON_PASSES {
                let feather = pass.feather.0 + pass.feather.1 * intensity;
                stroke.width = pass.width.0 + pass.width.1 * intensity + feather * 0.5;
                paint.set_color_rgba8(
                    pass.rgb.0,
                    pass.rgb.1,
                    pass.rgb.2,
                    a8(pass.alpha.0 + pass.alpha.1 * intensity),
                );
                self.pixmap
                    .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }
    }

    /// Single-frame speckles along the polyline; fresh randomness each call
    fn draw_glitter(&mut self, scene: &SceneState, time_ms: f64) {
        let points = scene.growth().points();
        if points.len() < 4 {
            return;
        }
        let global_alpha = 0.12 + 0.06 * (time_ms * 0.004).sin() as f32;
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.set_color_rgba8(255, 255, 255, a8(global_alpha * 0.95));

        for _ in 0..GLITTER_POINTS {
            let idx = self.glitter_rng.random_range(0..points.len());
            let base = points[idx].pos;
            let x = base.x + self.glitter_rng.random_range(-9.0..9.0);
            let y = base.y + self.glitter_rng.random_range(-9.0..9.0);
            let r = self.glitter_rng.random_range(0.0..1.6);
            let Some(circle) = PathBuilder::from_circle(x, y, r) else {
                continue;
            };
            self.pixmap.fill_path(
                &circle,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    fn draw_apex_ornaments(&mut self, spiral: &SpiralGeometry, time_ms: f64) {
        let apex = spiral.apex();

        // Lamp just above the tip
        let (lx, ly) = (apex.pos.x, apex.pos.y - 2.0);
        let p = 0.60 + 0.40 * (time_ms * 0.0065).sin() as f32;
        let core_alpha = 0.22 + 0.55 * p;
        let core_r = 4.6 + 1.8 * p;
        radial_glow(
            &mut self.pixmap,
            lx,
            ly,
            core_r + (18.0 + 34.0 * p) * 0.5,
            vec![
                GradientStop::new(0.0, Color::from_rgba8(255, 255, 255, a8(core_alpha))),
                GradientStop::new(0.35, Color::from_rgba8(255, 255, 255, a8(core_alpha * 0.5))),
                GradientStop::new(1.0, Color::from_rgba8(255, 255, 255, 0)),
            ],
        );
        fill_circle(&mut self.pixmap, lx, ly, core_r, (255, 255, 255), core_alpha);
        fill_circle(
            &mut self.pixmap,
            lx,
            ly,
            2.0 + 0.8 * p,
            (255, 255, 255),
            0.35 + 0.55 * p,
        );

        // Star above the lamp
        let (sx, sy) = (apex.pos.x, apex.pos.y - 18.0);
        let tw = 0.75 + 0.25 * (time_ms * 0.004).sin() as f32;
        radial_glow(
            &mut self.pixmap,
            sx,
            sy,
            12.8 + (26.0 + 18.0 * tw) * 0.5,
            vec![
                GradientStop::new(0.0, Color::from_rgba8(255, 240, 170, a8(0.30 + 0.10 * tw))),
                GradientStop::new(1.0, Color::from_rgba8(255, 240, 170, 0)),
            ],
        );
        let Some(star) = star_path(sx, sy, 12.8, 5.8) else {
            return;
        };
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.set_color_rgba8(255, 230, 120, a8(0.90 + 0.10 * tw));
        self.pixmap
            .fill_path(&star, &paint, FillRule::Winding, Transform::identity(), None);
    }
}
