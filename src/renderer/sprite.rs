//! Point sprite instance packing
//!
//! Both particle kinds share one interleaved instance layout; the whole
//! buffer is rebuilt and uploaded once per frame. Packing is pure so it can
//! be tested without a GPU.

use bytemuck::{Pod, Zeroable};

use crate::sim::{SnowField, SparkleField};

/// Fragment shaping selector: soft drift disc
pub const KIND_DRIFT: f32 = 0.0;
/// Fragment shaping selector: sharp additive sparkle
pub const KIND_SPARKLE: f32 = 1.0;

/// Drift flakes draw at this multiple of their simulation radius
const DRIFT_SIZE_MUL: f32 = 2.2;

/// One per-particle instance record (20-byte stride)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SpriteInstance {
    pub position: [f32; 2],
    pub size: f32,
    pub kind: f32,
    pub alpha: f32,
}

impl SpriteInstance {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: 8,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: 16,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

/// Rebuild the instance list: drift layers back-to-front, then sparkles.
///
/// Returns the drift count, which is the split index between the two draw
/// batches (drift blends source-over, sparkles add).
pub fn pack_sprites(
    snow: &SnowField,
    sparkles: &SparkleField,
    time_ms: f64,
    out: &mut Vec<SpriteInstance>,
) -> usize {
    out.clear();

    for layer in &snow.layers {
        let alpha_mul = layer.spec.alpha_mul;
        for flake in &layer.flakes {
            out.push(SpriteInstance {
                position: [flake.pos.x, flake.pos.y],
                size: flake.radius * DRIFT_SIZE_MUL,
                kind: KIND_DRIFT,
                alpha: flake.alpha * alpha_mul,
            });
        }
    }
    let drift_count = out.len();

    for (i, sparkle) in sparkles.sparkles().iter().enumerate() {
        let blink = sparkle.blink(time_ms, i);
        out.push(SpriteInstance {
            position: [sparkle.pos.x, sparkle.pos.y],
            size: sparkle.point_size(blink),
            kind: KIND_SPARKLE,
            alpha: sparkle.alpha(blink),
        });
    }

    drift_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Viewport;
    use crate::sim::SpiralGeometry;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn scene_parts() -> (SnowField, SparkleField) {
        let mut rng = Pcg32::seed_from_u64(31);
        let view = Viewport::new(640.0, 480.0);
        let snow = SnowField::new(&mut rng, view, 0.2);
        let spiral = SpiralGeometry::of(view);
        let sparkles = SparkleField::new(&mut rng, &spiral, 50);
        (snow, sparkles)
    }

    #[test]
    fn test_stride_is_five_floats() {
        assert_eq!(std::mem::size_of::<SpriteInstance>(), 20);
        assert_eq!(SpriteInstance::desc().array_stride, 20);
    }

    #[test]
    fn test_pack_counts_and_split() {
        let (snow, sparkles) = scene_parts();
        let mut out = Vec::new();
        let split = pack_sprites(&snow, &sparkles, 1234.0, &mut out);
        assert_eq!(split, snow.total());
        assert_eq!(out.len(), snow.total() + sparkles.len());
        // Casting to raw bytes preserves the 20-byte stride
        let bytes: &[u8] = bytemuck::cast_slice(&out);
        assert_eq!(bytes.len(), out.len() * 20);
    }

    #[test]
    fn test_kind_partitions_at_split() {
        let (snow, sparkles) = scene_parts();
        let mut out = Vec::new();
        let split = pack_sprites(&snow, &sparkles, 1234.0, &mut out);
        for inst in &out[..split] {
            assert_eq!(inst.kind, KIND_DRIFT);
        }
        for inst in &out[split..] {
            assert_eq!(inst.kind, KIND_SPARKLE);
        }
    }

    #[test]
    fn test_layers_packed_back_to_front() {
        let (snow, sparkles) = scene_parts();
        let mut out = Vec::new();
        pack_sprites(&snow, &sparkles, 0.0, &mut out);
        // The first record is the first flake of the back layer, dimmed by
        // its alpha multiplier and scaled for drawing.
        let first_flake = &snow.layers[0].flakes[0];
        assert_eq!(out[0].position, [first_flake.pos.x, first_flake.pos.y]);
        assert_eq!(out[0].size, first_flake.radius * DRIFT_SIZE_MUL);
        assert_eq!(out[0].alpha, first_flake.alpha * snow.layers[0].spec.alpha_mul);
    }

    #[test]
    fn test_repack_reuses_allocation() {
        let (snow, sparkles) = scene_parts();
        let mut out = Vec::new();
        pack_sprites(&snow, &sparkles, 0.0, &mut out);
        let cap = out.capacity();
        pack_sprites(&snow, &sparkles, 16.0, &mut out);
        assert_eq!(out.capacity(), cap);
    }

    #[test]
    fn test_sparkle_records_follow_twinkle() {
        let (snow, sparkles) = scene_parts();
        let mut out = Vec::new();
        let split = pack_sprites(&snow, &sparkles, 777.0, &mut out);
        for (i, (inst, s)) in out[split..].iter().zip(sparkles.sparkles()).enumerate() {
            let blink = s.blink(777.0, i);
            assert_eq!(inst.size, s.point_size(blink));
            assert_eq!(inst.alpha, s.alpha(blink));
        }
    }
}
