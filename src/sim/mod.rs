//! Deterministic scene simulation
//!
//! All animation state lives here. This module must stay pure:
//! - Wall-clock timestamps in, state out
//! - Seeded RNG only, injected by `&mut`
//! - No rendering or platform dependencies

pub mod glow;
pub mod growth;
pub mod snow;
pub mod sparkle;
pub mod spiral;
pub mod state;

pub use glow::{ClusterGlow, Illumination};
pub use growth::{GrowthController, GrowthPhase};
pub use snow::{LayerSpec, SnowField, SnowLayer, Snowflake, layer_specs};
pub use sparkle::{Sparkle, SparkleField};
pub use spiral::{SpiralGeometry, SpiralPoint};
pub use state::{SceneEvent, SceneState};
