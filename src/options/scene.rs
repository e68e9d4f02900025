use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::LightingVariant;
use crate::scene::Color;

/// How the Earth rotation step scales with frame time.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// A fixed increment every displayed frame, so rotation speed follows
    /// the refresh rate.
    PerFrame,
    /// The increment is scaled by elapsed time relative to a 60 Hz frame,
    /// so rotation speed is the same at any refresh rate.
    PerSecond,
}

/// Scene composition knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Scene", inline)]
#[serde(default)]
pub struct SceneOptions {
    /// Base light table the `[lighting]` overrides apply to.
    #[schemars(title = "Lighting Variant")]
    pub lighting_variant: LightingVariant,
    /// Icosahedron detail of the Earth geometry.
    #[schemars(title = "Earth Subdivision", range(min = 0, max = 64))]
    pub earth_subdivision: u32,
    /// Icosahedron detail of the glass body (quality/perf knob).
    #[schemars(title = "Glass Subdivision", range(min = 0, max = 400))]
    pub refractive_subdivision: u32,
    /// Add the additive night-lights mesh to the Earth group.
    #[schemars(title = "Night Lights")]
    pub use_night_lights: bool,
    /// Earth axial tilt in degrees, applied about Z (negative tilts toward
    /// +X).
    #[schemars(skip)]
    pub axial_tilt_deg: f32,
    /// Earth spin per step, in radians.
    #[schemars(title = "Rotation Step", range(min = 0.0, max = 0.02), extend("step" = 0.0005))]
    pub rotation_step: f32,
    /// Frame-rate dependence of the spin.
    #[schemars(title = "Rotation Mode")]
    pub rotation_mode: RotationMode,
    /// Divisor mapping the frame timestamp (ms) to the shader time uniform.
    #[schemars(skip)]
    pub time_divisor_ms: f64,
    /// Clear color behind the scene.
    #[schemars(skip)]
    pub background: Color,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            lighting_variant: LightingVariant::Spotlights,
            earth_subdivision: 16,
            refractive_subdivision: 400,
            use_night_lights: true,
            axial_tilt_deg: -23.4,
            rotation_step: 0.002,
            rotation_mode: RotationMode::PerFrame,
            time_divisor_ms: 10_000.0,
            background: Color::BLACK,
        }
    }
}
