use glam::Vec3;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Color;

/// Light type.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    /// Parallel rays shining from `position` toward the origin.
    Directional,
    /// Uniform light from every direction; position is ignored.
    Ambient,
    /// A cone from `position` toward the origin.
    Spot,
    /// Omnidirectional light at `position`.
    Point,
}

/// Cone half-angle of spot lights, in radians.
pub const SPOT_ANGLE: f32 = std::f32::consts::FRAC_PI_3;

/// A light attached to the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Id from the light table.
    pub name: String,
    /// Light type.
    pub kind: LightKind,
    /// Light color.
    pub color: Color,
    /// Intensity multiplier.
    pub intensity: f32,
    /// World-space position.
    pub position: Vec3,
}

impl Light {
    /// Direction the light travels, from its position toward the origin.
    /// `None` for ambient lights and lights placed at the origin.
    #[must_use]
    pub fn direction(&self) -> Option<Vec3> {
        match self.kind {
            LightKind::Ambient => None,
            _ => (-self.position).try_normalize(),
        }
    }
}
