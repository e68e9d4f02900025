use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::scene::{Color, LightKind};

/// One entry of the light table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct LightConfig {
    /// Attach this light to the scene.
    pub enabled: bool,
    /// Light type.
    pub kind: LightKind,
    /// Light color (sRGB hex).
    pub color: Color,
    /// Intensity multiplier.
    pub intensity: f32,
    /// World-space position. Ignored by ambient lights.
    pub position: [f32; 3],
}

impl LightConfig {
    fn new(
        kind: LightKind,
        color: u32,
        intensity: f32,
        position: [f32; 3],
        enabled: bool,
    ) -> Self {
        Self {
            enabled,
            kind,
            color: Color::from_hex(color),
            intensity,
            position,
        }
    }
}

/// Built-in light tables.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum LightingVariant {
    /// Four colored spot lights at cube corners; directional and ambient
    /// lights are configured but switched off.
    Spotlights,
    /// A blue key light plus blue ambient fill; spot lights off.
    Directional,
}

impl LightingVariant {
    /// The full light table of this variant, disabled entries included.
    #[must_use]
    pub fn lights(self) -> BTreeMap<String, LightConfig> {
        let spots = matches!(self, Self::Spotlights);
        let (ambient_color, ambient_intensity) = if spots {
            (0x00ff_ffff, 0.2)
        } else {
            (0x0042_55ff, 0.5)
        };

        let table = [
            (
                "directional",
                LightConfig::new(
                    LightKind::Directional,
                    0x0052_6cff,
                    1.8,
                    [2.0, 2.0, 2.0],
                    !spots,
                ),
            ),
            (
                "ambient",
                LightConfig::new(
                    LightKind::Ambient,
                    ambient_color,
                    ambient_intensity,
                    [0.0, 0.0, 0.0],
                    !spots,
                ),
            ),
            (
                "spot_blue",
                LightConfig::new(
                    LightKind::Spot,
                    0x0003_95d3,
                    0.25,
                    [2.0, 2.0, 2.0],
                    spots,
                ),
            ),
            (
                "spot_pink",
                LightConfig::new(
                    LightKind::Spot,
                    0x00f2_10a5,
                    0.25,
                    [-2.0, 2.0, 2.0],
                    spots,
                ),
            ),
            (
                "spot_yellow",
                LightConfig::new(
                    LightKind::Spot,
                    0x00ff_e40d,
                    0.25,
                    [2.0, -2.0, 2.0],
                    spots,
                ),
            ),
            (
                "spot_green",
                LightConfig::new(
                    LightKind::Spot,
                    0x002b_ff00,
                    0.25,
                    [2.0, 2.0, -2.0],
                    spots,
                ),
            ),
        ];

        table
            .into_iter()
            .map(|(id, config)| (id.to_owned(), config))
            .collect()
    }
}

/// Per-id light overrides. Entries replace (or add to) the table of the
/// scene's [`LightingVariant`].
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[schemars(title = "Lighting", inline)]
#[serde(default)]
pub struct LightingOptions {
    /// Light table overrides keyed by light id.
    pub lights: BTreeMap<String, LightConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_ids(variant: LightingVariant) -> Vec<String> {
        variant
            .lights()
            .into_iter()
            .filter(|(_, l)| l.enabled)
            .map(|(id, _)| id)
            .collect()
    }

    #[test]
    fn spotlights_enable_only_the_four_corners() {
        assert_eq!(
            enabled_ids(LightingVariant::Spotlights),
            ["spot_blue", "spot_green", "spot_pink", "spot_yellow"]
        );
    }

    #[test]
    fn directional_enables_key_and_fill() {
        assert_eq!(
            enabled_ids(LightingVariant::Directional),
            ["ambient", "directional"]
        );
    }

    #[test]
    fn spot_lights_sit_on_cube_corners() {
        for (id, light) in LightingVariant::Spotlights.lights() {
            if light.kind != LightKind::Spot {
                continue;
            }
            let negatives =
                light.position.iter().filter(|c| **c < 0.0).count();
            assert!(negatives <= 1, "{id} has {negatives} negative axes");
            assert!(light.position.iter().all(|c| c.abs() == 2.0));
        }
    }
}
