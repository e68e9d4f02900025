//! Centralized scene options with TOML preset support.
//!
//! Every tuning constant of the scene (light table, subdivision levels,
//! the refractive material surface, bloom, camera, texture sources) lives
//! here. Options serialize to/from TOML; two built-in presets cover the
//! "night lights" and "lite" variants of the scene.

mod bloom;
mod camera;
mod lighting;
mod material;
mod scene;
mod textures;

use std::collections::BTreeMap;
use std::path::Path;

pub use bloom::BloomOptions;
pub use camera::CameraOptions;
pub use lighting::{LightConfig, LightingOptions, LightingVariant};
pub use material::{EarthMaterialOptions, RefractiveMaterialOptions};
pub use scene::{RotationMode, SceneOptions};
pub use textures::TextureOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::EarthGlassError;
use crate::texture::TextureSource;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[bloom]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Scene composition: subdivisions, night lights, rotation.
    pub scene: SceneOptions,
    /// Per-light overrides on top of the lighting variant's table.
    pub lighting: LightingOptions,
    /// Physical material of the glass icosahedron.
    pub material: RefractiveMaterialOptions,
    /// Surface material of the Earth mesh.
    pub earth_material: EarthMaterialOptions,
    /// Bloom post-effect parameters.
    pub bloom: BloomOptions,
    /// Camera projection and placement.
    pub camera: CameraOptions,
    /// Day and night texture sources.
    #[schemars(skip)]
    pub textures: TextureOptions,
}

impl Options {
    /// Names accepted by [`Options::preset`].
    pub const PRESETS: [&'static str; 2] = ["night_lights", "lite"];

    /// Built-in preset by name.
    ///
    /// `night_lights` is the default scene: four colored spot lights, the
    /// additive night-lights layer and a 400-subdivision glass body.
    /// `lite` drops the night layer, uses directional + ambient light and
    /// a 16-subdivision body, and reads bundled textures from disk.
    pub fn preset(name: &str) -> Result<Self, EarthGlassError> {
        match name {
            "night_lights" => Ok(Self::default()),
            "lite" => Ok(Self {
                scene: SceneOptions {
                    lighting_variant: LightingVariant::Directional,
                    refractive_subdivision: 16,
                    use_night_lights: false,
                    ..SceneOptions::default()
                },
                textures: TextureOptions {
                    day_map: TextureSource::Path(
                        "assets/textures/earthmap4k.jpg".into(),
                    ),
                    night_map: TextureSource::Path(
                        "assets/textures/5_night_8k.jpg".into(),
                    ),
                },
                ..Self::default()
            }),
            other => Err(EarthGlassError::UnknownPreset(other.to_owned())),
        }
    }

    /// Resolve a command-line argument: an existing `.toml` path is loaded,
    /// anything else is treated as a preset name.
    pub fn resolve(arg: &str) -> Result<Self, EarthGlassError> {
        let path = Path::new(arg);
        if path.extension().is_some_and(|ext| ext == "toml") {
            return Self::load(path);
        }
        Self::preset(arg)
    }

    /// The effective light table: the scene's lighting variant with the
    /// per-id overrides from `[lighting.lights]` applied on top.
    #[must_use]
    pub fn resolved_lights(&self) -> BTreeMap<String, LightConfig> {
        let mut lights = self.scene.lighting_variant.lights();
        for (id, config) in &self.lighting.lights {
            let _ = lights.insert(id.clone(), config.clone());
        }
        lights
    }

    /// Generate JSON Schema describing the tunable options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, EarthGlassError> {
        let content =
            std::fs::read_to_string(path).map_err(EarthGlassError::Io)?;
        toml::from_str(&content)
            .map_err(|e| EarthGlassError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), EarthGlassError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EarthGlassError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(EarthGlassError::Io)?;
        }
        std::fs::write(path, content).map_err(EarthGlassError::Io)
    }
}
