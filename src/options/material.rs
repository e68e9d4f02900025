use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::scene::Color;

/// Physically based surface of the glass icosahedron.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Glass", inline)]
#[serde(default)]
pub struct RefractiveMaterialOptions {
    /// Base color.
    #[schemars(title = "Color")]
    pub color: Color,
    #[schemars(title = "Metalness", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    /// Metalness (0 = dielectric, 1 = metal).
    pub metalness: f32,
    #[schemars(title = "Roughness", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    /// Perceptual roughness.
    pub roughness: f32,
    #[schemars(title = "Clearcoat", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    /// Strength of the clear lacquer layer.
    pub clearcoat: f32,
    #[schemars(skip)]
    /// Roughness of the clear lacquer layer.
    pub clearcoat_roughness: f32,
    #[schemars(skip)]
    /// Blend the material with what is behind it.
    pub transparent: bool,
    #[schemars(title = "Opacity", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    /// Alpha used when `transparent` is set.
    pub opacity: f32,
    #[schemars(title = "Reflectivity", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    /// Specular reflectance of dielectrics.
    pub reflectivity: f32,
    #[schemars(skip)]
    /// Ratio used to bend an environment-map lookup. Has no visible
    /// effect: the scene renders without an environment map.
    pub refraction_ratio: f32,
    #[schemars(title = "IOR", range(min = 0.5, max = 2.333), extend("step" = 0.01))]
    /// Index of refraction.
    pub ior: f32,
}

impl Default for RefractiveMaterialOptions {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            metalness: 0.9,
            roughness: 0.1,
            clearcoat: 1.0,
            clearcoat_roughness: 0.0,
            transparent: true,
            opacity: 0.5,
            reflectivity: 0.2,
            refraction_ratio: 0.985,
            ior: 0.9,
        }
    }
}

/// Surface of the Earth mesh: a rough dielectric tinted by its day map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Earth", inline)]
#[serde(default)]
pub struct EarthMaterialOptions {
    /// Multiplied with the day map.
    #[schemars(title = "Tint")]
    pub color: Color,
    /// Metalness of the surface.
    #[schemars(title = "Metalness", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub metalness: f32,
    /// Perceptual roughness of the surface.
    #[schemars(title = "Roughness", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub roughness: f32,
}

impl Default for EarthMaterialOptions {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            metalness: 0.0,
            roughness: 1.0,
        }
    }
}
