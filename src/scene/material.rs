//! Surface descriptions attached to meshes.

use super::{Color, TextureId};
use crate::options::{EarthMaterialOptions, RefractiveMaterialOptions};

/// How a material's output is combined with the color already in the
/// target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Blending {
    /// Replace (or alpha-blend, when transparent).
    #[default]
    Normal,
    /// Add onto the destination.
    Additive,
}

/// Lit metallic/roughness surface, optionally mapped by a color texture.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardMaterial {
    /// Base color, multiplied with the map.
    pub color: Color,
    /// Color map.
    pub map: Option<TextureId>,
    /// Metalness.
    pub metalness: f32,
    /// Perceptual roughness.
    pub roughness: f32,
}

impl StandardMaterial {
    /// Earth surface material mapped by `map`.
    #[must_use]
    pub fn earth(options: &EarthMaterialOptions, map: TextureId) -> Self {
        Self {
            color: options.color,
            map: Some(map),
            metalness: options.metalness,
            roughness: options.roughness,
        }
    }
}

/// Unlit surface.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicMaterial {
    /// Base color, multiplied with the map.
    pub color: Color,
    /// Color map.
    pub map: Option<TextureId>,
    /// Compositing mode.
    pub blending: Blending,
}

/// Metallic/roughness surface with a clearcoat layer and transparency.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalMaterial {
    /// Base color.
    pub color: Color,
    /// Metalness.
    pub metalness: f32,
    /// Perceptual roughness.
    pub roughness: f32,
    /// Clearcoat strength.
    pub clearcoat: f32,
    /// Clearcoat roughness.
    pub clearcoat_roughness: f32,
    /// Alpha-blend with the background.
    pub transparent: bool,
    /// Alpha when transparent.
    pub opacity: f32,
    /// Dielectric specular reflectance.
    pub reflectivity: f32,
    /// Refraction ratio of an environment-map lookup. Kept as configuration
    /// only: the scene has no environment map, so it does not affect
    /// rendering and is not uploaded.
    pub refraction_ratio: f32,
    /// Index of refraction.
    pub ior: f32,
}

impl From<&RefractiveMaterialOptions> for PhysicalMaterial {
    fn from(o: &RefractiveMaterialOptions) -> Self {
        Self {
            color: o.color,
            metalness: o.metalness,
            roughness: o.roughness,
            clearcoat: o.clearcoat,
            clearcoat_roughness: o.clearcoat_roughness,
            transparent: o.transparent,
            opacity: o.opacity,
            reflectivity: o.reflectivity,
            refraction_ratio: o.refraction_ratio,
            ior: o.ior,
        }
    }
}

/// Any material the renderer can draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Lit, opaque.
    Standard(StandardMaterial),
    /// Unlit.
    Basic(BasicMaterial),
    /// Lit with clearcoat; compiled from the patchable physical template.
    Physical(PhysicalMaterial),
}

impl Material {
    /// Color map, if any.
    #[must_use]
    pub fn map(&self) -> Option<TextureId> {
        match self {
            Self::Standard(m) => m.map,
            Self::Basic(m) => m.map,
            Self::Physical(_) => None,
        }
    }

    /// Compositing mode.
    #[must_use]
    pub fn blending(&self) -> Blending {
        match self {
            Self::Basic(m) => m.blending,
            _ => Blending::Normal,
        }
    }

    /// Drawn after opaque geometry with alpha blending.
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        matches!(self, Self::Physical(m) if m.transparent)
    }
}
