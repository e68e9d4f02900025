//! Material shader templates.
//!
//! These are the sources the backend hands to compile hooks before
//! composing them with naga_oil. The physical material keeps its stages in
//! separate files so patches can target each one; the other kinds use one
//! file for both stages.

use super::ShaderSources;
use crate::scene::Material;

/// Vertex stage of the physical material.
pub const PHYSICAL_VERTEX: &str =
    include_str!("../../assets/shaders/materials/physical_vertex.wgsl");
/// Fragment stage of the physical material.
pub const PHYSICAL_FRAGMENT: &str =
    include_str!("../../assets/shaders/materials/physical_fragment.wgsl");
/// Lit, textured material (both stages).
pub const STANDARD: &str =
    include_str!("../../assets/shaders/materials/standard.wgsl");
/// Unlit, textured material (both stages).
pub const BASIC: &str =
    include_str!("../../assets/shaders/materials/basic.wgsl");

/// Unpatched physical material program.
#[must_use]
pub fn physical() -> ShaderSources {
    ShaderSources {
        vertex: PHYSICAL_VERTEX.to_owned(),
        fragment: PHYSICAL_FRAGMENT.to_owned(),
    }
}

/// Template for any material kind.
#[must_use]
pub fn for_material(material: &Material) -> ShaderSources {
    let single = |source: &str| ShaderSources {
        vertex: source.to_owned(),
        fragment: source.to_owned(),
    };
    match material {
        Material::Physical(_) => physical(),
        Material::Standard(_) => single(STANDARD),
        Material::Basic(_) => single(BASIC),
    }
}
