//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::GpuInitError;
use crate::shader::augment::ShaderPatchError;
use crate::texture::TextureLoadError;

/// Errors produced by the earthglass crate.
#[derive(Debug)]
pub enum EarthGlassError {
    /// GPU context initialization failure.
    Gpu(GpuInitError),
    /// A shader augmentation could not be applied to a material.
    ShaderPatch(ShaderPatchError),
    /// naga-oil failed to compose a WGSL module.
    ShaderCompose(String),
    /// A texture could not be fetched or decoded.
    TextureLoad(TextureLoadError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// No built-in preset with this name.
    UnknownPreset(String),
    /// Viewer event-loop failure.
    Viewer(String),
}

impl fmt::Display for EarthGlassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::ShaderPatch(e) => write!(f, "shader patch error: {e}"),
            Self::ShaderCompose(msg) => {
                write!(f, "shader composition error: {msg}")
            }
            Self::TextureLoad(e) => write!(f, "texture load error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::UnknownPreset(name) => {
                write!(f, "unknown preset '{name}'")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for EarthGlassError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::ShaderPatch(e) => Some(e),
            Self::TextureLoad(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GpuInitError> for EarthGlassError {
    fn from(e: GpuInitError) -> Self {
        Self::Gpu(e)
    }
}

impl From<ShaderPatchError> for EarthGlassError {
    fn from(e: ShaderPatchError) -> Self {
        Self::ShaderPatch(e)
    }
}

impl From<TextureLoadError> for EarthGlassError {
    fn from(e: TextureLoadError) -> Self {
        Self::TextureLoad(e)
    }
}

impl From<std::io::Error> for EarthGlassError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
