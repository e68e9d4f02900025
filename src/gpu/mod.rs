//! GPU resource management utilities.
//!
//! Provides wgpu device/surface initialization, shared pipeline
//! boilerplate, texture upload, and shader composition.

/// Shared wgpu boilerplate for layouts, samplers and screen-space passes.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// WGSL shader composition with `#import` support via naga-oil.
pub mod shader_composer;
/// Sampled color textures and their placeholders.
pub mod texture;
