// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Function signature hygiene
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Stylized Earth-in-glass scene rendered with wgpu.
//!
//! A textured, axially tilted Earth (day map plus an additive night-lights
//! layer) sits inside a large transparent icosahedron whose surface is
//! displaced over time by WGSL snippets spliced into the physical material
//! shader at fixed anchor comments. A bloom pass makes the glass glow.
//!
//! # Key entry points
//!
//! - [`scene::assembler::SceneAssembler`] - builds lights, meshes, the
//!   shader patch and the frame callbacks on any [`host::RenderHost`]
//! - [`shader::augment`] - typed, testable shader-source injection
//! - [`frame`] - the per-frame rotation step and time-uniform writer
//! - [`options::Options`] - TOML-backed configuration and presets
//! - [`renderer::SceneRenderer`] - the wgpu render host
//!
//! # Architecture
//!
//! The assembler only talks to the [`host::RenderHost`] trait, so the scene
//! can be built against a GPU backend or a test double. The backend compiles
//! each material lazily on first draw; the refractive material's compile
//! hook runs once at that point and the [`shader::ShaderHandle`] it was
//! registered with flips from uncompiled to compiled. Frame callbacks are
//! plain trait objects invoked by the host with a [`frame::FrameTick`].

pub mod camera;
pub mod error;
pub mod frame;
pub mod gpu;
pub mod host;
pub mod options;
pub mod renderer;
pub mod scene;
pub mod shader;
pub mod texture;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use error::EarthGlassError;
pub use host::RenderHost;
pub use options::Options;
#[cfg(feature = "viewer")]
pub use viewer::Viewer;
