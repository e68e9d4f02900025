//! Scene camera.
//!
//! A fixed perspective camera looking at the origin; the host owns it and
//! resizes its aspect with the viewport.

mod core;

pub use self::core::{Camera, CameraUniform};
