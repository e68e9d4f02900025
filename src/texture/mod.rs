//! Texture sources, load status and loaders.
//!
//! Loading is asynchronous relative to scene construction: the assembler
//! registers a source and asks a [`TextureLoader`] to fetch it, the scene
//! keeps rendering with a placeholder, and whoever drives the frame loop
//! feeds [`TextureLoader::poll`] results back into
//! [`Scene::resolve_texture`](crate::scene::Scene::resolve_texture).

mod threaded;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
pub use threaded::{fetch, ThreadedTextureLoader};

use crate::scene::TextureId;

/// Where a texture comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureSource {
    /// Remote image fetched over HTTP(S).
    Url(String),
    /// Image file on disk.
    Path(PathBuf),
}

impl fmt::Display for TextureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Load state of a texture.
#[derive(Debug, Clone)]
pub enum TextureStatus {
    /// Requested, not yet delivered.
    Pending,
    /// Decoded RGBA8 pixels.
    Ready(Arc<image::RgbaImage>),
    /// Load failed; the reason is kept for diagnostics.
    Failed(String),
}

/// A texture registered with the scene.
#[derive(Debug, Clone)]
pub struct Texture {
    /// Where the pixels come from.
    pub source: TextureSource,
    /// Current load state.
    pub status: TextureStatus,
}

impl Texture {
    /// A freshly requested texture.
    #[must_use]
    pub fn pending(source: TextureSource) -> Self {
        Self {
            source,
            status: TextureStatus::Pending,
        }
    }
}

/// Why a texture could not be loaded.
#[derive(Debug)]
pub enum TextureLoadError {
    /// Reading a local file failed.
    Io(std::io::Error),
    /// The HTTP request failed or returned an error status.
    Http(String),
    /// The bytes were not a decodable image.
    Decode(image::ImageError),
    /// The source kind is not available in this build.
    Unsupported(String),
    /// The loader worker went away before delivering a result.
    WorkerGone,
}

impl fmt::Display for TextureLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Http(msg) => write!(f, "HTTP error: {msg}"),
            Self::Decode(e) => write!(f, "decode error: {e}"),
            Self::Unsupported(msg) => write!(f, "unsupported source: {msg}"),
            Self::WorkerGone => f.write_str("loader worker exited"),
        }
    }
}

impl std::error::Error for TextureLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for TextureLoadError {
    fn from(e: image::ImageError) -> Self {
        Self::Decode(e)
    }
}

impl From<std::io::Error> for TextureLoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// A finished load.
pub type TextureResult = (TextureId, Result<image::RgbaImage, TextureLoadError>);

/// Fetches texture sources in the background.
pub trait TextureLoader {
    /// Start loading `source` for the scene texture `id`.
    fn request(&mut self, id: TextureId, source: &TextureSource);

    /// Collect loads that finished since the last call. Never blocks.
    fn poll(&mut self) -> Vec<TextureResult>;
}
