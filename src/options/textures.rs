use serde::{Deserialize, Serialize};

use crate::texture::TextureSource;

/// Day and night texture sources for the Earth meshes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextureOptions {
    /// Color map of the Earth surface.
    pub day_map: TextureSource,
    /// Emissive city-lights map, blended additively.
    pub night_map: TextureSource,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            day_map: TextureSource::Url(
                "https://imagedelivery.net/zbd8viznFTU9Xm-HIspwjQ/44f47c01-82a7-42b3-1b37-de6057609600/public"
                    .into(),
            ),
            night_map: TextureSource::Url(
                "https://imagedelivery.net/zbd8viznFTU9Xm-HIspwjQ/6388f36e-7ccd-4a3e-571f-77274742fa00/public"
                    .into(),
            ),
        }
    }
}
