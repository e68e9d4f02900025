use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Bloom post-effect parameters, in the units of an "unreal" style bloom:
/// `threshold` is the luminance cut-off of the bright pass, `radius` blends
/// the mip weights toward the wide levels, `strength` scales the result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Bloom", inline)]
#[serde(default)]
pub struct BloomOptions {
    /// Register the bloom pass at all.
    #[schemars(title = "Enabled")]
    pub enabled: bool,
    /// Overall glow strength.
    #[schemars(title = "Strength", range(min = 0.0, max = 3.0), extend("step" = 0.05))]
    pub strength: f32,
    /// Spread of the glow across mip levels.
    #[schemars(title = "Radius", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub radius: f32,
    /// Luminance above which pixels contribute to the glow.
    #[schemars(title = "Threshold", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub threshold: f32,
}

impl Default for BloomOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 0.7,
            radius: 0.4,
            threshold: 0.4,
        }
    }
}
