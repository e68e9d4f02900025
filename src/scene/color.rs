use std::borrow::Cow;
use std::fmt;

use schemars::{json_schema, JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};

/// An sRGB color stored as `0xRRGGBB`. Serializes as a `"#rrggbb"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(u32);

/// Error returned when a color string is not `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError(String);

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected a '#rrggbb' color, got '{}'", self.0)
    }
}

impl std::error::Error for ParseColorError {}

impl Color {
    /// Pure black.
    pub const BLACK: Self = Self(0x0000_0000);
    /// Pure white.
    pub const WHITE: Self = Self(0x00ff_ffff);

    /// Build from a `0xRRGGBB` literal. Bits above 24 are dropped.
    #[must_use]
    pub const fn from_hex(hex: u32) -> Self {
        Self(hex & 0x00ff_ffff)
    }

    /// The `0xRRGGBB` value.
    #[must_use]
    pub const fn hex(self) -> u32 {
        self.0
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn parse(s: &str) -> Result<Self, ParseColorError> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 {
            return Err(ParseColorError(s.to_owned()));
        }
        u32::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| ParseColorError(s.to_owned()))
    }

    /// Channels in 0..=1, still sRGB encoded.
    #[must_use]
    pub fn srgb(self) -> [f32; 3] {
        let [_, r, g, b] = self.0.to_be_bytes();
        [r, g, b].map(|c| f32::from(c) / 255.0)
    }

    /// Channels converted to linear light, for shading.
    #[must_use]
    pub fn linear(self) -> [f32; 3] {
        self.srgb().map(srgb_to_linear)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl JsonSchema for Color {
    fn schema_name() -> Cow<'static, str> {
        "Color".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "pattern": "^#[0-9a-fA-F]{6}$",
            "format": "color"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!(Color::parse("#526cff").unwrap(), Color::from_hex(0x526cff));
        assert_eq!(Color::parse("F210A5").unwrap(), Color::from_hex(0xf210a5));
        assert!(Color::parse("#fff").is_err());
        assert!(Color::parse("#gg0000").is_err());
    }

    #[test]
    fn display_is_lowercase_hex() {
        assert_eq!(Color::from_hex(0x0395d3).to_string(), "#0395d3");
    }

    #[test]
    fn linear_conversion_keeps_endpoints() {
        assert_eq!(Color::BLACK.linear(), [0.0, 0.0, 0.0]);
        let white = Color::WHITE.linear();
        assert!(white.iter().all(|c| (c - 1.0).abs() < 1e-6));
        // Mid grey is darker in linear space
        let grey = Color::from_hex(0x808080).linear()[0];
        assert!(grey > 0.2 && grey < 0.23, "{grey}");
    }
}
