//! Color type shared by themes, widget options and renderers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// RGBA color with alpha channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color::opaque(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::opaque(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: a as f64 / 255.0,
        }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgba8(r, g, b, 255)
    }

    pub fn to_rgba8(&self) -> (u8, u8, u8, u8) {
        (
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            (self.a * 255.0).round() as u8,
        )
    }

    /// Same color with a different alpha
    pub fn with_alpha(&self, a: f64) -> Self {
        Self { a, ..*self }
    }

    /// Darken toward black by `factor` (0.0 = unchanged, 1.0 = black)
    pub fn darken(&self, factor: f64) -> Self {
        let keep = 1.0 - factor.clamp(0.0, 1.0);
        Self::new(self.r * keep, self.g * keep, self.b * keep, self.a)
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let byte = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        match digits.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (slot, c) in rgb.iter_mut().zip(digits.chars()) {
                    let v = c.to_digit(16)? as u8;
                    *slot = v * 16 + v;
                }
                Some(Self::from_rgb8(rgb[0], rgb[1], rgb[2]))
            }
            6 => Some(Self::from_rgb8(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::from_rgba8(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// Interpret a JSON option value as a color.
    ///
    /// Accepts a hex string, an `[r, g, b]` or `[r, g, b, a]` array of 0-255
    /// components, or a serialized `Color` object.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::from_hex(s),
            Value::Array(parts) if parts.len() == 3 || parts.len() == 4 => {
                let mut c = [255u8; 4];
                for (slot, part) in c.iter_mut().zip(parts) {
                    *slot = part.as_u64()?.min(255) as u8;
                }
                Some(Self::from_rgba8(c[0], c[1], c[2], c[3]))
            }
            Value::Object(_) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }

    /// Apply to Cairo context
    #[cfg(feature = "cairo")]
    pub fn apply_to_cairo(&self, cr: &cairo::Context) {
        cr.set_source_rgba(self.r, self.g, self.b, self.a);
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Color::from_hex("#ff0000"), Some(Color::from_rgb8(255, 0, 0)));
        assert_eq!(Color::from_hex("0f0"), Some(Color::from_rgb8(0, 255, 0)));
        assert_eq!(
            Color::from_hex("#00000080").map(|c| c.to_rgba8()),
            Some((0, 0, 0, 128))
        );
        assert_eq!(Color::from_hex("#zzzzzz"), None);
        assert_eq!(Color::from_hex("#12345"), None);
    }

    #[test]
    fn test_from_value_array_and_object() {
        assert_eq!(
            Color::from_value(&json!([168, 85, 247])),
            Some(Color::from_rgb8(168, 85, 247))
        );
        assert_eq!(
            Color::from_value(&json!({"r": 1.0, "g": 0.5, "b": 0.0, "a": 1.0})),
            Some(Color::new(1.0, 0.5, 0.0, 1.0))
        );
        assert_eq!(Color::from_value(&json!(42)), None);
    }
}
