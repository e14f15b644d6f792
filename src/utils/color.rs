//! Color utilities
//!
//! 8-bit fixed-point color math, the Porter-Duff "over" compositor,
//! and hex color string parsing for config values.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 32-bit RGBA color, byte layout [R, G, B, A] from low to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorRGBA {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorRGBA {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack from the packed `u32` form (R in the lowest byte)
    pub const fn from_u32(packed: u32) -> Self {
        Self {
            r: packed as u8,
            g: (packed >> 8) as u8,
            b: (packed >> 16) as u8,
            a: (packed >> 24) as u8,
        }
    }

    pub const fn to_u32(self) -> u32 {
        (self.r as u32) | ((self.g as u32) << 8) | ((self.b as u32) << 16) | ((self.a as u32) << 24)
    }

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Same color with a different alpha
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Component-wise multiply, used for color modulation of overlays
    pub fn modulate(self, by: ColorRGBA) -> Self {
        Self {
            r: scale(self.r, by.r),
            g: scale(self.g, by.g),
            b: scale(self.b, by.b),
            a: scale(self.a, by.a),
        }
    }
}

impl fmt::Display for ColorRGBA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for ColorRGBA {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ColorRGBA {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hex_rgba(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color: {:?}", s)))
    }
}

// ============================================================================
// Fixed-point component math
// ============================================================================

/// `min(255, a + b)`
#[inline]
pub fn saturating_add(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

/// `b` as a fraction of full scale applied to `a`: `floor(a * b / 255)`
#[inline]
pub fn scale(a: u8, b: u8) -> u8 {
    (a as u32 * b as u32 / 255) as u8
}

/// Inverse of [`scale`]: `floor(255 * a / b)`, 0 when `b == 0`.
///
/// Clamped to 255. [`composite_over`] never feeds it `a > b`, so the
/// clamp only matters for direct callers.
#[inline]
pub fn unscale(a: u8, b: u8) -> u8 {
    if b == 0 {
        return 0;
    }
    (255 * a as u32 / b as u32).min(255) as u8
}

/// Porter-Duff "first over second" with exact integer truncation.
///
/// A fully transparent `first` leaves `second` untouched.
pub fn composite_over(first: ColorRGBA, second: ColorRGBA) -> ColorRGBA {
    if first.a == 0 {
        return second;
    }

    let inv = 255 - first.a;
    let a = saturating_add(first.a, scale(second.a, inv));

    let channel = |c1: u8, c2: u8| {
        let top = scale(c1, first.a);
        let bottom = scale(scale(c2, second.a), inv);
        unscale(saturating_add(top, bottom), a)
    };

    ColorRGBA {
        r: channel(first.r, second.r),
        g: channel(first.g, second.g),
        b: channel(first.b, second.b),
        a,
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse hex color (RRGGBB, RRGGBBAA, RGB or RGBA; `#` optional).
/// Colors without an alpha component are opaque.
/// Returns None on invalid input.
pub fn parse_hex_rgba(hex: &str) -> Option<ColorRGBA> {
    let hex = hex.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    // Short format: expand F -> FF
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);

    match hex.len() {
        8 => Some(ColorRGBA::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        6 => Some(ColorRGBA::new(byte(0)?, byte(2)?, byte(4)?, 255)),
        4 => Some(ColorRGBA::new(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        3 => Some(ColorRGBA::new(nibble(0)?, nibble(1)?, nibble(2)?, 255)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Straight transcription of the fixed-point formula, without clamping
    /// and without the transparent shortcut.
    fn reference_over(first: [u32; 4], second: [u32; 4]) -> [u32; 4] {
        let mul = |a: u32, b: u32| a * b / 255;
        let add = |a: u32, b: u32| (a + b).min(255);
        let mut out = [0u32; 4];
        out[3] = add(first[3], mul(second[3], 255 - first[3]));
        for i in 0..3 {
            let sum = add(
                mul(first[i], first[3]),
                mul(mul(second[i], second[3]), 255 - first[3]),
            );
            out[i] = if out[3] == 0 { 0 } else { 255 * sum / out[3] };
        }
        out
    }

    #[test]
    fn test_scale_extremes() {
        for a in 0..=255u8 {
            assert_eq!(scale(a, 255), a);
            assert_eq!(scale(a, 0), 0);
        }
    }

    #[test]
    fn test_saturating_add() {
        assert_eq!(saturating_add(200, 100), 255);
        assert_eq!(saturating_add(20, 30), 50);
    }

    #[test]
    fn test_unscale() {
        assert_eq!(unscale(10, 0), 0);
        assert_eq!(unscale(64, 128), 127);
        assert_eq!(unscale(128, 128), 255);
        // Quotients past 255 saturate rather than wrap (510 would wrap to 254)
        assert_eq!(unscale(200, 100), 255);
        assert_eq!(unscale(255, 1), 255);
    }

    #[test]
    fn test_opaque_black_occludes() {
        for packed in [0u32, 0xffffffff, 0x80402010, 0x00ff00ff, 0x7f7f7f7f] {
            let under = ColorRGBA::from_u32(packed);
            assert_eq!(composite_over(ColorRGBA::BLACK, under), ColorRGBA::BLACK);
        }
    }

    #[test]
    fn test_transparent_is_identity() {
        for packed in [0u32, 0xffffffff, 0x80402010, 0x00ff00ff, 0x01020304] {
            let under = ColorRGBA::from_u32(packed);
            assert_eq!(composite_over(ColorRGBA::TRANSPARENT, under), under);
            assert_eq!(composite_over(ColorRGBA::new(9, 9, 9, 0), under), under);
        }
    }

    #[test]
    fn test_half_red_over_blue() {
        let out = composite_over(ColorRGBA::new(255, 0, 0, 128), ColorRGBA::new(0, 0, 255, 255));
        // alpha: 128 + 255*127/255 = 255
        // red:   255 * (255*128/255) / 255 = 128
        // blue:  255 * (0 + 255*127/255) / 255 = 127
        assert_eq!(out, ColorRGBA::new(128, 0, 127, 255));
    }

    #[test]
    fn test_matches_reference_formula() {
        // The channel sum never exceeds the output alpha, so the clamp in
        // `unscale` is never hit and output matches the unclamped formula.
        let steps = [0u32, 1, 17, 64, 127, 128, 200, 254, 255];
        for &fa in &steps[1..] {
            for &sa in &steps {
                for &fc in &steps {
                    for &sc in &steps {
                        let first = [fc, 255 - fc, fc / 2, fa];
                        let second = [sc, sc / 3, 255 - sc, sa];
                        let expected = reference_over(first, second);
                        assert!(expected.iter().all(|&v| v <= 255));

                        let pack = |c: [u32; 4]| {
                            ColorRGBA::new(c[0] as u8, c[1] as u8, c[2] as u8, c[3] as u8)
                        };
                        assert_eq!(composite_over(pack(first), pack(second)), pack(expected));
                    }
                }
            }
        }
    }

    #[test]
    fn test_packed_layout() {
        let c = ColorRGBA::from_u32(0xff0000ff);
        assert_eq!(c, ColorRGBA::new(255, 0, 0, 255));
        assert_eq!(c.to_u32(), 0xff0000ff);
        assert_eq!(c.to_bytes(), [255, 0, 0, 255]);
    }

    #[test]
    fn test_parse_hex_rgba() {
        assert_eq!(parse_hex_rgba("ff0000"), Some(ColorRGBA::new(255, 0, 0, 255)));
        assert_eq!(parse_hex_rgba("#00ff0080"), Some(ColorRGBA::new(0, 255, 0, 128)));
        assert_eq!(parse_hex_rgba("f00"), Some(ColorRGBA::new(255, 0, 0, 255)));
        assert_eq!(parse_hex_rgba("#0f08"), Some(ColorRGBA::new(0, 255, 0, 136)));
        assert_eq!(parse_hex_rgba("invalid"), None);
        assert_eq!(parse_hex_rgba("ééé"), None);
    }

    #[test]
    fn test_modulate() {
        let c = ColorRGBA::new(200, 100, 50, 255);
        assert_eq!(c.modulate(ColorRGBA::WHITE), c);
        assert_eq!(c.modulate(ColorRGBA::TRANSPARENT), ColorRGBA::TRANSPARENT);
    }
}
