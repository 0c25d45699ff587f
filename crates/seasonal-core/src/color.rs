//! Color primitives: RGB/HSL conversion, luma, saturation and warm/cool tone.
//!
//! All functions are pure. Degenerate inputs (achromatic colors, black) are
//! defined results rather than errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// --- Perceptual luma weights (ITU-R BT.601) ---
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

// Generic tone: warm if hue is in [0, 60] or [300, 360].
const WARM_HUE_MAX: f32 = 60.0;
const WARM_HUE_WRAP_MIN: f32 = 300.0;

// Skin tone: typical skin hues sit around 18–30 degrees, so the generic
// buckets are too coarse. Cool only at the extreme red/magenta ends.
const SKIN_COOL_HUE_BELOW: f32 = 18.0;
const SKIN_COOL_HUE_ABOVE: f32 = 340.0;

/// An 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Hue in degrees [0, 360), saturation and lightness in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

/// Warm (yellow-red bias) or cool (blue-green bias).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Warm,
    Cool,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tone::Warm => f.write_str("warm"),
            Tone::Cool => f.write_str("cool"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid hex color: {0:?} (expected #RRGGBB)")]
pub struct HexColorError(pub String);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, HexColorError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HexColorError(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| HexColorError(hex.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Uppercase `#RRGGBB`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_hsl(&self) -> Hsl {
        rgb_to_hsl(*self)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Convert RGB to HSL. Achromatic input (r = g = b) yields h = 0, s = 0.
pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let r = rgb.r as f32 / 255.0;
    let g = rgb.g as f32 / 255.0;
    let b = rgb.b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if rgb.r == rgb.g && rgb.g == rgb.b {
        return Hsl { h: 0.0, s: 0.0, l: l * 100.0 };
    }

    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };

    // Six-way piecewise hue, keyed on the dominant channel.
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    let mut hue = h * 60.0;
    if hue >= 360.0 {
        hue -= 360.0;
    }

    Hsl { h: hue, s: s * 100.0, l: l * 100.0 }
}

/// Perceptual luma on a 0–255 scale.
pub fn brightness(rgb: Rgb) -> f32 {
    LUMA_R * rgb.r as f32 + LUMA_G * rgb.g as f32 + LUMA_B * rgb.b as f32
}

/// HSV-style saturation (max − min) / max on a 0–100 scale; 0 for black.
pub fn saturation(rgb: Rgb) -> f32 {
    let max = rgb.r.max(rgb.g).max(rgb.b) as f32;
    let min = rgb.r.min(rgb.g).min(rgb.b) as f32;
    if max == 0.0 {
        return 0.0;
    }
    (max - min) / max * 100.0
}

/// Generic hue-bucket tone, used for lips and other non-skin samples.
pub fn tone(rgb: Rgb) -> Tone {
    let hue = rgb_to_hsl(rgb).h;
    if (0.0..=WARM_HUE_MAX).contains(&hue) || (WARM_HUE_WRAP_MIN..=360.0).contains(&hue) {
        Tone::Warm
    } else {
        Tone::Cool
    }
}

/// Skin-tuned tone with tighter thresholds than [`tone`].
pub fn skin_tone(rgb: Rgb) -> Tone {
    let hue = rgb_to_hsl(rgb).h;
    if hue < SKIN_COOL_HUE_BELOW || hue > SKIN_COOL_HUE_ABOVE {
        Tone::Cool
    } else {
        Tone::Warm
    }
}

/// Shortest angular distance between two hues, in degrees [0, 180].
pub fn hue_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).abs() % 360.0;
    if d > 180.0 { 360.0 - d } else { d }
}
