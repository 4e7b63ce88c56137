//! Per-image color statistics
//!
//! Turns a [`QuantizationResult`] into a JSON-friendly report: every
//! palette color with its channels, HSL view and share of the image.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::quantize::QuantizationResult;

/// One palette color of an image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStats {
    /// Hex code, e.g. "#FF8000"
    pub name: String,
    /// Packed 0xAARRGGBB value
    pub argb: u32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: u8,
    /// HSL hue in degrees
    pub hue: f64,
    /// HSL saturation (0.0-1.0)
    pub saturation: f64,
    /// HSL lightness (0.0-1.0)
    pub lightness: f64,
    /// Share of the image's pixels, in percent
    pub factor: f64,
}

impl ColorStats {
    pub fn new(color: Color, factor: f64) -> Self {
        let hsl = color.to_hsl();
        Self {
            name: color.to_hex(),
            argb: color.argb(),
            r: color.r,
            g: color.g,
            b: color.b,
            alpha: color.a,
            hue: hsl.h,
            saturation: hsl.s,
            lightness: hsl.l,
            factor,
        }
    }

    pub fn color(&self) -> Color {
        Color::with_alpha(self.r, self.g, self.b, self.alpha)
    }
}

/// Palette report for one image, most frequent color first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageStats {
    pub name: String,
    pub colors: Vec<ColorStats>,
}

impl ImageStats {
    pub fn from_result(name: impl Into<String>, result: &QuantizationResult) -> Self {
        let total = result.pixel_count.max(1) as f64;
        let colors = result
            .entries()
            .into_iter()
            .map(|(color, count)| ColorStats::new(color, count as f64 * 100.0 / total))
            .collect();

        Self {
            name: name.into(),
            colors,
        }
    }

    /// Pretty-printed JSON report
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
