//! # Color Distill
//!
//! A Rust crate for reducing true-color images to small representative
//! palettes and for generating sets of perceptually distinct colors.
//!
//! This library provides:
//! - Wu's variance-minimizing color quantizer over a 3D moment histogram
//! - A palette generator working in CIE Lab, with k-means and
//!   force-directed refinement
//! - Euclidean, CMC and color-vision-deficiency aware color distances
//! - sRGB ↔ XYZ ↔ Lab ↔ HCL conversions
//!
//! ## Example
//!
//! ```rust
//! use color_distill::{quantize, Color};
//!
//! // 4 BGRA pixels of the same color
//! let image = [30u8, 20, 10, 255].repeat(4);
//! let result = quantize(&image, 8)?;
//! assert_eq!(result.counts.get(&Color::new(10, 20, 30)), Some(&4));
//! # Ok::<(), color_distill::DistillError>(())
//! ```

pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod generator;
pub mod quantize;
pub mod stats;

pub use color::{Color, Deficiency, DistanceCalculator, DistanceMetric, HclColor, HslColor, HsvColor, LabColor, XyzColor};
pub use config::{Bounds, DistillConfig, GenerationMode, PaletteConfig, QuantizerConfig, SamplePool};
pub use error::{DistillError, Result};
pub use generator::{CancellationToken, ColorPredicate, GeneratedPalette, PaletteGenerator};
pub use quantize::{ColorQuantizer, LinearQuantizer, QuantizationResult, WuQuantizer};
pub use stats::{ColorStats, ImageStats};

/// Quantize a BGRA image with Wu's method
///
/// # Arguments
///
/// * `image` - Interleaved pixel bytes in B, G, R, X order
/// * `color_count` - Maximum palette size, in [1, 256]
///
/// # Returns
///
/// The palette colors and the number of pixels mapped to each. Counts sum
/// to the number of pixels in `image`.
///
/// # Errors
///
/// Returns `DistillError` if:
/// - `color_count` is outside [1, 256]
/// - The image is empty or its length is not a multiple of 4
pub fn quantize(image: &[u8], color_count: usize) -> Result<QuantizationResult> {
    WuQuantizer::new().quantize(image, color_count)
}

/// Quantize a BGRA image to at most 256 colors
pub fn quantize_default(image: &[u8]) -> Result<QuantizationResult> {
    quantize(image, constants::quantizer::MAX_COLORS)
}

/// Quantize with the settings of a [`QuantizerConfig`]
pub fn quantize_with(image: &[u8], config: &QuantizerConfig) -> Result<QuantizationResult> {
    config.validate()?;
    WuQuantizer::with_index_bits(config.index_bits)?.quantize(image, config.color_count)
}

/// Generate `color_count` distinct colors inside the configured bounds
///
/// The hue, chroma and lightness bounds of `config` are enforced on every
/// seed and refined color. Randomness comes from `config.seed` when set.
///
/// # Errors
///
/// Returns `DistillError` if the configuration is invalid, the candidate
/// pool is too small, or no valid seed color can be found.
pub fn generate_palette(color_count: usize, config: &PaletteConfig) -> Result<GeneratedPalette> {
    let generator = PaletteGenerator::new(config.clone())?;
    let predicate = config.bounds_predicate();
    generator.generate_seeded(color_count, &predicate)
}
