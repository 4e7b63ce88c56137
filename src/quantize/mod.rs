//! Image color quantization
//!
//! Reduces a BGRA pixel buffer to a bounded palette and reports how many
//! pixels fall on each palette color.
//!
//! - [`WuQuantizer`]: greedy variance-minimizing histogram partitioning
//! - [`LinearQuantizer`]: nearest-color mapping onto a fixed or generated palette

pub mod cutter;
pub mod histogram;
pub mod linear;
pub mod wu;

use std::collections::HashMap;

pub use cutter::{Axis, ColorBox};
pub use histogram::{Moment, MomentTables};
pub use linear::LinearQuantizer;
pub use wu::WuQuantizer;

use crate::color::Color;
use crate::constants::quantizer::MAX_COLORS;
use crate::{DistillError, Result};

/// Common interface of the image quantizers
pub trait ColorQuantizer {
    /// Quantize an interleaved BGRA/BGRX buffer to at most `color_count` colors
    ///
    /// # Arguments
    ///
    /// * `image` - Pixel bytes, 4 per pixel, in B, G, R, X order
    /// * `color_count` - Palette size limit in [1, 256]
    ///
    /// # Errors
    ///
    /// Returns `DistillError` if the buffer is empty or not made of whole
    /// pixels, or if `color_count` is out of range.
    fn quantize(&self, image: &[u8], color_count: usize) -> Result<QuantizationResult>;
}

/// Palette colors of a quantized image and the pixels mapped to each
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizationResult {
    /// Pixel count per palette color
    pub counts: HashMap<Color, usize>,
    /// Number of pixels in the source image
    pub pixel_count: usize,
    /// Number of palette entries the quantizer produced before pixels were assigned
    pub achieved_count: usize,
}

impl QuantizationResult {
    pub fn new(pixel_count: usize, achieved_count: usize) -> Self {
        Self {
            counts: HashMap::new(),
            pixel_count,
            achieved_count,
        }
    }

    /// Add `count` pixels to `color`
    pub fn add(&mut self, color: Color, count: usize) {
        if count > 0 {
            *self.counts.entry(color).or_insert(0) += count;
        }
    }

    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Palette entries ordered by pixel count (descending), then by color
    pub fn entries(&self) -> Vec<(Color, usize)> {
        let mut entries: Vec<(Color, usize)> =
            self.counts.iter().map(|(color, count)| (*color, *count)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        entries
    }

    /// Palette colors ordered by pixel count (descending)
    pub fn palette(&self) -> Vec<Color> {
        self.entries().into_iter().map(|(color, _)| color).collect()
    }
}

/// Check the arguments shared by every quantizer
///
/// # Returns
///
/// The number of pixels in `image`
pub(crate) fn validate_input(image: &[u8], color_count: usize) -> Result<usize> {
    if !(1..=MAX_COLORS).contains(&color_count) {
        return Err(DistillError::invalid_parameter("color_count", color_count));
    }
    if image.is_empty() {
        return Err(DistillError::EmptyImage);
    }
    if image.len() % 4 != 0 {
        return Err(DistillError::MisalignedImage { length: image.len() });
    }
    Ok(image.len() / 4)
}
