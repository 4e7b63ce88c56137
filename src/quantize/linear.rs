//! Nearest-color quantizer over a fixed or generated palette

use log::{debug, info};
use rayon::prelude::*;

use crate::color::Color;
use crate::config::PaletteConfig;
use crate::constants::quantizer::{MAX_COLORS, MIN_PIXELS_PER_PARTIAL};
use crate::generator::PaletteGenerator;
use crate::quantize::{validate_input, ColorQuantizer, QuantizationResult};
use crate::{DistillError, Result};

#[derive(Debug, Clone)]
enum PaletteSource {
    Fixed(Vec<Color>),
    Generated(PaletteConfig),
}

/// Maps every pixel to the closest palette color by squared RGB distance
///
/// The palette is either supplied up front or generated per call with
/// `color_count` colors.
#[derive(Debug, Clone)]
pub struct LinearQuantizer {
    source: PaletteSource,
}

impl Default for LinearQuantizer {
    fn default() -> Self {
        Self::generated(PaletteConfig::default())
    }
}

impl LinearQuantizer {
    /// Quantize against a fixed palette
    ///
    /// `quantize` uses the first `color_count` entries.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an empty palette or one larger than 256 colors.
    pub fn with_palette(palette: Vec<Color>) -> Result<Self> {
        if palette.is_empty() || palette.len() > MAX_COLORS {
            return Err(DistillError::invalid_parameter("palette_size", palette.len()));
        }
        Ok(Self {
            source: PaletteSource::Fixed(palette),
        })
    }

    /// Quantize against a palette generated for each call
    pub fn generated(config: PaletteConfig) -> Self {
        Self {
            source: PaletteSource::Generated(config),
        }
    }

    fn palette(&self, color_count: usize) -> Result<Vec<Color>> {
        match &self.source {
            PaletteSource::Fixed(palette) => Ok(palette.iter().take(color_count).copied().collect()),
            PaletteSource::Generated(config) => {
                let generator = PaletteGenerator::new(config.clone())?;
                let predicate = config.bounds_predicate();
                Ok(generator.generate_seeded(color_count, &predicate)?.colors)
            }
        }
    }
}

/// Closest palette entry, first entry on ties
fn nearest(palette: &[Color], color: Color) -> usize {
    let mut best = 0;
    let mut best_distance = u32::MAX;
    for (index, candidate) in palette.iter().enumerate() {
        let dr = color.r as i32 - candidate.r as i32;
        let dg = color.g as i32 - candidate.g as i32;
        let db = color.b as i32 - candidate.b as i32;
        let distance = (dr * dr + dg * dg + db * db) as u32;
        if distance < best_distance {
            best_distance = distance;
            best = index;
        }
    }
    best
}

impl ColorQuantizer for LinearQuantizer {
    fn quantize(&self, image: &[u8], color_count: usize) -> Result<QuantizationResult> {
        let pixel_count = validate_input(image, color_count)?;
        let palette = self.palette(color_count)?;
        debug!("Linear quantization against {} palette colors", palette.len());

        let counts = image
            .par_chunks(MIN_PIXELS_PER_PARTIAL * 4)
            .map(|chunk| {
                let mut counts = vec![0usize; palette.len()];
                for pixel in chunk.chunks_exact(4).filter_map(|p| <[u8; 4]>::try_from(p).ok()) {
                    counts[nearest(&palette, Color::from_bgra(pixel))] += 1;
                }
                counts
            })
            .reduce(
                || vec![0usize; palette.len()],
                |mut total, partial| {
                    total.iter_mut().zip(partial).for_each(|(t, p)| *t += p);
                    total
                },
            );

        let mut result = QuantizationResult::new(pixel_count, palette.len());
        for (color, count) in palette.iter().zip(counts) {
            result.add(*color, count);
        }

        info!("Mapped {} pixels onto {} colors", pixel_count, result.len());
        Ok(result)
    }
}
