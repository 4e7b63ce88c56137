//! Wu's greedy orthogonal bipartitioning quantizer
//!
//! Repeatedly splits the histogram box with the largest color variance at
//! the cut that leaves the smallest summed variance in its two halves, then
//! maps every pixel to the mean color of its box.

use log::{debug, info};
use rayon::prelude::*;

use crate::color::Color;
use crate::constants::quantizer::{DEFAULT_INDEX_BITS, MIN_PIXELS_PER_PARTIAL};
use crate::quantize::cutter::{self, ColorBox};
use crate::quantize::histogram::{Moment, MomentTables};
use crate::quantize::{validate_input, ColorQuantizer, QuantizationResult};
use crate::{DistillError, Result};

/// Variance-driven histogram quantizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WuQuantizer {
    index_bits: u8,
}

impl Default for WuQuantizer {
    fn default() -> Self {
        Self::new()
    }
}

impl WuQuantizer {
    /// Create a quantizer with 7 bits per channel
    pub fn new() -> Self {
        Self {
            index_bits: DEFAULT_INDEX_BITS,
        }
    }

    /// Create a quantizer with a custom histogram resolution
    ///
    /// # Arguments
    ///
    /// * `index_bits` - Bits kept per channel, in [1, 8]
    pub fn with_index_bits(index_bits: u8) -> Result<Self> {
        if !(1..=8).contains(&index_bits) {
            return Err(DistillError::invalid_parameter("index_bits", index_bits));
        }
        Ok(Self { index_bits })
    }

    pub fn index_bits(&self) -> u8 {
        self.index_bits
    }

    /// Split the histogram into at most `color_count` boxes
    fn split_boxes(&self, tables: &MomentTables, color_count: usize) -> Vec<ColorBox> {
        let mut boxes = vec![ColorBox::spanning(tables)];
        let mut variances = vec![0.0f64];
        let mut next = 0;

        let box_variance = |cube: &ColorBox| {
            if cube.volume > 1 {
                cutter::variance(tables, cube)
            } else {
                0.0
            }
        };

        while boxes.len() < color_count {
            let mut current = boxes[next];
            match cutter::cut(tables, &mut current) {
                Some(sibling) => {
                    boxes[next] = current;
                    variances[next] = box_variance(&current);
                    boxes.push(sibling);
                    variances.push(box_variance(&sibling));
                }
                // Unsplittable: drop it from the running without using a slot
                None => variances[next] = 0.0,
            }

            let mut best = variances[0];
            next = 0;
            for (index, &candidate) in variances.iter().enumerate().skip(1) {
                if candidate > best {
                    best = candidate;
                    next = index;
                }
            }

            if best <= 0.0 {
                break;
            }
        }

        debug!(
            "Box splitting finished: {} requested, {} achieved",
            color_count,
            boxes.len()
        );
        boxes
    }

    /// Label each histogram cell with the index of its owning box
    fn mark(tables: &MomentTables, boxes: &[ColorBox]) -> Vec<u8> {
        let side = tables.side();
        let mut tags = vec![0u8; side * side * side];

        for (label, cube) in boxes.iter().enumerate() {
            for r in cube.r0 + 1..=cube.r1 {
                for g in cube.g0 + 1..=cube.g1 {
                    for b in cube.b0 + 1..=cube.b1 {
                        tags[tables.index(r, g, b)] = label as u8;
                    }
                }
            }
        }
        tags
    }

    /// Mean color of a box, black when it holds no pixels
    fn mean_color(tables: &MomentTables, cube: &ColorBox) -> Color {
        let weight = cutter::volume(tables, cube, Moment::Weight);
        if weight == 0 {
            return Color::BLACK;
        }
        let mean = |moment| (cutter::volume(tables, cube, moment) / weight) as u8;
        Color::new(mean(Moment::Red), mean(Moment::Green), mean(Moment::Blue))
    }

    /// Count the pixels that fall into each box
    fn count_labels(tables: &MomentTables, tags: &[u8], pixels: &[u8], boxes: usize) -> Vec<usize> {
        let chunk_bytes = MIN_PIXELS_PER_PARTIAL * 4;
        pixels
            .par_chunks(chunk_bytes)
            .map(|chunk| {
                let mut counts = vec![0usize; boxes];
                for pixel in chunk.chunks_exact(4) {
                    let (r, g, b) = tables.cell_of(pixel[2], pixel[1], pixel[0]);
                    counts[tags[tables.index(r, g, b)] as usize] += 1;
                }
                counts
            })
            .reduce(
                || vec![0usize; boxes],
                |mut total, partial| {
                    total.iter_mut().zip(partial).for_each(|(t, p)| *t += p);
                    total
                },
            )
    }
}

impl ColorQuantizer for WuQuantizer {
    fn quantize(&self, image: &[u8], color_count: usize) -> Result<QuantizationResult> {
        let pixel_count = validate_input(image, color_count)?;

        let tables = MomentTables::build(image, self.index_bits)?;
        let boxes = self.split_boxes(&tables, color_count);
        let tags = Self::mark(&tables, &boxes);
        let counts = Self::count_labels(&tables, &tags, image, boxes.len());

        let mut result = QuantizationResult::new(pixel_count, boxes.len());
        for (cube, count) in boxes.iter().zip(counts) {
            result.add(Self::mean_color(&tables, cube), count);
        }

        info!(
            "Quantized {} pixels to {} colors ({} requested)",
            pixel_count,
            result.len(),
            color_count
        );
        Ok(result)
    }
}
