//! Cumulative color moment tables
//!
//! Pixels are binned into a cube of `2^index_bits` cells per axis. Every
//! axis carries one extra leading cell of zeros so that box sums can be
//! taken by differencing without bounds checks. After [`MomentTables::build`]
//! each table holds a 3D prefix sum: entry `(r, g, b)` is the total over all
//! cells `(1..=r, 1..=g, 1..=b)`.

use log::debug;
use rayon::prelude::*;

use crate::constants::quantizer::{MIN_PIXELS_PER_PARTIAL, PARTIAL_MEMORY_BUDGET};
use crate::{DistillError, Result};

/// Selects one of the moment tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    /// Pixel count
    Weight,
    /// Sum of red channel values
    Red,
    /// Sum of green channel values
    Green,
    /// Sum of blue channel values
    Blue,
    /// Sum of r² + g² + b²
    Squared,
}

/// Histogram moment tables over quantized RGB cells
#[derive(Debug, Clone)]
pub struct MomentTables {
    index_bits: u8,
    side: usize,
    weights: Vec<i64>,
    red: Vec<i64>,
    green: Vec<i64>,
    blue: Vec<i64>,
    squared: Vec<i64>,
}

impl MomentTables {
    /// Create zeroed tables for the given bit depth
    pub(crate) fn new(index_bits: u8) -> Self {
        let side = (1usize << index_bits) + 1;
        let cells = side * side * side;
        Self {
            index_bits,
            side,
            weights: vec![0; cells],
            red: vec![0; cells],
            green: vec![0; cells],
            blue: vec![0; cells],
            squared: vec![0; cells],
        }
    }

    /// Build cumulative moment tables from a BGRA pixel buffer
    ///
    /// The buffer is split into chunks that are binned on separate threads,
    /// each into private tables. The partial histograms are merged by
    /// elementwise addition before the sequential prefix-sum pass.
    ///
    /// # Arguments
    ///
    /// * `pixels` - Pixel bytes, 4 per pixel, B, G, R, X order
    /// * `index_bits` - Bits kept per channel (1..=8)
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `index_bits` is outside [1, 8].
    pub fn build(pixels: &[u8], index_bits: u8) -> Result<Self> {
        if !(1..=8).contains(&index_bits) {
            return Err(DistillError::invalid_parameter("index_bits", index_bits));
        }

        let pixel_count = pixels.len() / 4;
        let partials = partial_count(pixel_count, index_bits, rayon::current_num_threads());
        let chunk_pixels = pixel_count.div_ceil(partials).max(1);

        debug!(
            "Building moment tables: {} pixels, {} index bits, {} partial histograms",
            pixel_count, index_bits, partials
        );

        let mut tables = pixels
            .par_chunks(chunk_pixels * 4)
            .map(|chunk| {
                let mut partial = Self::new(index_bits);
                partial.accumulate(chunk);
                partial
            })
            .reduce_with(Self::merge)
            .unwrap_or_else(|| Self::new(index_bits));

        tables.integrate();
        Ok(tables)
    }

    /// Bytes held by one set of tables at the given bit depth
    pub fn footprint(index_bits: u8) -> usize {
        let side = (1usize << index_bits) + 1;
        side * side * side * 5 * std::mem::size_of::<i64>()
    }

    pub fn index_bits(&self) -> u8 {
        self.index_bits
    }

    /// Cells per axis, including the zero border
    pub fn side(&self) -> usize {
        self.side
    }

    /// Flat index of cell `(r, g, b)`
    #[inline]
    pub fn index(&self, r: usize, g: usize, b: usize) -> usize {
        (r * self.side + g) * self.side + b
    }

    /// Histogram cell (border offset included) of an 8-bit RGB color
    #[inline]
    pub fn cell_of(&self, r: u8, g: u8, b: u8) -> (usize, usize, usize) {
        let shift = 8 - self.index_bits;
        (
            (r >> shift) as usize + 1,
            (g >> shift) as usize + 1,
            (b >> shift) as usize + 1,
        )
    }

    pub fn table(&self, moment: Moment) -> &[i64] {
        match moment {
            Moment::Weight => &self.weights,
            Moment::Red => &self.red,
            Moment::Green => &self.green,
            Moment::Blue => &self.blue,
            Moment::Squared => &self.squared,
        }
    }

    /// Bin every whole pixel of `pixels` into the raw histogram
    fn accumulate(&mut self, pixels: &[u8]) {
        for pixel in pixels.chunks_exact(4) {
            let (b, g, r) = (pixel[0], pixel[1], pixel[2]);
            let (ir, ig, ib) = self.cell_of(r, g, b);
            let index = self.index(ir, ig, ib);
            let (r, g, b) = (r as i64, g as i64, b as i64);

            self.weights[index] += 1;
            self.red[index] += r;
            self.green[index] += g;
            self.blue[index] += b;
            self.squared[index] += r * r + g * g + b * b;
        }
    }

    /// Elementwise sum of two raw histograms
    fn merge(mut self, other: Self) -> Self {
        for (table, other_table) in [
            (&mut self.weights, &other.weights),
            (&mut self.red, &other.red),
            (&mut self.green, &other.green),
            (&mut self.blue, &other.blue),
            (&mut self.squared, &other.squared),
        ] {
            for (cell, other_cell) in table.iter_mut().zip(other_table.iter()) {
                *cell += *other_cell;
            }
        }
        self
    }

    /// Turn the raw histogram into 3D prefix sums
    fn integrate(&mut self) {
        let side = self.side;
        let plane = side * side;
        let mut area = vec![[0i64; 5]; side];

        for r in 1..side {
            area.iter_mut().for_each(|cell| *cell = [0; 5]);

            for g in 1..side {
                let mut line = [0i64; 5];

                for b in 1..side {
                    let index = self.index(r, g, b);
                    let below = index - plane;

                    for (m, table) in [
                        &mut self.weights,
                        &mut self.red,
                        &mut self.green,
                        &mut self.blue,
                        &mut self.squared,
                    ]
                    .into_iter()
                    .enumerate()
                    {
                        line[m] += table[index];
                        area[b][m] += line[m];
                        table[index] = table[below] + area[b][m];
                    }
                }
            }
        }
    }
}

/// Number of private histograms to bin `pixel_count` pixels into
///
/// At least one, at most one per worker thread, each covering at least
/// `MIN_PIXELS_PER_PARTIAL` pixels, and together within `PARTIAL_MEMORY_BUDGET`.
fn partial_count(pixel_count: usize, index_bits: u8, threads: usize) -> usize {
    let affordable = PARTIAL_MEMORY_BUDGET / MomentTables::footprint(index_bits);
    (pixel_count / MIN_PIXELS_PER_PARTIAL)
        .min(threads)
        .min(affordable)
        .max(1)
}
