//! Perceptual palette generation
//!
//! Places a requested number of mutually distinct colors inside a bounded
//! region of Lab space. Seeds are drawn by rejection sampling and then
//! refined either by k-means clustering over a candidate pool or by a
//! force-directed repulsion simulation. The final colors are ordered so that
//! consecutive entries contrast as much as possible.
//!
//! ## Example
//!
//! ```rust
//! use color_distill::{GenerationMode, LabColor, PaletteConfig, PaletteGenerator};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let config = PaletteConfig { mode: GenerationMode::Force, quality: 1, ..PaletteConfig::default() };
//! let generator = PaletteGenerator::new(config)?;
//! let mut rng = StdRng::seed_from_u64(42);
//! let palette = generator.generate(5, &|_: &LabColor| true, &mut rng)?;
//! assert_eq!(palette.colors.len(), 5);
//! # Ok::<(), color_distill::DistillError>(())
//! ```

pub mod force;
pub mod kmeans;
pub mod sampler;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::color::{Color, DistanceCalculator, LabColor};
use crate::config::{GenerationMode, PaletteConfig};
use crate::{DistillError, Result};

/// Inclusion rule for generated colors
///
/// Must be pure: it may be called from several threads at once.
pub type ColorPredicate = dyn Fn(&LabColor) -> bool + Send + Sync;

/// Cooperative cancellation flag shared between a caller and a running generation
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every generation holding this token to stop after its current iteration
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Output of a refinement strategy before ordering
#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    pub colors: Vec<LabColor>,
    pub iterations: u32,
    pub cancelled: bool,
}

/// Generated palette in contrast order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedPalette {
    /// sRGB colors, each consecutive pair as far apart as the greedy ordering allows
    pub colors: Vec<Color>,
    /// The same colors in Lab, before conversion to 8-bit sRGB
    #[serde(skip)]
    pub lab: Vec<LabColor>,
    /// Refinement iterations actually run
    pub iterations: u32,
    /// Whether the run stopped early on cancellation
    pub cancelled: bool,
    /// Deficiency simulations computed during this run
    #[serde(skip)]
    pub simulations: usize,
}

impl GeneratedPalette {
    pub fn hex_codes(&self) -> Vec<String> {
        self.colors.iter().map(Color::to_hex).collect()
    }
}

/// Palette generator bound to one validated configuration
///
/// Holds no per-run state: each generation builds its own distance
/// calculator, so the simulation memo is dropped when the call returns.
#[derive(Debug)]
pub struct PaletteGenerator {
    config: PaletteConfig,
    cancellation: CancellationToken,
}

impl PaletteGenerator {
    /// Create a generator
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the configuration does not validate.
    pub fn new(config: PaletteConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancellation: CancellationToken::new(),
        })
    }

    /// Use `token` to cancel generations run by this generator
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn config(&self) -> &PaletteConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Generate a palette with an RNG seeded from the configuration
    ///
    /// Uses `config.seed` when set and OS entropy otherwise.
    pub fn generate_seeded(&self, color_count: usize, predicate: &ColorPredicate) -> Result<GeneratedPalette> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.generate(color_count, predicate, &mut rng)
    }

    /// Generate `color_count` distinct colors accepted by `predicate`
    ///
    /// # Arguments
    ///
    /// * `color_count` - Number of colors, at least 1
    /// * `predicate` - Inclusion rule every seed and moved color must satisfy
    /// * `rng` - Random source for seeding and jitter
    ///
    /// # Returns
    ///
    /// Exactly `color_count` colors ordered by contrast. A cancelled run
    /// returns the colors of the last completed iteration.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` if `color_count` is 0
    /// - `InsufficientSamples` if the k-means candidate pool is smaller than `color_count`
    /// - `UnsatisfiablePredicate` if no seed can be drawn
    pub fn generate<R: Rng + ?Sized>(
        &self,
        color_count: usize,
        predicate: &ColorPredicate,
        rng: &mut R,
    ) -> Result<GeneratedPalette> {
        if color_count == 0 {
            return Err(DistillError::invalid_parameter("color_count", color_count));
        }

        info!(
            "Generating {} colors: mode {:?}, distance {:?}, quality {}",
            color_count, self.config.mode, self.config.distance, self.config.quality
        );

        let distance = DistanceCalculator::with_severity(self.config.distance, self.config.severity);
        let refinement = match self.config.mode {
            GenerationMode::KMeans => {
                let sample_count = self.config.effective_sample_count(color_count);
                let samples = sampler::candidate_pool(&self.config, sample_count, predicate);
                if samples.len() < color_count {
                    return Err(DistillError::InsufficientSamples {
                        available: samples.len(),
                        requested: color_count,
                    });
                }
                let seeds = self.seeds(color_count, predicate, rng)?;
                kmeans::refine(
                    seeds,
                    &samples,
                    self.config.quality,
                    &distance,
                    predicate,
                    &self.cancellation,
                )
            }
            GenerationMode::Force => {
                let seeds = self.seeds(color_count, predicate, rng)?;
                force::refine(
                    seeds,
                    self.config.quality,
                    &distance,
                    predicate,
                    &self.cancellation,
                    rng,
                )
            }
        };

        let lab = sort_by_contrast(&refinement.colors);
        let colors = lab.iter().map(LabColor::to_rgb).collect();

        let simulations = distance.cached_simulations();
        info!(
            "Palette generation finished after {} iterations{}",
            refinement.iterations,
            if refinement.cancelled { " (cancelled)" } else { "" }
        );
        debug!("{} deficiency simulations memoized", simulations);

        Ok(GeneratedPalette {
            colors,
            lab,
            iterations: refinement.iterations,
            cancelled: refinement.cancelled,
            simulations,
        })
    }

    fn seeds<R: Rng + ?Sized>(
        &self,
        color_count: usize,
        predicate: &ColorPredicate,
        rng: &mut R,
    ) -> Result<Vec<LabColor>> {
        (0..color_count)
            .map(|_| sampler::random_valid(&mut *rng, predicate))
            .collect()
    }
}

/// Greedy farthest-point ordering
///
/// Starts from the first color and repeatedly appends the remaining color
/// farthest (squared Lab distance) from the last one appended.
pub fn sort_by_contrast(colors: &[LabColor]) -> Vec<LabColor> {
    let mut remaining = colors.to_vec();
    let mut sorted = Vec::with_capacity(colors.len());
    if remaining.is_empty() {
        return sorted;
    }
    sorted.push(remaining.remove(0));

    while !remaining.is_empty() {
        let last = sorted[sorted.len() - 1];
        let mut farthest = 0;
        let mut best = f64::MIN;
        for (index, color) in remaining.iter().enumerate() {
            let d = last.distance_squared(color);
            if d > best {
                best = d;
                farthest = index;
            }
        }
        sorted.push(remaining.remove(farthest));
    }
    sorted
}
