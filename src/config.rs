//! Configuration structures for quantization and palette generation.
//!
//! # Configuration Loading
//!
//! Configuration can be loaded from JSON files or constructed programmatically:
//!
//! ```no_run
//! use color_distill::DistillConfig;
//! use std::path::Path;
//!
//! // Load from file
//! let config = DistillConfig::from_json_file(Path::new("distill.json"))?;
//!
//! // Or use defaults
//! let config = DistillConfig::default();
//! # Ok::<(), color_distill::DistillError>(())
//! ```
//!
//! # Configuration Sections
//!
//! - [`QuantizerConfig`]: palette size and histogram resolution for images
//! - [`PaletteConfig`]: bounds, budgets and strategy for generated palettes

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::{DistanceMetric, LabColor};
use crate::constants::{generation, quantizer};
use crate::{DistillError, Result};

/// Complete configuration for both subsystems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistillConfig {
    /// Image quantization settings
    #[serde(default)]
    pub quantizer: QuantizerConfig,

    /// Palette generation settings
    #[serde(default)]
    pub palette: PaletteConfig,
}

/// Image quantization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantizerConfig {
    /// Maximum palette size (1-256)
    pub color_count: usize,

    /// Bits kept per channel when binning pixels (1-8)
    pub index_bits: u8,
}

impl Default for QuantizerConfig {
    fn default() -> Self {
        Self {
            color_count: quantizer::DEFAULT_COLOR_COUNT,
            index_bits: quantizer::DEFAULT_INDEX_BITS,
        }
    }
}

impl QuantizerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=quantizer::MAX_COLORS).contains(&self.color_count) {
            return Err(DistillError::invalid_parameter("color_count", self.color_count));
        }
        if !(1..=8).contains(&self.index_bits) {
            return Err(DistillError::invalid_parameter("index_bits", self.index_bits));
        }
        Ok(())
    }
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Refinement strategy for generated palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Lloyd-style clustering of a candidate pool
    #[default]
    KMeans,
    /// Pairwise repulsion between freely moving particles
    Force,
}

/// Candidate pool used by k-means mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplePool {
    /// Grid over hue, chroma and lightness sized by the sample count
    #[default]
    HclGrid,
    /// Fixed lattice over Lab, finer steps when `fine` is set
    LabLattice { fine: bool },
}

/// Palette generation parameters.
///
/// Hue is in degrees, chroma and lightness in CIE LCh units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteConfig {
    /// Allowed hue range (0-360)
    pub hue: Bounds,

    /// Allowed chroma range (0-100)
    pub chroma: Bounds,

    /// Allowed lightness range (0-100)
    pub lightness: Bounds,

    /// Iteration budget; force mode runs 20 steps per unit
    pub quality: u32,

    /// Requested candidate pool size, raised to 5 per color when smaller
    pub sample_count: usize,

    /// Distance used for clustering and repulsion
    #[serde(default)]
    pub distance: DistanceMetric,

    /// Clustering or force-directed refinement
    #[serde(default)]
    pub mode: GenerationMode,

    /// Candidate pool for k-means mode
    #[serde(default)]
    pub pool: SamplePool,

    /// Color deficiency severity for simulated metrics (0.0-1.0)
    #[serde(default = "default_severity")]
    pub severity: f64,

    /// Fixed RNG seed for reproducible palettes
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_severity() -> f64 {
    1.0
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            hue: Bounds::new(0.0, 360.0),
            chroma: Bounds::new(0.0, 100.0),
            lightness: Bounds::new(0.0, 100.0),
            quality: generation::DEFAULT_QUALITY,
            sample_count: generation::DEFAULT_SAMPLE_COUNT,
            distance: DistanceMetric::default(),
            mode: GenerationMode::default(),
            pool: SamplePool::default(),
            severity: default_severity(),
            seed: None,
        }
    }
}

impl PaletteConfig {
    /// Check ranges and budgets
    pub fn validate(&self) -> Result<()> {
        for (name, bounds, limit) in [
            ("hue", &self.hue, 360.0),
            ("chroma", &self.chroma, 100.0),
            ("lightness", &self.lightness, 100.0),
        ] {
            if !(bounds.min >= 0.0 && bounds.min <= bounds.max && bounds.max <= limit) {
                return Err(DistillError::invalid_parameter(
                    name,
                    format!("[{}, {}]", bounds.min, bounds.max),
                ));
            }
        }
        if self.quality == 0 {
            return Err(DistillError::invalid_parameter("quality", self.quality));
        }
        if !(0.0..=1.0).contains(&self.severity) {
            return Err(DistillError::invalid_parameter("severity", self.severity));
        }
        Ok(())
    }

    /// Candidate pool size for a palette of `color_count` colors
    pub fn effective_sample_count(&self, color_count: usize) -> usize {
        self.sample_count
            .max(color_count.saturating_mul(generation::SAMPLES_PER_COLOR))
    }

    /// Whether `lab` falls inside the hue, chroma and lightness bounds
    ///
    /// An undefined (NaN) hue matches any hue range.
    pub fn within_bounds(&self, lab: &LabColor) -> bool {
        within(&self.hue, &self.chroma, &self.lightness, lab)
    }

    /// Pure inclusion predicate enforcing the configured bounds
    pub fn bounds_predicate(&self) -> impl Fn(&LabColor) -> bool + Send + Sync + 'static {
        let (hue, chroma, lightness) = (self.hue, self.chroma, self.lightness);
        move |lab: &LabColor| within(&hue, &chroma, &lightness, lab)
    }
}

fn within(hue: &Bounds, chroma: &Bounds, lightness: &Bounds, lab: &LabColor) -> bool {
    let hcl = lab.to_hcl();
    (hcl.h.is_nan() || hue.contains(hcl.h)) && chroma.contains(hcl.c) && lightness.contains(hcl.l)
}

impl DistillConfig {
    /// Validate both sections
    pub fn validate(&self) -> Result<()> {
        self.quantizer.validate()?;
        self.palette.validate()
    }

    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DistillError::config(format!("Failed to read {}", path.display()), e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| DistillError::config(format!("Failed to parse {}", path.display()), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DistillError::config("Failed to serialize configuration", e))?;
        std::fs::write(path, json)
            .map_err(|e| DistillError::config(format!("Failed to write {}", path.display()), e))?;
        Ok(())
    }
}
