//! Reference values and tuning constants for quantization and palette generation
//!
//! This module contains compile-time constants grouped by the component
//! that consumes them.

/// D65 Standard Illuminant Reference
///
/// CIE Standard Illuminant D65 represents average daylight with a correlated
/// color temperature of 6504K. This is the reference white for every
/// conversion in this crate.
pub mod d65 {
    /// D65 white point in CIE XYZ color space, scaled so that Y = 100
    pub const WHITE_POINT_XYZ: [f64; 3] = [95.047, 100.000, 108.883];

    /// D65 white point normalized to Y = 1
    pub const XN: f64 = 0.950470;
    pub const YN: f64 = 1.0;
    pub const ZN: f64 = 1.088830;

    /// D65 chromaticity coordinates
    pub const CHROMATICITY_X: f64 = 0.312713;
    pub const CHROMATICITY_Y: f64 = 0.329016;
    pub const CHROMATICITY_Z: f64 = 0.358271;
}

/// sRGB transfer curve and primaries
pub mod srgb {
    /// Linear-light threshold when decoding 8-bit channels
    pub const DECODE_THRESHOLD: f64 = 0.04045;

    /// Encoded threshold when converting linear light back to sRGB
    pub const ENCODE_THRESHOLD: f64 = 0.0031308;

    pub const GAMMA: f64 = 2.4;

    /// Linear RGB to XYZ (observer 2°, D65)
    pub const RGB_TO_XYZ: [[f64; 3]; 3] = [
        [0.4124, 0.3576, 0.1805],
        [0.2126, 0.7152, 0.0722],
        [0.0193, 0.1192, 0.9505],
    ];

    /// XYZ to linear RGB (observer 2°, D65)
    pub const XYZ_TO_RGB: [[f64; 3]; 3] = [
        [3.2404542, -1.5371385, -0.4985314],
        [-0.9692660, 1.8760108, 0.0415560],
        [0.0556434, -0.2040259, 1.0572252],
    ];
}

/// CIE L*a*b* constants
pub mod lab {
    /// 4 / 29
    pub const T0: f64 = 0.137931034;
    /// 6 / 29
    pub const T1: f64 = 0.206896552;
    /// 3 * T1 * T1
    pub const T2: f64 = 0.12841855;
    /// T1 * T1 * T1
    pub const T3: f64 = 0.008856452;

    /// Chroma below which hue is undefined (rounded to 4 decimals)
    pub const ACHROMATIC_SCALE: f64 = 10_000.0;
}

/// Histogram quantizer parameters
pub mod quantizer {
    /// Bits kept per channel when binning pixels
    pub const DEFAULT_INDEX_BITS: u8 = 7;

    /// Largest palette a single quantization can produce
    pub const MAX_COLORS: usize = 256;

    /// Palette size of the default quantizer configuration
    pub const DEFAULT_COLOR_COUNT: usize = 16;

    /// Minimum pixels per partial histogram when building in parallel
    pub const MIN_PIXELS_PER_PARTIAL: usize = 1 << 16;

    /// Memory all partial histograms of one build may occupy together
    pub const PARTIAL_MEMORY_BUDGET: usize = 1 << 28;
}

/// Palette generation parameters
pub mod generation {
    /// Default iteration budget
    pub const DEFAULT_QUALITY: u32 = 50;

    /// Default candidate sample count
    pub const DEFAULT_SAMPLE_COUNT: usize = 800;

    /// Minimum candidate samples per requested color
    pub const SAMPLES_PER_COLOR: usize = 5;

    /// Allowed per-channel drift of a Lab → RGB → Lab round-trip
    pub const LAB_TOLERANCE: f64 = 7.0;

    /// Grid over-division so the upper bound is reachable despite rounding
    pub const GRID_DIVIDER_PADDING: f64 = 1.001;

    /// Random draws before rejection sampling gives up
    pub const MAX_REJECTION_ATTEMPTS: usize = 100_000;

    /// Lab lattice steps (L, a, b) for the coarse and fine candidate pools
    pub const LATTICE_STEPS: (usize, usize, usize) = (5, 10, 10);
    pub const FINE_LATTICE_STEPS: (usize, usize, usize) = (1, 5, 5);
}

/// Force-directed relaxation parameters
pub mod force {
    /// Repulsion constant between two particles
    pub const REPULSION: f64 = 100.0;

    /// Displacement speed
    pub const SPEED: f64 = 100.0;

    /// Largest displacement a particle may take in one step
    pub const MAX_STEP: f64 = 0.1;

    /// Simulation steps per unit of quality
    pub const STEPS_PER_QUALITY: u32 = 20;

    /// Jitter amplitude applied when two particles coincide
    pub const JITTER: f64 = 2.0;
}

/// Color difference parameters
pub mod distance {
    /// CMC l:c weighting (acceptability)
    pub const CMC_LIGHTNESS_WEIGHT: f64 = 2.0;
    pub const CMC_CHROMA_WEIGHT: f64 = 1.0;

    /// Compromise blend weights
    pub const NORMAL_WEIGHT: f64 = 1000.0;
    pub const PROTANOPE_WEIGHT: f64 = 100.0;
    pub const DEUTERANOPE_WEIGHT: f64 = 500.0;
    pub const TRITANOPE_WEIGHT: f64 = 1.0;

    /// Display gamma used by the deficiency simulation
    pub const SIMULATION_GAMMA: f64 = 2.2;
}

/// Confusion line parameters: confusion point (x, y), slope and y-intercept
/// of the line the simulated chromaticity is projected onto.
pub mod confusion {
    pub const PROTANOPE: [f64; 4] = [0.7465, 0.2535, 1.273463, -0.073894];
    pub const DEUTERANOPE: [f64; 4] = [1.4, -0.4, 0.968437, 0.003331];
    pub const TRITANOPE: [f64; 4] = [0.1748, 0.0, 0.062921, 0.292119];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_d65_constants() {
        assert!((d65::WHITE_POINT_XYZ[0] / 100.0 - d65::XN).abs() < 1e-9);
        assert!((d65::WHITE_POINT_XYZ[1] / 100.0 - d65::YN).abs() < 1e-9);
        assert!((d65::WHITE_POINT_XYZ[2] / 100.0 - d65::ZN).abs() < 1e-9);
    }

    #[test]
    fn test_lab_constants() {
        assert!((lab::T0 - 4.0 / 29.0).abs() < 1e-8);
        assert!((lab::T1 - 6.0 / 29.0).abs() < 1e-8);
        assert!((lab::T2 - 3.0 * lab::T1 * lab::T1).abs() < 1e-6);
        assert!((lab::T3 - lab::T1.powi(3)).abs() < 1e-8);
    }

    #[test]
    fn test_parameter_ranges() {
        assert!(quantizer::DEFAULT_INDEX_BITS >= 1 && quantizer::DEFAULT_INDEX_BITS <= 8);
        assert!(quantizer::DEFAULT_COLOR_COUNT <= quantizer::MAX_COLORS);
        assert!(generation::DEFAULT_SAMPLE_COUNT >= generation::SAMPLES_PER_COLOR);
        assert!(distance::NORMAL_WEIGHT > distance::DEUTERANOPE_WEIGHT);
    }
}
