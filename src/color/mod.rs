//! Color representation, conversion and comparison
//!
//! This module handles conversions between sRGB, XYZ, CIE Lab, HCL, HSL and HSV,
//! and the perceptual distance metrics used by palette generation.

pub mod conversion;
pub mod distance;

pub use conversion::{Color, HclColor, HslColor, HsvColor, LabColor, XyzColor};
pub use distance::{Deficiency, DistanceCalculator, DistanceMetric};
