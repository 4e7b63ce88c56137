//! Candidate colors for palette generation
//!
//! Two pools feed k-means clustering: an HCL grid sized by the requested
//! sample count, and a fixed Lab lattice. Seeds for both refinement modes
//! come from uniform rejection sampling in Lab.

use std::collections::HashSet;

use log::debug;
use rand::Rng;

use crate::color::{HclColor, LabColor};
use crate::config::{Bounds, PaletteConfig, SamplePool};
use crate::constants::generation::{
    FINE_LATTICE_STEPS, GRID_DIVIDER_PADDING, LAB_TOLERANCE, LATTICE_STEPS, MAX_REJECTION_ATTEMPTS,
};
use crate::generator::ColorPredicate;
use crate::{DistillError, Result};

/// Whether `lab` is inside the configured bounds and survives an RGB round-trip
///
/// The round-trip Lab → RGB → Lab may drift by at most 7 units per channel.
pub fn check_color(lab: &LabColor, config: &PaletteConfig) -> bool {
    if !config.within_bounds(lab) {
        return false;
    }
    let back = lab.to_rgb().to_lab();
    (back.l - lab.l).abs() <= LAB_TOLERANCE
        && (back.a - lab.a).abs() <= LAB_TOLERANCE
        && (back.b - lab.b).abs() <= LAB_TOLERANCE
}

/// Candidate pool selected by `config.pool`
pub fn candidate_pool(
    config: &PaletteConfig,
    sample_count: usize,
    predicate: &ColorPredicate,
) -> Vec<LabColor> {
    let pool = match config.pool {
        SamplePool::HclGrid => hcl_grid(config, sample_count, predicate),
        SamplePool::LabLattice { fine } => lab_lattice(fine, predicate),
    };
    debug!("Candidate pool: {:?} produced {} samples", config.pool, pool.len());
    pool
}

/// Grid over the configured hue, chroma and lightness ranges
///
/// Each axis gets `cbrt(sample_count)` steps (padded slightly so the upper
/// bound is reached). Points failing [`check_color`] or `predicate` are
/// dropped, as are duplicates.
pub fn hcl_grid(config: &PaletteConfig, sample_count: usize, predicate: &ColorPredicate) -> Vec<LabColor> {
    let divider = (sample_count as f64).cbrt() * GRID_DIVIDER_PADDING;
    let positions = divider.floor() as usize;
    let axis = |bounds: Bounds| {
        let step = bounds.span() / divider;
        (0..=positions)
            .map(move |k| bounds.min + k as f64 * step)
            .filter(move |value| *value <= bounds.max)
    };

    let mut seen = HashSet::new();
    let mut samples = Vec::new();
    for h in axis(config.hue) {
        for c in axis(config.chroma) {
            for l in axis(config.lightness) {
                let lab = HclColor::new(h, c, l).to_lab();
                if check_color(&lab, config) && predicate(&lab) && seen.insert(lab_key(&lab)) {
                    samples.push(lab);
                }
            }
        }
    }
    samples
}

/// Regular Lab lattice over L in [0, 100] and a, b in [-100, 100]
///
/// Keeps in-gamut points accepted by `predicate`.
pub fn lab_lattice(fine: bool, predicate: &ColorPredicate) -> Vec<LabColor> {
    let (l_step, a_step, b_step) = if fine { FINE_LATTICE_STEPS } else { LATTICE_STEPS };

    let mut samples = Vec::new();
    for l in (0..=100).step_by(l_step) {
        for a in (-100..=100).step_by(a_step) {
            for b in (-100..=100).step_by(b_step) {
                let lab = LabColor::new(l as f64, a as f64, b as f64);
                if lab.is_valid_rgb() && predicate(&lab) {
                    samples.push(lab);
                }
            }
        }
    }
    samples
}

/// Draw uniform Lab colors until one is in gamut and accepted by `predicate`
///
/// # Errors
///
/// Returns `UnsatisfiablePredicate` after `MAX_REJECTION_ATTEMPTS` failed draws.
pub fn random_valid<R: Rng + ?Sized>(rng: &mut R, predicate: &ColorPredicate) -> Result<LabColor> {
    for _ in 0..MAX_REJECTION_ATTEMPTS {
        let lab = LabColor::random(rng);
        if lab.is_valid_rgb() && predicate(&lab) {
            return Ok(lab);
        }
    }
    Err(DistillError::UnsatisfiablePredicate {
        attempts: MAX_REJECTION_ATTEMPTS,
    })
}

/// Bitwise identity of a Lab color, with -0.0 folded into 0.0
fn lab_key(lab: &LabColor) -> (u64, u64, u64) {
    ((lab.l + 0.0).to_bits(), (lab.a + 0.0).to_bits(), (lab.b + 0.0).to_bits())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn accept_all(_: &LabColor) -> bool {
        true
    }

    #[test]
    fn test_hcl_grid_respects_bounds() {
        let config = PaletteConfig {
            hue: Bounds::new(20.0, 80.0),
            chroma: Bounds::new(20.0, 60.0),
            lightness: Bounds::new(40.0, 80.0),
            ..PaletteConfig::default()
        };
        let samples = hcl_grid(&config, 800, &accept_all);

        assert!(!samples.is_empty());
        for lab in &samples {
            assert!(config.within_bounds(lab));
            assert!(check_color(lab, &config));
        }
    }

    #[test]
    fn test_hcl_grid_has_no_duplicates() {
        let config = PaletteConfig::default();
        let samples = hcl_grid(&config, 800, &accept_all);
        let unique: HashSet<_> = samples.iter().map(lab_key).collect();
        assert_eq!(unique.len(), samples.len());
    }

    #[test]
    fn test_hcl_grid_zero_width_range_terminates() {
        let config = PaletteConfig {
            lightness: Bounds::new(50.0, 50.0),
            ..PaletteConfig::default()
        };
        let samples = hcl_grid(&config, 125, &accept_all);
        assert!(samples.iter().all(|lab| (lab.l - 50.0).abs() < 1e-9));
    }

    #[test]
    fn test_hcl_grid_applies_predicate() {
        let config = PaletteConfig::default();
        let samples = hcl_grid(&config, 800, &|lab: &LabColor| lab.l > 70.0);
        assert!(samples.iter().all(|lab| lab.l > 70.0));
    }

    #[test]
    fn test_lab_lattice_coarse_and_fine() {
        let coarse = lab_lattice(false, &accept_all);
        let fine = lab_lattice(true, &accept_all);

        assert!(!coarse.is_empty());
        assert!(fine.len() > coarse.len());
        assert!(coarse.iter().all(LabColor::is_valid_rgb));
        // Black sits on the lattice
        assert!(coarse.contains(&LabColor::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_random_valid_is_in_gamut() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let lab = random_valid(&mut rng, &accept_all).unwrap();
            assert!(lab.is_valid_rgb());
        }
    }

    #[test]
    fn test_random_valid_gives_up() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = random_valid(&mut rng, &|_: &LabColor| false);
        assert!(matches!(result, Err(DistillError::UnsatisfiablePredicate { .. })));
    }

    #[test]
    fn test_check_color_tolerance() {
        let config = PaletteConfig::default();
        assert!(check_color(&LabColor::new(50.0, 10.0, 10.0), &config));
        // Outside the sRGB gamut: clamping moves it well beyond 7 units
        assert!(!check_color(&LabColor::new(50.0, -60.0, -60.0), &config));
    }
}
