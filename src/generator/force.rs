//! Force-directed relaxation
//!
//! Colors behave like charged particles in Lab space that push each other
//! apart. A particle only moves when its new position stays in gamut and is
//! accepted by the inclusion predicate.

use rand::Rng;

use crate::color::{DistanceCalculator, LabColor};
use crate::constants::force::{JITTER, MAX_STEP, REPULSION, SPEED, STEPS_PER_QUALITY};
use crate::generator::{CancellationToken, ColorPredicate, Refinement};

/// Run `quality * 20` repulsion steps over `colors`
pub fn refine<R: Rng + ?Sized>(
    mut colors: Vec<LabColor>,
    quality: u32,
    distance: &DistanceCalculator,
    predicate: &ColorPredicate,
    cancellation: &CancellationToken,
    rng: &mut R,
) -> Refinement {
    let steps = quality.saturating_mul(STEPS_PER_QUALITY);
    let mut iterations = 0;
    let mut cancelled = false;

    while iterations < steps {
        if cancellation.is_cancelled() {
            cancelled = true;
            break;
        }

        let forces = compute_forces(&colors, distance, rng);
        for (color, force) in colors.iter_mut().zip(&forces) {
            if let Some(candidate) = displace(color, force) {
                if candidate.is_valid_rgb() && predicate(&candidate) {
                    *color = candidate;
                }
            }
        }
        iterations += 1;
    }

    Refinement {
        colors,
        iterations,
        cancelled,
    }
}

/// Net repulsion on every particle
///
/// Coinciding particles cannot be pushed apart along a direction, so the
/// lower-index one of the pair receives a random jitter instead.
fn compute_forces<R: Rng + ?Sized>(
    colors: &[LabColor],
    distance: &DistanceCalculator,
    rng: &mut R,
) -> Vec<[f64; 3]> {
    let mut forces = vec![[0.0f64; 3]; colors.len()];

    for i in 0..colors.len() {
        for j in 0..i {
            let (a, b) = (&colors[i], &colors[j]);
            let delta = [a.l - b.l, a.a - b.a, a.b - b.b];
            let d = distance.distance(a, b);

            if d > 0.0 {
                let force = REPULSION / (d * d);
                for axis in 0..3 {
                    let push = delta[axis] * force / d;
                    forces[i][axis] += push;
                    forces[j][axis] -= push;
                }
            } else {
                for axis in 0..3 {
                    forces[j][axis] += JITTER - 2.0 * JITTER * rng.gen::<f64>();
                }
            }
        }
    }
    forces
}

/// Position after one step along `force`, at most `MAX_STEP` Lab units away
fn displace(color: &LabColor, force: &[f64; 3]) -> Option<LabColor> {
    let magnitude = (force[0] * force[0] + force[1] * force[1] + force[2] * force[2]).sqrt();
    let displacement = SPEED * magnitude;
    if displacement.is_nan() || displacement <= 0.0 {
        return None;
    }

    let ratio = SPEED * MAX_STEP.min(displacement) / displacement;
    Some(LabColor::new(
        color.l + force[0] * ratio,
        color.a + force[1] * ratio,
        color.b + force[2] * ratio,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DistanceMetric;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn accept_all(_: &LabColor) -> bool {
        true
    }

    #[test]
    fn test_forces_are_opposite() {
        let distance = DistanceCalculator::new(DistanceMetric::Euclidean);
        let colors = vec![LabColor::new(50.0, 0.0, 0.0), LabColor::new(60.0, 0.0, 0.0)];
        let mut rng = StdRng::seed_from_u64(1);
        let forces = compute_forces(&colors, &distance, &mut rng);

        // 100 / 10² along the L axis
        assert!((forces[1][0] - 1.0).abs() < 1e-12);
        assert!((forces[0][0] + 1.0).abs() < 1e-12);
        assert_eq!(forces[0][1], 0.0);
    }

    #[test]
    fn test_coinciding_colors_get_jitter() {
        let distance = DistanceCalculator::new(DistanceMetric::Euclidean);
        let lab = LabColor::new(50.0, 10.0, 10.0);
        let mut rng = StdRng::seed_from_u64(3);
        let forces = compute_forces(&[lab, lab], &distance, &mut rng);

        assert_eq!(forces[1], [0.0; 3]);
        assert!(forces[0].iter().all(|f| f.abs() <= JITTER));
        assert!(forces[0].iter().any(|f| *f != 0.0));
    }

    #[test]
    fn test_displacement_is_capped() {
        let moved = displace(&LabColor::new(50.0, 0.0, 0.0), &[3.0, 4.0, 0.0]).unwrap();
        // Any force beyond the cap moves the particle MAX_STEP along its direction
        let step = ((moved.l - 50.0).powi(2) + moved.a.powi(2)).sqrt();
        assert!((step - MAX_STEP).abs() < 1e-9);
        assert!((moved.a / (moved.l - 50.0) - 4.0 / 3.0).abs() < 1e-9);
        assert!(displace(&LabColor::new(50.0, 0.0, 0.0), &[0.0; 3]).is_none());
    }

    #[test]
    fn test_relaxation_spreads_colors() {
        let distance = DistanceCalculator::new(DistanceMetric::Euclidean);
        let start = vec![LabColor::new(50.0, 0.0, 0.0), LabColor::new(52.0, 0.0, 0.0)];
        let mut rng = StdRng::seed_from_u64(5);
        let refinement = refine(
            start.clone(),
            1,
            &distance,
            &accept_all,
            &CancellationToken::new(),
            &mut rng,
        );

        assert_eq!(refinement.iterations, 20);
        let before = start[0].distance_squared(&start[1]);
        let after = refinement.colors[0].distance_squared(&refinement.colors[1]);
        assert!(after > before);
        assert!(refinement.colors.iter().all(LabColor::is_valid_rgb));
    }

    #[test]
    fn test_rejected_moves_are_discarded() {
        let distance = DistanceCalculator::new(DistanceMetric::Euclidean);
        let start = vec![LabColor::new(50.0, 0.0, 0.0), LabColor::new(52.0, 0.0, 0.0)];
        let mut rng = StdRng::seed_from_u64(5);
        let frozen = |lab: &LabColor| lab.l == 50.0 || lab.l == 52.0;
        let refinement = refine(
            start.clone(),
            2,
            &distance,
            &frozen,
            &CancellationToken::new(),
            &mut rng,
        );
        assert_eq!(refinement.colors, start);
    }
}
