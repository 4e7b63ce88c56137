//! Lloyd-style clustering of a candidate pool

use log::debug;
use rayon::prelude::*;

use crate::color::{DistanceCalculator, LabColor};
use crate::generator::{CancellationToken, ColorPredicate, Refinement};

/// Refine `seeds` into cluster means of `samples`
///
/// Each iteration assigns every sample to its nearest seed (lowest index on
/// ties) and moves each seed to the mean of its cluster. A seed whose
/// cluster is empty, or whose mean is out of gamut or rejected by
/// `predicate`, jumps to the closest sample not yet claimed by another
/// seed. Stops when assignments repeat, after `quality` iterations, or on
/// cancellation.
pub fn refine(
    mut seeds: Vec<LabColor>,
    samples: &[LabColor],
    quality: u32,
    distance: &DistanceCalculator,
    predicate: &ColorPredicate,
    cancellation: &CancellationToken,
) -> Refinement {
    let mut previous: Option<Vec<usize>> = None;
    let mut iterations = 0;
    let mut cancelled = false;

    while iterations < quality {
        if cancellation.is_cancelled() {
            cancelled = true;
            break;
        }

        let assignments = assign(samples, &seeds, distance);
        if previous.as_ref() == Some(&assignments) {
            debug!("k-means converged after {} iterations", iterations);
            break;
        }
        iterations += 1;

        let mut sums = vec![(0.0f64, 0.0f64, 0.0f64, 0usize); seeds.len()];
        for (sample, &cluster) in samples.iter().zip(&assignments) {
            let sum = &mut sums[cluster];
            sum.0 += sample.l;
            sum.1 += sample.a;
            sum.2 += sample.b;
            sum.3 += 1;
        }

        let mut claimed = vec![false; samples.len()];
        for (seed, &(l, a, b, count)) in seeds.iter_mut().zip(&sums) {
            let mean = (count > 0).then(|| {
                let n = count as f64;
                LabColor::new(l / n, a / n, b / n)
            });

            match mean {
                Some(mean) if mean.is_valid_rgb() && predicate(&mean) => *seed = mean,
                _ => {
                    let target = mean.unwrap_or(*seed);
                    let replacement = closest(samples, &target, distance, |i| !claimed[i])
                        .or_else(|| closest(samples, &target, distance, |_| true));
                    if let Some(index) = replacement {
                        debug!("Reseeding cluster to sample {}", index);
                        *seed = samples[index];
                    }
                }
            }

            for (flag, sample) in claimed.iter_mut().zip(samples) {
                if *sample == *seed {
                    *flag = true;
                }
            }
        }

        previous = Some(assignments);
    }

    Refinement {
        colors: seeds,
        iterations,
        cancelled,
    }
}

/// Index of the nearest seed for every sample
fn assign(samples: &[LabColor], seeds: &[LabColor], distance: &DistanceCalculator) -> Vec<usize> {
    samples
        .par_iter()
        .map(|sample| {
            let mut nearest = 0;
            let mut best = f64::MAX;
            for (index, seed) in seeds.iter().enumerate() {
                let d = distance.distance(sample, seed);
                if d < best {
                    best = d;
                    nearest = index;
                }
            }
            nearest
        })
        .collect()
}

/// Closest sample to `target` among those accepted by `eligible`
fn closest<F>(samples: &[LabColor], target: &LabColor, distance: &DistanceCalculator, eligible: F) -> Option<usize>
where
    F: Fn(usize) -> bool,
{
    let mut best: Option<(usize, f64)> = None;
    for (index, sample) in samples.iter().enumerate() {
        if !eligible(index) {
            continue;
        }
        let d = distance.distance(sample, target);
        if best.map_or(true, |(_, current)| d < current) {
            best = Some((index, d));
        }
    }
    best.map(|(index, _)| index)
}
