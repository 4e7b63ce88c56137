//! Perceptual color distances
//!
//! Provides the distance metrics used to compare Lab colors while building
//! palettes:
//! - Euclidean distance in Lab
//! - CMC l:c color difference (l = 2, c = 1)
//! - Color-vision-deficiency distances, computed by projecting each color
//!   onto the confusion line of a protanope, deuteranope or tritanope
//! - A "compromise" distance blending normal vision with all three
//!   deficiencies
//!
//! Deficiency simulation is memoized per calculator because clustering asks
//! for the same colors over and over.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::color::conversion::{Color, LabColor};
use crate::constants::{confusion, d65, distance};

/// Selects how two Lab colors are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Straight L2 distance in Lab
    #[default]
    Euclidean,
    /// CMC l:c color difference
    Cmc,
    /// Weighted blend of normal vision and the three deficiencies
    Compromise,
    /// CMC distance as perceived with protanopia
    Protanope,
    /// CMC distance as perceived with deuteranopia
    Deuteranope,
    /// CMC distance as perceived with tritanopia
    Tritanope,
}

impl DistanceMetric {
    /// The simulated deficiency behind this metric, if any
    pub fn deficiency(&self) -> Option<Deficiency> {
        match self {
            DistanceMetric::Protanope => Some(Deficiency::Protanope),
            DistanceMetric::Deuteranope => Some(Deficiency::Deuteranope),
            DistanceMetric::Tritanope => Some(Deficiency::Tritanope),
            _ => None,
        }
    }
}

/// Dichromatic color vision deficiencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deficiency {
    Protanope,
    Deuteranope,
    Tritanope,
}

impl Deficiency {
    pub const ALL: [Deficiency; 3] = [
        Deficiency::Protanope,
        Deficiency::Deuteranope,
        Deficiency::Tritanope,
    ];

    /// Confusion line parameters of this deficiency
    pub fn confusion_line(&self) -> ConfusionLine {
        let [x, y, m, yint] = match self {
            Deficiency::Protanope => confusion::PROTANOPE,
            Deficiency::Deuteranope => confusion::DEUTERANOPE,
            Deficiency::Tritanope => confusion::TRITANOPE,
        };
        ConfusionLine { x, y, m, yint }
    }

    /// Weight of this deficiency in the compromise distance
    pub fn compromise_weight(&self) -> f64 {
        match self {
            Deficiency::Protanope => distance::PROTANOPE_WEIGHT,
            Deficiency::Deuteranope => distance::DEUTERANOPE_WEIGHT,
            Deficiency::Tritanope => distance::TRITANOPE_WEIGHT,
        }
    }
}

/// Confusion point in xy chromaticity plus the line colors collapse onto
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfusionLine {
    pub x: f64,
    pub y: f64,
    pub m: f64,
    pub yint: f64,
}

/// Euclidean distance in Lab
pub fn euclidean_distance(lab1: &LabColor, lab2: &LabColor) -> f64 {
    lab1.distance_squared(lab2).sqrt()
}

/// CMC l:c color difference with l = 2, c = 1
///
/// Not symmetric: the weighting functions are evaluated on `lab1`.
pub fn cmc_distance(lab1: &LabColor, lab2: &LabColor) -> f64 {
    let c1 = (lab1.a * lab1.a + lab1.b * lab1.b).sqrt();
    let c2 = (lab2.a * lab2.a + lab2.b * lab2.b).sqrt();
    let delta_c = c1 - c2;
    let delta_l = lab1.l - lab2.l;
    let delta_a = lab1.a - lab2.a;
    let delta_b = lab1.b - lab2.b;
    let delta_h2 = (delta_a * delta_a + delta_b * delta_b - delta_c * delta_c).max(0.0);

    let mut h1 = lab1.b.atan2(lab1.a).to_degrees();
    if h1 < 0.0 {
        h1 += 360.0;
    }

    let c1_4 = c1.powi(4);
    let f = (c1_4 / (c1_4 + 1900.0)).sqrt();
    let t = if (164.0..=345.0).contains(&h1) {
        0.56 + (0.2 * (h1 + 168.0).to_radians().cos()).abs()
    } else {
        0.36 + (0.4 * (h1 + 35.0).to_radians().cos()).abs()
    };
    let s_l = if lab1.l < 16.0 {
        0.511
    } else {
        0.040975 * lab1.l / (1.0 + 0.01765 * lab1.l)
    };
    let s_c = 0.0638 * c1 / (1.0 + 0.0131 * c1) + 0.638;
    let s_h = s_c * (f * t + 1.0 - f);

    let l_term = delta_l / (distance::CMC_LIGHTNESS_WEIGHT * s_l);
    let c_term = delta_c / (distance::CMC_CHROMA_WEIGHT * s_c);
    (l_term * l_term + c_term * c_term + delta_h2 / (s_h * s_h)).sqrt()
}

/// Simulate how a color is perceived with a color vision deficiency
///
/// Projects the color's chromaticity onto the deficiency's confusion line,
/// pulls out-of-range channels towards the neutral grey of equal luminance
/// and blends the result with the original by `amount` (0 = normal vision,
/// 1 = full dichromacy).
///
/// # Returns
///
/// The simulated color in Lab. All components are `NaN` when the projection
/// is undefined (e.g. pure black, whose chromaticity does not exist).
pub fn simulate_deficiency(lab: &LabColor, deficiency: Deficiency, amount: f64) -> LabColor {
    let line = deficiency.confusion_line();
    let color = lab.to_rgb();
    let source = [color.r, color.g, color.b].map(|c| c as f64 / 255.0);
    let [pow_r, pow_g, pow_b] = source.map(|c| c.powf(distance::SIMULATION_GAMMA));

    // RGB -> XYZ (sRGB, D65)
    let x = pow_r * 0.412424 + pow_g * 0.357579 + pow_b * 0.180464;
    let y = pow_r * 0.212656 + pow_g * 0.715158 + pow_b * 0.0721856;
    let z = pow_r * 0.0193324 + pow_g * 0.119193 + pow_b * 0.950444;

    let chroma_x = x / (x + y + z);
    let chroma_y = y / (x + y + z);

    // Line through the confusion point and the source chromaticity
    let m = (chroma_y - line.y) / (chroma_x - line.x);
    let yint = chroma_y - chroma_x * m;

    // Intersection with the deficiency's line
    let deviate_x = (line.yint - yint) / (m - line.m);
    let deviate_y = m * deviate_x + yint;

    let sim_x = deviate_x * y / deviate_y;
    let sim_z = (1.0 - (deviate_x + deviate_y)) * y / deviate_y;

    let neutral_x = d65::CHROMATICITY_X * y / d65::CHROMATICITY_Y;
    let neutral_z = d65::CHROMATICITY_Z * y / d65::CHROMATICITY_Y;
    let diff_x = neutral_x - sim_x;
    let diff_z = neutral_z - sim_z;
    let diff = [
        diff_x * 3.24071 + diff_z * -0.498571,
        diff_x * -0.969258 + diff_z * 0.0415557,
        diff_x * 0.0556352 + diff_z * 1.05707,
    ];

    let simulated = [
        sim_x * 3.24071 + y * -1.53726 + sim_z * -0.498571,
        sim_x * -0.969258 + y * 1.87599 + sim_z * 0.0415557,
        sim_x * 0.0556352 + y * -0.203996 + sim_z * 1.05707,
    ];

    // Shift towards neutral grey until the worst channel is back in range
    let mut adjust = 0.0f64;
    for (channel, delta) in simulated.iter().zip(diff.iter()) {
        let target = if *channel < 0.0 { 0.0 } else { 1.0 };
        let fit = (target - channel) / delta;
        if (0.0..=1.0).contains(&fit) {
            adjust = adjust.max(fit);
        }
    }

    let mut destination = [0.0; 3];
    for i in 0..3 {
        let shifted = (simulated[i] + adjust * diff[i]).clamp(0.0, 1.0);
        let corrected = shifted.powf(1.0 / distance::SIMULATION_GAMMA);
        destination[i] = source[i] * (1.0 - amount) + corrected * amount;
    }

    if destination.iter().any(|c| c.is_nan()) {
        return LabColor::new(f64::NAN, f64::NAN, f64::NAN);
    }

    let [r, g, b] = destination.map(|c| (c * 255.0).round().clamp(0.0, 255.0) as u8);
    Color::new(r, g, b).to_lab()
}

/// Memo key for deficiency simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SimulationKey {
    l: u64,
    a: u64,
    b: u64,
    deficiency: Deficiency,
    amount: u64,
}

impl SimulationKey {
    fn new(lab: &LabColor, deficiency: Deficiency, amount: f64) -> Self {
        // + 0.0 folds -0.0 into 0.0
        Self {
            l: (lab.l + 0.0).to_bits(),
            a: (lab.a + 0.0).to_bits(),
            b: (lab.b + 0.0).to_bits(),
            deficiency,
            amount: amount.to_bits(),
        }
    }
}

/// Distance dispatcher with a shared deficiency simulation memo
///
/// The memo is guarded by a read-write lock so a calculator can be shared
/// between the worker threads of a parallel clustering pass.
#[derive(Debug)]
pub struct DistanceCalculator {
    metric: DistanceMetric,
    severity: f64,
    cache: RwLock<HashMap<SimulationKey, LabColor>>,
}

impl Default for DistanceCalculator {
    fn default() -> Self {
        Self::new(DistanceMetric::default())
    }
}

impl DistanceCalculator {
    /// Create a calculator for the given metric with full deficiency severity
    pub fn new(metric: DistanceMetric) -> Self {
        Self::with_severity(metric, 1.0)
    }

    /// Create a calculator with a custom deficiency severity in [0, 1]
    pub fn with_severity(metric: DistanceMetric, severity: f64) -> Self {
        Self {
            metric,
            severity: severity.clamp(0.0, 1.0),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of memoized simulations
    pub fn cached_simulations(&self) -> usize {
        self.cache.read().len()
    }

    /// Distance between two Lab colors under the active metric
    pub fn distance(&self, lab1: &LabColor, lab2: &LabColor) -> f64 {
        match self.metric {
            DistanceMetric::Euclidean => euclidean_distance(lab1, lab2),
            DistanceMetric::Cmc => cmc_distance(lab1, lab2),
            DistanceMetric::Compromise => self.compromise_distance(lab1, lab2),
            DistanceMetric::Protanope => self.deficiency_distance(lab1, lab2, Deficiency::Protanope),
            DistanceMetric::Deuteranope => {
                self.deficiency_distance(lab1, lab2, Deficiency::Deuteranope)
            }
            DistanceMetric::Tritanope => self.deficiency_distance(lab1, lab2, Deficiency::Tritanope),
        }
    }

    /// Memoized [`simulate_deficiency`] at this calculator's severity
    pub fn simulate(&self, lab: &LabColor, deficiency: Deficiency) -> LabColor {
        let key = SimulationKey::new(lab, deficiency, self.severity);
        if let Some(simulated) = self.cache.read().get(&key) {
            return *simulated;
        }

        let simulated = simulate_deficiency(lab, deficiency, self.severity);
        self.cache.write().insert(key, simulated);
        simulated
    }

    /// CMC distance between the simulated colors
    ///
    /// Falls back to normal-vision CMC when either simulation is undefined.
    fn deficiency_distance(&self, lab1: &LabColor, lab2: &LabColor, deficiency: Deficiency) -> f64 {
        let sim1 = self.simulate(lab1, deficiency);
        let sim2 = self.simulate(lab2, deficiency);
        if sim1.has_nan() || sim2.has_nan() {
            cmc_distance(lab1, lab2)
        } else {
            cmc_distance(&sim1, &sim2)
        }
    }

    /// Weighted mean of normal and simulated CMC distances
    ///
    /// Simulations that come out undefined are left out of the mean.
    fn compromise_distance(&self, lab1: &LabColor, lab2: &LabColor) -> f64 {
        let mut total = distance::NORMAL_WEIGHT * cmc_distance(lab1, lab2);
        let mut weights = distance::NORMAL_WEIGHT;

        for deficiency in Deficiency::ALL {
            let sim1 = self.simulate(lab1, deficiency);
            let sim2 = self.simulate(lab2, deficiency);
            if sim1.has_nan() || sim2.has_nan() {
                continue;
            }
            let weight = deficiency.compromise_weight();
            total += weight * cmc_distance(&sim1, &sim2);
            weights += weight;
        }

        total / weights
    }
}
