//! Box statistics and optimal cuts over cumulative moment tables

use crate::quantize::histogram::{Moment, MomentTables};

/// Axis-aligned box of histogram cells
///
/// Lower bounds are exclusive and upper bounds inclusive, so the box covers
/// cells `r0 + 1..=r1` (likewise for g and b).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorBox {
    pub r0: usize,
    pub r1: usize,
    pub g0: usize,
    pub g1: usize,
    pub b0: usize,
    pub b1: usize,
    /// Number of cells inside the box
    pub volume: usize,
}

impl ColorBox {
    /// Box spanning every non-border cell of the tables
    pub fn spanning(tables: &MomentTables) -> Self {
        let last = tables.side() - 1;
        let mut whole = Self {
            r1: last,
            g1: last,
            b1: last,
            ..Self::default()
        };
        whole.update_volume();
        whole
    }

    pub fn update_volume(&mut self) {
        self.volume = (self.r1 - self.r0) * (self.g1 - self.g0) * (self.b1 - self.b0);
    }

    /// Exclusive lower and inclusive upper bound along `axis`
    pub fn bounds(&self, axis: Axis) -> (usize, usize) {
        match axis {
            Axis::Red => (self.r0, self.r1),
            Axis::Green => (self.g0, self.g1),
            Axis::Blue => (self.b0, self.b1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Red,
    Green,
    Blue,
}

/// Weight and channel sums over a box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Sums {
    r: i64,
    g: i64,
    b: i64,
    w: i64,
}

impl Sums {
    fn of(tables: &MomentTables, cube: &ColorBox) -> Self {
        Self {
            r: volume(tables, cube, Moment::Red),
            g: volume(tables, cube, Moment::Green),
            b: volume(tables, cube, Moment::Blue),
            w: volume(tables, cube, Moment::Weight),
        }
    }

    /// Σ channel² / weight, the quantity maximized by a cut
    fn score(&self) -> f64 {
        let (r, g, b) = (self.r as f64, self.g as f64, self.b as f64);
        (r * r + g * g + b * b) / self.w as f64
    }
}

/// Sum of `moment` over every cell inside `cube`
pub fn volume(tables: &MomentTables, cube: &ColorBox, moment: Moment) -> i64 {
    let t = tables.table(moment);
    let at = |r, g, b| t[tables.index(r, g, b)];

    at(cube.r1, cube.g1, cube.b1) - at(cube.r1, cube.g1, cube.b0) - at(cube.r1, cube.g0, cube.b1)
        + at(cube.r1, cube.g0, cube.b0)
        - at(cube.r0, cube.g1, cube.b1)
        + at(cube.r0, cube.g1, cube.b0)
        + at(cube.r0, cube.g0, cube.b1)
        - at(cube.r0, cube.g0, cube.b0)
}

/// Part of `volume` that does not depend on the cut position along `axis`
pub fn bottom(tables: &MomentTables, cube: &ColorBox, axis: Axis, moment: Moment) -> i64 {
    let t = tables.table(moment);
    let at = |r, g, b| t[tables.index(r, g, b)];

    match axis {
        Axis::Red => {
            -at(cube.r0, cube.g1, cube.b1) + at(cube.r0, cube.g1, cube.b0) + at(cube.r0, cube.g0, cube.b1)
                - at(cube.r0, cube.g0, cube.b0)
        }
        Axis::Green => {
            -at(cube.r1, cube.g0, cube.b1) + at(cube.r1, cube.g0, cube.b0) + at(cube.r0, cube.g0, cube.b1)
                - at(cube.r0, cube.g0, cube.b0)
        }
        Axis::Blue => {
            -at(cube.r1, cube.g1, cube.b0) + at(cube.r1, cube.g0, cube.b0) + at(cube.r0, cube.g1, cube.b0)
                - at(cube.r0, cube.g0, cube.b0)
        }
    }
}

/// Part of `volume` taken at cut `position` along `axis`
pub fn top(tables: &MomentTables, cube: &ColorBox, axis: Axis, position: usize, moment: Moment) -> i64 {
    let t = tables.table(moment);
    let at = |r, g, b| t[tables.index(r, g, b)];

    match axis {
        Axis::Red => {
            at(position, cube.g1, cube.b1) - at(position, cube.g1, cube.b0) - at(position, cube.g0, cube.b1)
                + at(position, cube.g0, cube.b0)
        }
        Axis::Green => {
            at(cube.r1, position, cube.b1) - at(cube.r1, position, cube.b0) - at(cube.r0, position, cube.b1)
                + at(cube.r0, position, cube.b0)
        }
        Axis::Blue => {
            at(cube.r1, cube.g1, position) - at(cube.r1, cube.g0, position) - at(cube.r0, cube.g1, position)
                + at(cube.r0, cube.g0, position)
        }
    }
}

/// Weighted color variance of the pixels inside `cube`
///
/// Returns 0 for an empty box.
pub fn variance(tables: &MomentTables, cube: &ColorBox) -> f64 {
    let sums = Sums::of(tables, cube);
    if sums.w == 0 {
        return 0.0;
    }
    volume(tables, cube, Moment::Squared) as f64 - sums.score()
}

/// Best cut position along one axis
///
/// Scores every position in `first..last` by the summed `Σ channel² / weight`
/// of the two halves and keeps the highest. Positions leaving either half
/// without pixels are skipped.
///
/// # Returns
///
/// The best score and its position, or `(0.0, None)` when no position
/// splits the pixels.
fn maximize(
    tables: &MomentTables,
    cube: &ColorBox,
    axis: Axis,
    first: usize,
    last: usize,
    whole: Sums,
) -> (f64, Option<usize>) {
    let base = Sums {
        r: bottom(tables, cube, axis, Moment::Red),
        g: bottom(tables, cube, axis, Moment::Green),
        b: bottom(tables, cube, axis, Moment::Blue),
        w: bottom(tables, cube, axis, Moment::Weight),
    };

    let mut best = 0.0;
    let mut cut = None;

    for position in first..last {
        let lower = Sums {
            r: base.r + top(tables, cube, axis, position, Moment::Red),
            g: base.g + top(tables, cube, axis, position, Moment::Green),
            b: base.b + top(tables, cube, axis, position, Moment::Blue),
            w: base.w + top(tables, cube, axis, position, Moment::Weight),
        };
        if lower.w == 0 {
            continue;
        }

        let upper = Sums {
            r: whole.r - lower.r,
            g: whole.g - lower.g,
            b: whole.b - lower.b,
            w: whole.w - lower.w,
        };
        if upper.w == 0 {
            continue;
        }

        let score = lower.score() + upper.score();
        if score > best {
            best = score;
            cut = Some(position);
        }
    }

    (best, cut)
}

/// Split `set1` along the axis and position that best reduces variance
///
/// The three axis searches run in parallel. Ties between axes prefer red,
/// then green. When the winning axis has no valid position the box is
/// left untouched.
///
/// # Returns
///
/// The new sibling box, with `set1` shrunk to the other half, or `None`
/// if the box cannot be split.
pub fn cut(tables: &MomentTables, set1: &mut ColorBox) -> Option<ColorBox> {
    let whole = Sums::of(tables, set1);
    let current = *set1;
    let search = |axis: Axis| {
        let (low, high) = current.bounds(axis);
        maximize(tables, &current, axis, low + 1, high, whole)
    };

    let ((max_r, cut_r), ((max_g, cut_g), (max_b, cut_b))) = rayon::join(
        || search(Axis::Red),
        || rayon::join(|| search(Axis::Green), || search(Axis::Blue)),
    );

    let (axis, position) = if max_r >= max_g && max_r >= max_b {
        (Axis::Red, cut_r?)
    } else if max_g >= max_r && max_g >= max_b {
        (Axis::Green, cut_g?)
    } else {
        (Axis::Blue, cut_b?)
    };

    let mut set2 = *set1;
    match axis {
        Axis::Red => {
            set1.r1 = position;
            set2.r0 = position;
        }
        Axis::Green => {
            set1.g1 = position;
            set2.g0 = position;
        }
        Axis::Blue => {
            set1.b1 = position;
            set2.b0 = position;
        }
    }

    set1.update_volume();
    set2.update_volume();
    Some(set2)
}
