//! Monotone sequence alignment with 1:1, 1:N and N:1 segments
//!
//! Both the word and the glyph aligners run on this lattice. Cell `(i, j)`
//! holds the best key for aligning the first `i` left items with the first
//! `j` right items. Keys compare lexicographically: lower total cost first,
//! then more 1:1 segments. Costs within [`COST_EPSILON`] are equal.
//!
//! Every co-optimal path is enumerated, up to a candidate cap.

use scriptorium_common::{Cardinality, MismatchReason, Resolution};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Costs closer than this are treated as equal
pub const COST_EPSILON: f64 = 1e-9;

/// One aligned segment of a path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Left items (words, glyphs) covered
    pub left: Range<usize>,
    /// Right items (tokens, symbols) covered
    pub right: Range<usize>,
    pub cardinality: Cardinality,
    pub cost: f64,
}

impl Step {
    /// Segment score in `(0, 1]`
    #[inline]
    #[must_use]
    pub fn score(&self) -> f64 {
        1.0 / (1.0 + self.cost)
    }
}

/// One complete alignment of a line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub steps: Vec<Step>,
    pub cost: f64,
    pub one_to_one: usize,
}

impl Path {
    fn new(steps: Vec<Step>) -> Self {
        let cost = steps.iter().map(|s| s.cost).sum();
        let one_to_one = steps
            .iter()
            .filter(|s| s.cardinality == Cardinality::OneToOne)
            .count();
        Self {
            steps,
            cost,
            one_to_one,
        }
    }
}

/// Every co-optimal path, in a deterministic order
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub paths: Vec<Path>,
    /// More co-optimal paths existed than the candidate cap allowed
    pub truncated: bool,
}

/// Every minimum-cost alignment of two sequences
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceAlignment {
    pub resolution: Resolution<Path>,
    /// More tied candidates existed than `max_candidates`
    pub truncated: bool,
}

impl SequenceAlignment {
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        self.resolution.is_ambiguous()
    }
}

/// Why two sequences could not be aligned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Infeasible {
    /// One side is empty
    EmptyLine,
    /// Side counts too far apart for the segment span
    SpanExceeded,
}

impl From<Infeasible> for MismatchReason {
    fn from(value: Infeasible) -> Self {
        match value {
            Infeasible::EmptyLine => Self::EmptyLine,
            Infeasible::SpanExceeded => Self::SpanExceeded,
        }
    }
}

/// Search bounds
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Largest side of a 1:N or N:1 segment
    pub max_span: usize,
    /// Most co-optimal paths to enumerate
    pub max_candidates: usize,
}

#[derive(Debug, Clone, Copy)]
struct Key {
    cost: f64,
    ones: usize,
}

impl Key {
    fn beats(self, other: Self) -> bool {
        if (self.cost - other.cost).abs() > COST_EPSILON {
            self.cost < other.cost
        } else {
            self.ones > other.ones
        }
    }

    fn ties(self, other: Self) -> bool {
        (self.cost - other.cost).abs() <= COST_EPSILON && self.ones == other.ones
    }
}

/// Segment shapes in enumeration order: 1:1, then 1:k, then k:1
fn shapes(max_span: usize) -> Vec<(usize, usize, Cardinality)> {
    let mut shapes = vec![(1, 1, Cardinality::OneToOne)];
    shapes.extend((2..=max_span).map(|k| (1, k, Cardinality::OneToMany)));
    shapes.extend((2..=max_span).map(|k| (k, 1, Cardinality::ManyToOne)));
    shapes
}

struct Lattice {
    shapes: Vec<(usize, usize, Cardinality)>,
    width: usize,
    best: Vec<Option<Key>>,
    /// Reachable predecessors per cell: (shape index, step cost)
    incoming: Vec<Vec<(usize, f64)>>,
}

impl Lattice {
    const fn cell(&self, i: usize, j: usize) -> usize {
        i * self.width + j
    }

    fn walk(
        &self,
        i: usize,
        j: usize,
        suffix: &mut Vec<Step>,
        limits: Limits,
        out: &mut Vec<Path>,
        truncated: &mut bool,
    ) {
        if out.len() >= limits.max_candidates {
            *truncated = true;
            return;
        }
        if i == 0 && j == 0 {
            out.push(Path::new(suffix.iter().rev().cloned().collect()));
            return;
        }
        let Some(here) = self.best[self.cell(i, j)] else {
            return;
        };
        for &(shape, cost) in &self.incoming[self.cell(i, j)] {
            let (a, b, cardinality) = self.shapes[shape];
            let Some(prev) = self.best[self.cell(i - a, j - b)] else {
                continue;
            };
            let key = Key {
                cost: prev.cost + cost,
                ones: prev.ones + usize::from(cardinality == Cardinality::OneToOne),
            };
            if !key.ties(here) {
                continue;
            }
            suffix.push(Step {
                left: i - a..i,
                right: j - b..j,
                cardinality,
                cost,
            });
            self.walk(i - a, j - b, suffix, limits, out, truncated);
            suffix.pop();
        }
    }
}

/// Align `n` left items with `m` right items, tagging ties
///
/// # Errors
///
/// Returns [`Infeasible`] when a side is empty or no path fits `max_span`.
pub fn align<F>(n: usize, m: usize, limits: Limits, cost: F) -> Result<SequenceAlignment, Infeasible>
where
    F: FnMut(Range<usize>, Range<usize>) -> f64,
{
    if n == 0 || m == 0 {
        return Err(Infeasible::EmptyLine);
    }
    let solution = solve(n, m, limits, cost).ok_or(Infeasible::SpanExceeded)?;
    let truncated = solution.truncated;
    Resolution::from_candidates(solution.paths)
        .map(|resolution| SequenceAlignment {
            resolution,
            truncated,
        })
        .ok_or(Infeasible::SpanExceeded)
}

/// Align `n` left items with `m` right items
///
/// `cost` is called once per candidate segment with the left and right
/// ranges it covers. Returns `None` when no path exists: an empty side, or
/// sides too unequal for `max_span`.
pub fn solve<F>(n: usize, m: usize, limits: Limits, mut cost: F) -> Option<Solution>
where
    F: FnMut(Range<usize>, Range<usize>) -> f64,
{
    if n == 0 || m == 0 {
        return None;
    }
    let limits = Limits {
        max_span: limits.max_span.max(1),
        max_candidates: limits.max_candidates.max(1),
    };
    let width = m + 1;
    let cells = (n + 1) * width;
    let mut lattice = Lattice {
        shapes: shapes(limits.max_span),
        width,
        best: vec![None; cells],
        incoming: vec![Vec::new(); cells],
    };
    lattice.best[0] = Some(Key {
        cost: 0.0,
        ones: 0,
    });

    for i in 0..=n {
        for j in 0..=m {
            if i == 0 && j == 0 {
                continue;
            }
            let here = lattice.cell(i, j);
            let mut cell: Option<Key> = None;
            for (shape, &(a, b, cardinality)) in lattice.shapes.iter().enumerate() {
                if a > i || b > j {
                    continue;
                }
                let Some(prev) = lattice.best[lattice.cell(i - a, j - b)] else {
                    continue;
                };
                let step = cost(i - a..i, j - b..j);
                lattice.incoming[here].push((shape, step));
                let key = Key {
                    cost: prev.cost + step,
                    ones: prev.ones + usize::from(cardinality == Cardinality::OneToOne),
                };
                if cell.map_or(true, |c| key.beats(c)) {
                    cell = Some(key);
                }
            }
            lattice.best[here] = cell;
        }
    }

    lattice.best[lattice.cell(n, m)]?;
    let mut paths = Vec::new();
    let mut truncated = false;
    lattice.walk(n, m, &mut Vec::new(), limits, &mut paths, &mut truncated);
    Some(Solution { paths, truncated })
}
