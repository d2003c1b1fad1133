use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::Game;

/// Per-cell preference for a snake traversal anchored in the top-left corner.
pub const SNAKE_MATRIX: [[f64; 4]; 4] = [
    [15.0 / 15.0, 14.0 / 15.0, 13.0 / 15.0, 12.0 / 15.0],
    [8.0 / 15.0, 9.0 / 15.0, 10.0 / 15.0, 11.0 / 15.0],
    [7.0 / 15.0, 6.0 / 15.0, 5.0 / 15.0, 4.0 / 15.0],
    [0.0, 1.0 / 15.0, 2.0 / 15.0, 3.0 / 15.0],
];

/// How the empty-cell count turns into a feature value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyCurve {
    Linear,
    /// `log2(empty + 1)`: the first free cells matter most.
    Log2,
}

/// What the corner bonus (or miss penalty) is multiplied by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerScale {
    /// The weight itself.
    Flat,
    /// The largest tile's value (2, 4, 8, ...).
    MaxValue,
    /// The largest tile's exponent (1, 2, 3, ...).
    MaxExponent,
}

/// Weights of the evaluation features. Features read tile values (2, 4, 8, ...),
/// never exponents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    /// Running game score.
    pub score: f64,
    pub empty: f64,
    pub empty_curve: EmptyCurve,
    /// Bonus when the largest tile sits in a corner.
    pub corner: f64,
    /// Subtracted when it does not.
    pub corner_miss: f64,
    pub corner_scale: CornerScale,
    pub monotonicity: f64,
    /// Penalty per unit of adjacent value difference.
    pub smoothness: f64,
    /// Bonus per adjacent equal pair.
    pub merges: f64,
    /// Weight of the [`SNAKE_MATRIX`] dot product.
    pub snake: f64,
}

impl HeuristicWeights {
    pub const ZERO: Self = Self {
        score: 0.0,
        empty: 0.0,
        empty_curve: EmptyCurve::Linear,
        corner: 0.0,
        corner_miss: 0.0,
        corner_scale: CornerScale::Flat,
        monotonicity: 0.0,
        smoothness: 0.0,
        merges: 0.0,
        snake: 0.0,
    };

    pub const BALANCED: Self = Self {
        score: 1.0,
        empty: 120.0,
        empty_curve: EmptyCurve::Log2,
        corner: 400.0,
        corner_miss: 100.0,
        corner_scale: CornerScale::Flat,
        monotonicity: 2.0,
        smoothness: 0.5,
        merges: 40.0,
        snake: 1.0,
    };

    pub const SMOOTH_MONOTONE: Self = Self {
        score: 1.0,
        empty: 50.0,
        empty_curve: EmptyCurve::Linear,
        corner: 200.0,
        corner_miss: 0.0,
        corner_scale: CornerScale::MaxExponent,
        monotonicity: 10.0,
        smoothness: 3.0,
        merges: 0.0,
        snake: 0.0,
    };

    pub const CORNER_ANCHOR: Self =
        Self { score: 1.0, corner: 1000.0, corner_scale: CornerScale::MaxValue, ..Self::ZERO };

    /// Reject weights that would make evaluations NaN or infinite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("score", self.score),
            ("empty", self.empty),
            ("corner", self.corner),
            ("corner_miss", self.corner_miss),
            ("monotonicity", self.monotonicity),
            ("smoothness", self.smoothness),
            ("merges", self.merges),
            ("snake", self.snake),
        ];
        match named.iter().find(|(_, v)| !v.is_finite()) {
            Some(&(name, value)) => Err(ConfigError::InvalidWeight { name, value }),
            None => Ok(()),
        }
    }
}

impl Default for HeuristicWeights {
    fn default() -> Self { Self::BALANCED }
}

/// Static board evaluation: a weighted sum of independent features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluator {
    weights: HeuristicWeights,
}

impl Evaluator {
    pub fn new(weights: HeuristicWeights) -> Self { Self { weights } }

    /// Desirability estimate for a non-terminal board.
    pub fn evaluate<G: Game>(&self, board: &G) -> f64 {
        let w = &self.weights;
        let grid = TileGrid { board };
        let empty = grid.empty() as f64;
        let empty_term = match w.empty_curve {
            EmptyCurve::Linear => empty,
            EmptyCurve::Log2 => (empty + 1.0).log2(),
        };
        let max = grid.max();
        let scale = match w.corner_scale {
            CornerScale::Flat => 1.0,
            CornerScale::MaxValue => max,
            CornerScale::MaxExponent => if max > 0.0 { max.log2() } else { 0.0 },
        };
        let corner_term = if grid.in_corner(max) { w.corner * scale } else { -w.corner_miss * scale };

        w.score * board.score() as f64
            + w.empty * empty_term
            + corner_term
            + w.monotonicity * grid.monotonicity()
            - w.smoothness * grid.roughness()
            + w.merges * grid.merge_pairs() as f64
            + w.snake * grid.snake()
    }

    /// Value of a board the search stops at: the real score if the game is
    /// over, otherwise the estimate.
    pub fn leaf<G: Game>(&self, board: &G) -> f64 {
        if board.is_terminal() { board.score() as f64 } else { self.evaluate(board) }
    }
}

impl Default for Evaluator {
    fn default() -> Self { Self::new(HeuristicWeights::default()) }
}

/// Tile values of a board, read in place.
struct TileGrid<'a, G> {
    board: &'a G,
}

impl<G> Clone for TileGrid<'_, G> {
    fn clone(&self) -> Self { *self }
}

impl<G> Copy for TileGrid<'_, G> {}

/// Every row and column of a `rows x cols` grid as `(first cell, step, length)`
/// over row-major indices.
fn lines(rows: usize, cols: usize) -> impl Iterator<Item = (usize, usize, usize)> {
    let across = (0..rows).map(move |r| (r * cols, 1, cols));
    let down = (0..cols).map(move |c| (c, cols, rows));
    across.chain(down)
}

impl<'a, G: Game> TileGrid<'a, G> {
    #[inline]
    fn at(&self, row: usize, col: usize) -> f64 {
        match self.board.tile_at(row, col) {
            0 => 0.0,
            exp => (1u64 << exp) as f64,
        }
    }

    fn cells(self) -> impl Iterator<Item = f64> + 'a {
        (0..G::ROWS).flat_map(move |r| (0..G::COLS).map(move |c| self.at(r, c)))
    }

    fn empty(&self) -> usize { self.cells().filter(|&v| v == 0.0).count() }

    fn max(&self) -> f64 { self.cells().fold(0.0, f64::max) }

    fn in_corner(&self, value: f64) -> bool {
        let (r, c) = (G::ROWS - 1, G::COLS - 1);
        [self.at(0, 0), self.at(0, c), self.at(r, 0), self.at(r, c)].contains(&value)
    }

    /// Neighbouring `(earlier, later)` values along one line.
    fn pairs(self, (start, step, len): (usize, usize, usize)) -> impl Iterator<Item = (f64, f64)> + 'a {
        let cell = move |i: usize| {
            let idx = start + i * step;
            self.at(idx / G::COLS, idx % G::COLS)
        };
        (1..len).map(move |i| (cell(i - 1), cell(i)))
    }

    fn monotonicity(&self) -> f64 {
        lines(G::ROWS, G::COLS)
            .map(|line| {
                let (inc, dec) = self.pairs(line).fold((0.0, 0.0), |(inc, dec), (a, b)| {
                    let diff = b - a;
                    if diff > 0.0 { (inc + diff, dec) } else { (inc, dec - diff) }
                });
                f64::max(inc, dec)
            })
            .sum()
    }

    /// Sum of absolute differences between neighbours.
    fn roughness(&self) -> f64 {
        lines(G::ROWS, G::COLS).map(|line| self.pairs(line).map(|(a, b)| (b - a).abs()).sum::<f64>()).sum()
    }

    fn merge_pairs(&self) -> usize {
        lines(G::ROWS, G::COLS).map(|line| self.pairs(line).filter(|&(a, b)| a != 0.0 && a == b).count()).sum()
    }

    fn snake(&self) -> f64 {
        let mut total = 0.0;
        for (r, weights) in SNAKE_MATRIX.iter().enumerate().take(G::ROWS) {
            for (c, weight) in weights.iter().enumerate().take(G::COLS) {
                total += weight * self.at(r, c);
            }
        }
        total
    }
}
