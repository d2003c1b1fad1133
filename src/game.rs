//! The board-side contract the search consumes.
//!
//! The search never touches a concrete board type; it only sees a [`Game`].
//! Values are immutable: every transition returns a fresh board.

use std::fmt::Debug;

/// One entry of the spawn distribution: a tile exponent and its probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnOutcome {
    pub exponent: u8,
    pub probability: f64,
}

/// A "2" with probability 0.9, a "4" with probability 0.1.
pub const CANONICAL_SPAWNS: [SpawnOutcome; 2] = [
    SpawnOutcome { exponent: 1, probability: 0.9 },
    SpawnOutcome { exponent: 2, probability: 0.1 },
];

/// Result of applying a legal action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResult<G> {
    pub board: G,
    pub points: u64,
}

/// One spawn branch: a tile of `exponent` placed at `cell` (row, col).
///
/// `probability` is the value probability alone; the search divides it by the
/// number of empty cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spawn<G> {
    pub cell: (usize, usize),
    pub exponent: u8,
    pub probability: f64,
    pub board: G,
}

/// A single-player tile-merging game on a fixed grid.
pub trait Game: Clone {
    /// Move direction. `Ord` fixes the static tie-break order.
    type Action: Copy + Eq + Ord + Debug;

    const ROWS: usize;
    const COLS: usize;

    /// Actions that change the board, in declaration order.
    fn legal_actions(&self) -> Vec<Self::Action>;

    /// Apply `action`. Callers only pass actions from [`Game::legal_actions`].
    fn apply(&self, action: Self::Action) -> MoveResult<Self>;

    /// True when no action changes the board.
    fn is_terminal(&self) -> bool { self.legal_actions().is_empty() }

    /// Running score.
    fn score(&self) -> u64;

    /// Tile exponent at (row, col), 0 when empty.
    fn tile_at(&self, row: usize, col: usize) -> u8;

    fn empty_cells(&self) -> usize {
        let mut n = 0;
        for row in 0..Self::ROWS {
            for col in 0..Self::COLS {
                if self.tile_at(row, col) == 0 {
                    n += 1;
                }
            }
        }
        n
    }

    /// Every (empty cell, spawn value) branch, cells in row-major order.
    fn spawns(&self) -> Vec<Spawn<Self>>;
}
