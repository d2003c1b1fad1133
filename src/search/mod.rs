//! Anytime game-tree search for 2048-style games.
//!
//! The pieces, leaves first:
//! - [`TimeBudget`]: the deadline every node polls.
//! - [`Evaluator`]: static board evaluation at the depth cutoff.
//! - [`MoveOrder`]: deterministic ordering of legal moves.
//! - [`SearchEngine`]: one fixed-depth search, alpha-beta or expectimax.
//! - [`Agent`]: iterative deepening under a time limit, with a fallback move.
//!
//! Quick start
//! ```
//! use anytime_2048::engine::Board;
//! use anytime_2048::search::{Agent, MovePicker, SearchConfig, Strategy};
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::time::Duration;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
//! let mut agent: Agent<Board> = Agent::new(SearchConfig::for_strategy(Strategy::Stochastic))?;
//! let mv = agent.find_move(&board, Duration::from_millis(20));
//! assert!(mv.is_some());
//! # Ok::<(), anytime_2048::error::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::Game;

mod agent;
mod budget;
mod engine;
mod heuristic;
mod ordering;

pub use agent::{Agent, AgentStats, MovePicker};
pub use budget::{Budget, TimeBudget};
pub use engine::SearchEngine;
pub use heuristic::{CornerScale, EmptyCurve, Evaluator, HeuristicWeights, SNAKE_MATRIX};
pub use ordering::MoveOrder;

/// Hard ceiling on any configured depth cap.
pub const MAX_SEARCH_DEPTH: u32 = 24;

/// How spawn (chance) nodes are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Spawns are picked by a minimizing opponent; alpha-beta pruned.
    Adversarial,
    /// Spawns are averaged over cells and values (expectimax).
    Stochastic,
}

/// Maximum iterative-deepening depth, in plies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthCap {
    Fixed(u32),
    /// `dense` applies when the board has fewer than `dense_below` empty cells.
    ByEmptyCells { sparse: u32, dense: u32, dense_below: usize },
}

impl DepthCap {
    pub fn for_board<G: Game>(&self, board: &G) -> u32 {
        let cap = match *self {
            DepthCap::Fixed(d) => d,
            DepthCap::ByEmptyCells { sparse, dense, dense_below } => {
                if board.empty_cells() < dense_below { dense } else { sparse }
            }
        };
        cap.min(MAX_SEARCH_DEPTH)
    }
}

/// Knobs for one agent. Built in code or loaded with [`crate::config::load_config`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub strategy: Strategy,
    pub depth_cap: DepthCap,
    pub ordering: MoveOrder,
    pub weights: HeuristicWeights,
}

impl SearchConfig {
    /// Defaults tuned per strategy. Expectimax branches far wider, so its cap
    /// only grows once the board fills up.
    pub fn for_strategy(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Adversarial => Self {
                strategy,
                depth_cap: DepthCap::Fixed(8),
                ordering: MoveOrder::ByScore,
                weights: HeuristicWeights::SMOOTH_MONOTONE,
            },
            Strategy::Stochastic => Self {
                strategy,
                depth_cap: DepthCap::ByEmptyCells { sparse: 3, dense: 5, dense_below: 6 },
                ordering: MoveOrder::ByScore,
                weights: HeuristicWeights::BALANCED,
            },
        }
    }

    /// Reject settings the search cannot run with: non-finite weights or a
    /// zero depth cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        match self.depth_cap {
            DepthCap::Fixed(0) | DepthCap::ByEmptyCells { sparse: 0, .. } | DepthCap::ByEmptyCells { dense: 0, .. } => {
                Err(ConfigError::ZeroDepthCap)
            }
            _ => Ok(()),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self { Self::for_strategy(Strategy::Stochastic) }
}

/// Value of a searched node, or a signal that the budget ran out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Eval {
    Value(f64),
    Expired,
}

/// Node counters for one search.
///
/// Each node entered is a child of something; each node that expands its
/// children is a parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeCounts {
    pub nodes: u64,
    pub parents: u64,
    pub children: u64,
}

impl NodeCounts {
    pub fn absorb(&mut self, other: NodeCounts) {
        self.nodes += other.nodes;
        self.parents += other.parents;
        self.children += other.children;
    }
}

/// Outcome of one root search at a fixed depth.
#[derive(Debug, Clone, PartialEq)]
pub enum DepthReport<A> {
    Completed { depth: u32, best: A, value: f64, counts: NodeCounts },
    Expired { depth: u32, counts: NodeCounts },
}

impl<A> DepthReport<A> {
    pub fn counts(&self) -> NodeCounts {
        match self {
            DepthReport::Completed { counts, .. } | DepthReport::Expired { counts, .. } => *counts,
        }
    }
}
