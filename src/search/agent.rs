use log::{debug, trace};
use std::time::Duration;

use crate::error::ConfigError;
use crate::game::Game;

use super::{Budget, DepthReport, NodeCounts, SearchConfig, SearchEngine, TimeBudget};

/// Something that picks moves under a time limit.
pub trait MovePicker<G: Game> {
    /// A legal move for `board`, or `None` when there is none.
    fn find_move(&mut self, board: &G, time_limit: Duration) -> Option<G::Action>;

    fn stats(&self) -> AgentStats;
}

/// Aggregate search statistics over every `find_move` call. Diagnostic only.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AgentStats {
    pub invocations: u64,
    /// Sum over invocations of the deepest completed depth.
    pub completed_depths: u64,
    pub counts: NodeCounts,
}

impl AgentStats {
    pub fn average_completed_depth(&self) -> f64 {
        if self.invocations == 0 { 0.0 } else { self.completed_depths as f64 / self.invocations as f64 }
    }

    /// Children expanded per expanded parent.
    pub fn average_branching_factor(&self) -> f64 {
        if self.counts.parents == 0 { 0.0 } else { self.counts.children as f64 / self.counts.parents as f64 }
    }
}

/// Iterative-deepening player.
///
/// Searches depth 1, 2, ... until the budget runs out or the depth cap is hit,
/// keeping the move of the deepest completed depth. A depth cut short by the
/// budget never replaces that move. If not even depth 1 completes, the move
/// from the previous call is reused when still legal, else the first move in
/// search order.
///
/// ```
/// use anytime_2048::engine::Board;
/// use anytime_2048::search::{Agent, MovePicker, SearchConfig};
/// use std::time::Duration;
///
/// let board = Board::from_raw(0x1100_0000_0000_0000);
/// let mut agent: Agent<Board> = Agent::new(SearchConfig::default())?;
/// assert!(agent.find_move(&board, Duration::from_millis(10)).is_some());
/// assert_eq!(agent.stats().invocations, 1);
/// # Ok::<(), anytime_2048::error::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Agent<G: Game> {
    config: SearchConfig,
    last_best: Option<G::Action>,
    stats: AgentStats,
}

impl<G: Game> Agent<G> {
    /// Fails on settings [`SearchConfig::validate`] rejects.
    pub fn new(config: SearchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, last_best: None, stats: AgentStats::default() })
    }

    pub fn config(&self) -> &SearchConfig { &self.config }

    /// Move confirmed by the most recent completed search, if any.
    pub fn last_best(&self) -> Option<G::Action> { self.last_best }

    pub fn reset_stats(&mut self) { self.stats = AgentStats::default(); }

    /// Like [`MovePicker::find_move`], polling an arbitrary budget.
    pub fn find_move_within<B: Budget>(&mut self, board: &G, budget: B) -> Option<G::Action> {
        self.stats.invocations += 1;
        let legal = board.legal_actions();
        if legal.is_empty() {
            trace!("no legal move; nothing to search");
            return None;
        }

        let cap = self.config.depth_cap.for_board(board).max(1);
        let mut engine = SearchEngine::validated(&self.config, budget);
        let mut confirmed: Option<(G::Action, u32)> = None;
        for depth in 1..=cap {
            let Some(report) = engine.search_root(board, depth) else { break };
            self.stats.counts.absorb(report.counts());
            match report {
                DepthReport::Completed { depth, best, value, counts } => {
                    debug!("depth {depth} completed: {best:?} value={value:.1} nodes={}", counts.nodes);
                    confirmed = Some((best, depth));
                }
                DepthReport::Expired { depth, counts } => {
                    debug!("depth {depth} expired after {} nodes", counts.nodes);
                    break;
                }
            }
        }

        match confirmed {
            Some((best, depth)) => {
                self.stats.completed_depths += depth as u64;
                self.last_best = Some(best);
                Some(best)
            }
            None => {
                let fallback = self
                    .last_best
                    .filter(|prev| legal.contains(prev))
                    .or_else(|| self.config.ordering.order(board).first().copied());
                trace!("no depth completed; falling back to {fallback:?}");
                fallback
            }
        }
    }
}

impl<G: Game> Default for Agent<G> {
    fn default() -> Self { Self { config: SearchConfig::default(), last_best: None, stats: AgentStats::default() } }
}

impl<G: Game> MovePicker<G> for Agent<G> {
    fn find_move(&mut self, board: &G, time_limit: Duration) -> Option<G::Action> {
        let budget = TimeBudget::start(time_limit);
        self.find_move_within(board, &budget)
    }

    fn stats(&self) -> AgentStats { self.stats }
}
