use crate::error::ConfigError;
use crate::game::Game;

use super::{Budget, DepthReport, Eval, Evaluator, NodeCounts, SearchConfig, Strategy};

impl Eval {
    #[inline]
    fn value(self) -> Option<f64> {
        match self {
            Eval::Value(v) => Some(v),
            Eval::Expired => None,
        }
    }
}

/// Spawn branches of `board` with their full weight: each empty cell is equally
/// likely, then the value follows the spawn distribution. Weights sum to 1.
pub(crate) fn chance_weights<G: Game>(board: &G) -> Vec<(G, f64)> {
    let cells = board.empty_cells();
    if cells == 0 {
        return Vec::new();
    }
    let n = cells as f64;
    board.spawns().into_iter().map(|s| (s.board, s.probability / n)).collect()
}

/// Fixed-depth search shared by both strategies.
///
/// Depth counts plies: a player move and a spawn each use one. Every node entry
/// polls the budget; once it reports expiry the search unwinds with
/// [`Eval::Expired`] and nothing partial is reported.
pub struct SearchEngine<'a, B: Budget> {
    config: &'a SearchConfig,
    evaluator: Evaluator,
    budget: B,
    counts: NodeCounts,
}

impl<'a, B: Budget> SearchEngine<'a, B> {
    /// Fails when a weight is not finite, since every value would be NaN.
    pub fn new(config: &'a SearchConfig, budget: B) -> Result<Self, ConfigError> {
        config.weights.validate()?;
        Ok(Self::validated(config, budget))
    }

    /// For callers that already ran [`SearchConfig::validate`].
    pub(crate) fn validated(config: &'a SearchConfig, budget: B) -> Self {
        Self { config, evaluator: Evaluator::new(config.weights), budget, counts: NodeCounts::default() }
    }

    /// Search every root move to `depth` (at least 1).
    ///
    /// Returns `None` when `board` has no legal move.
    pub fn search_root<G: Game>(&mut self, board: &G, depth: u32) -> Option<DepthReport<G::Action>> {
        let depth = depth.max(1);
        let children = self.config.ordering.children(board);
        if children.is_empty() {
            return None;
        }
        self.counts = NodeCounts { nodes: 1, parents: 1, children: 0 };
        let mut best: Option<(G::Action, f64)> = None;
        let mut alpha = f64::NEG_INFINITY;
        for (action, result) in children {
            if !self.budget.remaining() {
                return Some(DepthReport::Expired { depth, counts: self.take_counts() });
            }
            let floor = match self.config.strategy {
                Strategy::Adversarial => alpha,
                Strategy::Stochastic => f64::NEG_INFINITY,
            };
            let Some(v) = self.chance_node(&result.board, depth - 1, floor, f64::INFINITY).value() else {
                return Some(DepthReport::Expired { depth, counts: self.take_counts() });
            };
            if best.map_or(true, |(_, b)| v > b) {
                best = Some((action, v));
                alpha = alpha.max(v);
            }
        }
        let (best, value) = best?;
        Some(DepthReport::Completed { depth, best, value, counts: self.take_counts() })
    }

    /// Value of `board` as a max node searched to `depth`.
    pub fn evaluate_at_depth<G: Game>(&mut self, board: &G, depth: u32) -> Eval {
        self.max_node(board, depth, f64::NEG_INFINITY, f64::INFINITY)
    }

    fn take_counts(&mut self) -> NodeCounts { std::mem::take(&mut self.counts) }

    #[inline]
    fn enter(&mut self) -> bool {
        if !self.budget.remaining() {
            return false;
        }
        self.counts.nodes += 1;
        self.counts.children += 1;
        true
    }

    fn max_node<G: Game>(&mut self, board: &G, depth: u32, mut alpha: f64, beta: f64) -> Eval {
        if !self.enter() {
            return Eval::Expired;
        }
        if depth == 0 {
            return Eval::Value(self.evaluator.leaf(board));
        }
        let children = self.config.ordering.children(board);
        if children.is_empty() {
            return Eval::Value(board.score() as f64);
        }
        self.counts.parents += 1;
        let mut best = f64::NEG_INFINITY;
        for (_, result) in children {
            let Some(v) = self.chance_node(&result.board, depth - 1, alpha, beta).value() else {
                return Eval::Expired;
            };
            best = best.max(v);
            alpha = alpha.max(best);
            if beta <= alpha {
                break;
            }
        }
        Eval::Value(best)
    }

    fn chance_node<G: Game>(&mut self, board: &G, depth: u32, alpha: f64, mut beta: f64) -> Eval {
        if !self.enter() {
            return Eval::Expired;
        }
        if depth == 0 {
            return Eval::Value(self.evaluator.leaf(board));
        }
        let branches = chance_weights(board);
        if branches.is_empty() {
            return Eval::Value(self.evaluator.leaf(board));
        }
        self.counts.parents += 1;
        match self.config.strategy {
            Strategy::Adversarial => {
                let mut worst = f64::INFINITY;
                for (next, _) in &branches {
                    let Some(v) = self.max_node(next, depth - 1, alpha, beta).value() else {
                        return Eval::Expired;
                    };
                    worst = worst.min(v);
                    beta = beta.min(worst);
                    if beta <= alpha {
                        break;
                    }
                }
                Eval::Value(worst)
            }
            Strategy::Stochastic => {
                let mut expected = 0.0;
                for (next, weight) in &branches {
                    let Some(v) = self.max_node(next, depth - 1, f64::NEG_INFINITY, f64::INFINITY).value() else {
                        return Eval::Expired;
                    };
                    expected += weight * v;
                }
                Eval::Value(expected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Board, Move};
    use crate::search::budget::testing::PollBudget;
    use crate::search::{DepthCap, HeuristicWeights, MoveOrder};

    fn config(strategy: Strategy, ordering: MoveOrder) -> SearchConfig {
        SearchConfig { strategy, ordering, depth_cap: DepthCap::Fixed(8), weights: HeuristicWeights::SMOOTH_MONOTONE }
    }

    fn searcher<B: Budget>(cfg: &SearchConfig, budget: B) -> SearchEngine<'_, B> {
        SearchEngine::new(cfg, budget).unwrap()
    }

    fn boards() -> Vec<Board> {
        vec![
            Board::from_raw(0x1100_0000_0000_0000),
            Board::from_raw(0x1120_0310_2002_0001).with_score(36),
            Board::from_raw(0x4321_1230_0012_0000).with_score(120),
            Board::from_raw(0x2345_1234_2312_1210).with_score(400),
        ]
    }

    /// Plain minimax with spawns as the minimizer, counting nodes.
    fn minimax_max(b: &Board, depth: u32, e: &Evaluator, nodes: &mut u64) -> f64 {
        *nodes += 1;
        if depth == 0 {
            return e.leaf(b);
        }
        let moves = b.legal_actions();
        if moves.is_empty() {
            return b.score() as f64;
        }
        moves.iter().map(|&m| minimax_min(&b.apply(m).board, depth - 1, e, nodes)).fold(f64::NEG_INFINITY, f64::max)
    }

    fn minimax_min(b: &Board, depth: u32, e: &Evaluator, nodes: &mut u64) -> f64 {
        *nodes += 1;
        if depth == 0 || b.empty_cells() == 0 {
            return e.leaf(b);
        }
        b.spawns().iter().map(|s| minimax_max(&s.board, depth - 1, e, nodes)).fold(f64::INFINITY, f64::min)
    }

    fn minimax_root(b: &Board, depth: u32, e: &Evaluator, nodes: &mut u64) -> f64 {
        b.legal_actions()
            .iter()
            .map(|&m| minimax_min(&b.apply(m).board, depth - 1, e, nodes))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Plain expectimax: each spawn weighted by its probability over the empty cells.
    fn expectimax_max(b: &Board, depth: u32, e: &Evaluator) -> f64 {
        if depth == 0 {
            return e.leaf(b);
        }
        let moves = b.legal_actions();
        if moves.is_empty() {
            return b.score() as f64;
        }
        moves.iter().map(|&m| expectimax_chance(&b.apply(m).board, depth - 1, e)).fold(f64::NEG_INFINITY, f64::max)
    }

    fn expectimax_chance(b: &Board, depth: u32, e: &Evaluator) -> f64 {
        let cells = b.empty_cells();
        if depth == 0 || cells == 0 {
            return e.leaf(b);
        }
        let n = cells as f64;
        b.spawns().iter().map(|s| s.probability / n * expectimax_max(&s.board, depth - 1, e)).sum()
    }

    fn close(a: f64, b: f64) -> bool { (a - b).abs() <= 1e-9 * b.abs().max(1.0) }

    fn completed_value(report: Option<DepthReport<Move>>) -> (Move, f64, NodeCounts) {
        match report {
            Some(DepthReport::Completed { best, value, counts, .. }) => (best, value, counts),
            other => panic!("search did not complete: {other:?}"),
        }
    }

    #[test]
    fn alpha_beta_matches_exhaustive_minimax() {
        for ordering in [MoveOrder::Static, MoveOrder::ByScore] {
            let cfg = config(Strategy::Adversarial, ordering);
            let e = Evaluator::new(cfg.weights);
            for b in boards() {
                for depth in 1..=3 {
                    let mut exhaustive_nodes = 0;
                    let expected = minimax_root(&b, depth, &e, &mut exhaustive_nodes);
                    let mut engine = searcher(&cfg, PollBudget::unlimited());
                    let (_, value, counts) = completed_value(engine.search_root(&b, depth));
                    assert_eq!(value, expected, "board {b:?} depth {depth}");
                    assert!(counts.nodes <= exhaustive_nodes + 1);

                    let mut unused = 0;
                    let mut engine = searcher(&cfg, PollBudget::unlimited());
                    assert_eq!(engine.evaluate_at_depth(&b, depth), Eval::Value(minimax_max(&b, depth, &e, &mut unused)));
                }
            }
        }
    }

    #[test]
    fn expectimax_matches_exhaustive_expectation() {
        let cfg = config(Strategy::Stochastic, MoveOrder::ByScore);
        let e = Evaluator::new(cfg.weights);
        // Boards with several empty cells, so every chance node averages many spawns.
        let open = [
            boards()[0],
            boards()[1],
            boards()[2],
            Board::from_rows([[3, 2, 0, 0], [1, 0, 0, 1], [0; 4], [2, 0, 0, 0]]).with_score(24),
        ];
        for b in open {
            assert!(b.count_empty() >= 4);
            for depth in 2..=4 {
                let expected = expectimax_max(&b, depth, &e);
                let (_, value, _) = completed_value(searcher(&cfg, PollBudget::unlimited()).search_root(&b, depth));
                assert!(close(value, expected), "board {b:?} depth {depth}: {value} vs {expected}");
                match searcher(&cfg, PollBudget::unlimited()).evaluate_at_depth(&b, depth) {
                    Eval::Value(v) => assert!(close(v, expected), "board {b:?} depth {depth}: {v} vs {expected}"),
                    Eval::Expired => panic!("unlimited budget expired"),
                }
            }
        }
    }

    #[test]
    fn non_finite_weights_are_refused() {
        let mut cfg = config(Strategy::Stochastic, MoveOrder::ByScore);
        cfg.weights.smoothness = f64::NAN;
        assert!(matches!(
            SearchEngine::new(&cfg, PollBudget::unlimited()),
            Err(ConfigError::InvalidWeight { name: "smoothness", .. })
        ));
    }

    #[test]
    fn move_order_never_changes_the_value() {
        for strategy in [Strategy::Adversarial, Strategy::Stochastic] {
            let fixed = config(strategy, MoveOrder::Static);
            let scored = config(strategy, MoveOrder::ByScore);
            for b in boards() {
                let (_, a, _) = completed_value(searcher(&fixed, PollBudget::unlimited()).search_root(&b, 3));
                let (_, c, _) = completed_value(searcher(&scored, PollBudget::unlimited()).search_root(&b, 3));
                assert_eq!(a, c, "{strategy:?} on {b:?}");
            }
        }
    }

    #[test]
    fn chance_weights_sum_to_one() {
        let one_empty = Board::from_raw(0x1212_2121_1212_2120);
        let weights: Vec<f64> = chance_weights(&one_empty).into_iter().map(|(_, w)| w).collect();
        assert_eq!(weights.len(), 2);
        assert!((weights[0] - 0.9).abs() < 1e-12);
        assert!((weights[1] - 0.1).abs() < 1e-12);

        for b in boards() {
            let total: f64 = chance_weights(&b).iter().map(|(_, w)| w).sum();
            assert_eq!(chance_weights(&b).len(), 2 * b.count_empty());
            assert!((total - 1.0).abs() < 1e-12);
        }
        assert!(chance_weights(&Board::from_raw(0x1212_2121_1212_2121)).is_empty());
    }

    #[test]
    fn single_empty_cell_expectation() {
        // Post-move board with one hole; depth 2 reaches the spawned boards at depth 0.
        let after = Board::from_raw(0x1234_2341_3412_4120).with_score(64);
        let spawn2 = Board::from_raw(0x1234_2341_3412_4121).with_score(64);
        let spawn4 = Board::from_raw(0x1234_2341_3412_4122).with_score(64);

        let cfg = config(Strategy::Stochastic, MoveOrder::ByScore);
        let e = Evaluator::new(cfg.weights);
        let mut engine = searcher(&cfg, PollBudget::unlimited());
        let got = engine.chance_node(&after, 1, f64::NEG_INFINITY, f64::INFINITY);
        assert_eq!(got, Eval::Value(0.9 * e.leaf(&spawn2) + 0.1 * e.leaf(&spawn4)));

        let cfg = config(Strategy::Adversarial, MoveOrder::ByScore);
        let mut engine = searcher(&cfg, PollBudget::unlimited());
        let got = engine.chance_node(&after, 1, f64::NEG_INFINITY, f64::INFINITY);
        assert_eq!(got, Eval::Value(e.leaf(&spawn2).min(e.leaf(&spawn4))));
    }

    #[test]
    fn depth_zero_is_the_static_value() {
        let cfg = config(Strategy::Stochastic, MoveOrder::ByScore);
        let e = Evaluator::new(cfg.weights);
        for b in boards() {
            let mut engine = searcher(&cfg, PollBudget::unlimited());
            assert_eq!(engine.evaluate_at_depth(&b, 0), Eval::Value(e.evaluate(&b)));
        }
        let over = Board::from_raw(0x1212_2121_1212_2121).with_score(512);
        for depth in [0, 3] {
            let mut engine = searcher(&cfg, PollBudget::unlimited());
            assert_eq!(engine.evaluate_at_depth(&over, depth), Eval::Value(512.0));
        }
    }

    #[test]
    fn expiry_propagates_instead_of_a_value() {
        let b = boards()[1];
        for strategy in [Strategy::Adversarial, Strategy::Stochastic] {
            let cfg = config(strategy, MoveOrder::ByScore);
            for limit in [0, 1, 5, 20] {
                let mut engine = searcher(&cfg, PollBudget::new(limit));
                assert!(matches!(engine.search_root(&b, 3), Some(DepthReport::Expired { depth: 3, .. })));
                let mut engine = searcher(&cfg, PollBudget::new(limit));
                assert_eq!(engine.evaluate_at_depth(&b, 3), Eval::Expired);
            }
        }
    }

    #[test]
    fn no_legal_move_has_no_report() {
        let cfg = config(Strategy::Stochastic, MoveOrder::ByScore);
        let mut engine = searcher(&cfg, PollBudget::unlimited());
        assert!(engine.search_root(&Board::from_raw(0x1212_2121_1212_2121), 2).is_none());
    }

    #[test]
    fn counts_cover_root_and_children() {
        let cfg = config(Strategy::Stochastic, MoveOrder::ByScore);
        let b = boards()[0];
        let (_, _, counts) = completed_value(searcher(&cfg, PollBudget::unlimited()).search_root(&b, 1));
        let moves = b.legal_actions().len() as u64;
        assert_eq!(counts, NodeCounts { nodes: 1 + moves, parents: 1, children: moves });
    }
}
