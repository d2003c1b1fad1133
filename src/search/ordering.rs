use serde::{Deserialize, Serialize};

use crate::game::{Game, MoveResult};

/// Order in which a node tries its moves. Only the amount of pruning depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOrder {
    /// The action type's own `Ord` order.
    Static,
    /// Highest resulting score first; ties keep the static order.
    #[default]
    ByScore,
}

impl MoveOrder {
    /// Legal moves of `board`, ordered, each with its result.
    pub fn children<G: Game>(&self, board: &G) -> Vec<(G::Action, MoveResult<G>)> {
        let mut actions = board.legal_actions();
        actions.sort();
        let mut children: Vec<_> = actions.into_iter().map(|a| (a, board.apply(a))).collect();
        if let MoveOrder::ByScore = self {
            // stable: equal scores stay in static order
            children.sort_by(|(_, x), (_, y)| y.board.score().cmp(&x.board.score()));
        }
        children
    }

    pub fn order<G: Game>(&self, board: &G) -> Vec<G::Action> {
        self.children(board).into_iter().map(|(a, _)| a).collect()
    }
}
