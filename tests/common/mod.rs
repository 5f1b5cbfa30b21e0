use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use mcdag::environment::{GameState, Outcome, Player};
use mcdag::games::tictactoe::Square;
use mcdag::search::SearchNode;

#[allow(dead_code)]
/// The shortest possible game: the first player makes the only move and wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Duel {
    Start,
    Over,
}

impl GameState for Duel {
    type Move = u8;

    fn player(&self) -> Player {
        match self {
            Self::Start => Player::First,
            Self::Over => Player::Second,
        }
    }

    fn legal_moves(&self) -> Vec<u8> {
        match self {
            Self::Start => vec![0],
            Self::Over => vec![],
        }
    }

    fn apply(&self, _action: u8) -> Self {
        Self::Over
    }

    fn outcome(&self) -> Option<Outcome> {
        match self {
            Self::Start => None,
            Self::Over => Some(Outcome::Winner(Player::First)),
        }
    }
}

#[allow(dead_code)]
pub(crate) fn square(index: u8) -> Square {
    Square::try_from(index).expect("valid square")
}

/// Collects every node reachable from `root` through the children links,
/// each one exactly once.
#[allow(dead_code)]
pub(crate) fn reachable<S: GameState>(root: &Arc<SearchNode<S>>) -> Vec<Arc<SearchNode<S>>> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([Arc::clone(root)]);
    let mut nodes = vec![];
    while let Some(node) = queue.pop_front() {
        if !seen.insert(Arc::as_ptr(&node)) {
            continue;
        }
        queue.extend(node.children());
        nodes.push(node);
    }
    nodes
}

/// Checks the invariants that hold for every node of a quiescent graph.
#[allow(dead_code)]
pub(crate) fn check_invariants<S: GameState>(root: &Arc<SearchNode<S>>) {
    for node in reachable(root) {
        assert!(node.wins() + node.ties() <= node.visits());
        if node.is_expanded() {
            // Expansion counts a visit of its own.
            assert!(node.visits() > 0);
        }
        let q = node.q();
        assert!((0.0..=1.0).contains(&q), "Q = {q} is out of bounds");
        let children = node.children();
        if node.is_expanded() {
            assert_eq!(children.len(), node.moves().len());
            for (&action, child) in node.moves().iter().zip(&children) {
                assert!(child.state() == &node.state().apply(action));
                assert!(
                    child
                        .parents()
                        .iter()
                        .any(|parent| Arc::ptr_eq(parent, &node)),
                    "a child must refer back to its parent"
                );
            }
        } else {
            assert!(children.is_empty());
        }
        if node.state().is_terminal() {
            assert!(!node.is_expanded());
        }
    }
}
