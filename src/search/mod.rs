//! Implements [Monte Carlo Tree Search] (MCTS) over a search graph.
//!
//! Positions reached via different move orders ([transpositions]) share a
//! single [`SearchNode`], so the "tree" is really a directed acyclic graph:
//! parents own their children and children refer back to their parents
//! weakly. Each search iteration performs four steps:
//!
//! 1. Selection: starting from the root, descend to the child with the best
//!    PUCT score until an unexpanded node is reached.
//! 2. Simulation: play random moves from the selected leaf until the game is
//!    over.
//! 3. Backpropagation: update win/tie statistics of every node on the path.
//! 4. Expansion: add one layer of children below the leaf.
//!
//! Memory is reclaimed by "filicide": dropping the children of a node
//! releases their subtrees and removes their transposition table entries.
//!
//! [Monte Carlo Tree Search]: https://en.wikipedia.org/wiki/Monte_Carlo_tree_search
//! [transpositions]: https://www.chessprogramming.org/Transposition

use std::fmt;
use std::str::FromStr;

use anyhow::bail;

mod graph;
mod node;
mod policy;
pub mod rollout;
mod transposition;

pub use graph::SearchGraph;
pub use node::SearchNode;
pub use policy::Policy;

/// Parameters of the search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Exploration constant (`C` in the PUCT formula).
    pub exploration: f32,
    /// Reward for a tied game; a win is worth `1` and a loss is worth `0`.
    pub tie_reward: f32,
    /// Added to every policy weight so that hopeless moves keep a non-zero
    /// preference.
    pub policy_epsilon: f32,
    /// Which children survive [`SearchGraph::prune`].
    pub prune_rule: PruneRule,
}

impl Config {
    /// UCT exploration constant, roughly `sqrt(2)`.
    pub const EXPLORATION: f32 = 1.44;
    #[allow(missing_docs)]
    pub const TIE_REWARD: f32 = 0.5;
    #[allow(missing_docs)]
    pub const POLICY_EPSILON: f32 = 0.000_01;
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exploration: Self::EXPLORATION,
            tie_reward: Self::TIE_REWARD,
            policy_epsilon: Self::POLICY_EPSILON,
            prune_rule: PruneRule::default(),
        }
    }
}

/// Decides which children of a node are filicided by [`SearchGraph::prune`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PruneRule {
    /// Keep the most visited child (the first one on ties) and filicide all of
    /// its siblings.
    #[default]
    MostVisitedSibling,
    /// Compare every child against the visit count of the parent itself and
    /// filicide each child that has not been visited more than the parent.
    /// Since selection visits the parent at least as often as any child, this
    /// discards almost every subtree.
    ParentVisits,
}

impl FromStr for PruneRule {
    type Err = anyhow::Error;

    fn from_str(rule: &str) -> anyhow::Result<Self> {
        match rule {
            "sibling" => Ok(Self::MostVisitedSibling),
            "parent" => Ok(Self::ParentVisits),
            _ => bail!("prune rule should be 'sibling' or 'parent', got '{rule}'"),
        }
    }
}

impl fmt::Display for PruneRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match &self {
                Self::MostVisitedSibling => "sibling",
                Self::ParentVisits => "parent",
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!((config.exploration - 1.44).abs() < f32::EPSILON);
        assert!((config.tie_reward - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.prune_rule, PruneRule::MostVisitedSibling);
    }

    #[test]
    fn parse_prune_rule() {
        assert_eq!(
            "sibling".parse::<PruneRule>().unwrap(),
            PruneRule::MostVisitedSibling
        );
        assert_eq!("parent".parse::<PruneRule>().unwrap(), PruneRule::ParentVisits);
        assert!("none".parse::<PruneRule>().is_err());
        assert_eq!(PruneRule::ParentVisits.to_string(), "parent");
    }
}
