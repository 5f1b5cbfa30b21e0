//! Interface between the search and the game rules implementation.
//!
//! The search never looks inside a position: it only needs to know who is to
//! move, which moves are legal, how to apply them and whether the game is
//! over. Anything implementing [`GameState`] can be searched.

use std::fmt;
use std::hash::Hash;
use std::ops::Not;

/// Games are played between two players. [`Player::First`] makes the first
/// move from the starting position.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    First,
    Second,
}

impl Not for Player {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match &self {
                Self::First => '1',
                Self::Second => '2',
            }
        )
    }
}

/// Final state of a finished game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Nobody won.
    Tie,
    /// Given player won.
    Winner(Player),
}

impl Outcome {
    /// Converts the absolute outcome to the result from `player`'s
    /// perspective.
    #[must_use]
    pub fn relative_to(self, player: Player) -> GameResult {
        match self {
            Self::Tie => GameResult::Tie,
            Self::Winner(winner) if winner == player => GameResult::Win,
            Self::Winner(_) => GameResult::Loss,
        }
    }
}

/// Result of the game from the perspective of a particular player.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Win,
    Tie,
    Loss,
}

/// Immutable game position. The rules engine is an external collaborator: the
/// search only consumes this narrow contract.
///
/// Equal positions must hash identically: the transposition table relies on
/// it to merge positions reached via different move orders into one node.
pub trait GameState: Clone + Eq + Hash {
    /// Opaque identifier of a legal transition.
    type Move: Copy + Eq + Hash + fmt::Debug;

    /// Returns the player to move.
    fn player(&self) -> Player;

    /// Returns legal moves in a stable order. Terminal positions have none.
    fn legal_moves(&self) -> Vec<Self::Move>;

    /// Returns the position after making `action`. Does not mutate `self`.
    fn apply(&self, action: Self::Move) -> Self;

    /// Returns the outcome if the game is over.
    fn outcome(&self) -> Option<Outcome>;

    /// Returns `true` if the game is over.
    fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }
}
