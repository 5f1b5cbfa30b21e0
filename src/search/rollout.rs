//! Random playouts used to estimate the value of a leaf.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::environment::GameState;

/// Plays uniformly random legal moves from `state` until the game is over and
/// returns the final position.
///
/// A non-terminal position without legal moves violates the [`GameState`]
/// contract; the rollout stops there and the result is not terminal.
pub fn simulate<S: GameState, R: Rng + ?Sized>(state: &S, rng: &mut R) -> S {
    let mut current = state.clone();
    while !current.is_terminal() {
        let Some(&action) = current.legal_moves().choose(rng) else {
            break;
        };
        current = current.apply(action);
    }
    current
}
