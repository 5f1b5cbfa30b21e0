//! Monte Carlo Tree Search over a game graph where transpositions (identical
//! positions reached through different move orders) share a single node. For
//! more information, see [README].
//!
//! The building blocks are:
//!
//! - [`environment::GameState`]: the contract a game has to implement to be
//!   searched.
//! - [`search::SearchGraph`]: the transposition table owning the search
//!   graph, with the MCTS driver on top of it.
//! - [`search::SearchNode`]: per-position statistics, selection, expansion,
//!   backpropagation and pruning.
//! - [`games`]: games the engine can play out of the box.
//!
//! [README]: https://github.com/kirillbobyrev/mcdag/blob/main/README.md

pub mod environment;
pub mod games;
pub mod search;

mod engine;
pub use engine::{Engine, Options};
use shadow_rs::shadow;

shadow!(build);

/// Build type and target. Produced by `build.rs`.
const FEATURES: &str = include_str!(concat!(env!("OUT_DIR"), "/features"));

/// Returns the full engine version that can be used to identify how it was
/// built in the first place.
fn engine_version() -> String {
    format!(
        "{} (commit {}, branch {})",
        build::PKG_VERSION,
        build::SHORT_COMMIT,
        build::BRANCH
    )
}

/// Prints information about the engine version and the repository on
/// startup.
pub fn print_engine_info() {
    println!("mcdag {}", engine_version());
    println!("<https://github.com/kirillbobyrev/mcdag>");
}

/// Prints the build type, target and whether the build is clean.
pub fn print_binary_info() {
    println!("Release build: {}", !shadow_rs::is_debug());
    println!("Target: {FEATURES}");
    if !shadow_rs::git_clean() {
        println!("Warning: built with uncommitted changes");
    }
    println!();
}
