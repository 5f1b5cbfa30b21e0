//! Plays tic-tac-toe games between two search configurations and reports the
//! score of the first one. Useful for checking that a change in search
//! parameters (or the prune rule) does not weaken the engine.

use anyhow::bail;
use clap::Parser;
use log::{debug, info};
use mcdag::environment::{GameResult, GameState, Player};
use mcdag::games::tictactoe::Board;
use mcdag::search::{Config, PruneRule, SearchGraph};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of games. Players swap sides every game.
    #[arg(long, default_value_t = 100)]
    games: u64,
    /// Search iterations per move of the first player.
    #[arg(long, default_value_t = 1_000)]
    iterations: usize,
    /// Search iterations per move of the second player.
    #[arg(long, default_value_t = 1_000)]
    opponent_iterations: usize,
    #[arg(long, default_value_t = Config::EXPLORATION)]
    exploration: f32,
    #[arg(long, default_value_t = Config::EXPLORATION)]
    opponent_exploration: f32,
    #[arg(long, default_value_t = PruneRule::default())]
    prune_rule: PruneRule,
    #[arg(long, default_value_t = PruneRule::default())]
    opponent_prune_rule: PruneRule,
    /// Transposition table budget of both players, enforced after every move.
    #[arg(long, default_value_t = 10_000)]
    max_table_size: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

struct Contestant {
    graph: SearchGraph<Board>,
    iterations: usize,
}

/// Plays a single game and returns the result for the first contestant.
fn play_game(args: &Args, game: u64) -> anyhow::Result<GameResult> {
    let mut rng = StdRng::seed_from_u64(args.seed.wrapping_add(game));
    let first = Contestant {
        graph: SearchGraph::new(Config {
            exploration: args.exploration,
            prune_rule: args.prune_rule,
            ..Config::default()
        }),
        iterations: args.iterations,
    };
    let second = Contestant {
        graph: SearchGraph::new(Config {
            exploration: args.opponent_exploration,
            prune_rule: args.opponent_prune_rule,
            ..Config::default()
        }),
        iterations: args.opponent_iterations,
    };
    let first_side = if game % 2 == 0 {
        Player::First
    } else {
        Player::Second
    };

    let mut position = Board::starting();
    while !position.is_terminal() {
        let to_move = if position.player() == first_side {
            &first
        } else {
            &second
        };
        let root = to_move
            .graph
            .run_search_with_rng(position, to_move.iterations, &mut rng);
        let Some(action) = root.get_move() else {
            bail!("no move found in position {}", position.compact());
        };
        debug!("Game {game}: {} plays {action}", position.player());
        drop(root);
        position = position.apply(action);
        // Both players keep what they know about the position on the board.
        for contestant in [&first, &second] {
            let played = contestant.graph.get_or_create_node(position, None);
            played.prune_ancestors();
            contestant.graph.prune_from(&played, args.max_table_size);
            // The position might be new to this player: then the old graph
            // is disconnected from it and still has to fit the budget.
            contestant.graph.prune(args.max_table_size);
        }
    }
    let Some(outcome) = position.outcome() else {
        bail!("the game ended without an outcome");
    };
    info!("Game {game} is over: {}", position.compact());
    Ok(outcome.relative_to(first_side))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    if args.games == 0 {
        bail!("at least one game should be played");
    }

    let results = (0..args.games)
        .into_par_iter()
        .map(|game| play_game(&args, game))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let count = |expected: GameResult| results.iter().filter(|&&r| r == expected).count();
    let (wins, ties, losses) = (
        count(GameResult::Win),
        count(GameResult::Tie),
        count(GameResult::Loss),
    );
    println!("Games: {}", results.len());
    println!("Wins: {wins}, ties: {ties}, losses: {losses}");
    println!(
        "Score: {:.1}%",
        100.0 * (wins as f64 + 0.5 * ties as f64) / results.len() as f64
    );
    Ok(())
}
