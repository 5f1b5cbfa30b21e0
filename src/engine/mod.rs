//! The engine puts all pieces together: it keeps the current position and the
//! search graph between commands, so consecutive searches along a game reuse
//! everything learned so far.
//!
//! [`Engine::run`] is the "main loop" of the engine which reads commands from
//! the input stream and writes responses to the output stream.
use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::bail;
use itertools::Itertools;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::engine::protocol::Command;
use crate::environment::GameState;
use crate::games::tictactoe::{Board, Square};
use crate::search::{Config, SearchGraph, SearchNode};

mod protocol;

/// Search settings of the engine.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    /// Iterations per `go` unless the command overrides it.
    pub iterations: usize,
    /// Transposition table budget enforced after every played move.
    pub max_table_size: usize,
    /// Seed for the rollouts, random if not set.
    pub seed: Option<u64>,
    #[allow(missing_docs)]
    pub config: Config,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            max_table_size: 100_000,
            seed: None,
            config: Config::default(),
        }
    }
}

/// The Engine handles commands and owns the search state, including I/O.
pub struct Engine<'a, R: BufRead, W: Write> {
    position: Board,
    graph: SearchGraph<Board>,
    /// Node of the last searched position.
    root: Option<Arc<SearchNode<Board>>>,
    options: Options,
    rng: StdRng,
    input: &'a mut R,
    output: &'a mut W,
}

impl<'a, R: BufRead, W: Write> Engine<'a, R, W> {
    /// Creates a new instance of the engine with the starting position and
    /// provided I/O.
    #[must_use]
    pub fn new(options: Options, input: &'a mut R, output: &'a mut W) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            position: Board::starting(),
            graph: SearchGraph::new(options.config),
            root: None,
            options,
            rng,
            input,
            output,
        }
    }

    /// Continuously reads the input stream and executes commands until
    /// "quit" is sent or the input ends.
    ///
    /// Malformed commands are reported with `info string` and otherwise
    /// ignored.
    pub fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            match Command::parse(&line) {
                Command::IsReady => writeln!(self.output, "readyok")?,
                Command::SetPosition { board, moves } => {
                    self.handle_position(board.as_deref(), &moves)?;
                },
                Command::Go { iterations } => self.handle_go(iterations)?,
                Command::Policy => self.handle_policy()?,
                Command::Play { square } => self.handle_play(&square)?,
                Command::Display => writeln!(self.output, "{}", self.position)?,
                Command::Moves => writeln!(
                    self.output,
                    "{}",
                    self.position.legal_moves().iter().join(" ")
                )?,
                Command::Stats => self.handle_stats()?,
                Command::Quit => break,
                Command::Unknown(command) => {
                    writeln!(self.output, "info string Unsupported command: {command}")?;
                },
            }
            self.output.flush()?;
        }
        Ok(())
    }

    /// Changes the position to the one specified in the command. The
    /// position is left unchanged if the command is invalid.
    fn handle_position(&mut self, board: Option<&str>, moves: &[String]) -> anyhow::Result<()> {
        match parse_position(board, moves) {
            Ok(position) => self.position = position,
            Err(e) => writeln!(self.output, "info string Invalid position: {e}")?,
        }
        self.root = None;
        Ok(())
    }

    fn handle_go(&mut self, iterations: Option<usize>) -> anyhow::Result<()> {
        if self.position.is_terminal() {
            writeln!(self.output, "info string The game is over")?;
            writeln!(self.output, "bestmove none")?;
            return Ok(());
        }
        let iterations = iterations.unwrap_or(self.options.iterations);
        let root = self
            .graph
            .run_search_with_rng(self.position, iterations, &mut self.rng);
        writeln!(
            self.output,
            "info iterations {iterations} visits {} value {:.3} nodes {} hitrate {:.3} purges {}",
            root.visits(),
            root.q(),
            self.graph.size(),
            self.graph.transposition_hit_rate(),
            self.graph.purge_count(),
        )?;
        match root.get_move() {
            Some(best) => writeln!(self.output, "bestmove {best}")?,
            None => writeln!(self.output, "bestmove none")?,
        }
        self.root = Some(root);
        Ok(())
    }

    fn handle_policy(&mut self) -> anyhow::Result<()> {
        match &self.root {
            Some(root) => writeln!(self.output, "info policy {}", root.get_policy().normalized())?,
            None => writeln!(self.output, "info string No search was run in this position")?,
        }
        Ok(())
    }

    /// Commits a move: the graph is collapsed around the played line and
    /// trimmed to the table budget.
    fn handle_play(&mut self, square: &str) -> anyhow::Result<()> {
        let square = match parse_move(&self.position, square) {
            Ok(square) => square,
            Err(e) => {
                writeln!(self.output, "info string {e}")?;
                return Ok(());
            },
        };
        self.position = self.position.apply(square);
        match self.root.take().and_then(|root| root.child(square)) {
            Some(played) => {
                debug!("Collapsing the graph around the played move {square}");
                played.prune_ancestors();
                self.graph.prune_from(&played, self.options.max_table_size);
            },
            None => self.graph.prune(self.options.max_table_size),
        }
        info!(
            "Played {square}: {} nodes left, {} purged so far",
            self.graph.size(),
            self.graph.purge_count()
        );
        writeln!(self.output, "{}", self.position.compact())?;
        Ok(())
    }

    fn handle_stats(&mut self) -> anyhow::Result<()> {
        writeln!(
            self.output,
            "info nodes {} lookups {} hits {} hitrate {:.3} purges {}",
            self.graph.size(),
            self.graph.lookup_count(),
            self.graph.hit_count(),
            self.graph.transposition_hit_rate(),
            self.graph.purge_count(),
        )?;
        Ok(())
    }
}

/// Parses `square` and checks that it is a legal move in `position`.
fn parse_move(position: &Board, square: &str) -> anyhow::Result<Square> {
    let square = Square::try_from(square)?;
    if !position.legal_moves().contains(&square) {
        bail!("illegal move {square} in position {}", position.compact());
    }
    Ok(square)
}

fn parse_position(board: Option<&str>, moves: &[String]) -> anyhow::Result<Board> {
    let mut position = match board {
        Some(board) => Board::try_from(board)?,
        None => Board::starting(),
    };
    for next_move in moves {
        let square = parse_move(&position, next_move)?;
        position = position.apply(square);
    }
    Ok(position)
}
