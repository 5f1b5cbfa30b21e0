//! Classic 3×3 [Tic-tac-toe] with bitboard representation.
//!
//! The board is small enough for the whole game tree to be searched, which
//! makes it a convenient sanity check: perfect play is a tie and the search
//! should always find immediate wins and forced blocks.
//!
//! [Tic-tac-toe]: https://en.wikipedia.org/wiki/Tic-tac-toe

use std::fmt;

use anyhow::{bail, Context};
use itertools::Itertools;

use crate::environment::{GameState, Outcome, Player};

#[allow(missing_docs)]
pub const BOARD_WIDTH: u8 = 3;
#[allow(missing_docs)]
pub const BOARD_SIZE: u8 = BOARD_WIDTH * BOARD_WIDTH;

/// All rows, columns and diagonals as square masks.
const LINES: [u16; 8] = [
    0b000_000_111,
    0b000_111_000,
    0b111_000_000,
    0b001_001_001,
    0b010_010_010,
    0b100_100_100,
    0b100_010_001,
    0b001_010_100,
];

const FULL: u16 = (1 << BOARD_SIZE) - 1;

/// Board cell, numbered row by row from the top left corner:
///
/// ```text
/// 0 1 2
/// 3 4 5
/// 6 7 8
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    const fn mask(self) -> u16 {
        1 << self.0
    }

    /// Iterates over all squares in index order.
    pub fn iter() -> impl Iterator<Item = Self> {
        (0..BOARD_SIZE).map(Self)
    }
}

impl TryFrom<u8> for Square {
    type Error = anyhow::Error;

    fn try_from(index: u8) -> anyhow::Result<Self> {
        if index >= BOARD_SIZE {
            bail!("square index should be in 0..{BOARD_SIZE}, got {index}");
        }
        Ok(Self(index))
    }
}

impl TryFrom<&str> for Square {
    type Error = anyhow::Error;

    fn try_from(square: &str) -> anyhow::Result<Self> {
        let index: u8 = square
            .trim()
            .parse()
            .with_context(|| format!("square should be a number, got '{square}'"))?;
        Self::try_from(index)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tic-tac-toe position. [`Player::First`] plays `X` and moves first, so the
/// side to move is derived from the piece counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Board {
    first: u16,
    second: u16,
}

impl Board {
    /// Returns the empty board.
    #[must_use]
    pub const fn starting() -> Self {
        Self {
            first: 0,
            second: 0,
        }
    }

    /// Returns the piece occupying the square, if any.
    #[must_use]
    pub const fn at(&self, square: Square) -> Option<Player> {
        if self.first & square.mask() != 0 {
            Some(Player::First)
        } else if self.second & square.mask() != 0 {
            Some(Player::Second)
        } else {
            None
        }
    }

    const fn occupied(&self) -> u16 {
        self.first | self.second
    }

    fn completes_line(pieces: u16) -> bool {
        LINES.iter().any(|&line| pieces & line == line)
    }

    /// Serializes the board in the compact one-line form accepted by
    /// [`Board::try_from`], e.g. `XX.OO....`.
    #[must_use]
    pub fn compact(&self) -> String {
        Square::iter().map(|square| symbol(self.at(square))).collect()
    }
}

const fn symbol(piece: Option<Player>) -> char {
    match piece {
        Some(Player::First) => 'X',
        Some(Player::Second) => 'O',
        None => '.',
    }
}

impl GameState for Board {
    type Move = Square;

    fn player(&self) -> Player {
        if self.first.count_ones() == self.second.count_ones() {
            Player::First
        } else {
            Player::Second
        }
    }

    fn legal_moves(&self) -> Vec<Square> {
        if self.is_terminal() {
            return vec![];
        }
        Square::iter()
            .filter(|square| self.occupied() & square.mask() == 0)
            .collect()
    }

    fn apply(&self, action: Square) -> Self {
        debug_assert!(self.at(action).is_none(), "{action} is occupied");
        let mut next = *self;
        match self.player() {
            Player::First => next.first |= action.mask(),
            Player::Second => next.second |= action.mask(),
        }
        next
    }

    fn outcome(&self) -> Option<Outcome> {
        if Self::completes_line(self.first) {
            Some(Outcome::Winner(Player::First))
        } else if Self::completes_line(self.second) {
            Some(Outcome::Winner(Player::Second))
        } else if self.occupied() == FULL {
            Some(Outcome::Tie)
        } else {
            None
        }
    }
}

impl TryFrom<&str> for Board {
    type Error = anyhow::Error;

    /// Parses the board from nine cells (`X`, `O` or `.`) listed row by row.
    /// Whitespace and `/` row separators are ignored.
    fn try_from(input: &str) -> anyhow::Result<Self> {
        let cells = input
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '/')
            .collect_vec();
        if cells.len() != BOARD_SIZE as usize {
            bail!(
                "board should have {BOARD_SIZE} cells, got {}: '{input}'",
                cells.len()
            );
        }
        let mut board = Self::starting();
        for (square, cell) in Square::iter().zip(cells) {
            match cell {
                'X' | 'x' => board.first |= square.mask(),
                'O' | 'o' => board.second |= square.mask(),
                '.' | '-' | '_' => {},
                _ => bail!("unexpected cell '{cell}' at square {square}"),
            }
        }
        let (first, second) = (board.first.count_ones(), board.second.count_ones());
        if first != second && first != second + 1 {
            bail!("X moves first: expected X count to be O count or one more, got {first} X and {second} O");
        }
        if Self::completes_line(board.first) && Self::completes_line(board.second) {
            bail!("both players can not have three in a row");
        }
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = (0..BOARD_WIDTH)
            .map(|row| {
                (0..BOARD_WIDTH)
                    .map(|column| symbol(self.at(Square(row * BOARD_WIDTH + column))))
                    .join(" ")
            })
            .join("\n");
        write!(f, "{rows}")
    }
}
