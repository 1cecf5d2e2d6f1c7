//! Newtype wrappers for Q-table keys and key derivation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    tictactoe::{BoardState, CELL_COUNT, CanonicalContext, Cell, Player},
};

/// Compact, hashable key for a board position.
///
/// The 25 cells are packed in base 3 (empty = 0, X = 1, O = 2) with cell
/// (0, 0) as the most significant digit. The player to move is implied by
/// the piece counts, since X always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(u64);

impl StateKey {
    pub fn from_cells(cells: &[Cell; CELL_COUNT]) -> Self {
        StateKey(cells.iter().fold(0u64, |acc, &cell| {
            acc * 3
                + match cell {
                    Cell::Empty => 0,
                    Cell::X => 1,
                    Cell::O => 2,
                }
        }))
    }

    /// Raw packed value
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Unpack the cells
    pub fn cells(&self) -> [Cell; CELL_COUNT] {
        let mut cells = [Cell::Empty; CELL_COUNT];
        let mut rest = self.0;
        for cell in cells.iter_mut().rev() {
            *cell = match rest % 3 {
                1 => Cell::X,
                2 => Cell::O,
                _ => Cell::Empty,
            };
            rest /= 3;
        }
        cells
    }

    /// Player to move, derived from piece parity
    pub fn to_move(&self) -> Player {
        let cells = self.cells();
        let x = cells.iter().filter(|&&c| c == Cell::X).count();
        let o = cells.iter().filter(|&&c| c == Cell::O).count();
        if x > o { Player::O } else { Player::X }
    }

    /// Label form `<25 cells>_<player to move>`
    pub fn label(&self) -> String {
        format!(
            "{}_{}",
            self.cells().iter().map(|&c| c.to_char()).collect::<String>(),
            self.to_move().symbol()
        )
    }

    /// Parse a label produced by [`label`](Self::label) or [`BoardState::encode`].
    ///
    /// # Errors
    ///
    /// Returns error if the label is malformed or the suffix disagrees with
    /// the piece counts.
    pub fn parse(label: &str) -> Result<Self> {
        let invalid = || Error::InvalidLabelFormat {
            label: label.to_string(),
            expected: format!("{}_P", ".".repeat(CELL_COUNT)),
        };

        let (board, player) = label.split_once('_').ok_or_else(invalid)?;
        if board.chars().count() != CELL_COUNT {
            return Err(invalid());
        }

        let state = BoardState::from_string(board)?;
        if player != state.to_move.symbol().to_string() {
            return Err(invalid());
        }

        Ok(state.key())
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// How boards are turned into Q-table keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StateEncoding {
    /// The flattened board as-is
    #[default]
    Raw,
    /// The D4-canonical board; actions are mapped into and out of canonical
    /// coordinates around every lookup
    Symmetric,
}

impl StateEncoding {
    pub fn context(self, state: &BoardState) -> CanonicalContext {
        match self {
            StateEncoding::Raw => state.identity_context(),
            StateEncoding::Symmetric => state.canonical_context(),
        }
    }
}

impl std::str::FromStr for StateEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(StateEncoding::Raw),
            "symmetric" | "d4" => Ok(StateEncoding::Symmetric),
            other => Err(Error::config(format!(
                "unknown state encoding '{other}' (expected 'raw' or 'symmetric')"
            ))),
        }
    }
}

impl fmt::Display for StateEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateEncoding::Raw => write!(f, "raw"),
            StateEncoding::Symmetric => write!(f, "symmetric"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tictactoe::Action;

    #[test]
    fn test_empty_board_key_is_zero() {
        assert_eq!(BoardState::new().key().value(), 0);
    }

    #[test]
    fn test_key_round_trips_cells() {
        let board = BoardState::new()
            .apply(Action::new(0, 0))
            .unwrap()
            .apply(Action::new(4, 4))
            .unwrap()
            .apply(Action::center())
            .unwrap();
        let key = board.key();
        assert_eq!(key.cells(), board.cells);
        assert_eq!(key.to_move(), Player::O);
        assert_eq!(key.label(), board.encode());
    }

    #[test]
    fn test_parse_label() {
        let board = BoardState::new().apply(Action::new(1, 2)).unwrap();
        let key = StateKey::parse(&board.encode()).unwrap();
        assert_eq!(key, board.key());

        assert!(StateKey::parse("X").is_err());
        let wrong_turn = format!("X{}_X", ".".repeat(24));
        assert!(StateKey::parse(&wrong_turn).is_err());
    }

    #[test]
    fn test_distinct_boards_have_distinct_keys() {
        let a = BoardState::new().apply(Action::new(0, 0)).unwrap();
        let b = BoardState::new().apply(Action::new(0, 1)).unwrap();
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_encoding_contexts() {
        let board = BoardState::new().apply(Action::new(4, 4)).unwrap();
        let raw = StateEncoding::Raw.context(&board);
        assert_eq!(raw.key, board.key());

        let symmetric = StateEncoding::Symmetric.context(&board);
        let corner = BoardState::new().apply(Action::new(0, 0)).unwrap();
        assert_eq!(symmetric.key, StateEncoding::Symmetric.context(&corner).key);
    }
}
