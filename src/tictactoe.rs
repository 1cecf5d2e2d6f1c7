//! 5x5 Tic-Tac-Toe game implementation

pub mod board;
pub mod game;
pub mod lines;
pub mod symmetry;

pub use board::{Action, BOARD_SIDE, BoardState, CELL_COUNT, Cell, Player, TerminalStatus, WinRule};
pub use game::{Game, GameOutcome, Move};
pub use lines::LineAnalyzer;
pub use symmetry::{CanonicalContext, D4Transform};
