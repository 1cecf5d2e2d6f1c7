//! Board state representation and basic operations

use std::fmt;

use serde::{Deserialize, Serialize};

use super::lines::LineAnalyzer;
use crate::{Error, Result, types::StateKey};

/// Number of rows (and columns) on the board.
pub const BOARD_SIDE: usize = 5;

/// Number of cells on the board.
pub const CELL_COUNT: usize = BOARD_SIDE * BOARD_SIDE;

/// A cell on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    X,
    O,
}

impl Cell {
    pub fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }

    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            '.' | '-' => Some(Cell::Empty),
            'X' | 'x' => Some(Cell::X),
            'O' | 'o' | '0' => Some(Cell::O),
            _ => None,
        }
    }

    pub fn to_player(self) -> Option<Player> {
        match self {
            Cell::X => Some(Player::X),
            Cell::O => Some(Player::O),
            Cell::Empty => None,
        }
    }
}

/// A player in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    X,
    O,
}

impl Player {
    /// Get the opponent player
    pub fn opponent(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// Convert player to cell
    pub fn to_cell(self) -> Cell {
        match self {
            Player::X => Cell::X,
            Player::O => Cell::O,
        }
    }

    pub fn symbol(self) -> char {
        self.to_cell().to_char()
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Which alignments end the game.
///
/// `FourInARow` counts any four consecutive marks horizontally, vertically or
/// diagonally (28 lines). `FiveInARow` only counts complete rows, columns and
/// the two long diagonals (12 lines).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WinRule {
    #[default]
    FourInARow,
    FiveInARow,
}

impl WinRule {
    /// Number of aligned marks required to win
    pub fn line_length(self) -> usize {
        match self {
            WinRule::FourInARow => 4,
            WinRule::FiveInARow => 5,
        }
    }
}

impl std::str::FromStr for WinRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "4" | "four" | "four-in-a-row" => Ok(WinRule::FourInARow),
            "5" | "five" | "five-in-a-row" => Ok(WinRule::FiveInARow),
            other => Err(Error::config(format!(
                "unknown win rule '{other}' (expected 'four-in-a-row' or 'five-in-a-row')"
            ))),
        }
    }
}

impl fmt::Display for WinRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinRule::FourInARow => write!(f, "four-in-a-row"),
            WinRule::FiveInARow => write!(f, "five-in-a-row"),
        }
    }
}

/// A move target on the grid.
///
/// Coordinates outside the grid are representable so that
/// [`BoardState::apply`] can reject them with [`Error::IllegalMove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Action {
    pub row: usize,
    pub col: usize,
}

impl Action {
    pub const fn new(row: usize, col: usize) -> Self {
        Action { row, col }
    }

    /// Build an action from a row-major cell index
    pub fn from_index(index: usize) -> Option<Self> {
        (index < CELL_COUNT).then(|| Action::new(index / BOARD_SIDE, index % BOARD_SIDE))
    }

    /// Row-major cell index
    pub fn index(self) -> usize {
        self.row * BOARD_SIDE + self.col
    }

    pub fn in_bounds(self) -> bool {
        self.row < BOARD_SIDE && self.col < BOARD_SIDE
    }

    /// The center cell, (2, 2)
    pub const fn center() -> Self {
        Action::new(BOARD_SIDE / 2, BOARD_SIDE / 2)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Status of a board after the last move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalStatus {
    Ongoing,
    Win(Player),
    Draw,
}

impl TerminalStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TerminalStatus::Ongoing)
    }

    /// Final outcome, if the game is over
    pub fn outcome(self) -> Option<super::GameOutcome> {
        match self {
            TerminalStatus::Ongoing => None,
            TerminalStatus::Win(player) => Some(super::GameOutcome::Win(player)),
            TerminalStatus::Draw => Some(super::GameOutcome::Draw),
        }
    }
}

/// Complete board state: cells, whose turn it is and the rule in force.
///
/// `BoardState` is `Copy`; every move returns a new value and the original is
/// left untouched, so the same state always yields the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardState {
    pub cells: [Cell; CELL_COUNT],
    pub to_move: Player,
    pub rule: WinRule,
}

/// Count of each piece type on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PieceCount {
    x: usize,
    o: usize,
}

impl BoardState {
    /// Create a new empty board with X to move and the default rule
    pub fn new() -> Self {
        Self::with_rule(WinRule::default())
    }

    /// Create a new empty board with X to move under `rule`
    pub fn with_rule(rule: WinRule) -> Self {
        BoardState {
            cells: [Cell::Empty; CELL_COUNT],
            to_move: Player::X,
            rule,
        }
    }

    /// Empty board under the same rule as `self`
    #[must_use = "reset returns a new board state; the original is unchanged"]
    pub fn reset(&self) -> Self {
        Self::with_rule(self.rule)
    }

    fn count_pieces(cells: &[Cell; CELL_COUNT]) -> PieceCount {
        let mut count = PieceCount { x: 0, o: 0 };
        for cell in cells {
            match cell {
                Cell::X => count.x += 1,
                Cell::O => count.o += 1,
                Cell::Empty => {}
            }
        }
        count
    }

    /// Create a board from a string of 25 cell characters (whitespace ignored)
    /// under the default rule.
    ///
    /// The player to move is inferred from piece parity: X moves first.
    ///
    /// # Errors
    ///
    /// Returns error if fewer than 25 cells are given, a character is not a
    /// valid cell, or the piece counts break turn parity.
    pub fn from_string(s: &str) -> Result<Self> {
        Self::from_string_with_rule(s, WinRule::default())
    }

    pub fn from_string_with_rule(s: &str, rule: WinRule) -> Result<Self> {
        let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.len() < CELL_COUNT {
            return Err(Error::InvalidBoardLength {
                expected: CELL_COUNT,
                got: chars.len(),
                context: s.to_string(),
            });
        }

        let mut cells = [Cell::Empty; CELL_COUNT];
        for (i, &c) in chars.iter().take(CELL_COUNT).enumerate() {
            cells[i] = Cell::from_char(c).ok_or_else(|| Error::InvalidCellCharacter {
                character: c,
                position: i,
                context: s.to_string(),
            })?;
        }

        let to_move = Self::turn_from_cells(&cells)?;
        Ok(BoardState {
            cells,
            to_move,
            rule,
        })
    }

    /// Player to move implied by the piece counts
    pub(crate) fn turn_from_cells(cells: &[Cell; CELL_COUNT]) -> Result<Player> {
        let count = Self::count_pieces(cells);
        if count.x == count.o {
            Ok(Player::X)
        } else if count.x == count.o + 1 {
            Ok(Player::O)
        } else {
            Err(Error::InvalidPieceCounts {
                x_count: count.x,
                o_count: count.o,
            })
        }
    }

    /// Count the number of occupied cells on the board.
    pub fn occupied_count(&self) -> usize {
        let count = Self::count_pieces(&self.cells);
        count.x + count.o
    }

    /// Get the cell targeted by an in-bounds action
    pub fn get(&self, action: Action) -> Cell {
        self.cells[action.index()]
    }

    pub fn is_empty(&self, action: Action) -> bool {
        action.in_bounds() && self.get(action) == Cell::Empty
    }

    /// All empty cells in row-major order, regardless of game status
    pub fn empty_actions(&self) -> Vec<Action> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &cell)| cell == Cell::Empty)
            .filter_map(|(i, _)| Action::from_index(i))
            .collect()
    }

    /// Legal moves for the player to move, in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] when the game is already over.
    pub fn legal_actions(&self) -> Result<Vec<Action>> {
        if self.is_terminal() {
            return Err(Error::InvalidState {
                state: self.encode(),
            });
        }
        Ok(self.empty_actions())
    }

    /// Place the mark of the player to move and pass the turn.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalMove`] if the action is outside the grid or the
    /// cell is occupied, and [`Error::InvalidState`] if the game is over.
    #[must_use = "apply returns a new board state; the original is unchanged"]
    pub fn apply(&self, action: Action) -> Result<BoardState> {
        if !action.in_bounds() {
            return Err(Error::IllegalMove {
                row: action.row,
                col: action.col,
                reason: format!("outside the {BOARD_SIDE}x{BOARD_SIDE} grid"),
            });
        }

        if self.get(action) != Cell::Empty {
            return Err(Error::IllegalMove {
                row: action.row,
                col: action.col,
                reason: "cell is already occupied".to_string(),
            });
        }

        if self.is_terminal() {
            return Err(Error::InvalidState {
                state: self.encode(),
            });
        }

        let mut next = *self;
        next.cells[action.index()] = self.to_move.to_cell();
        next.to_move = self.to_move.opponent();
        Ok(next)
    }

    /// Like [`apply`](Self::apply) but also checks that `player` is on turn.
    #[must_use = "apply_as returns a new board state; the original is unchanged"]
    pub fn apply_as(&self, action: Action, player: Player) -> Result<BoardState> {
        if player != self.to_move {
            return Err(Error::IllegalMove {
                row: action.row,
                col: action.col,
                reason: format!("it is {}'s turn, not {player}'s", self.to_move),
            });
        }
        self.apply(action)
    }

    /// Check if a player has completed a line under the board's rule
    pub fn has_won(&self, player: Player) -> bool {
        LineAnalyzer::has_won(&self.cells, self.rule, player)
    }

    pub fn winner(&self) -> Option<Player> {
        if self.has_won(Player::X) {
            Some(Player::X)
        } else if self.has_won(Player::O) {
            Some(Player::O)
        } else {
            None
        }
    }

    pub fn terminal_status(&self) -> TerminalStatus {
        if let Some(winner) = self.winner() {
            TerminalStatus::Win(winner)
        } else if !self.cells.contains(&Cell::Empty) {
            TerminalStatus::Draw
        } else {
            TerminalStatus::Ongoing
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal_status().is_terminal()
    }

    /// Key of the board as-is (no symmetry reduction)
    pub fn key(&self) -> StateKey {
        StateKey::from_cells(&self.cells)
    }

    /// Label form `<25 cells>_<player to move>`
    pub fn encode(&self) -> String {
        format!(
            "{}_{}",
            self.cells.iter().map(|&c| c.to_char()).collect::<String>(),
            self.to_move.symbol()
        )
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &cell) in self.cells.iter().enumerate() {
            write!(f, "{}", cell.to_char())?;
            if (i + 1).is_multiple_of(BOARD_SIDE) && i + 1 < CELL_COUNT {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
