//! Winning line analysis for the 5x5 board

use std::sync::LazyLock;

use super::{
    WinRule,
    board::{Action, BOARD_SIDE, CELL_COUNT, Cell, Player},
};

/// Cell indices of every four-cell line (28 lines)
static FOUR_IN_A_ROW_LINES: LazyLock<Vec<Vec<usize>>> = LazyLock::new(|| build_lines(4));

/// Cell indices of every full row, column and long diagonal (12 lines)
static FIVE_IN_A_ROW_LINES: LazyLock<Vec<Vec<usize>>> = LazyLock::new(|| build_lines(5));

/// Enumerate all straight runs of `length` cells: rows, columns, diagonals
/// and anti-diagonals.
fn build_lines(length: usize) -> Vec<Vec<usize>> {
    const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

    let side = BOARD_SIDE as isize;
    let span = length as isize - 1;
    let mut lines = Vec::new();

    for (dr, dc) in DIRECTIONS {
        for row in 0..side {
            for col in 0..side {
                let end_row = row + dr * span;
                let end_col = col + dc * span;
                if !(0..side).contains(&end_row) || !(0..side).contains(&end_col) {
                    continue;
                }
                lines.push(
                    (0..=span)
                        .map(|step| ((row + dr * step) * side + col + dc * step) as usize)
                        .collect(),
                );
            }
        }
    }

    lines
}

/// Utility for analyzing winning lines
pub struct LineAnalyzer;

impl LineAnalyzer {
    /// All winning lines for a rule, as row-major cell indices
    pub fn lines(rule: WinRule) -> &'static [Vec<usize>] {
        match rule {
            WinRule::FourInARow => &FOUR_IN_A_ROW_LINES,
            WinRule::FiveInARow => &FIVE_IN_A_ROW_LINES,
        }
    }

    /// Check if a player fully occupies any winning line
    pub fn has_won(cells: &[Cell; CELL_COUNT], rule: WinRule, player: Player) -> bool {
        let target = player.to_cell();
        Self::lines(rule)
            .iter()
            .any(|line| line.iter().all(|&idx| cells[idx] == target))
    }

    /// Empty cells that would immediately complete a line for `player`,
    /// in row-major order
    pub fn winning_actions(cells: &[Cell; CELL_COUNT], rule: WinRule, player: Player) -> Vec<Action> {
        let mut indices: Vec<usize> = Self::lines(rule)
            .iter()
            .filter_map(|line| Self::completing_cell(cells, player, line))
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices.into_iter().filter_map(Action::from_index).collect()
    }

    /// The single empty cell of a line whose other cells all belong to `player`
    fn completing_cell(cells: &[Cell; CELL_COUNT], player: Player, line: &[usize]) -> Option<usize> {
        let target = player.to_cell();
        let mut empty = None;

        for &idx in line {
            match cells[idx] {
                Cell::Empty if empty.is_none() => empty = Some(idx),
                Cell::Empty => return None,
                c if c == target => {}
                _ => return None,
            }
        }

        empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_counts() {
        assert_eq!(LineAnalyzer::lines(WinRule::FourInARow).len(), 28);
        assert_eq!(LineAnalyzer::lines(WinRule::FiveInARow).len(), 12);
        assert!(
            LineAnalyzer::lines(WinRule::FourInARow)
                .iter()
                .all(|line| line.len() == 4)
        );
    }

    #[test]
    fn test_five_in_a_row_contains_long_diagonals() {
        let lines = LineAnalyzer::lines(WinRule::FiveInARow);
        assert!(lines.contains(&vec![0, 6, 12, 18, 24]));
        assert!(lines.contains(&vec![4, 8, 12, 16, 20]));
    }

    #[test]
    fn test_has_won_vertical() {
        let mut cells = [Cell::Empty; CELL_COUNT];
        for row in 1..5 {
            cells[row * BOARD_SIDE + 3] = Cell::O;
        }

        assert!(LineAnalyzer::has_won(&cells, WinRule::FourInARow, Player::O));
        assert!(!LineAnalyzer::has_won(&cells, WinRule::FiveInARow, Player::O));
        assert!(!LineAnalyzer::has_won(&cells, WinRule::FourInARow, Player::X));
    }

    #[test]
    fn test_winning_actions() {
        // XX.X.
        let mut cells = [Cell::Empty; CELL_COUNT];
        cells[0] = Cell::X;
        cells[1] = Cell::X;
        cells[3] = Cell::X;

        let moves = LineAnalyzer::winning_actions(&cells, WinRule::FourInARow, Player::X);
        assert_eq!(moves, vec![Action::new(0, 2)]);
        assert!(LineAnalyzer::winning_actions(&cells, WinRule::FourInARow, Player::O).is_empty());
    }

    #[test]
    fn test_blocked_line_has_no_winning_action() {
        // XXO..
        let mut cells = [Cell::Empty; CELL_COUNT];
        cells[0] = Cell::X;
        cells[1] = Cell::X;
        cells[2] = Cell::O;

        assert!(LineAnalyzer::winning_actions(&cells, WinRule::FourInARow, Player::X).is_empty());
    }
}
