//! Output formatting for CLI

use crate::tictactoe::{Action, BOARD_SIDE, BoardState, Cell};

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a subsection header
pub fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(40));
}

/// Format a number with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// `count (rate%)`
pub fn format_count_rate(count: usize, rate: f64) -> String {
    format!("{} ({:.1}%)", format_number(count), rate * 100.0)
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// Board with row and column indices, one row per line.
pub fn render_board(state: &BoardState) -> String {
    let mut out = String::from("   ");
    for col in 0..BOARD_SIDE {
        out.push_str(&format!(" {col}"));
    }
    out.push('\n');
    for row in 0..BOARD_SIDE {
        out.push_str(&format!(" {row} "));
        for col in 0..BOARD_SIDE {
            out.push(' ');
            out.push(state.get(Action::new(row, col)).to_char());
        }
        out.push('\n');
    }
    out
}

/// Grid of per-cell values; occupied cells show their mark instead.
pub fn render_value_grid(state: &BoardState, value: impl Fn(Action) -> f64) -> String {
    let mut out = String::from("    ");
    for col in 0..BOARD_SIDE {
        out.push_str(&format!("{col:>8}"));
    }
    out.push('\n');
    for row in 0..BOARD_SIDE {
        out.push_str(&format!(" {row}  "));
        for col in 0..BOARD_SIDE {
            let action = Action::new(row, col);
            match state.get(action) {
                Cell::Empty => out.push_str(&format!("{:>8.3}", value(action))),
                cell => out.push_str(&format!("{:>8}", cell.to_char())),
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_render_board_marks_moves() {
        let state = BoardState::new()
            .apply(Action::new(0, 0))
            .unwrap()
            .apply(Action::new(4, 4))
            .unwrap();
        let rendered = render_board(&state);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "    0 1 2 3 4");
        assert_eq!(lines[1], " 0  X . . . .");
        assert_eq!(lines[5], " 4  . . . . O");
    }

    #[test]
    fn test_value_grid_shows_marks_for_occupied_cells() {
        let state = BoardState::new().apply(Action::center()).unwrap();
        let grid = render_value_grid(&state, |_| 0.5);
        assert!(grid.contains("X"));
        assert_eq!(grid.matches("0.500").count(), 24);
    }
}
