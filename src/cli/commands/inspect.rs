//! Inspect command - Summarize a saved Q-table or show its values for one board

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use statrs::statistics::Statistics;

use crate::{
    app::App,
    cli::output::{
        format_number, print_kv, print_section, print_subsection, render_board,
        render_value_grid,
    },
    q_learning::{QLearningAgent, SavedAgent},
    tictactoe::{Action, BoardState, LineAnalyzer, Player},
};

#[derive(Parser, Debug)]
#[command(about = "Inspect a trained agent's Q-table")]
pub struct InspectArgs {
    /// Path to trained agent file
    pub agent: PathBuf,

    /// Board to show Q-values for: 25 cells of `X`, `O` or `.`, optionally
    /// followed by `_X`/`_O`
    #[arg(long, short = 'b')]
    pub board: Option<String>,

    /// Number of highest-valued entries to list
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

/// Aggregate numbers over a Q-table
#[derive(Debug, Clone, PartialEq)]
pub struct TableStats {
    pub entries: usize,
    pub states: usize,
    pub x_states: usize,
    pub o_states: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl TableStats {
    pub fn from_saved(saved: &SavedAgent) -> Self {
        let values: Vec<f64> = saved.table.values().collect();
        let mut states: Vec<_> = saved.table.iter().map(|(state, _, _)| state).collect();
        states.sort_unstable();
        states.dedup();
        let x_states = states
            .iter()
            .filter(|state| state.to_move() == Player::X)
            .count();

        let (min, max, mean, std_dev) = if values.is_empty() {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            (
                Statistics::min(values.iter()),
                Statistics::max(values.iter()),
                values.iter().mean(),
                values.iter().population_std_dev(),
            )
        };

        Self {
            entries: values.len(),
            states: states.len(),
            x_states,
            o_states: states.len() - x_states,
            min,
            max,
            mean,
            std_dev,
        }
    }
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let app = App::new();
    let (agent, saved) = app
        .load_agent(&args.agent)
        .with_context(|| format!("Failed to load agent {}", args.agent.display()))?;

    match &args.board {
        Some(board) => inspect_board(&agent, &saved, board),
        None => {
            summarize(&saved, args.top);
            Ok(())
        }
    }
}

fn summarize(saved: &SavedAgent, top: usize) {
    let stats = TableStats::from_saved(saved);

    print_section("Agent");
    print_kv("Format version", &saved.version.to_string());
    print_kv("Rule", &saved.rule.to_string());
    print_kv("Encoding", &saved.encoding.to_string());
    print_kv(
        "Episodes trained",
        &format_number(saved.metadata.episodes_trained),
    );
    if !saved.metadata.opponent.is_empty() {
        print_kv("Trained against", &saved.metadata.opponent);
    }
    if let Some(seed) = saved.metadata.seed {
        print_kv("Seed", &seed.to_string());
    }
    print_kv(
        "α / γ",
        &format!(
            "{} / {}",
            saved.metadata.learning_rate, saved.metadata.discount
        ),
    );

    print_section("Q-table");
    print_kv("Entries", &format_number(stats.entries));
    print_kv("States", &format_number(stats.states));
    print_kv("X to move", &format_number(stats.x_states));
    print_kv("O to move", &format_number(stats.o_states));
    print_kv("Min value", &format!("{:.4}", stats.min));
    print_kv("Max value", &format!("{:.4}", stats.max));
    print_kv(
        "Mean value",
        &format!("{:.4} ± {:.4}", stats.mean, stats.std_dev),
    );

    if top > 0 && !saved.table.is_empty() {
        let mut entries = saved.table.entries();
        entries.sort_by(|a, b| b.value.total_cmp(&a.value));
        print_subsection(&format!("Top {} entries", top.min(entries.len())));
        for entry in entries.iter().take(top) {
            println!(
                "  {}  ({}, {})  {:>8.4}",
                entry.state.label(),
                entry.row,
                entry.col,
                entry.value
            );
        }
    }
}

fn inspect_board(agent: &QLearningAgent, saved: &SavedAgent, board: &str) -> Result<()> {
    let state = BoardState::from_string_with_rule(board, saved.rule)
        .with_context(|| format!("Invalid board '{board}'"))?;

    print_section(&format!("Board ({} to move)", state.to_move));
    println!("{}", render_board(&state));

    if let Some(outcome) = state.terminal_status().outcome() {
        println!("Game over: {outcome:?}");
        return Ok(());
    }

    let ctx = agent.encoding().context(&state);
    print_kv("State key", &ctx.key.label());
    print_kv(
        "Known actions",
        &format_number(saved.table.state_values(ctx.key).len()),
    );

    print_subsection("Q-values");
    print!("{}", render_value_grid(&state, |action| agent.value_of(&state, action)));

    let greedy = agent.greedy_action(&state)?;
    print_kv(
        "Greedy action",
        &format!("{greedy} (Q = {:.4})", agent.value_of(&state, greedy)),
    );

    let mover = state.to_move;
    let wins = LineAnalyzer::winning_actions(&state.cells, state.rule, mover);
    let threats = LineAnalyzer::winning_actions(&state.cells, state.rule, mover.opponent());
    let list = |actions: &[Action]| {
        if actions.is_empty() {
            "-".to_string()
        } else {
            actions
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        }
    };
    print_kv(&format!("Wins for {mover}"), &list(&wins));
    print_kv("Blocks needed", &list(&threats));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        q_learning::{QTable, TrainingMetadata},
        tictactoe::WinRule,
        types::StateEncoding,
    };

    #[test]
    fn test_table_stats() {
        let x_board = BoardState::new();
        let o_board = x_board.apply(Action::center()).unwrap();

        let mut table = QTable::new();
        table.update(x_board.key(), Action::new(0, 0), 1.0);
        table.update(x_board.key(), Action::new(0, 1), -1.0);
        table.update(o_board.key(), Action::new(0, 0), 0.5);
        table.update(o_board.key(), Action::new(1, 1), 0.5);

        let agent = QLearningAgent::new(0.1, 0.9, StateEncoding::Raw).with_table(table);
        let saved = SavedAgent::from_agent(&agent, WinRule::FourInARow, TrainingMetadata::default());
        let stats = TableStats::from_saved(&saved);

        assert_eq!(stats.entries, 4);
        assert_eq!(stats.states, 2);
        assert_eq!(stats.x_states, 1);
        assert_eq!(stats.o_states, 1);
        assert_eq!(stats.min, -1.0);
        assert_eq!(stats.max, 1.0);
        assert!((stats.mean - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_empty_table_stats() {
        let agent = QLearningAgent::new(0.1, 0.9, StateEncoding::Raw);
        let saved = SavedAgent::from_agent(&agent, WinRule::FourInARow, TrainingMetadata::default());
        let stats = TableStats::from_saved(&saved);
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.mean, 0.0);
    }
}
