//! Evaluate command - Evaluate a trained agent against an opponent

use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use crate::{
    app::App,
    cli::{
        commands::train::parse_player_token,
        output::{format_count_rate, format_number, print_kv, print_section},
    },
    opponents::OpponentType,
    pipeline::{EvaluationReport, Evaluator},
    q_learning::TrainingMetadata,
    tictactoe::{Player, WinRule},
    types::StateEncoding,
};

#[derive(Parser, Debug)]
#[command(about = "Evaluate a trained agent")]
pub struct EvaluateArgs {
    /// Path to trained agent file
    pub agent: PathBuf,

    /// Opponent to evaluate against (random or self-play)
    #[arg(long, short = 'o', default_value = "random")]
    pub opponent: OpponentType,

    /// Number of evaluation games
    #[arg(long, short = 'g', default_value_t = 100)]
    pub games: usize,

    /// Random seed for the opponent
    #[arg(long)]
    pub seed: Option<u64>,

    /// Which token the evaluated agent controls (`x` or `o`); defaults to
    /// the side it was trained on
    #[arg(long)]
    pub agent_player: Option<String>,

    /// Export results to a JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Serialize)]
struct EvaluationExport<'a> {
    agent_file: String,
    opponent: String,
    agent_player: Player,
    seed: Option<u64>,
    rule: WinRule,
    encoding: StateEncoding,
    report: &'a EvaluationReport,
    training: &'a TrainingMetadata,
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    let app = App::new();

    println!("Loading trained agent from: {}", args.agent.display());
    let (agent, saved) = app
        .load_agent(&args.agent)
        .with_context(|| format!("Failed to load agent {}", args.agent.display()))?;

    print_section("Loaded Agent Info");
    print_kv("Rule", &saved.rule.to_string());
    print_kv("Encoding", &saved.encoding.to_string());
    print_kv("Q-table entries", &format_number(saved.table.len()));
    print_kv("States", &format_number(saved.table.state_count()));
    print_kv(
        "Episodes trained",
        &format_number(saved.metadata.episodes_trained),
    );
    if !saved.metadata.opponent.is_empty() {
        print_kv("Trained against", &saved.metadata.opponent);
    }

    let agent_player = match &args.agent_player {
        Some(token) => parse_player_token(token, "--agent-player")?,
        None => saved.metadata.agent_player.unwrap_or(Player::X),
    };

    let mut opponent = args.opponent.build(args.seed);
    let evaluator = Evaluator::new(saved.rule, agent_player);

    print_section("Evaluation Configuration");
    print_kv("Opponent", opponent.name());
    print_kv("Agent plays as", &agent_player.to_string());
    print_kv("Games", &format_number(args.games));
    if let Some(seed) = args.seed {
        print_kv("Seed", &seed.to_string());
    }

    let report = evaluator.evaluate(
        &agent,
        args.games,
        opponent.as_mut(),
        saved.metadata.episodes_trained,
    )?;

    print_section("Evaluation Results");
    print_kv("Total games", &format_number(report.games));
    print_kv("Wins", &format_count_rate(report.wins, report.win_rate));
    print_kv("Draws", &format_count_rate(report.draws, report.draw_rate));
    print_kv("Losses", &format_count_rate(report.losses, report.loss_rate));
    print_kv(
        "Chosen-action Q",
        &format!("{:.4} ± {:.4}", report.mean_q, report.std_q),
    );

    if let Some(export_path) = &args.export {
        let export = EvaluationExport {
            agent_file: args.agent.display().to_string(),
            opponent: args.opponent.to_string(),
            agent_player,
            seed: args.seed,
            rule: saved.rule,
            encoding: saved.encoding,
            report: &report,
            training: &saved.metadata,
        };
        let file = File::create(export_path)
            .with_context(|| format!("Failed to create {}", export_path.display()))?;
        serde_json::to_writer_pretty(file, &export)?;
        println!("\n✓ Results exported to: {}", export_path.display());
    }

    Ok(())
}
