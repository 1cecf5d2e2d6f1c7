//! Train command - Train a Q-learning agent against an opponent

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::Serialize;
use serde_json::to_writer_pretty;
use tracing::info;

use crate::{
    app::App,
    cli::output::{format_count_rate, format_number, print_kv, print_section},
    opponents::OpponentType,
    pipeline::{
        CsvReportObserver, EvaluationReport, MetricsObserver, ProgressObserver, TrainingConfig,
        TrainingResult,
    },
    q_learning::{EpsilonSchedule, RewardScheme, SavedAgent},
    tictactoe::{Player, WinRule},
    types::StateEncoding,
};

#[derive(Debug, Serialize)]
struct SummaryStats {
    total_episodes: usize,
    wins: usize,
    draws: usize,
    losses: usize,
    win_rate: f64,
    draw_rate: f64,
    loss_rate: f64,
}

impl From<&TrainingResult> for SummaryStats {
    fn from(result: &TrainingResult) -> Self {
        Self {
            total_episodes: result.total_episodes,
            wins: result.wins,
            draws: result.draws,
            losses: result.losses,
            win_rate: result.win_rate,
            draw_rate: result.draw_rate,
            loss_rate: result.loss_rate,
        }
    }
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile {
    training: SummaryStats,
    final_evaluation: Option<EvaluationReport>,
    final_epsilon: f64,
    q_table_size: usize,
    config: TrainingConfig,
    metadata: SummaryMetadata,
}

#[derive(Debug, Serialize)]
struct SummaryMetadata {
    agent_file: Option<String>,
    resumed_from: Option<String>,
    /// Episodes in this run plus any the resumed agent already had
    episodes_trained: usize,
}

pub(crate) fn parse_player_token(value: &str, flag: &str) -> Result<Player> {
    match value.trim().to_ascii_lowercase().as_str() {
        "x" | "first" | "player1" | "p1" => Ok(Player::X),
        "o" | "second" | "player2" | "p2" => Ok(Player::O),
        other => Err(anyhow!(
            "Invalid value '{other}' for {flag} (expected 'x' or 'o')"
        )),
    }
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Trailing separator or no file name means a directory target.
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train a Q-learning agent", allow_negative_numbers = true)]
pub struct TrainArgs {
    /// JSON training configuration; flags given on the command line override it
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Number of training episodes
    #[arg(long, short = 'e')]
    pub episodes: Option<usize>,

    /// Opponent to train against (random or self-play)
    #[arg(long, short = 'o')]
    pub opponent: Option<OpponentType>,

    /// Learning rate α (0.0-1.0]
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Discount factor γ [0.0-1.0]
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Initial exploration rate
    #[arg(long)]
    pub epsilon_start: Option<f64>,

    /// Exploration floor
    #[arg(long)]
    pub epsilon_end: Option<f64>,

    /// Exponential epsilon decay per episode
    #[arg(long, conflicts_with = "epsilon_linear")]
    pub epsilon_decay: Option<f64>,

    /// Decay epsilon linearly to the floor over this many episodes
    #[arg(long)]
    pub epsilon_linear: Option<usize>,

    /// Episodes between checkpoint evaluations
    #[arg(long)]
    pub checkpoint_interval: Option<usize>,

    /// Greedy games per checkpoint evaluation
    #[arg(long)]
    pub eval_games: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Which token the agent controls (`x` or `o`)
    #[arg(long)]
    pub agent_player: Option<String>,

    /// Win rule (four-in-a-row or five-in-a-row)
    #[arg(long)]
    pub rule: Option<WinRule>,

    /// State encoding (raw or symmetric)
    #[arg(long)]
    pub encoding: Option<StateEncoding>,

    /// Reward schedule (win=1,draw=0,loss=-1)
    #[arg(long)]
    pub reward: Option<String>,

    /// Output file for the trained agent (MessagePack)
    #[arg(long, short = 'O')]
    pub output: Option<PathBuf>,

    /// Also save the agent to `--output` at every checkpoint
    #[arg(long, default_value_t = false, requires = "output")]
    pub save_checkpoints: bool,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Optional CSV file with one row per checkpoint evaluation
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Continue training a previously saved agent
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Show progress bar
    #[arg(long, default_value_t = false)]
    pub progress: bool,
}

impl TrainArgs {
    /// Defaults for every optional flag
    pub fn new() -> Self {
        Self {
            config: None,
            episodes: None,
            opponent: None,
            alpha: None,
            gamma: None,
            epsilon_start: None,
            epsilon_end: None,
            epsilon_decay: None,
            epsilon_linear: None,
            checkpoint_interval: None,
            eval_games: None,
            seed: None,
            agent_player: None,
            rule: None,
            encoding: None,
            reward: None,
            output: None,
            save_checkpoints: false,
            summary: None,
            history: None,
            resume: None,
            progress: false,
        }
    }

    /// Merge the config file (if any) with command-line overrides
    pub fn training_config(&self) -> Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => TrainingConfig::default(),
        };

        if let Some(episodes) = self.episodes {
            config.num_episodes = episodes;
        }
        if let Some(opponent) = self.opponent {
            config.opponent = opponent;
        }
        if let Some(alpha) = self.alpha {
            config.learning_rate = alpha;
        }
        if let Some(gamma) = self.gamma {
            config.discount = gamma;
        }
        if let Some(start) = self.epsilon_start {
            config.epsilon_start = start;
        }
        if let Some(end) = self.epsilon_end {
            config.epsilon_end = end;
        }
        if let Some(decay) = self.epsilon_decay {
            config.epsilon_schedule = EpsilonSchedule::Exponential { decay };
        }
        if let Some(episodes) = self.epsilon_linear {
            config.epsilon_schedule = EpsilonSchedule::Linear { episodes };
        }
        if let Some(interval) = self.checkpoint_interval {
            config.checkpoint_interval = interval;
        }
        if let Some(games) = self.eval_games {
            config.eval_games = games;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(token) = &self.agent_player {
            config.agent_player = parse_player_token(token, "--agent-player")?;
        }
        if let Some(rule) = self.rule {
            config.rule = rule;
        }
        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        if let Some(reward) = &self.reward {
            config.rewards = parse_reward_schedule(reward, config.rewards)?;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for TrainArgs {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse reward schedule from string (e.g., "win=1,draw=0,loss=-1").
/// Keys that are not given keep their value from `base`.
fn parse_reward_schedule(s: &str, base: RewardScheme) -> Result<RewardScheme> {
    let mut rewards = base;

    for part in s.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (key, value_str) = trimmed
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid reward entry '{trimmed}'. Expected key=value"))?;
        let value: f64 = value_str
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid numeric reward '{value_str}' in '{trimmed}'"))?;
        match key.trim().to_ascii_lowercase().as_str() {
            "win" => rewards.win = value,
            "draw" => rewards.draw = value,
            "loss" => rewards.loss = value,
            other => {
                return Err(anyhow!(
                    "Unknown reward key '{other}'. Expected win, draw, or loss"
                ));
            }
        }
    }

    Ok(rewards)
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let config = args.training_config()?;
    let app = App::new();

    let initial: Option<SavedAgent> = match &args.resume {
        Some(path) => Some(
            app.load_saved(path)
                .with_context(|| format!("Failed to load agent {}", path.display()))?,
        ),
        None => None,
    };

    let summary_path = args.summary.as_deref().map(|raw| {
        let sanitized = sanitize_summary_path(raw);
        if sanitized != raw {
            println!("Summary path normalized to {}", sanitized.display());
        }
        sanitized
    });

    print_section("Training Configuration");
    print_kv("Episodes", &format_number(config.num_episodes));
    print_kv("Opponent", &config.opponent.to_string());
    print_kv("Agent plays as", &config.agent_player.to_string());
    print_kv("Rule", &config.rule.to_string());
    print_kv("Encoding", &config.encoding.to_string());
    print_kv(
        "α / γ",
        &format!("{} / {}", config.learning_rate, config.discount),
    );
    print_kv(
        "Epsilon",
        &format!(
            "{} → {} ({:?})",
            config.epsilon_start, config.epsilon_end, config.epsilon_schedule
        ),
    );
    if let Some(seed) = config.seed {
        print_kv("Seed", &seed.to_string());
    }
    if let (Some(path), Some(saved)) = (&args.resume, &initial) {
        print_kv(
            "Resuming from",
            &format!(
                "{} ({} episodes)",
                path.display(),
                format_number(saved.metadata.episodes_trained)
            ),
        );
    }

    let metrics = MetricsObserver::new(config.agent_player);
    let mut trainer = app
        .create_trainer(config.clone(), initial)?
        .with_observer(Box::new(metrics.clone()));
    if args.progress {
        trainer = trainer.with_observer(Box::new(ProgressObserver::new(config.agent_player)));
    }
    if let Some(path) = &args.history {
        let observer = CsvReportObserver::new(path)
            .with_context(|| format!("Failed to create history file {}", path.display()))?;
        trainer = trainer.with_observer(Box::new(observer));
    }
    if args.save_checkpoints
        && let Some(path) = &args.output
    {
        trainer = trainer.with_checkpoint_saving(app.repository(), path.clone());
    }

    let result = trainer.run()?;

    print_section("Training Results");
    print_kv("Total episodes", &format_number(result.total_episodes));
    print_kv("Wins", &format_count_rate(result.wins, result.win_rate));
    print_kv("Draws", &format_count_rate(result.draws, result.draw_rate));
    print_kv("Losses", &format_count_rate(result.losses, result.loss_rate));
    print_kv("Final epsilon", &format!("{:.4}", result.final_epsilon));
    print_kv("Q-table entries", &format_number(result.q_table_size));

    let summary = metrics.summary();
    if !summary.checkpoint_win_rates.is_empty() {
        println!("\nCheckpoint win rates:");
        for (episode, rate) in &summary.checkpoint_win_rates {
            println!("  {:>8}  {:5.1}%", format_number(*episode), rate * 100.0);
        }
    }

    let metadata = trainer.metadata();

    if let Some(output_path) = &args.output {
        app.save_agent(trainer.agent(), config.rule, metadata.clone(), output_path)
            .with_context(|| format!("Failed to save agent to {}", output_path.display()))?;
        info!(path = %output_path.display(), "agent saved");
        println!("\n✓ Agent saved to: {}", output_path.display());
    }

    if let Some(path) = summary_path {
        let file = TrainingSummaryFile {
            training: SummaryStats::from(&result),
            final_evaluation: result.final_report().cloned(),
            final_epsilon: result.final_epsilon,
            q_table_size: result.q_table_size,
            config,
            metadata: SummaryMetadata {
                agent_file: args.output.as_ref().map(|p| p.display().to_string()),
                resumed_from: args.resume.as_ref().map(|p| p.display().to_string()),
                episodes_trained: metadata.episodes_trained,
            },
        };
        write_summary(&path, &file)?;
        println!("✓ Summary written to: {}", path.display());
    }

    Ok(())
}

fn write_summary(path: &Path, summary: &TrainingSummaryFile) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create summary file {}", path.display()))?;
    to_writer_pretty(file, summary)?;
    Ok(())
}
