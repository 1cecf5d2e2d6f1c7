//! Training loop for the Q-learning agent

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::evaluation::{EvaluationReport, Evaluator};
use crate::{
    Error, Result,
    opponents::OpponentType,
    ports::{Observer, Opponent, QTableRepository},
    q_learning::{EpsilonSchedule, QLearningAgent, RewardScheme, SavedAgent, TrainingMetadata},
    tictactoe::{Action, BoardState, GameOutcome, Player, WinRule},
    types::StateEncoding,
};

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// α, in (0, 1]
    pub learning_rate: f64,
    /// γ, in [0, 1]
    pub discount: f64,
    pub epsilon_start: f64,
    pub epsilon_end: f64,
    pub epsilon_schedule: EpsilonSchedule,
    pub num_episodes: usize,
    /// Evaluate (and optionally save) every this many episodes
    pub checkpoint_interval: usize,
    /// Greedy games per checkpoint evaluation
    pub eval_games: usize,
    pub opponent: OpponentType,
    pub seed: Option<u64>,
    /// Mark the learner plays. X always moves first.
    pub agent_player: Player,
    pub rule: WinRule,
    pub encoding: StateEncoding,
    pub rewards: RewardScheme,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount: 0.9,
            epsilon_start: 1.0,
            epsilon_end: 0.01,
            epsilon_schedule: EpsilonSchedule::default(),
            num_episodes: 1000,
            checkpoint_interval: 100,
            eval_games: 100,
            opponent: OpponentType::Random,
            seed: None,
            agent_player: Player::X,
            rule: WinRule::default(),
            encoding: StateEncoding::default(),
            rewards: RewardScheme::default(),
        }
    }
}

impl TrainingConfig {
    /// Check every hyperparameter range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] naming the first bad value.
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(Error::config(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(Error::config(format!(
                "discount must be in [0, 1], got {}",
                self.discount
            )));
        }
        for (name, value) in [
            ("epsilon_start", self.epsilon_start),
            ("epsilon_end", self.epsilon_end),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::config(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        if self.epsilon_end > self.epsilon_start {
            return Err(Error::config(format!(
                "epsilon_end ({}) must not exceed epsilon_start ({})",
                self.epsilon_end, self.epsilon_start
            )));
        }
        if self.checkpoint_interval == 0 {
            return Err(Error::config("checkpoint_interval must be positive"));
        }
        self.epsilon_schedule.validate()?;
        self.rewards.validate()
    }

    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| Error::Io {
            operation: format!("open config file {path:?}"),
            source,
        })?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }

    pub fn with_episodes(mut self, num_episodes: usize) -> Self {
        self.num_episodes = num_episodes;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_epsilon(mut self, start: f64, end: f64) -> Self {
        self.epsilon_start = start;
        self.epsilon_end = end;
        self
    }

    pub fn with_schedule(mut self, schedule: EpsilonSchedule) -> Self {
        self.epsilon_schedule = schedule;
        self
    }

    pub fn with_checkpoints(mut self, interval: usize, eval_games: usize) -> Self {
        self.checkpoint_interval = interval;
        self.eval_games = eval_games;
        self
    }

    pub fn with_opponent(mut self, opponent: OpponentType) -> Self {
        self.opponent = opponent;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_agent_player(mut self, player: Player) -> Self {
        self.agent_player = player;
        self
    }

    pub fn with_rule(mut self, rule: WinRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_encoding(mut self, encoding: StateEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_rewards(mut self, rewards: RewardScheme) -> Self {
        self.rewards = rewards;
        self
    }
}

/// Mutable progress of a run, owned by the trainer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingProgress {
    /// Episodes completed so far, including those of earlier runs the
    /// trainer was resumed from
    pub episode: usize,
    /// Epsilon for the next episode
    pub epsilon: f64,
}

/// Result of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    pub total_episodes: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub draw_rate: f64,
    pub loss_rate: f64,
    pub final_epsilon: f64,
    pub q_table_size: usize,
    pub checkpoints: Vec<EvaluationReport>,
}

impl TrainingResult {
    fn new(
        total_episodes: usize,
        wins: usize,
        draws: usize,
        losses: usize,
        final_epsilon: f64,
        q_table_size: usize,
        checkpoints: Vec<EvaluationReport>,
    ) -> Self {
        let rate = |count: usize| {
            if total_episodes > 0 {
                count as f64 / total_episodes as f64
            } else {
                0.0
            }
        };

        Self {
            total_episodes,
            wins,
            draws,
            losses,
            win_rate: rate(wins),
            draw_rate: rate(draws),
            loss_rate: rate(losses),
            final_epsilon,
            q_table_size,
            checkpoints,
        }
    }

    /// Last checkpoint evaluation, if any ran
    pub fn final_report(&self) -> Option<&EvaluationReport> {
        self.checkpoints.last()
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// A move whose transition is waiting for the mover's next turn
#[derive(Debug, Clone, Copy)]
struct PendingMove {
    state: BoardState,
    action: Action,
}

fn slot(player: Player) -> usize {
    match player {
        Player::X => 0,
        Player::O => 1,
    }
}

/// Drives episodes between the agent and an opponent and applies the
/// Q-learning update after every transition.
///
/// Each player's transition runs from a board where it is to move to the
/// next board where it is to move again (after the reply), or to the
/// terminal board. When a move ends the game, the other player's pending
/// transition is closed with that player's terminal reward in the same
/// step. Only the learner's transitions are applied unless the opponent
/// [shares the table](Opponent::shares_table).
pub struct Trainer {
    config: TrainingConfig,
    agent: QLearningAgent,
    opponent: Box<dyn Opponent>,
    observers: Vec<Box<dyn Observer>>,
    repository: Option<(Arc<dyn QTableRepository>, PathBuf)>,
    progress: TrainingProgress,
}

impl Trainer {
    /// Create a trainer. The configuration is authoritative: the agent's
    /// α, γ and rewards are replaced with the configured ones.
    ///
    /// Checkpoints evaluate against [a fresh copy](Opponent::for_evaluation)
    /// of `opponent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] before any episode runs if the
    /// configuration is out of range, the agent uses a different encoding, or
    /// `opponent` is a built-in kind other than `config.opponent`.
    pub fn new(
        config: TrainingConfig,
        mut agent: QLearningAgent,
        mut opponent: Box<dyn Opponent>,
    ) -> Result<Self> {
        config.validate()?;
        if agent.encoding() != config.encoding {
            return Err(Error::config(format!(
                "agent uses {} state encoding but the configuration requests {}",
                agent.encoding(),
                config.encoding
            )));
        }

        if let Ok(kind) = opponent.name().parse::<OpponentType>()
            && kind != config.opponent
        {
            return Err(Error::config(format!(
                "opponent is {kind} but the configuration requests {}",
                config.opponent
            )));
        }

        agent.set_hyperparameters(config.learning_rate, config.discount, config.rewards);
        if let Some(seed) = config.seed {
            agent.set_rng_seed(seed);
            opponent.set_rng_seed(seed.wrapping_add(1));
        }

        let progress = TrainingProgress {
            episode: 0,
            epsilon: config.epsilon_start,
        };

        Ok(Self {
            config,
            agent,
            opponent,
            observers: Vec::new(),
            repository: None,
            progress,
        })
    }

    /// Build the agent and opponent from the configuration alone
    pub fn from_config(config: TrainingConfig) -> Result<Self> {
        let agent = QLearningAgent::new(config.learning_rate, config.discount, config.encoding);
        let opponent = config.opponent.build(config.seed);
        Self::new(config, agent, opponent)
    }

    /// Continue the episode count and epsilon schedule of an earlier run
    /// that completed `episodes` episodes.
    pub fn resume_at(mut self, episodes: usize) -> Self {
        self.progress = TrainingProgress {
            episode: episodes,
            epsilon: self.epsilon_at(episodes),
        };
        self
    }

    /// Add an observer
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Save the agent to `path` at every checkpoint
    pub fn with_checkpoint_saving(
        mut self,
        repository: Arc<dyn QTableRepository>,
        path: impl Into<PathBuf>,
    ) -> Self {
        self.repository = Some((repository, path.into()));
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn agent(&self) -> &QLearningAgent {
        &self.agent
    }

    pub fn into_agent(self) -> QLearningAgent {
        self.agent
    }

    pub fn progress(&self) -> TrainingProgress {
        self.progress
    }

    /// Metadata describing the current state of training
    pub fn metadata(&self) -> TrainingMetadata {
        TrainingMetadata {
            episodes_trained: self.progress.episode,
            opponent: self.opponent.name().to_string(),
            seed: self.config.seed,
            learning_rate: self.config.learning_rate,
            discount: self.config.discount,
            agent_player: Some(self.config.agent_player),
            saved_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .ok()
                .map(|d| d.as_secs()),
        }
    }

    /// Snapshot suitable for a repository
    pub fn saved_agent(&self) -> SavedAgent {
        SavedAgent::from_agent(&self.agent, self.config.rule, self.metadata())
    }

    fn epsilon_at(&self, episode: usize) -> f64 {
        self.config.epsilon_schedule.epsilon_at(
            episode,
            self.config.epsilon_start,
            self.config.epsilon_end,
        )
    }

    /// Run all configured episodes.
    ///
    /// Observers see episode indices relative to this run; epsilon and
    /// checkpoint indices continue from [`resume_at`](Self::resume_at).
    /// Any board error aborts the run; updates applied so far stay in the
    /// agent's table.
    pub fn run(&mut self) -> Result<TrainingResult> {
        let total = self.config.num_episodes;
        let offset = self.progress.episode;
        info!(
            episodes = total,
            opponent = self.opponent.name(),
            rule = %self.config.rule,
            encoding = %self.config.encoding,
            resumed_from = offset,
            alpha = self.config.learning_rate,
            gamma = self.config.discount,
            "starting training"
        );

        for observer in &mut self.observers {
            observer.on_training_start(total)?;
        }

        let mut wins = 0;
        let mut draws = 0;
        let mut losses = 0;
        let mut checkpoints = Vec::new();

        for episode in 0..total {
            let epsilon = self.epsilon_at(offset + episode);
            self.progress.epsilon = epsilon;

            let outcome = self.play_episode(epsilon)?;
            match outcome {
                GameOutcome::Win(winner) if winner == self.config.agent_player => wins += 1,
                GameOutcome::Win(_) => losses += 1,
                GameOutcome::Draw => draws += 1,
            }
            debug!(episode, epsilon, ?outcome, "episode finished");

            for observer in &mut self.observers {
                observer.on_episode_end(episode, outcome)?;
            }

            self.progress.episode = offset + episode + 1;
            self.progress.epsilon = self.epsilon_at(offset + episode + 1);

            let done = episode + 1;
            if done % self.config.checkpoint_interval == 0 || done == total {
                checkpoints.push(self.checkpoint(epsilon, checkpoints.len())?);
            }
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        info!(
            wins,
            draws,
            losses,
            q_table_size = self.agent.table().len(),
            "training finished"
        );

        Ok(TrainingResult::new(
            total,
            wins,
            draws,
            losses,
            self.progress.epsilon,
            self.agent.table().len(),
            checkpoints,
        ))
    }

    fn learns(&self, player: Player) -> bool {
        player == self.config.agent_player || self.opponent.shares_table()
    }

    fn play_episode(&mut self, epsilon: f64) -> Result<GameOutcome> {
        let mut state = BoardState::with_rule(self.config.rule);
        let mut pending: [Option<PendingMove>; 2] = [None, None];

        loop {
            let mover = state.to_move;

            // Mover is on turn again, so its previous move has a successor.
            if let Some(previous) = pending[slot(mover)].take()
                && self.learns(mover)
            {
                let transition =
                    self.agent
                        .transition(&previous.state, previous.action, 0.0, &state);
                self.agent.learn(&transition);
            }

            let action = if mover == self.config.agent_player {
                self.agent.select_action(&state, epsilon)?
            } else {
                self.opponent.select_action(
                    self.agent.table(),
                    self.agent.encoding(),
                    &state,
                    epsilon,
                )?
            };
            let next = state.apply(action)?;

            let Some(outcome) = next.terminal_status().outcome() else {
                pending[slot(mover)] = Some(PendingMove { state, action });
                state = next;
                continue;
            };

            let rewards = self.agent.rewards();
            if self.learns(mover) {
                let reward = rewards.for_outcome(outcome, mover);
                let transition = self.agent.transition(&state, action, reward, &next);
                self.agent.learn(&transition);
            }

            let other = mover.opponent();
            if let Some(previous) = pending[slot(other)].take()
                && self.learns(other)
            {
                let reward = rewards.for_outcome(outcome, other);
                let transition = self
                    .agent
                    .transition(&previous.state, previous.action, reward, &next);
                self.agent.learn(&transition);
            }

            return Ok(outcome);
        }
    }

    fn checkpoint(&mut self, epsilon: f64, index: usize) -> Result<EvaluationReport> {
        let mut eval_opponent = self.opponent.for_evaluation(
            self.config
                .seed
                .map(|seed| seed.wrapping_add(2 + index as u64)),
        );
        let evaluator = Evaluator::new(self.config.rule, self.config.agent_player);
        let mut report = evaluator.evaluate(
            &self.agent,
            self.config.eval_games,
            eval_opponent.as_mut(),
            self.progress.episode,
        )?;
        report.epsilon = epsilon;

        info!(
            episode = report.episode_index,
            win_rate = report.win_rate,
            draw_rate = report.draw_rate,
            loss_rate = report.loss_rate,
            mean_q = report.mean_q,
            q_table_size = report.q_table_size,
            "checkpoint"
        );

        for observer in &mut self.observers {
            observer.on_checkpoint(&report)?;
        }

        if let Some((repository, path)) = &self.repository {
            repository.save(&self.saved_agent(), path)?;
            info!(path = %path.display(), "saved checkpoint");
        }

        Ok(report)
    }
}
