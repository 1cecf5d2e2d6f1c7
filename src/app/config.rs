//! Configuration types for agent creation.

use crate::{pipeline::TrainingConfig, q_learning::RewardScheme, types::StateEncoding};

/// Configuration for creating a Q-learning agent.
///
/// # Examples
///
/// ```
/// use tictactoe5::{app::AgentConfig, types::StateEncoding};
///
/// let config = AgentConfig::new()
///     .with_learning_rate(0.2)
///     .with_encoding(StateEncoding::Symmetric)
///     .with_seed(42);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub learning_rate: f64,
    pub discount: f64,
    pub encoding: StateEncoding,
    pub rewards: RewardScheme,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl AgentConfig {
    /// Defaults match [`TrainingConfig::default`]: α 0.1, γ 0.9, raw keys.
    pub fn new() -> Self {
        Self::from_training(&TrainingConfig::default())
    }

    /// The agent part of a training configuration
    pub fn from_training(config: &TrainingConfig) -> Self {
        Self {
            learning_rate: config.learning_rate,
            discount: config.discount,
            encoding: config.encoding,
            rewards: config.rewards,
            seed: config.seed,
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
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

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new()
    }
}
