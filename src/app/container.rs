//! Dependency injection container.
//!
//! The container owns the storage backend and a default seed, and hands out
//! agents and trainers wired to them.

use std::{path::Path, sync::Arc};

use tracing::info;

use super::config::AgentConfig;
use crate::{
    Result,
    adapters::MsgPackRepository,
    pipeline::{Trainer, TrainingConfig},
    ports::QTableRepository,
    q_learning::{QLearningAgent, SavedAgent, TrainingMetadata},
    tictactoe::WinRule,
};

/// Application with dependency injection.
///
/// # Examples
///
/// ## Production usage
///
/// ```
/// use tictactoe5::app::{AgentConfig, App};
///
/// let app = App::new();
/// let agent = app.create_agent(AgentConfig::new().with_seed(42));
/// assert!(agent.table().is_empty());
/// ```
///
/// ## Testing with dependency injection
///
/// ```
/// use tictactoe5::{adapters::InMemoryRepository, app::App};
///
/// let app = App::for_testing()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
pub struct App {
    repository: Arc<dyn QTableRepository>,
    /// Default random seed (None = non-deterministic)
    default_seed: Option<u64>,
}

impl App {
    /// Create a new app with production defaults: MessagePack files and no
    /// default seed.
    pub fn new() -> Self {
        Self {
            repository: Arc::new(MsgPackRepository::new()),
            default_seed: None,
        }
    }

    /// Create a builder for constructing app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn repository(&self) -> Arc<dyn QTableRepository> {
        Arc::clone(&self.repository)
    }

    pub fn default_seed(&self) -> Option<u64> {
        self.default_seed
    }

    /// Create an agent with an empty table.
    ///
    /// The config seed wins over the container default.
    pub fn create_agent(&self, config: AgentConfig) -> QLearningAgent {
        let mut agent = QLearningAgent::new(config.learning_rate, config.discount, config.encoding)
            .with_rewards(config.rewards);
        if let Some(seed) = config.seed.or(self.default_seed) {
            agent.set_rng_seed(seed);
        }
        agent
    }

    /// Create a trainer for `config`, starting from `initial` when resuming
    /// from a saved agent.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is out of range or the
    /// saved agent was trained under a different rule or encoding.
    pub fn create_trainer(
        &self,
        mut config: TrainingConfig,
        initial: Option<SavedAgent>,
    ) -> Result<Trainer> {
        if config.seed.is_none() {
            config.seed = self.default_seed;
        }

        let mut completed = 0;
        let agent = match initial {
            Some(saved) => {
                if saved.rule != config.rule {
                    return Err(crate::Error::config(format!(
                        "saved agent was trained with {} but the configuration uses {}",
                        saved.rule, config.rule
                    )));
                }
                info!(
                    entries = saved.table.len(),
                    episodes = saved.metadata.episodes_trained,
                    "resuming from saved agent"
                );
                completed = saved.metadata.episodes_trained;
                saved.to_agent()?
            }
            None => self.create_agent(AgentConfig::from_training(&config)),
        };

        let opponent = config.opponent.build(config.seed);
        Ok(Trainer::new(config, agent, opponent)?.resume_at(completed))
    }

    /// Load an agent from persistent storage.
    pub fn load_agent(&self, path: &Path) -> Result<(QLearningAgent, SavedAgent)> {
        let saved = self.repository.load(path)?;
        let mut agent = saved.to_agent()?;
        if let Some(seed) = self.default_seed {
            agent.set_rng_seed(seed);
        }
        Ok((agent, saved))
    }

    /// Load the saved form without building an agent.
    pub fn load_saved(&self, path: &Path) -> Result<SavedAgent> {
        self.repository.load(path)
    }

    /// Save an agent to persistent storage.
    pub fn save_agent(
        &self,
        agent: &QLearningAgent,
        rule: WinRule,
        metadata: TrainingMetadata,
        path: &Path,
    ) -> Result<()> {
        self.repository
            .save(&SavedAgent::from_agent(agent, rule, metadata), path)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing app with custom dependencies.
///
/// # Examples
///
/// ```
/// use tictactoe5::{adapters::InMemoryRepository, app::AppBuilder};
///
/// let app = AppBuilder::new()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
#[derive(Default)]
pub struct AppBuilder {
    repository: Option<Arc<dyn QTableRepository>>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom repository.
    pub fn with_repository<R: QTableRepository + 'static>(mut self, repo: R) -> Self {
        self.repository = Some(Arc::new(repo));
        self
    }

    /// Set a default random seed for all agents and trainers created by
    /// this container.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Build the app. Falls back to `MsgPackRepository` when no repository
    /// was given.
    pub fn build(self) -> App {
        App {
            repository: self
                .repository
                .unwrap_or_else(|| Arc::new(MsgPackRepository::new())),
            default_seed: self.default_seed,
        }
    }
}
