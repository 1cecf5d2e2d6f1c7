//! Saved agent format
//!
//! A saved agent is the Q-table plus what is needed to read it back
//! correctly: the key encoding, the win rule it was trained under, and a
//! record of how it was trained.

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    q_learning::{agent::QLearningAgent, q_table::QTable},
    tictactoe::{Player, WinRule},
    types::StateEncoding,
};

/// How a saved table was produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    /// Number of training episodes played
    pub episodes_trained: usize,
    /// Opponent trained against
    pub opponent: String,
    /// Random seed used (if any)
    pub seed: Option<u64>,
    pub learning_rate: f64,
    pub discount: f64,
    /// Which mark the learner played
    pub agent_player: Option<Player>,
    /// Seconds since the Unix epoch when saved
    pub saved_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAgent {
    pub version: u32,
    pub table: QTable,
    pub encoding: StateEncoding,
    pub rule: WinRule,
    pub metadata: TrainingMetadata,
}

impl SavedAgent {
    /// Current save format version
    pub const VERSION: u32 = 1;

    pub fn from_agent(agent: &QLearningAgent, rule: WinRule, metadata: TrainingMetadata) -> Self {
        Self {
            version: Self::VERSION,
            table: agent.table().clone(),
            encoding: agent.encoding(),
            rule,
            metadata,
        }
    }

    /// Fail unless this file uses the current format
    pub fn check_version(&self) -> Result<()> {
        if self.version != Self::VERSION {
            return Err(Error::UnsupportedVersion {
                found: self.version,
                expected: Self::VERSION,
            });
        }
        Ok(())
    }

    /// Rebuild an agent with the saved table and training hyperparameters
    pub fn to_agent(&self) -> Result<QLearningAgent> {
        self.check_version()?;
        let mut agent = QLearningAgent::new(
            self.metadata.learning_rate,
            self.metadata.discount,
            self.encoding,
        )
        .with_table(self.table.clone());
        if let Some(seed) = self.metadata.seed {
            agent.set_rng_seed(seed);
        }
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tictactoe::{Action, BoardState};

    fn trained_agent() -> QLearningAgent {
        let mut agent = QLearningAgent::new(0.5, 0.9, StateEncoding::Raw).with_seed(7);
        let state = BoardState::new();
        let next = state
            .apply(Action::new(0, 0))
            .unwrap()
            .apply(Action::new(1, 1))
            .unwrap();
        let transition = agent.transition(&state, Action::new(0, 0), 0.3, &next);
        agent.learn(&transition);
        agent
    }

    #[test]
    fn test_msgpack_roundtrip_is_exact() {
        let agent = trained_agent();
        let metadata = TrainingMetadata {
            episodes_trained: 1,
            opponent: "random".to_string(),
            seed: Some(7),
            learning_rate: 0.5,
            discount: 0.9,
            ..TrainingMetadata::default()
        };
        let saved = SavedAgent::from_agent(&agent, WinRule::FourInARow, metadata);

        let bytes = rmp_serde::to_vec(&saved).unwrap();
        let loaded: SavedAgent = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(loaded, saved);

        let restored = loaded.to_agent().unwrap();
        assert_eq!(restored.table(), agent.table());
        assert_eq!(restored.learning_rate(), 0.5);
        assert_eq!(
            restored.value_of(&BoardState::new(), Action::new(0, 0)),
            agent.value_of(&BoardState::new(), Action::new(0, 0))
        );
    }

    #[test]
    fn test_unsupported_version() {
        let mut saved = SavedAgent::from_agent(
            &trained_agent(),
            WinRule::FiveInARow,
            TrainingMetadata::default(),
        );
        saved.version = 99;
        assert!(matches!(
            saved.to_agent(),
            Err(Error::UnsupportedVersion {
                found: 99,
                expected: 1
            })
        ));
    }
}
