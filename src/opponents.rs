//! Opponent policies the learner trains and is evaluated against

use std::fmt;

use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    ports::Opponent,
    q_learning::{EpsilonGreedy, QTable},
    tictactoe::{Action, BoardState},
    types::StateEncoding,
};

fn build_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

fn random_legal(state: &BoardState, rng: &mut StdRng) -> Result<Action> {
    state
        .legal_actions()?
        .choose(rng)
        .copied()
        .ok_or_else(|| Error::NoLegalActions {
            state: state.encode(),
        })
}

/// Uniform random play (baseline)
pub struct RandomOpponent {
    rng: StdRng,
}

impl RandomOpponent {
    pub fn new() -> Self {
        Self {
            rng: build_rng(None),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomOpponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Opponent for RandomOpponent {
    fn select_action(
        &mut self,
        _table: &QTable,
        _encoding: StateEncoding,
        state: &BoardState,
        _epsilon: f64,
    ) -> Result<Action> {
        random_legal(state, &mut self.rng)
    }

    fn name(&self) -> &str {
        "random"
    }

    fn for_evaluation(&self, seed: Option<u64>) -> Box<dyn Opponent> {
        Box::new(Self { rng: build_rng(seed) })
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

/// Epsilon-greedy play from the learner's own table.
///
/// Keys are always taken for the side to move, so the opponent's positions
/// never collide with the learner's in the shared table.
pub struct SelfPlayOpponent {
    rng: StdRng,
}

impl SelfPlayOpponent {
    pub fn new() -> Self {
        Self {
            rng: build_rng(None),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SelfPlayOpponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Opponent for SelfPlayOpponent {
    fn select_action(
        &mut self,
        table: &QTable,
        encoding: StateEncoding,
        state: &BoardState,
        epsilon: f64,
    ) -> Result<Action> {
        EpsilonGreedy::select_on_board(table, encoding, state, epsilon, &mut self.rng)
    }

    fn name(&self) -> &str {
        "self-play"
    }

    fn for_evaluation(&self, seed: Option<u64>) -> Box<dyn Opponent> {
        Box::new(Self { rng: build_rng(seed) })
    }

    fn shares_table(&self) -> bool {
        true
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

/// Opponent selection for configuration files and the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpponentType {
    #[default]
    Random,
    SelfPlay,
}

impl OpponentType {
    pub fn build(self, seed: Option<u64>) -> Box<dyn Opponent> {
        let mut opponent: Box<dyn Opponent> = match self {
            OpponentType::Random => Box::new(RandomOpponent::new()),
            OpponentType::SelfPlay => Box::new(SelfPlayOpponent::new()),
        };
        if let Some(seed) = seed {
            opponent.set_rng_seed(seed);
        }
        opponent
    }
}

impl std::str::FromStr for OpponentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(OpponentType::Random),
            "self-play" | "selfplay" | "self" => Ok(OpponentType::SelfPlay),
            other => Err(Error::config(format!(
                "unknown opponent '{other}' (expected 'random' or 'self-play')"
            ))),
        }
    }
}

impl fmt::Display for OpponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpponentType::Random => write!(f, "random"),
            OpponentType::SelfPlay => write!(f, "self-play"),
        }
    }
}
