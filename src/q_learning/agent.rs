//! Q-learning agent
//!
//! The agent owns the Q-table, the hyperparameters and a seeded random
//! source. Episodes are driven from outside (see
//! [`Trainer`](crate::pipeline::Trainer)); the agent only selects actions and
//! applies updates to the transitions it is handed.

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    q_learning::{policy::EpsilonGreedy, q_table::QTable},
    tictactoe::{Action, BoardState, GameOutcome, Player},
    types::{StateEncoding, StateKey},
};

/// Terminal rewards. Non-terminal steps always earn 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardScheme {
    pub win: f64,
    pub draw: f64,
    pub loss: f64,
}

impl Default for RewardScheme {
    fn default() -> Self {
        Self {
            win: 1.0,
            draw: 0.0,
            loss: -1.0,
        }
    }
}

impl RewardScheme {
    /// Reward for `player` when the game ended with `outcome`
    pub fn for_outcome(&self, outcome: GameOutcome, player: Player) -> f64 {
        match outcome {
            GameOutcome::Win(winner) if winner == player => self.win,
            GameOutcome::Win(_) => self.loss,
            GameOutcome::Draw => self.draw,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("win", self.win), ("draw", self.draw), ("loss", self.loss)] {
            if !value.is_finite() {
                return Err(Error::config(format!(
                    "{name} reward must be finite, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// One learning step, already expressed in key coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: StateKey,
    pub action: Action,
    pub reward: f64,
    pub next_state: StateKey,
    /// Legal actions in `next_state`; empty when `done`
    pub next_legal_actions: Vec<Action>,
    pub done: bool,
}

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Tabular Q-learning agent (off-policy TD control)
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    table: QTable,
    learning_rate: f64,
    discount: f64,
    encoding: StateEncoding,
    rewards: RewardScheme,
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl QLearningAgent {
    /// Create an agent with an empty table
    ///
    /// # Arguments
    ///
    /// * `learning_rate` - α, in (0, 1]
    /// * `discount` - γ, in [0, 1]
    /// * `encoding` - how boards become table keys
    pub fn new(learning_rate: f64, discount: f64, encoding: StateEncoding) -> Self {
        Self {
            table: QTable::new(),
            learning_rate,
            discount,
            encoding,
            rewards: RewardScheme::default(),
            rng: build_rng(None),
            rng_seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.set_rng_seed(seed);
        self
    }

    pub fn with_rewards(mut self, rewards: RewardScheme) -> Self {
        self.rewards = rewards;
        self
    }

    /// Replace the table, e.g. with one loaded from disk
    pub fn with_table(mut self, table: QTable) -> Self {
        self.table = table;
        self
    }

    /// Change α, γ and rewards while keeping the learned table
    pub fn set_hyperparameters(&mut self, learning_rate: f64, discount: f64, rewards: RewardScheme) {
        self.learning_rate = learning_rate;
        self.discount = discount;
        self.rewards = rewards;
    }

    pub fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn into_table(self) -> QTable {
        self.table
    }

    pub fn encoding(&self) -> StateEncoding {
        self.encoding
    }

    pub fn rewards(&self) -> RewardScheme {
        self.rewards
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    pub fn rng_seed(&self) -> Option<u64> {
        self.rng_seed
    }

    /// Epsilon-greedy choice for the player to move on `state`
    pub fn select_action(&mut self, state: &BoardState, epsilon: f64) -> Result<Action> {
        EpsilonGreedy::select_on_board(&self.table, self.encoding, state, epsilon, &mut self.rng)
    }

    /// Best known action; deterministic and read-only
    pub fn greedy_action(&self, state: &BoardState) -> Result<Action> {
        EpsilonGreedy::greedy_on_board(&self.table, self.encoding, state)
    }

    /// Q-value of playing `action` (board coordinates) on `state`
    pub fn value_of(&self, state: &BoardState, action: Action) -> f64 {
        let ctx = self.encoding.context(state);
        self.table.get(ctx.key, ctx.map_action_to_canonical(action))
    }

    /// Build a transition for the mover of `state`.
    ///
    /// `next_state` is either terminal or the next board on which the same
    /// player is to move again.
    pub fn transition(
        &self,
        state: &BoardState,
        action: Action,
        reward: f64,
        next_state: &BoardState,
    ) -> Transition {
        let ctx = self.encoding.context(state);
        let next_ctx = self.encoding.context(next_state);
        let done = next_state.is_terminal();
        let next_legal_actions = if done {
            Vec::new()
        } else {
            next_state
                .empty_actions()
                .into_iter()
                .map(|a| next_ctx.map_action_to_canonical(a))
                .collect()
        };

        Transition {
            state: ctx.key,
            action: ctx.map_action_to_canonical(action),
            reward,
            next_state: next_ctx.key,
            next_legal_actions,
            done,
        }
    }

    /// Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') − Q(s,a)]
    ///
    /// The bootstrap term is 0 when the transition is terminal. Returns the
    /// new value.
    pub fn learn(&mut self, transition: &Transition) -> f64 {
        let current = self.table.get(transition.state, transition.action);
        let max_next = if transition.done {
            0.0
        } else {
            self.table
                .max_q(transition.next_state, &transition.next_legal_actions)
        };
        let target = transition.reward + self.discount * max_next;
        let updated = current + self.learning_rate * (target - current);
        self.table
            .update(transition.state, transition.action, updated);
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(actions: &[(usize, usize)]) -> BoardState {
        actions.iter().fold(BoardState::new(), |b, &(r, c)| {
            b.apply(Action::new(r, c)).unwrap()
        })
    }

    #[test]
    fn test_terminal_update_from_zero() {
        let mut agent = QLearningAgent::new(0.5, 0.9, StateEncoding::Raw);
        let state = BoardState::new();
        let transition = Transition {
            state: state.key(),
            action: Action::center(),
            reward: 1.0,
            next_state: board(&[(2, 2)]).key(),
            next_legal_actions: Vec::new(),
            done: true,
        };

        let value = agent.learn(&transition);
        assert!((value - 0.5).abs() < 1e-12);
        assert_eq!(agent.table().get(state.key(), Action::center()), 0.5);
    }

    #[test]
    fn test_bootstrap_uses_max_next_value() {
        let mut agent = QLearningAgent::new(0.5, 0.9, StateEncoding::Raw);
        let next = board(&[(0, 0), (4, 4)]);
        agent.table.update(next.key(), Action::new(1, 1), 1.0);
        agent.table.update(next.key(), Action::new(1, 2), 2.0);

        let transition = agent.transition(&BoardState::new(), Action::new(0, 0), 0.0, &next);
        assert!(!transition.done);
        assert_eq!(transition.next_legal_actions.len(), 23);

        // 0 + 0.5 * (0 + 0.9 * 2.0 - 0) = 0.9
        let value = agent.learn(&transition);
        assert!((value - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_terminal_transition_ignores_next_values() {
        let mut agent = QLearningAgent::new(0.1, 0.9, StateEncoding::Raw);
        let before = board(&[(0, 0), (4, 0), (0, 1), (4, 1), (0, 2), (4, 2)]);
        let after = before.apply(Action::new(0, 3)).unwrap();
        assert!(after.is_terminal());

        let transition = agent.transition(&before, Action::new(0, 3), 1.0, &after);
        assert!(transition.done);
        assert!(transition.next_legal_actions.is_empty());

        agent.table.update(after.key(), Action::new(3, 3), 50.0);
        let value = agent.learn(&transition);
        assert!((value - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_seeded_agents_select_identically() {
        let mut a = QLearningAgent::new(0.1, 0.9, StateEncoding::Raw).with_seed(42);
        let mut b = QLearningAgent::new(0.1, 0.9, StateEncoding::Raw).with_seed(42);
        let state = board(&[(2, 2)]);
        for _ in 0..10 {
            assert_eq!(
                a.select_action(&state, 1.0).unwrap(),
                b.select_action(&state, 1.0).unwrap()
            );
        }
    }

    #[test]
    fn test_greedy_action_follows_table() {
        let mut agent = QLearningAgent::new(0.1, 0.9, StateEncoding::Raw);
        let state = board(&[(0, 0)]);
        agent.table.update(state.key(), Action::new(3, 2), 0.4);
        assert_eq!(agent.greedy_action(&state).unwrap(), Action::new(3, 2));
        assert_eq!(agent.value_of(&state, Action::new(3, 2)), 0.4);
    }

    #[test]
    fn test_symmetric_agent_shares_values_across_rotations() {
        let mut agent = QLearningAgent::new(0.5, 0.9, StateEncoding::Symmetric);
        // Neither board is symmetric under any transform, so the canonical
        // action is unique.
        let corner = board(&[(0, 0), (0, 1)]);
        let opposite = board(&[(4, 4), (4, 3)]);

        let after = corner.apply(Action::new(1, 1)).unwrap();
        let transition = agent.transition(&corner, Action::new(1, 1), 1.0, &after);
        agent.learn(&Transition {
            done: true,
            next_legal_actions: Vec::new(),
            ..transition
        });

        assert_eq!(agent.value_of(&corner, Action::new(1, 1)), 0.5);
        // A half turn maps (1, 1) onto (3, 3).
        assert_eq!(agent.value_of(&opposite, Action::new(3, 3)), 0.5);
        assert_eq!(agent.value_of(&opposite, Action::new(1, 1)), 0.0);
    }

    #[test]
    fn test_reward_scheme() {
        let rewards = RewardScheme::default();
        assert_eq!(rewards.for_outcome(GameOutcome::Win(Player::X), Player::X), 1.0);
        assert_eq!(rewards.for_outcome(GameOutcome::Win(Player::X), Player::O), -1.0);
        assert_eq!(rewards.for_outcome(GameOutcome::Draw, Player::O), 0.0);

        let bad = RewardScheme {
            win: f64::INFINITY,
            ..RewardScheme::default()
        };
        assert!(bad.validate().is_err());
    }
}
