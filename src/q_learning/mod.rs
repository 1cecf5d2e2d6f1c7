//! Tabular Q-learning
//!
//! Off-policy temporal difference control: the agent bootstraps each value
//! from the best value available in the successor state,
//!
//! ```text
//! Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') − Q(s,a)]
//! ```
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`q_table`] | (state, action) → value store, 0.0 for unseen pairs |
//! | [`policy`] | Epsilon-greedy selection over the store |
//! | [`schedule`] | Epsilon annealing across episodes |
//! | [`agent`] | Owns the table, hyperparameters and random source |
//! | [`serialization`] | Saved agent format |
//!
//! ## Usage Example
//!
//! ```no_run
//! use tictactoe5::{
//!     q_learning::QLearningAgent,
//!     tictactoe::BoardState,
//!     types::StateEncoding,
//! };
//!
//! let mut agent = QLearningAgent::new(
//!     0.1, // learning_rate
//!     0.9, // discount
//!     StateEncoding::Raw,
//! )
//! .with_seed(42);
//!
//! let action = agent.select_action(&BoardState::new(), 1.0).unwrap();
//! ```

pub mod agent;
pub mod policy;
pub mod q_table;
pub mod schedule;
pub mod serialization;

pub use agent::{QLearningAgent, RewardScheme, Transition};
pub use policy::EpsilonGreedy;
pub use q_table::{QEntry, QTable};
pub use schedule::EpsilonSchedule;
pub use serialization::{SavedAgent, TrainingMetadata};
