//! Tabular Q-learning for 5x5 Tic-Tac-Toe
//!
//! This crate provides:
//! - 5x5 Tic-Tac-Toe rules with four- or five-in-a-row win conditions
//! - Raw and D4-symmetric state encodings for Q-table keys
//! - An epsilon-greedy Q-learning agent with exponential or linear
//!   exploration schedules
//! - Training against random and self-play opponents with
//!   periodic greedy evaluation
//! - MessagePack persistence of learned tables
//!
//! ```no_run
//! use tictactoe5::{
//!     opponents::OpponentType,
//!     pipeline::{Trainer, TrainingConfig},
//! };
//!
//! let config = TrainingConfig::default()
//!     .with_episodes(5_000)
//!     .with_opponent(OpponentType::Random)
//!     .with_seed(7);
//! let mut trainer = Trainer::from_config(config)?;
//! let result = trainer.run()?;
//! println!("win rate {:.2}", result.win_rate);
//! # Ok::<(), tictactoe5::Error>(())
//! ```

pub mod adapters;
pub mod app;
pub mod cli;
pub mod error;
pub mod opponents;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod tictactoe;
pub mod types;

pub use error::{Error, Result};
pub use q_learning::{QLearningAgent, QTable};
pub use tictactoe::{Action, BoardState, Player, WinRule};
pub use types::{StateEncoding, StateKey};
