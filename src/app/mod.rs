//! Application layer with dependency injection container.
//!
//! The container owns infrastructure (the agent repository) and provides
//! factory methods for agents and trainers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │          Application Layer (app)         │
//! │  ┌────────────────────────────────────┐  │
//! │  │        App (DI container)          │  │
//! │  └──────────────┬─────────────────────┘  │
//! │                 │ owns                   │
//! │                 ▼                        │
//! │  ┌────────────────────────────────────┐  │
//! │  │  Infrastructure (adapters)         │  │
//! │  │  - MsgPackRepository               │  │
//! │  │  - InMemoryRepository (testing)    │  │
//! │  └──────────────┬─────────────────────┘  │
//! │                 │ implements             │
//! │                 ▼                        │
//! │  ┌────────────────────────────────────┐  │
//! │  │  Ports                             │  │
//! │  │  - QTableRepository                │  │
//! │  └──────────────┬─────────────────────┘  │
//! │                 │ used by                │
//! │                 ▼                        │
//! │  ┌────────────────────────────────────┐  │
//! │  │  Learning core                     │  │
//! │  │  - QLearningAgent                  │  │
//! │  │  - Trainer                         │  │
//! │  └────────────────────────────────────┘  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use tictactoe5::{
//!     adapters::InMemoryRepository,
//!     app::App,
//!     pipeline::TrainingConfig,
//! };
//!
//! let app = App::for_testing()
//!     .with_repository(InMemoryRepository::new())
//!     .with_default_seed(42)
//!     .build();
//!
//! let mut trainer = app.create_trainer(TrainingConfig::default().with_episodes(10), None)?;
//! let result = trainer.run()?;
//! assert_eq!(result.total_episodes, 10);
//! # Ok::<(), tictactoe5::Error>(())
//! ```

pub mod config;
pub mod container;

pub use config::AgentConfig;
pub use container::{App, AppBuilder};
