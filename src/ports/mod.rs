//! Ports (trait boundaries) for external dependencies.
//!
//! This module defines the interfaces between the learning core and the
//! pieces around it: who the agent plays against, who watches training, and
//! where trained tables are stored. Implementations live in
//! [`opponents`](crate::opponents), [`pipeline::observers`](crate::pipeline::observers)
//! and [`adapters`](crate::adapters).

pub mod observer;
pub mod opponent;
pub mod repository;

pub use observer::Observer;
pub use opponent::Opponent;
pub use repository::QTableRepository;
