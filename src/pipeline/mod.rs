//! Training and evaluation pipeline
//!
//! - [`training`]: the episode loop, configuration and checkpointing
//! - [`evaluation`]: greedy games and the reports they produce
//! - [`observers`]: progress bar, metrics and CSV history

pub mod evaluation;
pub mod observers;
pub mod training;

pub use evaluation::{EvaluationReport, Evaluator, evaluate};
pub use observers::{CsvReportObserver, MetricsObserver, MetricsSummary, ProgressObserver};
pub use training::{Trainer, TrainingConfig, TrainingProgress, TrainingResult};

pub use crate::ports::{Observer, Opponent};
