//! Observer port - abstraction for watching a training run
//!
//! Observers receive training events without the trainer knowing what they
//! do with them: draw a progress bar, keep metrics, append CSV rows.

use crate::{Result, pipeline::EvaluationReport, tictactoe::GameOutcome};

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(total_episodes)` - once
/// 2. `on_episode_end(episode, outcome)` - after every episode
/// 3. `on_checkpoint(report)` - every checkpoint interval and after the
///    final episode
/// 4. `on_training_end()` - once
///
/// # Examples
///
/// ```no_run
/// use tictactoe5::{
///     ports::Observer,
///     tictactoe::GameOutcome,
/// };
///
/// struct EpisodeCounter {
///     episodes: usize,
/// }
///
/// impl Observer for EpisodeCounter {
///     fn on_episode_end(
///         &mut self,
///         _episode: usize,
///         _outcome: GameOutcome,
///     ) -> tictactoe5::Result<()> {
///         self.episodes += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called once before the first episode.
    fn on_training_start(&mut self, _total_episodes: usize) -> Result<()> {
        Ok(())
    }

    /// Called after each episode reaches a terminal board.
    ///
    /// `outcome` is absolute (which mark won), not relative to the learner.
    fn on_episode_end(&mut self, _episode: usize, _outcome: GameOutcome) -> Result<()> {
        Ok(())
    }

    /// Called with the evaluation run at each checkpoint.
    fn on_checkpoint(&mut self, _report: &EvaluationReport) -> Result<()> {
        Ok(())
    }

    /// Called once after the last episode and checkpoint.
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}
