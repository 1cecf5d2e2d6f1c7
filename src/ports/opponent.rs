//! Opponent port - who the learner plays against

use crate::{
    Result,
    q_learning::QTable,
    tictactoe::{Action, BoardState},
    types::StateEncoding,
};

/// The side of the board the learner does not control.
///
/// Implementations borrow the learner's table read-only; whether their
/// moves are also learned from is decided by [`shares_table`](Self::shares_table),
/// not by the opponent itself.
pub trait Opponent: Send {
    /// Pick a legal action for the player to move on `state`.
    ///
    /// `epsilon` is the exploration rate in force for the current episode;
    /// opponents that do not explore ignore it.
    ///
    /// # Errors
    ///
    /// Returns an error if `state` is terminal.
    fn select_action(
        &mut self,
        table: &QTable,
        encoding: StateEncoding,
        state: &BoardState,
        epsilon: f64,
    ) -> Result<Action>;

    /// Short identifier used in logs and saved metadata
    fn name(&self) -> &str;

    /// Whether this side plays from the learner's table, so that its
    /// transitions should update that table too.
    fn shares_table(&self) -> bool {
        false
    }

    /// A fresh opponent of the same kind, used for checkpoint evaluation so
    /// the training opponent's random stream is left alone.
    fn for_evaluation(&self, seed: Option<u64>) -> Box<dyn Opponent>;

    /// Re-seed the opponent's random source.
    fn set_rng_seed(&mut self, _seed: u64) {}
}
