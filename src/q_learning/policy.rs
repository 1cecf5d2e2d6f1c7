//! Epsilon-greedy action selection over a Q-table

use rand::{Rng, seq::IndexedRandom};

use crate::{
    Error, Result,
    q_learning::q_table::QTable,
    tictactoe::{Action, BoardState},
    types::{StateEncoding, StateKey},
};

/// Epsilon-greedy selector. Holds no state: the caller supplies epsilon and
/// the random source.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpsilonGreedy;

impl EpsilonGreedy {
    /// With probability `epsilon` pick a uniform random legal action,
    /// otherwise the table's best action.
    ///
    /// No random number is drawn when `epsilon` is zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoLegalActions`] when `legal` is empty.
    pub fn select<R: Rng + ?Sized>(
        table: &QTable,
        state: StateKey,
        legal: &[Action],
        epsilon: f64,
        rng: &mut R,
    ) -> Result<Action> {
        if epsilon > 0.0 && rng.random::<f64>() < epsilon {
            return legal.choose(rng).copied().ok_or_else(|| no_legal(state));
        }
        table.best_action(state, legal).ok_or_else(|| no_legal(state))
    }

    /// Select on a board, translating actions through `encoding` so the
    /// table is consulted in key coordinates and the result comes back in
    /// board coordinates.
    pub fn select_on_board<R: Rng + ?Sized>(
        table: &QTable,
        encoding: StateEncoding,
        state: &BoardState,
        epsilon: f64,
        rng: &mut R,
    ) -> Result<Action> {
        let ctx = encoding.context(state);
        let legal: Vec<Action> = state
            .legal_actions()?
            .into_iter()
            .map(|a| ctx.map_action_to_canonical(a))
            .collect();

        let chosen = Self::select(table, ctx.key, &legal, epsilon, rng)?;
        Ok(ctx.map_canonical_to_original(chosen))
    }

    /// Greedy choice on a board; never touches a random source
    pub fn greedy_on_board(
        table: &QTable,
        encoding: StateEncoding,
        state: &BoardState,
    ) -> Result<Action> {
        let ctx = encoding.context(state);
        let legal: Vec<Action> = state
            .legal_actions()?
            .into_iter()
            .map(|a| ctx.map_action_to_canonical(a))
            .collect();

        let chosen = table
            .best_action(ctx.key, &legal)
            .ok_or_else(|| no_legal(ctx.key))?;
        Ok(ctx.map_canonical_to_original(chosen))
    }
}

fn no_legal(state: StateKey) -> Error {
    Error::NoLegalActions {
        state: state.label(),
    }
}
