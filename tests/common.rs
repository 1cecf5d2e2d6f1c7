//! Common test utilities for the tictactoe5 test suite.

#![allow(dead_code)]

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use tictactoe5::tictactoe::{Action, BoardState, WinRule};

/// Play the given moves from an empty board under the default rule.
pub fn board(moves: &[(usize, usize)]) -> BoardState {
    moves.iter().fold(BoardState::new(), |state, &(r, c)| {
        state.apply(Action::new(r, c)).unwrap()
    })
}

/// A random reachable position: a random-length prefix of a random game.
pub fn random_reachable_state(rule: WinRule, rng: &mut StdRng) -> BoardState {
    let plies = rng.random_range(0..=24);
    let mut state = BoardState::with_rule(rule);
    for _ in 0..plies {
        if state.is_terminal() {
            break;
        }
        let actions = state.empty_actions();
        let action = *actions.choose(rng).unwrap();
        state = state.apply(action).unwrap();
    }
    state
}

/// Seeded RNG for reproducible sampling in tests.
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
