//! High-level game management

use serde::{Deserialize, Serialize};

use super::board::{Action, BoardState, Player, WinRule};
use crate::{Error, Result};

/// A move in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub action: Action,
    pub player: Player,
}

/// Outcome of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    Win(Player),
    Draw,
}

impl GameOutcome {
    /// Swap the winner perspective (X <-> O).
    pub fn swap_players(self) -> Self {
        match self {
            GameOutcome::Win(player) => GameOutcome::Win(player.opponent()),
            GameOutcome::Draw => GameOutcome::Draw,
        }
    }
}

/// A complete game with history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub initial: BoardState,
    pub current: BoardState,
    pub moves: Vec<Move>,
    pub outcome: Option<GameOutcome>,
}

impl Game {
    pub fn new(rule: WinRule) -> Self {
        let initial = BoardState::with_rule(rule);
        Game {
            initial,
            current: initial,
            moves: Vec::new(),
            outcome: None,
        }
    }

    /// Play a move for the player on turn and record the outcome if the game ends.
    pub fn play(&mut self, action: Action) -> Result<()> {
        if self.outcome.is_some() {
            return Err(Error::InvalidState {
                state: self.current.encode(),
            });
        }

        let player = self.current.to_move;
        self.current = self.current.apply(action)?;
        self.moves.push(Move { action, player });
        self.outcome = self.current.terminal_status().outcome();

        Ok(())
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Get the sequence of board states, starting with the initial board
    pub fn state_sequence(&self) -> Result<Vec<BoardState>> {
        let mut states = Vec::with_capacity(self.moves.len() + 1);
        let mut state = self.initial;
        states.push(state);
        for mv in &self.moves {
            state = state.apply_as(mv.action, mv.player)?;
            states.push(state);
        }
        Ok(states)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(WinRule::default())
    }
}
