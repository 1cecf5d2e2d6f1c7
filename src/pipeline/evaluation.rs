//! Greedy evaluation of a learned policy

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::{
    Result,
    ports::Opponent,
    q_learning::QLearningAgent,
    tictactoe::{BoardState, GameOutcome, Player, WinRule},
};

/// Outcome rates and Q-value statistics from one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Training episodes completed when the evaluation ran
    pub episode_index: usize,
    pub games: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub draw_rate: f64,
    pub loss_rate: f64,
    /// Mean of Q(s, a) over every (state, chosen action) the learner played
    pub mean_q: f64,
    /// Population standard deviation of the same sample
    pub std_q: f64,
    /// Stored state-action pairs at evaluation time
    pub q_table_size: usize,
    /// Training epsilon at evaluation time (the games themselves use 0)
    pub epsilon: f64,
}

/// Plays evaluation games with exploration switched off.
///
/// The agent is only borrowed, so evaluation can never change its table.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    pub rule: WinRule,
    pub agent_player: Player,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            rule: WinRule::default(),
            agent_player: Player::X,
        }
    }
}

impl Evaluator {
    pub fn new(rule: WinRule, agent_player: Player) -> Self {
        Self { rule, agent_player }
    }

    /// Play `num_games` games of the greedy agent against `opponent`.
    ///
    /// The opponent is asked with epsilon 0: table-driven opponents play
    /// greedily too, random ones stay random.
    pub fn evaluate(
        &self,
        agent: &QLearningAgent,
        num_games: usize,
        opponent: &mut dyn Opponent,
        episode_index: usize,
    ) -> Result<EvaluationReport> {
        let mut wins = 0;
        let mut draws = 0;
        let mut losses = 0;
        let mut samples = Vec::new();

        for _ in 0..num_games {
            match self.play_game(agent, opponent, &mut samples)? {
                GameOutcome::Win(winner) if winner == self.agent_player => wins += 1,
                GameOutcome::Win(_) => losses += 1,
                GameOutcome::Draw => draws += 1,
            }
        }

        let rate = |count: usize| {
            if num_games > 0 {
                count as f64 / num_games as f64
            } else {
                0.0
            }
        };
        let (mean_q, std_q) = if samples.is_empty() {
            (0.0, 0.0)
        } else {
            (samples.iter().mean(), samples.iter().population_std_dev())
        };

        Ok(EvaluationReport {
            episode_index,
            games: num_games,
            wins,
            draws,
            losses,
            win_rate: rate(wins),
            draw_rate: rate(draws),
            loss_rate: rate(losses),
            mean_q,
            std_q,
            q_table_size: agent.table().len(),
            epsilon: 0.0,
        })
    }

    fn play_game(
        &self,
        agent: &QLearningAgent,
        opponent: &mut dyn Opponent,
        samples: &mut Vec<f64>,
    ) -> Result<GameOutcome> {
        let mut state = BoardState::with_rule(self.rule);

        loop {
            if let Some(outcome) = state.terminal_status().outcome() {
                return Ok(outcome);
            }

            let action = if state.to_move == self.agent_player {
                let action = agent.greedy_action(&state)?;
                samples.push(agent.value_of(&state, action));
                action
            } else {
                opponent.select_action(agent.table(), agent.encoding(), &state, 0.0)?
            };

            state = state.apply(action)?;
        }
    }
}

/// Evaluate with the default rule and the learner playing X.
pub fn evaluate(
    agent: &QLearningAgent,
    num_games: usize,
    opponent: &mut dyn Opponent,
    episode_index: usize,
) -> Result<EvaluationReport> {
    Evaluator::default().evaluate(agent, num_games, opponent, episode_index)
}
