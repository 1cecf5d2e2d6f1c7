//! Q-learning behavior end to end: updates, exploration and convergence

mod common;

use tictactoe5::{
    opponents::{OpponentType, RandomOpponent},
    pipeline::{Evaluator, Opponent, Trainer, TrainingConfig},
    q_learning::{EpsilonSchedule, QLearningAgent, QTable, Transition},
    tictactoe::{Action, BoardState, D4Transform, Player, WinRule},
    types::StateEncoding,
};

#[test]
fn fresh_update_with_unit_reward() {
    let mut agent = QLearningAgent::new(0.5, 0.9, StateEncoding::Raw);
    let state = BoardState::new();
    let next = common::board(&[(2, 2), (0, 0)]);

    let transition = Transition {
        state: state.key(),
        action: Action::center(),
        reward: 1.0,
        next_state: next.key(),
        next_legal_actions: next.empty_actions(),
        done: false,
    };
    let value = agent.learn(&transition);

    // 0 + 0.5 * (1 + 0.9 * 0 - 0)
    assert_eq!(value, 0.5);
    assert_eq!(agent.table().get(state.key(), Action::center()), 0.5);
    assert_eq!(agent.table().len(), 1);
}

#[test]
fn unseen_pairs_read_as_zero() {
    let table = QTable::new();
    let state = common::board(&[(1, 1)]);
    for action in state.empty_actions() {
        assert_eq!(table.get(state.key(), action), 0.0);
    }
}

#[test]
fn epsilon_is_non_increasing() {
    for schedule in [
        EpsilonSchedule::Exponential { decay: 0.995 },
        EpsilonSchedule::Exponential { decay: 0.9 },
        EpsilonSchedule::Linear { episodes: 300 },
    ] {
        let mut previous = schedule.epsilon_at(0, 1.0, 0.05);
        assert_eq!(previous, 1.0);
        for episode in 1..2_000 {
            let epsilon = schedule.epsilon_at(episode, 1.0, 0.05);
            assert!(epsilon <= previous, "{schedule:?} rose at episode {episode}");
            assert!(epsilon >= 0.05);
            previous = epsilon;
        }
        assert_eq!(previous, 0.05);
    }
}

/// Always takes the first empty cell in row-major order. The untrained
/// greedy learner breaks ties the same way, and as X it loses that race to
/// O's anti-diagonal (0,3)..(3,0).
struct FirstEmptyCell;

impl Opponent for FirstEmptyCell {
    fn select_action(
        &mut self,
        _table: &QTable,
        _encoding: StateEncoding,
        state: &BoardState,
        _epsilon: f64,
    ) -> tictactoe5::Result<Action> {
        Ok(state.legal_actions()?[0])
    }

    fn name(&self) -> &str {
        "first-empty-cell"
    }

    fn for_evaluation(&self, _seed: Option<u64>) -> Box<dyn Opponent> {
        Box::new(FirstEmptyCell)
    }
}

#[test]
fn training_turns_losses_into_wins() {
    let evaluator = Evaluator::new(WinRule::FourInARow, Player::X);
    let untrained = QLearningAgent::new(0.1, 0.9, StateEncoding::Raw);
    let before = evaluator
        .evaluate(&untrained, 10, &mut FirstEmptyCell, 0)
        .unwrap();
    assert_eq!(before.win_rate, 0.0);
    assert_eq!(before.loss_rate, 1.0);

    let config = TrainingConfig::default()
        .with_episodes(2_000)
        .with_checkpoints(500, 1)
        .with_seed(2024);
    let agent = QLearningAgent::new(0.1, 0.9, StateEncoding::Raw);
    let mut trainer = Trainer::new(config, agent, Box::new(FirstEmptyCell)).unwrap();
    let result = trainer.run().unwrap();
    assert_eq!(result.total_episodes, 2_000);
    assert_eq!(result.checkpoints.len(), 4);
    assert_eq!(result.final_report().unwrap().win_rate, 1.0);

    let after = evaluator
        .evaluate(trainer.agent(), 10, &mut FirstEmptyCell, 2_000)
        .unwrap();
    assert_eq!(
        after.win_rate, 1.0,
        "greedy play after training should beat the scripted opponent"
    );
    assert!(after.mean_q > before.mean_q);
}

#[test]
fn trained_agent_holds_up_against_random() {
    let evaluator = Evaluator::new(WinRule::FourInARow, Player::X);
    let untrained = QLearningAgent::new(0.1, 0.9, StateEncoding::Raw);
    let baseline = evaluator
        .evaluate(&untrained, 200, &mut RandomOpponent::with_seed(99), 0)
        .unwrap();

    let config = TrainingConfig::default()
        .with_episodes(4_000)
        .with_opponent(OpponentType::Random)
        .with_checkpoints(1_000, 50)
        .with_seed(2024);
    let mut trainer = Trainer::from_config(config).unwrap();
    trainer.run().unwrap();

    let report = evaluator
        .evaluate(trainer.agent(), 200, &mut RandomOpponent::with_seed(99), 4_000)
        .unwrap();
    assert!(report.win_rate >= 0.6, "win rate was {}", report.win_rate);
    assert!(report.win_rate >= baseline.win_rate);
}

#[test]
fn training_is_reproducible_with_a_seed() {
    let config = TrainingConfig::default()
        .with_episodes(200)
        .with_checkpoints(100, 20)
        .with_seed(5);

    let mut first = Trainer::from_config(config.clone()).unwrap();
    let mut second = Trainer::from_config(config).unwrap();
    let a = first.run().unwrap();
    let b = second.run().unwrap();

    assert_eq!(a, b);
    assert_eq!(first.agent().table(), second.agent().table());
}

#[test]
fn self_play_learns_both_sides() {
    let config = TrainingConfig::default()
        .with_episodes(300)
        .with_opponent(OpponentType::SelfPlay)
        .with_checkpoints(300, 10)
        .with_seed(11);
    let mut trainer = Trainer::from_config(config).unwrap();
    trainer.run().unwrap();

    let table = trainer.agent().table();
    let x_entries = table
        .iter()
        .filter(|(state, _, _)| state.to_move() == Player::X)
        .count();
    let o_entries = table
        .iter()
        .filter(|(state, _, _)| state.to_move() == Player::O)
        .count();
    assert!(x_entries > 0);
    assert!(o_entries > 0);
}

#[test]
fn learner_as_o_only_learns_o_positions() {
    let config = TrainingConfig::default()
        .with_episodes(200)
        .with_agent_player(Player::O)
        .with_checkpoints(200, 10)
        .with_seed(8);
    let mut trainer = Trainer::from_config(config).unwrap();
    trainer.run().unwrap();

    let table = trainer.agent().table();
    assert!(!table.is_empty());
    assert!(
        table
            .iter()
            .all(|(state, _, _)| state.to_move() == Player::O)
    );
}

#[test]
fn evaluation_leaves_the_table_untouched() {
    let config = TrainingConfig::default()
        .with_episodes(100)
        .with_checkpoints(100, 10)
        .with_seed(1);
    let mut trainer = Trainer::from_config(config).unwrap();
    trainer.run().unwrap();
    let agent = trainer.into_agent();
    let before = agent.table().clone();

    let mut opponent = RandomOpponent::with_seed(4);
    Evaluator::default()
        .evaluate(&agent, 50, &mut opponent, 100)
        .unwrap();
    assert_eq!(agent.table(), &before);
}

#[test]
fn symmetric_encoding_shares_keys_across_rotations() {
    let state = common::board(&[(0, 0), (0, 1), (3, 2)]);
    let ctx = StateEncoding::Symmetric.context(&state);

    for t in D4Transform::all() {
        let rotated = state.transform(&t);
        let rotated_ctx = StateEncoding::Symmetric.context(&rotated);
        assert_eq!(ctx.key, rotated_ctx.key);

        for action in rotated.empty_actions() {
            let canonical = rotated_ctx.map_action_to_canonical(action);
            assert_eq!(rotated_ctx.map_canonical_to_original(canonical), action);
        }
    }
}

#[test]
fn symmetric_training_stores_only_canonical_keys() {
    let config = TrainingConfig::default()
        .with_episodes(300)
        .with_encoding(StateEncoding::Symmetric)
        .with_checkpoints(300, 10)
        .with_seed(21);
    let mut trainer = Trainer::from_config(config).unwrap();
    trainer.run().unwrap();

    let table = trainer.agent().table();
    assert!(!table.is_empty());
    for (key, _, _) in table.iter() {
        let board = BoardState {
            cells: key.cells(),
            to_move: key.to_move(),
            rule: WinRule::FourInARow,
        };
        assert_eq!(StateEncoding::Symmetric.context(&board).key, key);
    }
}
