use clap::Parser;
use tempfile::tempdir;
use tictactoe5::{
    adapters::MsgPackRepository,
    cli::commands::train::{TrainArgs, execute},
    ports::QTableRepository,
    types::StateEncoding,
};

fn parse_args<I, T>(args: I) -> TrainArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    TrainArgs::parse_from(args)
}

#[test]
fn train_writes_agent_and_summary() {
    let tmp = tempdir().unwrap();
    let agent_path = tmp.path().join("agent.msgpack");
    let summary_path = tmp.path().join("summary.json");

    let args = parse_args([
        "ttt5-train",
        "--episodes",
        "40",
        "--opponent",
        "random",
        "--checkpoint-interval",
        "20",
        "--eval-games",
        "5",
        "--seed",
        "7",
        "--output",
        agent_path.to_str().unwrap(),
        "--summary",
        summary_path.to_str().unwrap(),
    ]);

    execute(args).expect("training should succeed");

    let saved = MsgPackRepository::new().load(&agent_path).unwrap();
    assert_eq!(saved.metadata.episodes_trained, 40);
    assert_eq!(saved.metadata.seed, Some(7));
    assert!(!saved.table.is_empty());

    let contents = std::fs::read_to_string(&summary_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(parsed["training"]["total_episodes"], 40);
    assert_eq!(parsed["final_evaluation"]["episode_index"], 40);
    assert_eq!(parsed["final_evaluation"]["games"], 5);
    assert_eq!(parsed["config"]["opponent"], "random");
    assert_eq!(parsed["q_table_size"], saved.table.len());
}

#[test]
fn summary_without_extension_appends_json() {
    let tmp = tempdir().unwrap();
    let summary_stem = tmp.path().join("run_overview");

    let args = parse_args([
        "ttt5-train",
        "--episodes",
        "5",
        "--eval-games",
        "0",
        "--summary",
        summary_stem.to_str().unwrap(),
    ]);

    execute(args).expect("training with summary should succeed");

    let expected_path = summary_stem.with_extension("json");
    assert!(
        expected_path.exists(),
        "expected summary at {}",
        expected_path.display()
    );
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&expected_path).unwrap()).unwrap();
    assert_eq!(parsed["training"]["total_episodes"], 5);
}

#[test]
fn summary_directory_argument_creates_default_file() {
    let tmp = tempdir().unwrap();
    let summary_dir = tmp.path().join("summaries");
    let summary_arg = format!("{}/", summary_dir.display());

    let args = parse_args([
        "ttt5-train",
        "--episodes",
        "3",
        "--eval-games",
        "0",
        "--summary",
        &summary_arg,
    ]);

    execute(args).expect("training with directory summary should succeed");
    assert!(summary_dir.join("training_summary.json").exists());
}

#[test]
fn config_file_is_merged_with_flags() {
    let tmp = tempdir().unwrap();
    let config_path = tmp.path().join("config.json");
    let agent_path = tmp.path().join("agent.msgpack");
    let history_path = tmp.path().join("history.csv");
    std::fs::write(
        &config_path,
        r#"{ "num_episodes": 30, "encoding": "symmetric", "checkpoint_interval": 10, "eval_games": 4 }"#,
    )
    .unwrap();

    let args = parse_args([
        "ttt5-train",
        "--config",
        config_path.to_str().unwrap(),
        "--episodes",
        "20",
        "--seed",
        "3",
        "--output",
        agent_path.to_str().unwrap(),
        "--history",
        history_path.to_str().unwrap(),
    ]);
    execute(args).unwrap();

    let saved = MsgPackRepository::new().load(&agent_path).unwrap();
    assert_eq!(saved.encoding, StateEncoding::Symmetric);
    assert_eq!(saved.metadata.episodes_trained, 20);

    let history = std::fs::read_to_string(&history_path).unwrap();
    // header plus checkpoints at 10 and 20
    assert_eq!(history.lines().count(), 3);
}

#[test]
fn resume_accumulates_episode_count() {
    let tmp = tempdir().unwrap();
    let first = tmp.path().join("first.msgpack");
    let second = tmp.path().join("second.msgpack");

    execute(parse_args([
        "ttt5-train",
        "--episodes",
        "15",
        "--eval-games",
        "0",
        "--output",
        first.to_str().unwrap(),
    ]))
    .unwrap();
    execute(parse_args([
        "ttt5-train",
        "--episodes",
        "10",
        "--eval-games",
        "0",
        "--resume",
        first.to_str().unwrap(),
        "--output",
        second.to_str().unwrap(),
    ]))
    .unwrap();

    let saved = MsgPackRepository::new().load(&second).unwrap();
    assert_eq!(saved.metadata.episodes_trained, 25);
}

#[test]
fn invalid_hyperparameter_fails() {
    let args = parse_args(["ttt5-train", "--episodes", "5", "--gamma", "1.5"]);
    assert!(execute(args).is_err());
}
