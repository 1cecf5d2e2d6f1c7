//! Observer implementations for training runs

use std::{
    fs::File,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use super::evaluation::EvaluationReport;
use crate::{
    Error, Result,
    ports::Observer,
    tictactoe::{GameOutcome, Player},
};

/// Progress bar observer - shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    agent_player: Player,
    wins: usize,
    draws: usize,
    losses: usize,
    last_win_rate: Option<f64>,
}

impl ProgressObserver {
    /// Counts outcomes from `agent_player`'s side
    pub fn new(agent_player: Player) -> Self {
        Self {
            progress_bar: None,
            agent_player,
            wins: 0,
            draws: 0,
            losses: 0,
            last_win_rate: None,
        }
    }

    fn message(&self) -> String {
        let mut message = format!("{} D:{} L:{}", self.wins, self.draws, self.losses);
        if let Some(rate) = self.last_win_rate {
            message.push_str(&format!(" eval:{:.1}%", rate * 100.0));
        }
        message
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new(Player::X)
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        let pb = ProgressBar::new(total_episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes (W:{msg})")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, episode: usize, outcome: GameOutcome) -> Result<()> {
        match outcome {
            GameOutcome::Win(winner) if winner == self.agent_player => self.wins += 1,
            GameOutcome::Win(_) => self.losses += 1,
            GameOutcome::Draw => self.draws += 1,
        }

        if let Some(pb) = &self.progress_bar {
            pb.set_position(episode as u64 + 1);
            pb.set_message(self.message());
        }
        Ok(())
    }

    fn on_checkpoint(&mut self, report: &EvaluationReport) -> Result<()> {
        self.last_win_rate = Some(report.win_rate);
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_episodes: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub draw_rate: f64,
    pub loss_rate: f64,
    /// Checkpoint win rates in order, for learning curves
    pub checkpoint_win_rates: Vec<(usize, f64)>,
}

#[derive(Debug, Default)]
struct Metrics {
    wins: usize,
    draws: usize,
    losses: usize,
    total: usize,
    checkpoints: Vec<(usize, f64)>,
}

/// Metrics observer - tracks outcome counts and the evaluation curve.
///
/// Clones share their counters, so keep one clone to read the summary after
/// the trainer has taken ownership of the other.
#[derive(Clone)]
pub struct MetricsObserver {
    agent_player: Player,
    metrics: Arc<Mutex<Metrics>>,
}

impl MetricsObserver {
    pub fn new(agent_player: Player) -> Self {
        Self {
            agent_player,
            metrics: Arc::new(Mutex::new(Metrics::default())),
        }
    }

    fn metrics(&self) -> MutexGuard<'_, Metrics> {
        self.metrics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn summary(&self) -> MetricsSummary {
        let m = self.metrics();
        let rate = |count: usize| {
            if m.total == 0 {
                0.0
            } else {
                count as f64 / m.total as f64
            }
        };
        MetricsSummary {
            total_episodes: m.total,
            wins: m.wins,
            draws: m.draws,
            losses: m.losses,
            win_rate: rate(m.wins),
            draw_rate: rate(m.draws),
            loss_rate: rate(m.losses),
            checkpoint_win_rates: m.checkpoints.clone(),
        }
    }
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new(Player::X)
    }
}

impl Observer for MetricsObserver {
    fn on_episode_end(&mut self, _episode: usize, outcome: GameOutcome) -> Result<()> {
        let agent_player = self.agent_player;
        let mut m = self.metrics();
        m.total += 1;
        match outcome {
            GameOutcome::Win(winner) if winner == agent_player => m.wins += 1,
            GameOutcome::Win(_) => m.losses += 1,
            GameOutcome::Draw => m.draws += 1,
        }
        Ok(())
    }

    fn on_checkpoint(&mut self, report: &EvaluationReport) -> Result<()> {
        self.metrics()
            .checkpoints
            .push((report.episode_index, report.win_rate));
        Ok(())
    }
}

/// CSV observer - appends one row per checkpoint report.
///
/// Columns follow [`EvaluationReport`] field order and a header row is
/// written first. Rows are flushed as they arrive so an interrupted run keeps
/// every completed checkpoint.
pub struct CsvReportObserver {
    writer: csv::Writer<File>,
}

impl CsvReportObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create report file {path:?}"),
            source,
        })?;
        Ok(Self {
            writer: csv::Writer::from_writer(file),
        })
    }
}

impl Observer for CsvReportObserver {
    fn on_checkpoint(&mut self, report: &EvaluationReport) -> Result<()> {
        self.writer.serialize(report)?;
        self.writer.flush()?;
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn report(episode_index: usize, win_rate: f64) -> EvaluationReport {
        EvaluationReport {
            episode_index,
            games: 10,
            wins: (win_rate * 10.0) as usize,
            draws: 0,
            losses: 10 - (win_rate * 10.0) as usize,
            win_rate,
            draw_rate: 0.0,
            loss_rate: 1.0 - win_rate,
            mean_q: 0.25,
            std_q: 0.1,
            q_table_size: 42,
            epsilon: 0.5,
        }
    }

    #[test]
    fn test_metrics_observer_counts_from_agent_side() {
        let observer = MetricsObserver::new(Player::O);
        let mut boxed: Box<dyn Observer> = Box::new(observer.clone());

        boxed.on_episode_end(0, GameOutcome::Win(Player::O)).unwrap();
        boxed.on_episode_end(1, GameOutcome::Win(Player::X)).unwrap();
        boxed.on_episode_end(2, GameOutcome::Draw).unwrap();
        boxed.on_episode_end(3, GameOutcome::Win(Player::O)).unwrap();
        boxed.on_checkpoint(&report(4, 0.5)).unwrap();

        let summary = observer.summary();
        assert_eq!(summary.total_episodes, 4);
        assert_eq!(summary.wins, 2);
        assert_eq!(summary.losses, 1);
        assert_eq!(summary.draws, 1);
        assert_eq!(summary.win_rate, 0.5);
        assert_eq!(summary.checkpoint_win_rates, vec![(4, 0.5)]);
    }

    #[test]
    fn test_csv_observer_writes_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.csv");

        let mut observer = CsvReportObserver::new(&path).unwrap();
        observer.on_checkpoint(&report(100, 0.3)).unwrap();
        observer.on_checkpoint(&report(200, 0.7)).unwrap();
        observer.on_training_end().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "episode_index,games,wins,draws,losses,win_rate,draw_rate,loss_rate,mean_q,std_q,q_table_size,epsilon"
        );
        assert!(lines[2].starts_with("200,10,7,0,3,0.7,"));
    }
}
