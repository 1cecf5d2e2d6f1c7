//! Exploration-rate annealing

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How epsilon moves from its start value toward its floor over episodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EpsilonSchedule {
    /// Multiply by `decay` after every episode
    Exponential { decay: f64 },
    /// Straight line from start to end over `episodes` episodes
    Linear { episodes: usize },
}

impl Default for EpsilonSchedule {
    fn default() -> Self {
        EpsilonSchedule::Exponential { decay: 0.995 }
    }
}

impl EpsilonSchedule {
    pub fn validate(&self) -> Result<()> {
        match *self {
            EpsilonSchedule::Exponential { decay } if !(decay > 0.0 && decay <= 1.0) => Err(
                Error::config(format!("epsilon decay must be in (0, 1], got {decay}")),
            ),
            EpsilonSchedule::Linear { episodes: 0 } => Err(Error::config(
                "linear epsilon schedule needs at least one episode",
            )),
            _ => Ok(()),
        }
    }

    /// Epsilon in force during `episode` (0-based).
    ///
    /// Never below `end` and never increasing in `episode` as long as
    /// `end <= start`.
    pub fn epsilon_at(&self, episode: usize, start: f64, end: f64) -> f64 {
        let value = match *self {
            EpsilonSchedule::Exponential { decay } => {
                let steps = i32::try_from(episode).unwrap_or(i32::MAX);
                start * decay.powi(steps)
            }
            EpsilonSchedule::Linear { episodes } => {
                let progress = (episode as f64 / episodes.max(1) as f64).min(1.0);
                start + (end - start) * progress
            }
        };
        value.max(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_matches_per_episode_decay() {
        let schedule = EpsilonSchedule::default();
        assert_eq!(schedule.epsilon_at(0, 1.0, 0.01), 1.0);
        assert!((schedule.epsilon_at(1, 1.0, 0.01) - 0.995).abs() < 1e-12);

        let mut eps = 1.0_f64;
        for _ in 0..100 {
            eps = (eps * 0.995).max(0.01);
        }
        assert!((schedule.epsilon_at(100, 1.0, 0.01) - eps).abs() < 1e-9);
    }

    #[test]
    fn test_exponential_is_clamped_and_monotonic() {
        let schedule = EpsilonSchedule::Exponential { decay: 0.9 };
        let values: Vec<f64> = (0..500).map(|e| schedule.epsilon_at(e, 1.0, 0.05)).collect();
        assert!(values.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(*values.last().unwrap(), 0.05);
    }

    #[test]
    fn test_linear_reaches_end() {
        let schedule = EpsilonSchedule::Linear { episodes: 10 };
        assert_eq!(schedule.epsilon_at(0, 1.0, 0.0), 1.0);
        assert!((schedule.epsilon_at(5, 1.0, 0.0) - 0.5).abs() < 1e-12);
        assert_eq!(schedule.epsilon_at(10, 1.0, 0.0), 0.0);
        assert_eq!(schedule.epsilon_at(1_000, 1.0, 0.0), 0.0);

        let values: Vec<f64> = (0..20).map(|e| schedule.epsilon_at(e, 0.8, 0.1)).collect();
        assert!(values.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_validate() {
        assert!(EpsilonSchedule::default().validate().is_ok());
        assert!(EpsilonSchedule::Exponential { decay: 0.0 }.validate().is_err());
        assert!(EpsilonSchedule::Exponential { decay: 1.5 }.validate().is_err());
        assert!(EpsilonSchedule::Exponential { decay: f64::NAN }.validate().is_err());
        assert!(EpsilonSchedule::Linear { episodes: 0 }.validate().is_err());
    }
}
