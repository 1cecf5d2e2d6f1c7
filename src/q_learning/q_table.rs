//! Q-table mapping (state, action) pairs to learned values

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{tictactoe::Action, types::StateKey};

/// One persisted Q-value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QEntry {
    pub state: StateKey,
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

/// Q-table keyed by state and action.
///
/// Unseen pairs read as 0.0. The table only grows: nothing is evicted or
/// pruned during training. It serializes as a list of [`QEntry`] sorted by
/// state and action, so saved files are stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<QEntry>", into = "Vec<QEntry>")]
pub struct QTable {
    values: HashMap<(StateKey, Action), f64>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value for a state-action pair, 0.0 if never written
    pub fn get(&self, state: StateKey, action: Action) -> f64 {
        self.values.get(&(state, action)).copied().unwrap_or(0.0)
    }

    /// Overwrite the value for a state-action pair
    pub fn update(&mut self, state: StateKey, action: Action, value: f64) {
        self.values.insert((state, action), value);
    }

    /// Highest-valued legal action.
    ///
    /// Ties go to the lowest row, then the lowest column, whatever order
    /// `legal` is given in. Returns `None` only for an empty slice.
    pub fn best_action(&self, state: StateKey, legal: &[Action]) -> Option<Action> {
        let mut best: Option<(Action, f64)> = None;
        for &action in legal {
            let value = self.get(state, action);
            best = match best {
                Some((best_action, best_value))
                    if best_value > value || (best_value == value && best_action < action) =>
                {
                    Some((best_action, best_value))
                }
                _ => Some((action, value)),
            };
        }
        best.map(|(action, _)| action)
    }

    /// Maximum value over legal actions; 0.0 for an empty slice
    pub fn max_q(&self, state: StateKey, legal: &[Action]) -> f64 {
        if legal.is_empty() {
            return 0.0;
        }
        legal
            .iter()
            .map(|&action| self.get(state, action))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Stored values for one state, sorted by action
    pub fn state_values(&self, state: StateKey) -> Vec<(Action, f64)> {
        let mut values: Vec<(Action, f64)> = self
            .values
            .iter()
            .filter(|((key, _), _)| *key == state)
            .map(|(&(_, action), &value)| (action, value))
            .collect();
        values.sort_by_key(|&(action, _)| action);
        values
    }

    /// Number of stored state-action pairs
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of distinct states with at least one stored value
    pub fn state_count(&self) -> usize {
        self.values
            .keys()
            .map(|(state, _)| *state)
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateKey, Action, f64)> + '_ {
        self.values
            .iter()
            .map(|(&(state, action), &value)| (state, action, value))
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.values().copied()
    }

    /// All entries in persisted order
    pub fn entries(&self) -> Vec<QEntry> {
        let mut entries: Vec<QEntry> = self
            .iter()
            .map(|(state, action, value)| QEntry {
                state,
                row: action.row,
                col: action.col,
                value,
            })
            .collect();
        entries.sort_by_key(|e| (e.state, e.row, e.col));
        entries
    }
}

impl From<Vec<QEntry>> for QTable {
    fn from(entries: Vec<QEntry>) -> Self {
        QTable {
            values: entries
                .into_iter()
                .map(|e| ((e.state, Action::new(e.row, e.col)), e.value))
                .collect(),
        }
    }
}

impl From<QTable> for Vec<QEntry> {
    fn from(table: QTable) -> Self {
        table.entries()
    }
}
