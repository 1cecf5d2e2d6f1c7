//! In-memory agent repository for testing.
//!
//! Agents are still encoded to MessagePack bytes, so a save/load cycle goes
//! through the same serialization as a file would, without touching disk.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{Result, error::Error, ports::QTableRepository, q_learning::SavedAgent};

/// In-memory repository for testing.
///
/// All clones share the same underlying storage.
///
/// # Examples
///
/// ```
/// use std::path::Path;
///
/// use tictactoe5::{
///     adapters::InMemoryRepository,
///     ports::QTableRepository,
///     q_learning::{QLearningAgent, SavedAgent, TrainingMetadata},
///     tictactoe::WinRule,
///     types::StateEncoding,
/// };
///
/// let repo = InMemoryRepository::new();
/// let agent = QLearningAgent::new(0.1, 0.9, StateEncoding::Raw);
/// let saved = SavedAgent::from_agent(&agent, WinRule::default(), TrainingMetadata::default());
///
/// repo.save(&saved, Path::new("agent"))?;
/// let loaded = repo.load(Path::new("agent"))?;
/// assert_eq!(loaded, saved);
/// # Ok::<(), tictactoe5::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of agents currently stored.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    pub fn clear(&self) {
        self.storage().clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.storage().contains_key(&key(path))
    }
}

fn key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

impl QTableRepository for InMemoryRepository {
    fn save(&self, agent: &SavedAgent, path: &Path) -> Result<()> {
        let bytes = rmp_serde::to_vec_named(agent).map_err(|e| Error::SerializationContext {
            operation: "serialize agent for in-memory storage".to_string(),
            message: e.to_string(),
        })?;

        self.storage().insert(key(path), bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedAgent> {
        let storage = self.storage();
        let bytes = storage.get(&key(path)).ok_or_else(|| Error::Io {
            operation: format!("load agent from in-memory storage at {path:?}"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "key not found in memory"),
        })?;

        let agent: SavedAgent =
            rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
                operation: "deserialize agent from in-memory storage".to_string(),
                message: e.to_string(),
            })?;
        agent.check_version()?;
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        q_learning::{QLearningAgent, TrainingMetadata},
        tictactoe::WinRule,
        types::StateEncoding,
    };

    fn saved() -> SavedAgent {
        let agent = QLearningAgent::new(0.1, 0.9, StateEncoding::Symmetric);
        SavedAgent::from_agent(&agent, WinRule::FiveInARow, TrainingMetadata::default())
    }

    #[test]
    fn test_in_memory_save_and_load() {
        let repo = InMemoryRepository::new();
        let path = Path::new("agent");

        assert_eq!(repo.count(), 0);
        assert!(!repo.contains(path));

        repo.save(&saved(), path).unwrap();
        assert_eq!(repo.count(), 1);
        assert!(repo.contains(path));

        let loaded = repo.load(path).unwrap();
        assert_eq!(loaded.encoding, StateEncoding::Symmetric);
        assert_eq!(loaded.rule, WinRule::FiveInARow);
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let repo = InMemoryRepository::new();
        assert!(repo.load(Path::new("nonexistent")).is_err());
    }

    #[test]
    fn test_clone_shares_storage() {
        let repo1 = InMemoryRepository::new();
        let repo2 = repo1.clone();

        repo1.save(&saved(), Path::new("shared")).unwrap();
        assert!(repo2.load(Path::new("shared")).is_ok());
        assert_eq!(repo2.count(), 1);

        repo2.clear();
        assert_eq!(repo1.count(), 0);
    }
}
