//! Repository port for saved agents.

use std::path::Path;

use crate::{Result, q_learning::SavedAgent};

/// Port for persisting and loading trained Q-tables.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
///
/// use tictactoe5::{ports::QTableRepository, q_learning::SavedAgent};
///
/// fn backup<R: QTableRepository>(repo: &R, agent: &SavedAgent) -> tictactoe5::Result<()> {
///     repo.save(agent, Path::new("backup.msgpack"))
/// }
/// ```
pub trait QTableRepository: Send + Sync {
    /// Save an agent to persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be written or serialization
    /// fails.
    fn save(&self, agent: &SavedAgent, path: &Path) -> Result<()>;

    /// Load an agent from persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, corrupt, or written by an
    /// unsupported format version.
    fn load(&self, path: &Path) -> Result<SavedAgent>;
}
