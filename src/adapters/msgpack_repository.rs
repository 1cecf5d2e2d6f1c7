//! MessagePack implementation of the Q-table repository.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use tracing::debug;

use crate::{Result, error::Error, ports::QTableRepository, q_learning::SavedAgent};

/// MessagePack-based agent repository.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
///
/// use tictactoe5::{adapters::MsgPackRepository, ports::QTableRepository};
///
/// let repo = MsgPackRepository::new();
/// let saved = repo.load(Path::new("agent.msgpack"))?;
/// println!("{} entries", saved.table.len());
/// # Ok::<(), tictactoe5::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    pub fn new() -> Self {
        Self
    }
}

impl QTableRepository for MsgPackRepository {
    fn save(&self, agent: &SavedAgent, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| Error::Io {
                operation: format!("create directory {parent:?}"),
                source,
            })?;
        }

        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write_named(&mut writer, agent).map_err(|e| {
            Error::SerializationContext {
                operation: "serialize agent to MessagePack".to_string(),
                message: e.to_string(),
            }
        })?;
        writer.flush().map_err(|source| Error::Io {
            operation: format!("flush file {path:?}"),
            source,
        })?;

        debug!(path = %path.display(), entries = agent.table.len(), "saved agent");
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedAgent> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;

        let agent: SavedAgent = rmp_serde::decode::from_read(BufReader::new(file)).map_err(
            |e| Error::SerializationContext {
                operation: "deserialize agent from MessagePack".to_string(),
                message: e.to_string(),
            },
        )?;
        agent.check_version()?;

        Ok(agent)
    }
}
