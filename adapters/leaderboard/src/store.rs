//! Storage backends for leaderboard records.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::Player;

/// Failures raised by a [`PlayerStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("failed to access leaderboard file {path}")]
    Io {
        /// File that was accessed.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
    /// The backing file does not hold a list of records.
    #[error("leaderboard file {path} is malformed")]
    Json {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// The store refuses to be read.
    #[error("leaderboard store is unavailable")]
    Unavailable,
}

/// Persistence seam for leaderboard records.
pub trait PlayerStore {
    /// Loads every stored record.
    fn load_players(&mut self) -> Result<Vec<Player>, StoreError>;

    /// Replaces the stored records with `players`.
    fn save_players(&mut self, players: &[Player]) -> Result<(), StoreError>;
}

/// Stores records as a pretty-printed JSON array.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PlayerStore for JsonFileStore {
    fn load_players(&mut self) -> Result<Vec<Player>, StoreError> {
        let json = fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;
        serde_json::from_str(&json).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn save_players(&mut self, players: &[Player]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let json = serde_json::to_string_pretty(players).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| self.io_error(source))
    }
}

/// Keeps records in memory; nothing survives the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    players: Vec<Player>,
    unreadable: bool,
}

impl MemoryStore {
    /// Creates a store preloaded with `players`.
    #[must_use]
    pub fn with_players(players: Vec<Player>) -> Self {
        Self {
            players,
            unreadable: false,
        }
    }

    /// Creates a store whose first load fails.
    #[must_use]
    pub fn unreadable() -> Self {
        Self {
            players: Vec::new(),
            unreadable: true,
        }
    }

    /// Records currently held.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }
}

impl PlayerStore for MemoryStore {
    fn load_players(&mut self) -> Result<Vec<Player>, StoreError> {
        if std::mem::take(&mut self.unreadable) {
            return Err(StoreError::Unavailable);
        }
        Ok(self.players.clone())
    }

    fn save_players(&mut self, players: &[Player]) -> Result<(), StoreError> {
        self.players = players.to_vec();
        Ok(())
    }
}
