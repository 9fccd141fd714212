//! # JSON File Stores
//!
//! Favorites and the login session live as JSON files under
//! `~/.stagedoor/` (`favorites.json`, `session.json`).
//!
//! All writes use atomic rename (write `.tmp`, then `rename()`) for crash
//! safety. Filesystem work runs on the tokio blocking pool so store
//! effects never stall the runtime.
//!
//! A missing file is a normal empty store. A file that exists but does
//! not parse is an error; callers decide whether that surfaces to the
//! user or degrades to the empty state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::store::{FavoritesStore, SessionStore, StorageError};
use crate::api::types::{FavoriteEvent, Session};

/// Returns `~/.stagedoor/`, creating it if needed.
pub fn data_dir() -> io::Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory"))?;
    let dir = home.join(".stagedoor");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Atomically write `data` as JSON to `path` (via `.tmp` + rename).
fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StorageError> {
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| StorageError::Corrupt(e.to_string()))?;
    fs::write(&tmp_path, json).map_err(|e| StorageError::Io(e.to_string()))?;
    fs::rename(&tmp_path, path).map_err(|e| StorageError::Io(e.to_string()))?;
    Ok(())
}

/// Read JSON from `path`. A missing file yields `None`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path).map_err(|e| StorageError::Io(e.to_string()))?;
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| StorageError::Corrupt(e.to_string()))
}

async fn run_blocking<T, F>(work: F) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| StorageError::Io(e.to_string()))?
}

// ============================================================================
// Favorites
// ============================================================================

pub struct JsonFavoritesStore {
    path: PathBuf,
}

impl JsonFavoritesStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the default location, `~/.stagedoor/favorites.json`.
    pub fn in_data_dir() -> io::Result<Self> {
        Ok(Self::new(data_dir()?.join("favorites.json")))
    }
}

#[async_trait]
impl FavoritesStore for JsonFavoritesStore {
    async fn load(&self) -> Result<Vec<FavoriteEvent>, StorageError> {
        let path = self.path.clone();
        run_blocking(move || Ok(read_json(&path)?.unwrap_or_default())).await
    }

    async fn save(&self, favorites: &[FavoriteEvent]) -> Result<(), StorageError> {
        let path = self.path.clone();
        let favorites = favorites.to_vec();
        run_blocking(move || {
            atomic_write_json(&path, &favorites)?;
            debug!("saved {} favorites", favorites.len());
            Ok(())
        })
        .await
    }
}

// ============================================================================
// Session
// ============================================================================

pub struct JsonSessionStore {
    path: PathBuf,
}

impl JsonSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the default location, `~/.stagedoor/session.json`.
    pub fn in_data_dir() -> io::Result<Self> {
        Ok(Self::new(data_dir()?.join("session.json")))
    }
}

#[async_trait]
impl SessionStore for JsonSessionStore {
    async fn load(&self) -> Result<Option<Session>, StorageError> {
        let path = self.path.clone();
        run_blocking(move || read_json(&path)).await
    }

    async fn save(&self, session: &Session) -> Result<(), StorageError> {
        let path = self.path.clone();
        let session = session.clone();
        run_blocking(move || {
            atomic_write_json(&path, &session)?;
            debug!("saved session for user {}", session.user_id);
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let path = self.path.clone();
        run_blocking(move || match fs::remove_file(&path) {
            Ok(()) => {
                debug!("cleared stored session");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        })
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================
