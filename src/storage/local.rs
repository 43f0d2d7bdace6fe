//! Local filesystem storage implementation.
//!
//! Keeps the watch state in one JSON file, replaced atomically on save.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::WatchState;
use crate::storage::StateStorage;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Create a LocalStorage backed by the given state file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(&bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self.read_bytes().await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StateStorage for LocalStorage {
    async fn load_state(&self) -> WatchState {
        match self.read_json::<WatchState>().await {
            Ok(Some(state)) => {
                log::debug!(
                    "Loaded {} state entries from {}",
                    state.len(),
                    self.path.display()
                );
                state
            }
            Ok(None) => {
                log::info!(
                    "No state file at {}, starting fresh",
                    self.path.display()
                );
                WatchState::new()
            }
            Err(e) => {
                log::warn!(
                    "State file {} is unreadable ({}), starting fresh",
                    self.path.display(),
                    e
                );
                WatchState::new()
            }
        }
    }

    async fn save_state(&self, state: &WatchState) -> Result<()> {
        self.write_json(state).await?;
        log::info!(
            "Saved {} state entries to {}",
            state.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SizeLabel, Status, WatchKey};
    use crate::pipeline::ChangeDetector;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty_state() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("watch_state.json"));

        assert!(storage.load_state().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty_state() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("watch_state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let storage = LocalStorage::new(&path);
        assert!(storage.load_state().await.is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_entry_keeps_the_rest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("watch_state.json");
        std::fs::write(&path, r#"{ "A|2XS": "unavailable", "B|2XS": "test" }"#).unwrap();

        let mut state = LocalStorage::new(&path).load_state().await;
        assert_eq!(state.len(), 1);

        let key = WatchKey::new("A", SizeLabel::Xxs);
        assert_eq!(state.get(&key), Some(Status::Unavailable));

        let detection = ChangeDetector::new(true).observe(&key, Status::Available, &mut state);
        assert!(detection.should_alert());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("nested/dir/watch_state.json"));
        let key = WatchKey::new("Canyon Allroad R138_P01", SizeLabel::Xxs);

        let mut state = WatchState::new();
        state.upsert(&key, Status::Unavailable);
        storage.save_state(&state).await.unwrap();

        let loaded = storage.load_state().await;
        assert_eq!(loaded, state);
        assert!(!storage.path().with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_file() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("watch_state.json"));
        let key = WatchKey::new("Bike", SizeLabel::M);

        let mut state = WatchState::new();
        state.upsert(&key, Status::Unavailable);
        storage.save_state(&state).await.unwrap();
        state.upsert(&key, Status::Available);
        storage.save_state(&state).await.unwrap();

        let raw = std::fs::read_to_string(storage.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json, serde_json::json!({ "Bike|M": "available" }));
    }

    #[tokio::test]
    async fn test_reads_state_written_by_hand() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("watch_state.json");
        std::fs::write(
            &path,
            "{\n  \"Canyon Allroad R138_P02|2XS\": \"available\"\n}",
        )
        .unwrap();

        let state = LocalStorage::new(&path).load_state().await;
        assert_eq!(
            state.get(&WatchKey::new("Canyon Allroad R138_P02", SizeLabel::Xxs)),
            Some(Status::Available)
        );
    }
}
