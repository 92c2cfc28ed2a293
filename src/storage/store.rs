// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::errors::StorageError;
use crate::storage::PersistedState;

/// Durable home of [`PersistedState`].
///
/// `save` replaces the whole state; a reader never sees a partial write.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// The last saved state, `None` on first start.
    async fn load(&self) -> Result<Option<PersistedState>, StorageError>;

    async fn save(&self, state: &PersistedState) -> Result<(), StorageError>;
}

/// State kept as a pretty-printed JSON document on disk.
///
/// Writes go to a sibling temporary file that is renamed over the target.
/// Saves through one store are serialized since they share that file.
pub struct JsonFileStore {
    path: PathBuf,
    writing: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writing: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, state: &PersistedState) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(state)?;
        let _writing = self.writing.lock().await;
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

/// In-process store; state survives a platform restart but not process exit.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Option<PersistedState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, state: &PersistedState) -> Result<(), StorageError> {
        *self.state.lock().await = Some(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DatapointValue, Reading};
    use crate::storage::{PersistedNorth, PersistedStage};
    use std::collections::BTreeMap;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn sample_state() -> PersistedState {
        let mut state = PersistedState::new();
        state.statistics.insert("READINGS".into(), 42);
        state.north.push(PersistedNorth {
            name: "Archive".into(),
            plugin: "capture".into(),
            schedule_id: Uuid::new_v4(),
            enabled: false,
            interval_ms: 500,
            values: BTreeMap::from([("blockSize".to_string(), "10".to_string())]),
            pipeline: vec![PersistedStage {
                name: "SF1".into(),
                values: BTreeMap::from([("factor".to_string(), "2.0".to_string())]),
            }],
            pending: vec![Reading::new("counter", "Counter #1")
                .with_datapoint("value", DatapointValue::Integer(7))],
        });
        state
    }

    #[tokio::test]
    async fn test_file_store_missing_file_loads_none() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let state = sample_state();

        JsonFileStore::new(&path).save(&state).await.unwrap();

        let loaded = JsonFileStore::new(&path).load().await.unwrap().unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.pending_readings(), 1);
        assert!(!path.with_file_name("state.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let result = JsonFileStore::new(&path).load().await;
        assert!(matches!(result, Err(StorageError::Encoding(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_file_store_concurrent_saves_all_succeed() {
        let dir = tempdir().unwrap();
        let store = std::sync::Arc::new(JsonFileStore::new(dir.path().join("state.json")));

        let mut handles = Vec::new();
        for n in 0..32u64 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let mut state = sample_state();
                state.statistics.insert("READINGS".into(), n);
                store.save(&state).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let loaded = store.load().await.unwrap().unwrap();
        assert!(loaded.statistics["READINGS"] < 32);
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().await.unwrap().is_none());

        let state = sample_state();
        store.save(&state).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(state));
    }
}
