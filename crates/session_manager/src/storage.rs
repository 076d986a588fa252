//! Durable key-value storage for session records

use crate::error::{Result, SessionError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

/// String key-value store shared by every session namespace.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; missing keys are not an error
    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// In-process store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().await.remove(key);
        Ok(())
    }
}

/// Single JSON document holding every key.
pub struct FileKeyValueStore {
    path: PathBuf,
    // serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path).await?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    /// Current document for a write. An unparsable document is replaced
    /// rather than blocking every later write; the flag reports that case.
    async fn load_for_write(&self) -> Result<(BTreeMap<String, String>, bool)> {
        match self.load().await {
            Ok(items) => Ok((items, false)),
            Err(SessionError::SerializationError(e)) => {
                tracing::warn!(
                    "Discarding unreadable session store {}: {}",
                    self.path.display(),
                    e
                );
                Ok((BTreeMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    async fn save(&self, items: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(items)?;
        fs::write(&self.path, contents).await?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load().await?.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let (mut items, _) = self.load_for_write().await?;
        items.insert(key.to_string(), value.to_string());
        self.save(&items).await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let (mut items, corrupt) = self.load_for_write().await?;
        if items.remove(key).is_some() || corrupt {
            self.save(&items).await?;
        }
        Ok(())
    }
}
