//! Token Storage
//!
//! Key/value storage backends holding serialized token records.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{AccountError, AccountResult, StorageError};

/// Storage interface. Values are opaque strings; last write wins per key.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read the value at `key`.
    async fn get(&self, key: &str) -> AccountResult<Option<String>>;

    /// Write `value` at `key`.
    async fn set(&self, key: &str, value: String) -> AccountResult<()>;

    /// Delete `key`. Deleting an absent key is not an error.
    async fn remove(&self, key: &str) -> AccountResult<()>;
}

/// In-memory storage implementation.
#[derive(Default)]
pub struct InMemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn get(&self, key: &str) -> AccountResult<Option<String>> {
        Ok(self.values().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> AccountResult<()> {
        self.values().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> AccountResult<()> {
        self.values().remove(key);
        Ok(())
    }
}

/// Storage persisted as a single JSON object file mapping keys to values.
///
/// Writes go through a sibling temp file and a rename. The file is created
/// on first write; a missing file reads as empty.
pub struct FileStorage {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> AccountResult<BTreeMap<String, String>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(AccountError::Storage(StorageError::ReadFailed {
                    message: format!("{}: {e}", self.path.display()),
                }))
            }
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            AccountError::Storage(StorageError::ReadFailed {
                message: format!("{} is not a storage file: {e}", self.path.display()),
            })
        })
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> AccountResult<()> {
        let write_failed = |e: std::io::Error| {
            AccountError::Storage(StorageError::WriteFailed {
                message: format!("{}: {e}", self.path.display()),
            })
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
        }

        let contents = serde_json::to_string_pretty(map).map_err(|e| {
            AccountError::Storage(StorageError::WriteFailed {
                message: e.to_string(),
            })
        })?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, contents).await.map_err(write_failed)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(write_failed)
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn get(&self, key: &str) -> AccountResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_map().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> AccountResult<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value);
        self.write_map(&map).await
    }

    async fn remove(&self, key: &str) -> AccountResult<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        if map.remove(key).is_none() {
            return Ok(());
        }
        self.write_map(&map).await.map_err(|e| match e {
            AccountError::Storage(StorageError::WriteFailed { message }) => {
                AccountError::Storage(StorageError::DeleteFailed { message })
            }
            other => other,
        })
    }
}

/// Mock storage for testing.
#[derive(Default)]
pub struct MockStorage {
    values: Mutex<HashMap<String, String>>,
    get_history: Mutex<Vec<String>>,
    set_history: Mutex<Vec<(String, String)>>,
    remove_history: Mutex<Vec<String>>,
    next_error: Mutex<Option<AccountError>>,
    should_fail: Mutex<bool>,
    replacements: Mutex<HashMap<usize, String>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a raw value.
    pub fn insert_raw(&self, key: &str, value: impl Into<String>) -> &Self {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.into());
        self
    }

    /// Current raw value at `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    /// Set next error to return.
    pub fn set_next_error(&self, error: AccountError) -> &Self {
        *self.next_error.lock().unwrap() = Some(error);
        self
    }

    /// Set storage to fail all operations.
    pub fn set_should_fail(&self, should_fail: bool) -> &Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    /// Overwrite the value of the key read by the `call`-th `get` (1-based)
    /// just before it is read, simulating a concurrent writer.
    pub fn replace_before_get(&self, call: usize, value: impl Into<String>) -> &Self {
        self.replacements
            .lock()
            .unwrap()
            .insert(call, value.into());
        self
    }

    pub fn get_history(&self) -> Vec<String> {
        self.get_history.lock().unwrap().clone()
    }

    pub fn set_history(&self) -> Vec<(String, String)> {
        self.set_history.lock().unwrap().clone()
    }

    pub fn remove_history(&self) -> Vec<String> {
        self.remove_history.lock().unwrap().clone()
    }

    fn check_error(&self) -> AccountResult<()> {
        if *self.should_fail.lock().unwrap() {
            return Err(AccountError::Storage(StorageError::ReadFailed {
                message: "Mock storage failure".to_string(),
            }));
        }

        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }

        Ok(())
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn get(&self, key: &str) -> AccountResult<Option<String>> {
        self.check_error()?;
        let call = {
            let mut history = self.get_history.lock().unwrap();
            history.push(key.to_string());
            history.len()
        };
        if let Some(value) = self.replacements.lock().unwrap().remove(&call) {
            self.values.lock().unwrap().insert(key.to_string(), value);
        }
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> AccountResult<()> {
        self.check_error()?;
        self.set_history
            .lock()
            .unwrap()
            .push((key.to_string(), value.clone()));
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> AccountResult<()> {
        self.check_error()?;
        self.remove_history.lock().unwrap().push(key.to_string());
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}
