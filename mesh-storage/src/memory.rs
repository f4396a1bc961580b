//! In-memory storage adapter.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use mesh_core::{MeshResult, StorageError};
use tracing::trace;

use crate::adapter::StoreStorageAdapter;
use crate::options::ProxyOptions;

type StoredValue = Arc<dyn Any + Send + Sync>;

/// Process-local adapter that keeps values in a map.
///
/// Values are stored as-is, without going through `codify`/`load`. Reading a
/// key back with a strategy of a different value type is a
/// `StorageError::TypeMismatch`. Deleting a missing key succeeds.
#[derive(Default)]
pub struct MemoryStorageAdapter {
    values: RwLock<HashMap<String, StoredValue>>,
}

impl MemoryStorageAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every stored value.
    pub fn clear(&self) -> MeshResult<()> {
        let mut values = self.values.write().map_err(|_| StorageError::LockPoisoned)?;
        values.clear();
        Ok(())
    }

    pub fn len(&self) -> MeshResult<usize> {
        let values = self.values.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(values.len())
    }

    pub fn is_empty(&self) -> MeshResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> MeshResult<Vec<String>> {
        let values = self.values.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut keys: Vec<String> = values.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl fmt::Debug for MemoryStorageAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = self.keys().unwrap_or_default();
        f.debug_struct("MemoryStorageAdapter")
            .field("keys", &keys)
            .finish()
    }
}

#[async_trait]
impl StoreStorageAdapter for MemoryStorageAdapter {
    async fn exists(&self, key: &str) -> MeshResult<bool> {
        let values = self.values.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(values.contains_key(key))
    }

    async fn read<O: ProxyOptions>(&self, key: &str, _options: &O) -> MeshResult<O::Value> {
        let values = self.values.read().map_err(|_| StorageError::LockPoisoned)?;
        let stored = values.get(key).ok_or_else(|| StorageError::NotFound {
            key: key.to_string(),
        })?;
        let value = stored
            .downcast_ref::<O::Value>()
            .ok_or_else(|| StorageError::TypeMismatch {
                key: key.to_string(),
                expected: std::any::type_name::<O::Value>().to_string(),
            })?;
        Ok(value.clone())
    }

    async fn write<O: ProxyOptions>(
        &self,
        key: &str,
        value: &O::Value,
        options: &O,
    ) -> MeshResult<()> {
        let mut values = self.values.write().map_err(|_| StorageError::LockPoisoned)?;
        values.insert(key.to_string(), Arc::new(value.clone()));
        trace!(key, strategy = options.name(), "Stored value in memory");
        Ok(())
    }

    async fn delete(&self, key: &str) -> MeshResult<()> {
        let mut values = self.values.write().map_err(|_| StorageError::LockPoisoned)?;
        values.remove(key);
        Ok(())
    }
}
