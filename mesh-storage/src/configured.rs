//! Adapter selected from a `StoreConfig` at runtime.

use async_trait::async_trait;
use mesh_core::{BackendKind, MeshResult, StoreConfig};

use crate::adapter::StoreStorageAdapter;
use crate::filesystem::FileSystemStorageAdapter;
use crate::memory::MemoryStorageAdapter;
use crate::options::ProxyOptions;

/// Either built-in adapter, chosen by `StoreConfig::backend`.
#[derive(Debug)]
pub enum ConfiguredAdapter {
    Memory(MemoryStorageAdapter),
    FileSystem(FileSystemStorageAdapter),
}

impl ConfiguredAdapter {
    pub fn from_config(config: &StoreConfig) -> Self {
        match config.backend {
            BackendKind::Memory => ConfiguredAdapter::Memory(MemoryStorageAdapter::new()),
            BackendKind::FileSystem => {
                ConfiguredAdapter::FileSystem(FileSystemStorageAdapter::from_config(config))
            }
        }
    }

    pub fn backend(&self) -> BackendKind {
        match self {
            ConfiguredAdapter::Memory(_) => BackendKind::Memory,
            ConfiguredAdapter::FileSystem(_) => BackendKind::FileSystem,
        }
    }
}

#[async_trait]
impl StoreStorageAdapter for ConfiguredAdapter {
    async fn exists(&self, key: &str) -> MeshResult<bool> {
        match self {
            ConfiguredAdapter::Memory(a) => a.exists(key).await,
            ConfiguredAdapter::FileSystem(a) => a.exists(key).await,
        }
    }

    async fn read<O: ProxyOptions>(&self, key: &str, options: &O) -> MeshResult<O::Value> {
        match self {
            ConfiguredAdapter::Memory(a) => a.read(key, options).await,
            ConfiguredAdapter::FileSystem(a) => a.read(key, options).await,
        }
    }

    async fn write<O: ProxyOptions>(
        &self,
        key: &str,
        value: &O::Value,
        options: &O,
    ) -> MeshResult<()> {
        match self {
            ConfiguredAdapter::Memory(a) => a.write(key, value, options).await,
            ConfiguredAdapter::FileSystem(a) => a.write(key, value, options).await,
        }
    }

    async fn delete(&self, key: &str) -> MeshResult<()> {
        match self {
            ConfiguredAdapter::Memory(a) => a.delete(key).await,
            ConfiguredAdapter::FileSystem(a) => a.delete(key).await,
        }
    }
}
