//! Namespace hierarchy of stores over one shared adapter.

use std::sync::Arc;

use mesh_core::{FlagOverrides, Identifier, MeshResult, StoreConfig, StoreFlags};
use tracing::{debug, info};

use crate::adapter::StoreStorageAdapter;
use crate::configured::ConfiguredAdapter;
use crate::filesystem::FileSystemStorageAdapter;
use crate::memory::MemoryStorageAdapter;
use crate::options::ProxyOptions;
use crate::proxy::StoreProxy;

/// A node in the store tree.
///
/// Nodes are immutable after construction. Children share the parent's
/// adapter and differ only in identifier and flags, so `store.child("a")
/// .proxy("k", ..)` and `store.proxy("a/k", ..)` address the same key.
pub struct MeshStore<A: StoreStorageAdapter> {
    identifier: Identifier,
    storage: Arc<A>,
    flags: StoreFlags,
}

impl<A: StoreStorageAdapter> MeshStore<A> {
    pub fn new(identifier: impl Into<Identifier>, storage: Arc<A>, flags: StoreFlags) -> Self {
        Self {
            identifier: identifier.into(),
            storage,
            flags,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn flags(&self) -> StoreFlags {
        self.flags
    }

    /// Shared adapter.
    pub fn storage(&self) -> &Arc<A> {
        &self.storage
    }

    /// Derive a child namespace. Set overrides replace the parent's flags.
    pub fn child(&self, child_id: &str, overrides: Option<FlagOverrides>) -> Self {
        let flags = match overrides {
            Some(overrides) => self.flags.merge(overrides),
            None => self.flags,
        };
        let identifier = self.identifier.join(child_id);
        debug!(parent = %self.identifier, child = %identifier, ?flags, "Derived child store");
        Self {
            identifier,
            storage: Arc::clone(&self.storage),
            flags,
        }
    }

    /// A fresh proxy for `key` under this namespace.
    ///
    /// Each call returns an independent proxy with its own cache, even for a
    /// key that already has one.
    pub fn proxy<O: ProxyOptions>(&self, key: &str, options: O) -> StoreProxy<A, O> {
        StoreProxy::new(
            self.identifier.join(key),
            self.identifier.clone(),
            Arc::clone(&self.storage),
            options,
            self.flags,
        )
    }
}

impl<A: StoreStorageAdapter> Clone for MeshStore<A> {
    fn clone(&self) -> Self {
        Self {
            identifier: self.identifier.clone(),
            storage: Arc::clone(&self.storage),
            flags: self.flags,
        }
    }
}

impl<A: StoreStorageAdapter> std::fmt::Debug for MeshStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshStore")
            .field("identifier", &self.identifier)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl MeshStore<MemoryStorageAdapter> {
    /// Root store over a new in-memory adapter.
    pub fn in_memory(identifier: impl Into<Identifier>, flags: StoreFlags) -> Self {
        Self::new(identifier, Arc::new(MemoryStorageAdapter::new()), flags)
    }
}

impl MeshStore<FileSystemStorageAdapter> {
    /// Root store writing modules under `config.root_dir`.
    pub fn on_disk(config: &StoreConfig) -> MeshResult<Self> {
        config.validate()?;
        let adapter = FileSystemStorageAdapter::from_config(config);
        info!(
            root = %adapter.root().display(),
            extension = adapter.extension(),
            identifier = %config.identifier,
            "Opened filesystem store"
        );
        Ok(Self::new(
            config.identifier.clone(),
            Arc::new(adapter),
            config.flags,
        ))
    }
}

impl MeshStore<ConfiguredAdapter> {
    /// Root store over whichever backend `config` names.
    pub fn from_config(config: &StoreConfig) -> MeshResult<Self> {
        config.validate()?;
        let adapter = ConfiguredAdapter::from_config(config);
        info!(
            backend = ?adapter.backend(),
            identifier = %config.identifier,
            "Opened store"
        );
        Ok(Self::new(
            config.identifier.clone(),
            Arc::new(adapter),
            config.flags,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::StringWithoutValidation;
    use mesh_core::{BackendKind, MeshError};
    use tempfile::TempDir;

    #[test]
    fn test_child_joins_identifier_and_merges_flags() {
        let root = MeshStore::in_memory("root", StoreFlags::new(true, false));
        let child = root.child("a", Some(FlagOverrides::new().validate(true)));

        assert_eq!(child.identifier().as_str(), "root/a");
        assert_eq!(child.flags(), StoreFlags::new(true, true));
        assert_eq!(root.flags(), StoreFlags::new(true, false));
        assert!(Arc::ptr_eq(root.storage(), child.storage()));

        let inherited = child.child("b", None);
        assert_eq!(inherited.identifier().as_str(), "root/a/b");
        assert_eq!(inherited.flags(), child.flags());
    }

    #[test]
    fn test_proxy_identifier_and_namespace() {
        let root = MeshStore::in_memory("root", StoreFlags::writable());
        let proxy = root.child("a", None).proxy("k", StringWithoutValidation);
        assert_eq!(proxy.identifier().as_str(), "root/a/k");
        assert_eq!(proxy.namespace().as_str(), "root/a");
        assert!(!proxy.is_cached());

        let direct = root.proxy("a/k", StringWithoutValidation);
        assert_eq!(direct.identifier(), proxy.identifier());
    }

    #[tokio::test]
    async fn test_independent_proxies_cache_separately() {
        let root = MeshStore::in_memory("root", StoreFlags::writable());
        let mut reader = root.proxy("k", StringWithoutValidation);
        let mut writer = root.proxy("k", StringWithoutValidation);

        assert_eq!(reader.get().await.unwrap(), None);
        writer.set("v".to_string()).await.unwrap();
        assert_eq!(reader.get().await.unwrap(), None);

        let mut fresh = root.proxy("k", StringWithoutValidation);
        assert_eq!(fresh.get().await.unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_on_disk_rejects_invalid_config() {
        let config = StoreConfig::new().with_extension("");
        let err = MeshStore::on_disk(&config).unwrap_err();
        assert!(matches!(err, MeshError::Config(_)));
    }

    #[tokio::test]
    async fn test_from_config_selects_backend() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::new()
            .with_root_dir(dir.path())
            .with_identifier("cache");
        let store = MeshStore::from_config(&config).unwrap();
        assert_eq!(store.storage().backend(), BackendKind::FileSystem);

        let mut proxy = store.proxy("k", StringWithoutValidation);
        proxy.set("on disk".to_string()).await.unwrap();
        assert!(dir.path().join("cache/k.mesh.json").exists());

        let memory = MeshStore::from_config(&config.with_backend(BackendKind::Memory)).unwrap();
        assert_eq!(memory.storage().backend(), BackendKind::Memory);
    }
}
