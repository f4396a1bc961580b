//! Per-key store proxy with a single-load cache.

use std::future::Future;
use std::sync::Arc;

use mesh_core::{Identifier, MeshError, MeshResult, StoreFlags};
use tracing::{debug, info, warn};

use crate::adapter::StoreStorageAdapter;
use crate::options::ProxyOptions;

/// Cache state of a proxy.
///
/// `Cached(None)` records that storage was consulted and held nothing, which
/// is distinct from never having looked.
#[derive(Debug, Clone, PartialEq)]
enum CacheSlot<T> {
    Uninitialized,
    Cached(Option<T>),
}

/// Handle on one artifact key.
///
/// The first `get` (or any operation that needs the current value) consults
/// storage once; later calls are served from the cache. The proxy only sees
/// its own writes: another proxy for the same identifier, or a direct adapter
/// write, is not observed once the cache is filled.
///
/// Operations take `&mut self`, so calls on one proxy never interleave.
pub struct StoreProxy<A, O>
where
    A: StoreStorageAdapter,
    O: ProxyOptions,
{
    identifier: Identifier,
    namespace: Identifier,
    storage: Arc<A>,
    options: O,
    flags: StoreFlags,
    slot: CacheSlot<O::Value>,
}

impl<A, O> StoreProxy<A, O>
where
    A: StoreStorageAdapter,
    O: ProxyOptions,
{
    pub(crate) fn new(
        identifier: Identifier,
        namespace: Identifier,
        storage: Arc<A>,
        options: O,
        flags: StoreFlags,
    ) -> Self {
        Self {
            identifier,
            namespace,
            storage,
            options,
            flags,
            slot: CacheSlot::Uninitialized,
        }
    }

    /// Fully-qualified identifier, also the storage key.
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Identifier of the store that created this proxy.
    pub fn namespace(&self) -> &Identifier {
        &self.namespace
    }

    pub fn flags(&self) -> StoreFlags {
        self.flags
    }

    pub fn options(&self) -> &O {
        &self.options
    }

    /// Whether storage has already been consulted.
    pub fn is_cached(&self) -> bool {
        matches!(self.slot, CacheSlot::Cached(_))
    }

    fn cached(&self) -> Option<&O::Value> {
        match &self.slot {
            CacheSlot::Cached(value) => value.as_ref(),
            CacheSlot::Uninitialized => None,
        }
    }

    async fn ensure_loaded(&mut self) -> MeshResult<()> {
        if self.is_cached() {
            return Ok(());
        }

        let key = self.identifier.as_str();
        let value = if self.storage.exists(key).await? {
            debug!(identifier = %self.identifier, "Loading artifact from storage");
            Some(self.storage.read(key, &self.options).await?)
        } else {
            debug!(identifier = %self.identifier, "No stored artifact");
            None
        };

        self.slot = CacheSlot::Cached(value);
        Ok(())
    }

    /// Run the strategy's validate step. Absent `old` always passes.
    fn check(&self, old: Option<&O::Value>, new: &O::Value) -> MeshResult<()> {
        let Some(old) = old else {
            return Ok(());
        };

        self.options
            .validate(old, new, self.identifier.as_str())
            .map_err(|source| {
                warn!(
                    identifier = %self.identifier,
                    namespace = %self.namespace,
                    reasons = source.len(),
                    "Rejected artifact update"
                );
                MeshError::Validation {
                    identifier: self.identifier.clone(),
                    namespace: self.namespace.clone(),
                    source,
                }
            })
    }

    /// Current value, loading it from storage on first use.
    pub async fn get(&mut self) -> MeshResult<Option<O::Value>> {
        self.ensure_loaded().await?;
        Ok(self.cached().cloned())
    }

    /// Replace the value and write it through to storage.
    ///
    /// # Errors
    ///
    /// - `MeshError::ReadonlyStore` when the proxy is read-only; nothing is
    ///   validated or written.
    /// - `MeshError::Validation` when `validate` is on and the strategy
    ///   rejects the change; cache and storage are left untouched.
    pub async fn set(&mut self, value: O::Value) -> MeshResult<()> {
        if self.flags.readonly {
            return Err(MeshError::ReadonlyStore {
                identifier: self.identifier.clone(),
                namespace: self.namespace.clone(),
            });
        }

        if self.flags.validate {
            self.ensure_loaded().await?;
            self.check(self.cached(), &value)?;
        }

        self.storage
            .write(self.identifier.as_str(), &value, &self.options)
            .await?;
        self.slot = CacheSlot::Cached(Some(value));
        Ok(())
    }

    /// Return the value, computing it when missing.
    ///
    /// With `validate` on, `compute` runs on every call so the candidate can
    /// be checked against the stored value:
    ///
    /// - writable: the candidate is validated, then stored through
    ///   [`set`](Self::set). A rejection is returned as an error.
    /// - read-only: the candidate is only validated and never persisted. The
    ///   returned value is the one previously stored.
    ///
    /// Without `validate`, `compute` runs only when nothing is stored, and a
    /// read-only proxy then returns `None`.
    pub async fn get_with_set<F, Fut>(&mut self, compute: F) -> MeshResult<Option<O::Value>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MeshResult<O::Value>>,
    {
        self.ensure_loaded().await?;

        if self.flags.validate || self.cached().is_none() {
            let candidate = compute().await?;

            if self.flags.validate {
                self.check(self.cached(), &candidate)?;
            }

            if !self.flags.readonly {
                // With validate on, set checks the candidate a second time.
                self.set(candidate).await?;
            } else if self.flags.validate {
                info!(
                    identifier = %self.identifier,
                    "Candidate artifact is compatible; read-only store left unchanged"
                );
            }
        }

        Ok(self.cached().cloned())
    }

    /// Remove the stored value.
    ///
    /// Not gated by `readonly`, and the cache is not reset: a later `get` on
    /// this proxy still returns the cached value.
    pub async fn delete(&self) -> MeshResult<()> {
        self.storage.delete(self.identifier.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStorageAdapter;
    use crate::strategies::JsonWithoutValidation;
    use mesh_core::AggregateError;
    use serde_json::{json, Value};

    /// Rejects any change that lowers `version`.
    struct MonotonicVersion;

    impl ProxyOptions for MonotonicVersion {
        type Value = Value;

        fn name(&self) -> &'static str {
            "monotonic"
        }

        fn codify(&self, value: &Value, identifier: &str) -> MeshResult<String> {
            JsonWithoutValidation::<Value>::new().codify(value, identifier)
        }

        fn load(
            &self,
            export: crate::module::ModuleExport,
            identifier: &str,
        ) -> MeshResult<Value> {
            JsonWithoutValidation::<Value>::new().load(export, identifier)
        }

        fn validate(&self, old: &Value, new: &Value, _: &str) -> Result<(), AggregateError> {
            if new["version"].as_i64() < old["version"].as_i64() {
                return Err(AggregateError::single("version went backwards"));
            }
            Ok(())
        }
    }

    fn proxy<O: ProxyOptions>(
        storage: &Arc<MemoryStorageAdapter>,
        options: O,
        flags: StoreFlags,
    ) -> StoreProxy<MemoryStorageAdapter, O> {
        StoreProxy::new(
            Identifier::new("root/k"),
            Identifier::new("root"),
            Arc::clone(storage),
            options,
            flags,
        )
    }

    #[tokio::test]
    async fn test_get_on_empty_storage_caches_absence() {
        let storage = Arc::new(MemoryStorageAdapter::new());
        let mut p = proxy(&storage, JsonWithoutValidation::<Value>::new(), StoreFlags::writable());

        assert!(!p.is_cached());
        assert_eq!(p.get().await.unwrap(), None);
        assert!(p.is_cached());

        // A write behind the proxy's back is not observed.
        storage
            .write("root/k", &json!(1), &JsonWithoutValidation::<Value>::new())
            .await
            .unwrap();
        assert_eq!(p.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let storage = Arc::new(MemoryStorageAdapter::new());
        let mut p = proxy(&storage, JsonWithoutValidation::<Value>::new(), StoreFlags::writable());

        p.set(json!({"a": 1})).await.unwrap();
        assert_eq!(p.get().await.unwrap(), Some(json!({"a": 1})));
        assert_eq!(storage.keys().unwrap(), vec!["root/k".to_string()]);
    }

    #[tokio::test]
    async fn test_readonly_set_fails_without_writing() {
        let storage = Arc::new(MemoryStorageAdapter::new());
        let mut p = proxy(
            &storage,
            JsonWithoutValidation::<Value>::new(),
            StoreFlags::new(true, false),
        );

        let err = p.set(json!(1)).await.unwrap_err();
        assert!(err.is_readonly());
        assert_eq!(
            err.to_string(),
            "Unable to set root/k in store root: the store is read-only"
        );
        assert!(storage.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_validation_failure_leaves_state_untouched() {
        let storage = Arc::new(MemoryStorageAdapter::new());
        let mut p = proxy(&storage, MonotonicVersion, StoreFlags::new(false, true));

        p.set(json!({"version": 2})).await.unwrap();
        let err = p.set(json!({"version": 1})).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.validation_messages(), ["version went backwards".to_string()]);

        assert_eq!(p.get().await.unwrap(), Some(json!({"version": 2})));
        let stored = storage.read("root/k", &MonotonicVersion).await.unwrap();
        assert_eq!(stored, json!({"version": 2}));
    }

    #[tokio::test]
    async fn test_first_set_skips_validation() {
        let storage = Arc::new(MemoryStorageAdapter::new());
        let mut p = proxy(&storage, MonotonicVersion, StoreFlags::new(false, true));
        p.set(json!({"version": -5})).await.unwrap();
        assert_eq!(p.get().await.unwrap(), Some(json!({"version": -5})));
    }

    #[tokio::test]
    async fn test_get_with_set_computes_only_when_missing() {
        let storage = Arc::new(MemoryStorageAdapter::new());
        let mut p = proxy(&storage, JsonWithoutValidation::<Value>::new(), StoreFlags::writable());

        let mut calls = 0;
        for _ in 0..2 {
            let value = p
                .get_with_set(|| {
                    calls += 1;
                    async { Ok(json!("computed")) }
                })
                .await
                .unwrap();
            assert_eq!(value, Some(json!("computed")));
        }
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_get_with_set_recomputes_when_validating() {
        let storage = Arc::new(MemoryStorageAdapter::new());
        let mut p = proxy(&storage, MonotonicVersion, StoreFlags::new(false, true));

        p.set(json!({"version": 1})).await.unwrap();
        let value = p
            .get_with_set(|| async { Ok(json!({"version": 3})) })
            .await
            .unwrap();
        assert_eq!(value, Some(json!({"version": 3})));

        let err = p
            .get_with_set(|| async { Ok(json!({"version": 0})) })
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_get_with_set_readonly_without_validate_returns_none() {
        let storage = Arc::new(MemoryStorageAdapter::new());
        let mut p = proxy(
            &storage,
            JsonWithoutValidation::<Value>::new(),
            StoreFlags::new(true, false),
        );
        let value = p.get_with_set(|| async { Ok(json!(1)) }).await.unwrap();
        assert_eq!(value, None);
        assert!(storage.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_inspection_mode_validates_without_persisting() {
        let storage = Arc::new(MemoryStorageAdapter::new());
        storage
            .write("root/k", &json!({"version": 2}), &MonotonicVersion)
            .await
            .unwrap();
        let mut p = proxy(&storage, MonotonicVersion, StoreFlags::inspect());

        let value = p
            .get_with_set(|| async { Ok(json!({"version": 5})) })
            .await
            .unwrap();
        assert_eq!(value, Some(json!({"version": 2})));

        let err = p
            .get_with_set(|| async { Ok(json!({"version": 1})) })
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let stored = storage.read("root/k", &MonotonicVersion).await.unwrap();
        assert_eq!(stored, json!({"version": 2}));
    }

    #[tokio::test]
    async fn test_compute_error_propagates() {
        let storage = Arc::new(MemoryStorageAdapter::new());
        let mut p = proxy(&storage, JsonWithoutValidation::<Value>::new(), StoreFlags::writable());
        let err = p
            .get_with_set(|| async {
                Err(MeshError::from(mesh_core::ConfigError::MissingRequired {
                    field: "source".to_string(),
                }))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MeshError::Config(_)));
        assert!(storage.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_delete_ignores_readonly_and_keeps_cache() {
        let storage = Arc::new(MemoryStorageAdapter::new());
        storage
            .write("root/k", &json!(7), &JsonWithoutValidation::<Value>::new())
            .await
            .unwrap();
        let mut p = proxy(
            &storage,
            JsonWithoutValidation::<Value>::new(),
            StoreFlags::new(true, false),
        );

        assert_eq!(p.get().await.unwrap(), Some(json!(7)));
        p.delete().await.unwrap();
        assert!(!storage.exists("root/k").await.unwrap());
        assert_eq!(p.get().await.unwrap(), Some(json!(7)));
    }
}
