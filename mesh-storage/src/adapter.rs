//! Storage adapter trait.

use async_trait::async_trait;
use mesh_core::MeshResult;

use crate::options::ProxyOptions;

/// Pluggable persistence medium behind a store.
///
/// Keys are fully-qualified identifiers (`<namespace>/<key>`). Adapters hold
/// no per-key cache of their own; proxies cache above them.
///
/// # Contract
///
/// - `read` is only meaningful after `exists` returned true. Reading a missing
///   key yields `StorageError::NotFound`.
/// - `write` replaces any previous value under the key.
/// - Whether `delete` of a missing key fails is adapter-specific.
#[async_trait]
pub trait StoreStorageAdapter: Send + Sync {
    /// Whether a value is stored under `key`.
    async fn exists(&self, key: &str) -> MeshResult<bool>;

    /// Load the value under `key`, reconstructing it through `options`.
    async fn read<O: ProxyOptions>(&self, key: &str, options: &O) -> MeshResult<O::Value>;

    /// Persist `value` under `key`, encoding it through `options`.
    async fn write<O: ProxyOptions>(
        &self,
        key: &str,
        value: &O::Value,
        options: &O,
    ) -> MeshResult<()>;

    /// Remove the value under `key`.
    async fn delete(&self, key: &str) -> MeshResult<()>;
}
