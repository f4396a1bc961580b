//! Property-based tests for store invariants.
//!
//! - Read-only stores never reach the adapter's `write`
//! - Values written to disk read back deeply equal from a fresh proxy
//! - Child and direct proxies resolve the same identifiers

use std::sync::Arc;

use mesh_core::StoreFlags;
use mesh_storage::{
    FileSystemStorageAdapter, JsonWithoutValidation, MemoryStorageAdapter, MeshStore,
    StringWithoutValidation,
};
use mesh_test_utils::generators::*;
use mesh_test_utils::CountingAdapter;
use proptest::prelude::*;
use serde_json::Value;
use tempfile::TempDir;
use tokio::runtime::Runtime;

fn test_runtime() -> Result<Runtime, TestCaseError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any store with `readonly` set rejects `set` without writing.
    #[test]
    fn prop_readonly_never_writes(
        validate in any::<bool>(),
        key in arb_identifier(),
        value in arb_json(),
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let adapter = Arc::new(CountingAdapter::new(MemoryStorageAdapter::new()));
            let store = MeshStore::new("root", Arc::clone(&adapter), StoreFlags::new(true, validate));
            let mut proxy = store.proxy(key.as_str(), JsonWithoutValidation::<Value>::new());

            let err = proxy.set(value).await.unwrap_err();
            prop_assert!(err.is_readonly());
            prop_assert_eq!(adapter.counts().write, 0);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// JSON values survive the module format and a fresh proxy.
    #[test]
    fn prop_json_disk_round_trip(key in arb_identifier(), value in arb_json()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let dir = TempDir::new().map_err(|e| TestCaseError::fail(e.to_string()))?;
            let adapter = Arc::new(FileSystemStorageAdapter::new(dir.path()));
            let store = MeshStore::new("root", adapter, StoreFlags::writable());

            store
                .proxy(key.as_str(), JsonWithoutValidation::<Value>::new())
                .set(value.clone())
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            let mut fresh = store.clone().proxy(key.as_str(), JsonWithoutValidation::<Value>::new());
            let loaded = fresh.get().await.map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(loaded, Some(value));
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Text with backticks, `${` and escapes survives byte-for-byte.
    #[test]
    fn prop_text_disk_round_trip(text in arb_tricky_text()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let dir = TempDir::new().map_err(|e| TestCaseError::fail(e.to_string()))?;
            let store = MeshStore::new(
                "root",
                Arc::new(FileSystemStorageAdapter::new(dir.path())),
                StoreFlags::writable(),
            );

            store
                .proxy("text", StringWithoutValidation)
                .set(text.clone())
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            let mut fresh = store.proxy("text", StringWithoutValidation);
            let loaded = fresh.get().await.map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(loaded, Some(text));
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Nested children and a direct path proxy share one identifier.
    #[test]
    fn prop_child_chain_matches_direct_path(
        segments in prop::collection::vec(arb_segment(), 1..4),
        key in arb_segment(),
        flags in arb_flags(),
    ) {
        let root = MeshStore::in_memory("root", flags);
        let nested = segments
            .iter()
            .fold(root.clone(), |store, segment| store.child(segment, None));

        let via_children = nested.proxy(&key, StringWithoutValidation);
        let direct = root.proxy(&format!("{}/{}", segments.join("/"), key), StringWithoutValidation);

        prop_assert_eq!(via_children.identifier(), direct.identifier());
        prop_assert_eq!(via_children.flags(), flags);
    }

    /// Overrides win; unset overrides inherit.
    #[test]
    fn prop_child_flag_merge(flags in arb_flags(), overrides in arb_flag_overrides()) {
        let root = MeshStore::in_memory("root", flags);
        let child = root.child("c", Some(overrides));
        prop_assert_eq!(child.flags().readonly, overrides.readonly.unwrap_or(flags.readonly));
        prop_assert_eq!(child.flags().validate, overrides.validate.unwrap_or(flags.validate));
        prop_assert_eq!(root.flags(), flags);
    }
}
