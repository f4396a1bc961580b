//! Mesh Test Utilities
//!
//! Shared test infrastructure for the mesh workspace:
//! - An instrumented adapter that counts storage operations
//! - Schema SDL fixtures
//! - Proptest generators for identifiers, flags and values
//! - Tracing setup for tests

pub use mesh_core::{
    FlagOverrides, Identifier, MeshError, MeshResult, StorageError, StoreFlags,
};
pub use mesh_schema::Schema;
pub use mesh_storage::{
    FileSystemStorageAdapter, MemoryStorageAdapter, MeshStore, ProxyOptions, StoreProxy,
    StoreStorageAdapter,
};

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

// ============================================================================
// INSTRUMENTED ADAPTER
// ============================================================================

/// Snapshot of operation counts recorded by a [`CountingAdapter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCounts {
    pub exists: usize,
    pub read: usize,
    pub write: usize,
    pub delete: usize,
}

impl OperationCounts {
    /// Calls that consulted storage (`exists` + `read`).
    pub fn lookups(&self) -> usize {
        self.exists + self.read
    }
}

/// Adapter wrapper counting every call before delegating.
#[derive(Debug, Default)]
pub struct CountingAdapter<A> {
    inner: A,
    exists: AtomicUsize,
    read: AtomicUsize,
    write: AtomicUsize,
    delete: AtomicUsize,
}

impl<A> CountingAdapter<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            exists: AtomicUsize::new(0),
            read: AtomicUsize::new(0),
            write: AtomicUsize::new(0),
            delete: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn counts(&self) -> OperationCounts {
        OperationCounts {
            exists: self.exists.load(Ordering::SeqCst),
            read: self.read.load(Ordering::SeqCst),
            write: self.write.load(Ordering::SeqCst),
            delete: self.delete.load(Ordering::SeqCst),
        }
    }

    pub fn reset(&self) {
        self.exists.store(0, Ordering::SeqCst);
        self.read.store(0, Ordering::SeqCst);
        self.write.store(0, Ordering::SeqCst);
        self.delete.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl<A: StoreStorageAdapter> StoreStorageAdapter for CountingAdapter<A> {
    async fn exists(&self, key: &str) -> MeshResult<bool> {
        self.exists.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(key).await
    }

    async fn read<O: ProxyOptions>(&self, key: &str, options: &O) -> MeshResult<O::Value> {
        self.read.fetch_add(1, Ordering::SeqCst);
        self.inner.read(key, options).await
    }

    async fn write<O: ProxyOptions>(
        &self,
        key: &str,
        value: &O::Value,
        options: &O,
    ) -> MeshResult<()> {
        self.write.fetch_add(1, Ordering::SeqCst);
        self.inner.write(key, value, options).await
    }

    async fn delete(&self, key: &str) -> MeshResult<()> {
        self.delete.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Schema SDL used across tests.

    use super::*;

    /// Baseline schema.
    pub const BASE_SDL: &str = r#"
type Query {
  user(id: ID!): User
  users(first: Int = 10): [User!]!
}

type User {
  id: ID!
  name: String
  email: String
}
"#;

    /// [`BASE_SDL`] with `User.email` removed.
    pub const FIELD_REMOVED_SDL: &str = r#"
type Query {
  user(id: ID!): User
  users(first: Int = 10): [User!]!
}

type User {
  id: ID!
  name: String
}
"#;

    /// [`BASE_SDL`] with an optional `User.avatar` field added.
    pub const FIELD_ADDED_SDL: &str = r#"
type Query {
  user(id: ID!): User
  users(first: Int = 10): [User!]!
}

type User {
  id: ID!
  name: String
  email: String
  avatar: String
}
"#;

    /// Schema using directives, descriptions and every type kind.
    pub const DIRECTIVE_SDL: &str = r#"
directive @cache(ttl: Int!) on FIELD_DEFINITION | OBJECT

"Root query"
type Query @cache(ttl: 30) {
  node(id: ID!): Node @cache(ttl: 5)
  search(term: String!, kind: Kind = BOOK): [Result!]!
}

interface Node {
  id: ID!
}

type Book implements Node {
  id: ID!
  title: String @deprecated(reason: "Use `name`; costs ${price}")
}

type Author implements Node {
  id: ID!
  name: String
}

union Result = Book | Author

enum Kind {
  BOOK
  AUTHOR
}

input Range {
  from: Int
  to: Int
}

scalar DateTime
"#;

    pub fn base_schema() -> Schema {
        parse(BASE_SDL)
    }

    pub fn field_removed_schema() -> Schema {
        parse(FIELD_REMOVED_SDL)
    }

    pub fn field_added_schema() -> Schema {
        parse(FIELD_ADDED_SDL)
    }

    pub fn directive_schema() -> Schema {
        parse(DIRECTIVE_SDL)
    }

    fn parse(sdl: &str) -> Schema {
        match Schema::parse(sdl) {
            Ok(schema) => schema,
            Err(err) => panic!("fixture SDL must be valid: {err}"),
        }
    }
}

// ============================================================================
// TRACING
// ============================================================================

/// Install a test-writer subscriber once; later calls are no-ops.
///
/// Honours `MESH_LOG`, defaulting to `warn`.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("MESH_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for store inputs.

    use super::*;
    use proptest::prelude::*;
    use serde_json::Value;

    /// One identifier segment.
    pub fn arb_segment() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,8}".prop_map(|s| s)
    }

    /// Relative identifier of one to four segments.
    pub fn arb_identifier() -> impl Strategy<Value = Identifier> {
        prop::collection::vec(arb_segment(), 1..=4).prop_map(|parts| Identifier::new(parts.join("/")))
    }

    pub fn arb_flags() -> impl Strategy<Value = StoreFlags> {
        (any::<bool>(), any::<bool>()).prop_map(|(readonly, validate)| StoreFlags::new(readonly, validate))
    }

    pub fn arb_flag_overrides() -> impl Strategy<Value = FlagOverrides> {
        (any::<Option<bool>>(), any::<Option<bool>>())
            .prop_map(|(readonly, validate)| FlagOverrides { readonly, validate })
    }

    /// Text that stresses escaping: quotes, backslashes, backticks, `${`.
    pub fn arb_tricky_text() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                Just("`".to_string()),
                Just("${".to_string()),
                Just("}".to_string()),
                Just("\"".to_string()),
                Just("\\".to_string()),
                Just("\n".to_string()),
                "[ -~]{0,6}".prop_map(|s| s),
                any::<char>().prop_map(|c| c.to_string()),
            ],
            0..16,
        )
        .prop_map(|parts| parts.concat())
    }

    /// Arbitrary JSON value of bounded depth.
    pub fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            any::<f64>()
                .prop_filter("finite", |f| f.is_finite())
                .prop_map(Value::from),
            arb_tricky_text().prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map(arb_segment(), inner, 0..4)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }
}
