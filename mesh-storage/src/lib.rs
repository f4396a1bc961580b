//! Mesh Storage - Lazily-Populated Artifact Store
//!
//! A tree of namespaced stores over one pluggable storage adapter. Each key
//! is accessed through a proxy that loads the stored value at most once and
//! gates overwrites with the read-only and validate flags.
//!
//! Architecture:
//! ```text
//! MeshStore (identifier, flags)
//!     ├── child(id, overrides) → MeshStore
//!     └── proxy(key, options) → StoreProxy (single-load cache)
//!                                   ↓
//!                          StoreStorageAdapter
//!                          ├── MemoryStorageAdapter
//!                          └── FileSystemStorageAdapter (artifact modules)
//! ```
//!
//! Strategies (`ProxyOptions`) decide how values are codified, loaded and
//! validated: JSON, raw strings, and GraphQL schemas with breaking-change
//! detection.

pub mod adapter;
pub mod configured;
pub mod filesystem;
pub mod memory;
pub mod module;
pub mod options;
pub mod proxy;
pub mod store;
pub mod strategies;

pub use adapter::StoreStorageAdapter;
pub use configured::ConfiguredAdapter;
pub use filesystem::FileSystemStorageAdapter;
pub use memory::MemoryStorageAdapter;
pub use module::{ArtifactModule, ModuleExport, ModuleSource, MODULE_FORMAT};
pub use options::ProxyOptions;
pub use proxy::StoreProxy;
pub use store::MeshStore;
pub use strategies::{GraphQLSchemaWithDiffing, JsonWithoutValidation, StringWithoutValidation};
