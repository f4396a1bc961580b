//! Mesh Schema - GraphQL SDL Schemas for the Artifact Store
//!
//! Schemas are stored as artifacts and compared on every overwrite.
//!
//! Architecture:
//! ```text
//! SDL text
//!     ↓
//! async-graphql-parser (ServiceDocument)
//!     ↓
//! Builder (lower + merge extensions + validate)
//!     ↓
//! Schema model  ──→  Printer (SDL, directives preserved)
//!     ↓
//! Diff (old, new) → [Change { criticality }]
//! ```

pub mod builder;
pub mod diff;
pub mod model;
pub mod printer;

pub use builder::BuildOptions;
pub use diff::{diff, rejected_changes, Change, ChangeKind, Criticality};
pub use model::*;
pub use printer::print_schema;
