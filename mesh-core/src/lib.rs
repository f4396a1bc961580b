//! Mesh Core - Shared Types
//!
//! Errors, identifiers, flags and configuration shared by the schema and
//! storage crates. This crate performs no I/O.

mod config;
mod error;
mod flags;
mod identity;
pub mod telemetry;

pub use config::*;
pub use error::*;
pub use flags::*;
pub use identity::*;
pub use telemetry::{init_tracing, TelemetryConfig};
