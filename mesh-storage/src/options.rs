//! Proxy options: how a value is codified, loaded and validated.

use mesh_core::{AggregateError, MeshResult};

use crate::module::ModuleExport;

/// Strategy bundle attached to a proxy.
///
/// A strategy owns three operations on its value type:
///
/// - `codify` renders a value as artifact module text for persistence
/// - `load` evaluates the default export of a stored module back into a value
/// - `validate` decides whether `new` may replace `old`
///
/// `validate` returns every reason for rejection at once. Only the proxy
/// calls it, and only when both values are present.
pub trait ProxyOptions: Send + Sync {
    /// Value stored under the proxy's key.
    type Value: Clone + Send + Sync + 'static;

    /// Short strategy name used in logs.
    fn name(&self) -> &'static str;

    /// Render `value` as module source text.
    fn codify(&self, value: &Self::Value, identifier: &str) -> MeshResult<String>;

    /// Turn a loaded module's default export into a value.
    fn load(&self, export: ModuleExport, identifier: &str) -> MeshResult<Self::Value>;

    /// Accept or reject replacing `old` with `new`.
    fn validate(
        &self,
        old: &Self::Value,
        new: &Self::Value,
        identifier: &str,
    ) -> Result<(), AggregateError>;
}
