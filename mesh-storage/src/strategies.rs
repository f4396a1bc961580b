//! Built-in proxy option strategies.

use std::fmt;
use std::marker::PhantomData;

use mesh_core::{AggregateError, CodecError, MeshResult};
use mesh_schema::{diff, print_schema, rejected_changes, BuildOptions, Change, Schema};
use serde::{de::DeserializeOwned, Serialize};

use crate::module::{ArtifactModule, ModuleExport, ModuleSource};
use crate::options::ProxyOptions;

fn unexpected_export(identifier: &str, expected: &str, found: &ModuleExport) -> CodecError {
    CodecError::UnexpectedExport {
        identifier: identifier.to_string(),
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}

// ============================================================================
// JSON
// ============================================================================

/// Any serde value, stored as a JSON literal. Every overwrite is accepted.
pub struct JsonWithoutValidation<T = serde_json::Value> {
    _value: PhantomData<fn() -> T>,
}

impl<T> JsonWithoutValidation<T> {
    pub fn new() -> Self {
        Self {
            _value: PhantomData,
        }
    }
}

impl<T> Default for JsonWithoutValidation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonWithoutValidation<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonWithoutValidation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsonWithoutValidation<{}>", std::any::type_name::<T>())
    }
}

impl<T> ProxyOptions for JsonWithoutValidation<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Value = T;

    fn name(&self) -> &'static str {
        "json"
    }

    fn codify(&self, value: &T, identifier: &str) -> MeshResult<String> {
        let value = serde_json::to_value(value).map_err(|e| CodecError::Encode {
            identifier: identifier.to_string(),
            reason: e.to_string(),
        })?;
        ArtifactModule::with_default(identifier, ModuleExport::Json { value })?.render()
    }

    fn load(&self, export: ModuleExport, identifier: &str) -> MeshResult<T> {
        match export {
            ModuleExport::Json { value } => serde_json::from_value(value).map_err(|e| {
                CodecError::Decode {
                    identifier: identifier.to_string(),
                    reason: e.to_string(),
                }
                .into()
            }),
            other => Err(unexpected_export(identifier, "json", &other).into()),
        }
    }

    fn validate(&self, _old: &T, _new: &T, _identifier: &str) -> Result<(), AggregateError> {
        Ok(())
    }
}

// ============================================================================
// RAW STRING
// ============================================================================

/// Plain text, exported verbatim. Every overwrite is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringWithoutValidation;

impl ProxyOptions for StringWithoutValidation {
    type Value = String;

    fn name(&self) -> &'static str {
        "string"
    }

    fn codify(&self, value: &String, identifier: &str) -> MeshResult<String> {
        ArtifactModule::with_default(
            identifier,
            ModuleExport::Text {
                value: value.clone(),
            },
        )?
        .render()
    }

    fn load(&self, export: ModuleExport, identifier: &str) -> MeshResult<String> {
        match export {
            ModuleExport::Text { value } => Ok(value),
            other => Err(unexpected_export(identifier, "text", &other).into()),
        }
    }

    fn validate(
        &self,
        _old: &String,
        _new: &String,
        _identifier: &str,
    ) -> Result<(), AggregateError> {
        Ok(())
    }
}

// ============================================================================
// GRAPHQL SCHEMA
// ============================================================================

/// GraphQL schema stored as SDL and rebuilt on load.
///
/// Replacing a schema is rejected when the diff against the previous one
/// contains any breaking or dangerous change. Safe changes pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphQLSchemaWithDiffing;

impl GraphQLSchemaWithDiffing {
    /// Every change between `old` and `new`, without touching any store.
    pub fn inspect(&self, old: &Schema, new: &Schema) -> Vec<Change> {
        diff(old, new)
    }
}

impl ProxyOptions for GraphQLSchemaWithDiffing {
    type Value = Schema;

    fn name(&self) -> &'static str {
        "graphql-schema"
    }

    fn codify(&self, value: &Schema, identifier: &str) -> MeshResult<String> {
        let export = ModuleExport::Schema {
            source: ModuleSource {
                name: identifier.to_string(),
                body: print_schema(value),
            },
            assume_valid: true,
        };
        ArtifactModule::with_default(identifier, export)?.render()
    }

    fn load(&self, export: ModuleExport, identifier: &str) -> MeshResult<Schema> {
        match export {
            ModuleExport::Schema {
                source,
                assume_valid,
            } => Ok(Schema::build(&source.body, BuildOptions { assume_valid })?),
            other => Err(unexpected_export(identifier, "schema", &other).into()),
        }
    }

    fn validate(
        &self,
        old: &Schema,
        new: &Schema,
        _identifier: &str,
    ) -> Result<(), AggregateError> {
        let rejected = rejected_changes(old, new);
        if rejected.is_empty() {
            return Ok(());
        }
        Err(AggregateError::new(
            rejected.into_iter().map(|change| change.message).collect(),
        ))
    }
}
