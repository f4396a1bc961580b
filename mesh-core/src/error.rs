//! Error types for mesh store operations

use crate::Identifier;
use thiserror::Error;

/// Storage medium errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("No artifact stored under key {key}")]
    NotFound { key: String },

    #[error("I/O failure for key {key}: {reason}")]
    Io { key: String, reason: String },

    #[error("Stored value for key {key} is not a {expected}")]
    TypeMismatch { key: String, expected: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Errors produced while encoding or loading artifact modules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Failed to encode artifact {identifier}: {reason}")]
    Encode { identifier: String, reason: String },

    #[error("Failed to decode artifact {identifier}: {reason}")]
    Decode { identifier: String, reason: String },

    #[error("Artifact {identifier} uses unsupported module format {found}")]
    UnsupportedFormat { identifier: String, found: String },

    #[error("Artifact {identifier} holds a module generated for {found}")]
    IdentifierMismatch { identifier: String, found: String },

    #[error("Artifact {identifier} imports unknown primitive {import}")]
    UnresolvedImport { identifier: String, import: String },

    #[error("Artifact {identifier} digest mismatch (expected {expected}, found {actual})")]
    DigestMismatch {
        identifier: String,
        expected: String,
        actual: String,
    },

    #[error("Artifact {identifier} exports a {found} value where {expected} was expected")]
    UnexpectedExport {
        identifier: String,
        expected: String,
        found: String,
    },
}

/// Schema construction errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Failed to parse schema SDL: {reason}")]
    Parse { reason: String },

    #[error("Invalid schema: {}", .reasons.join("; "))]
    Invalid { reasons: Vec<String> },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Rejection raised by a strategy's validate step.
///
/// Carries every offending reason rather than only the first one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", .messages.join("\n"))]
pub struct AggregateError {
    pub messages: Vec<String>,
}

impl AggregateError {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    pub fn single(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Master error type for all mesh store errors.
#[derive(Debug, Clone, Error)]
pub enum MeshError {
    #[error("Unable to set {identifier} in store {namespace}: the store is read-only")]
    ReadonlyStore {
        identifier: Identifier,
        namespace: Identifier,
    },

    #[error("Validation failed for {identifier} in store {namespace}:\n{source}")]
    Validation {
        identifier: Identifier,
        namespace: Identifier,
        source: AggregateError,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl MeshError {
    /// True for the read-only violation kind.
    pub fn is_readonly(&self) -> bool {
        matches!(self, MeshError::ReadonlyStore { .. })
    }

    /// True for the validation-failure kind.
    pub fn is_validation(&self) -> bool {
        matches!(self, MeshError::Validation { .. })
    }

    /// Messages of a validation failure, empty for every other kind.
    pub fn validation_messages(&self) -> &[String] {
        match self {
            MeshError::Validation { source, .. } => &source.messages,
            _ => &[],
        }
    }
}

/// Result type alias for mesh store operations.
pub type MeshResult<T> = Result<T, MeshError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            key: "root/schema".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("No artifact stored"));
        assert!(msg.contains("root/schema"));
    }

    #[test]
    fn test_codec_error_display_digest_mismatch() {
        let err = CodecError::DigestMismatch {
            identifier: "root/x".to_string(),
            expected: "sha256:aa".to_string(),
            actual: "sha256:bb".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("digest mismatch"));
        assert!(msg.contains("sha256:aa"));
        assert!(msg.contains("sha256:bb"));
    }

    #[test]
    fn test_schema_error_display_joins_reasons() {
        let err = SchemaError::Invalid {
            reasons: vec!["Unknown type Foo".to_string(), "Unknown type Bar".to_string()],
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Unknown type Foo; Unknown type Bar"));
    }

    #[test]
    fn test_readonly_error_names_identifier_and_namespace() {
        let err = MeshError::ReadonlyStore {
            identifier: Identifier::new("root/child/key"),
            namespace: Identifier::new("root/child"),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("root/child/key"));
        assert!(msg.contains("store root/child"));
        assert!(err.is_readonly());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_error_lists_every_message() {
        let err = MeshError::Validation {
            identifier: Identifier::new("root/schema"),
            namespace: Identifier::new("root"),
            source: AggregateError::new(vec![
                "Field Query.a was removed".to_string(),
                "Type Foo was removed".to_string(),
            ]),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Field Query.a was removed"));
        assert!(msg.contains("Type Foo was removed"));
        assert_eq!(err.validation_messages().len(), 2);
        assert!(err.is_validation());
    }

    #[test]
    fn test_mesh_error_from_variants() {
        let storage = MeshError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, MeshError::Storage(_)));

        let codec = MeshError::from(CodecError::Decode {
            identifier: "x".to_string(),
            reason: "eof".to_string(),
        });
        assert!(matches!(codec, MeshError::Codec(_)));

        let schema = MeshError::from(SchemaError::Parse {
            reason: "bad".to_string(),
        });
        assert!(matches!(schema, MeshError::Schema(_)));

        let config = MeshError::from(ConfigError::MissingRequired {
            field: "root_dir".to_string(),
        });
        assert!(matches!(config, MeshError::Config(_)));
        assert!(config.validation_messages().is_empty());
    }
}
