//! Configuration types

use crate::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default file extension for generated artifact modules.
pub const DEFAULT_MODULE_EXTENSION: &str = "mesh.json";

/// Default identifier of a root store.
pub const DEFAULT_ROOT_IDENTIFIER: &str = ".mesh";

/// Storage medium backing a root store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Volatile, process-lifetime map.
    Memory,
    /// One generated module file per key.
    #[default]
    FileSystem,
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_memory" | "in-memory" => Ok(BackendKind::Memory),
            "filesystem" | "file_system" | "fs" => Ok(BackendKind::FileSystem),
            other => Err(ConfigError::InvalidValue {
                field: "backend".to_string(),
                value: other.to_string(),
                reason: "expected one of: memory, filesystem".to_string(),
            }),
        }
    }
}

/// Root store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: BackendKind,
    /// Directory that relative keys resolve against (filesystem backend).
    pub root_dir: PathBuf,
    /// Extension appended to every key, without the leading dot.
    pub extension: String,
    /// Identifier of the root namespace.
    pub identifier: Identifier,
    pub flags: StoreFlags,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            root_dir: PathBuf::from("."),
            extension: DEFAULT_MODULE_EXTENSION.to_string(),
            identifier: Identifier::new(DEFAULT_ROOT_IDENTIFIER),
            flags: StoreFlags::default(),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<Identifier>) -> Self {
        self.identifier = identifier.into();
        self
    }

    pub fn with_flags(mut self, flags: StoreFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `MESH_STORE_BACKEND`: `memory` or `filesystem` (default: filesystem)
    /// - `MESH_STORE_DIR`: root directory (default: `.`)
    /// - `MESH_STORE_EXTENSION`: module extension (default: `mesh.json`)
    /// - `MESH_STORE_IDENTIFIER`: root identifier (default: `.mesh`)
    /// - `MESH_STORE_READONLY`: `true`/`1` to forbid writes (default: false)
    /// - `MESH_STORE_VALIDATE`: `true`/`1` to validate writes (default: false)
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`StoreConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let backend = match lookup("MESH_STORE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => defaults.backend,
        };

        let config = Self {
            backend,
            root_dir: lookup("MESH_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.root_dir),
            extension: lookup("MESH_STORE_EXTENSION").unwrap_or(defaults.extension),
            identifier: lookup("MESH_STORE_IDENTIFIER")
                .map(Identifier::new)
                .unwrap_or(defaults.identifier),
            flags: StoreFlags {
                readonly: parse_flag(lookup("MESH_STORE_READONLY"), defaults.flags.readonly),
                validate: parse_flag(lookup("MESH_STORE_VALIDATE"), defaults.flags.validate),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - extension is non-empty and carries no leading dot
    /// - identifier is non-empty
    pub fn validate(&self) -> ConfigResult<()> {
        if self.extension.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "extension".to_string(),
                value: self.extension.clone(),
                reason: "extension must not be empty".to_string(),
            });
        }

        if self.extension.starts_with('.') {
            return Err(ConfigError::InvalidValue {
                field: "extension".to_string(),
                value: self.extension.clone(),
                reason: "extension must not start with '.'".to_string(),
            });
        }

        if self.identifier.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "identifier".to_string(),
                value: String::new(),
                reason: "root identifier must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

fn parse_flag(raw: Option<String>, default: bool) -> bool {
    raw.map(|s| s == "true" || s == "1").unwrap_or(default)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.extension, DEFAULT_MODULE_EXTENSION);
        assert_eq!(config.flags, StoreFlags::writable());
    }

    #[test]
    fn test_from_lookup_reads_every_variable() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            ("MESH_STORE_BACKEND", "memory"),
            ("MESH_STORE_DIR", "/tmp/artifacts"),
            ("MESH_STORE_EXTENSION", "json"),
            ("MESH_STORE_IDENTIFIER", "build//cache"),
            ("MESH_STORE_READONLY", "1"),
            ("MESH_STORE_VALIDATE", "true"),
        ]))
        .unwrap();

        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.root_dir, PathBuf::from("/tmp/artifacts"));
        assert_eq!(config.extension, "json");
        assert_eq!(config.identifier.as_str(), "build/cache");
        assert_eq!(config.flags, StoreFlags::inspect());
    }

    #[test]
    fn test_from_lookup_falls_back_to_defaults() {
        let config = StoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = StoreConfig::from_lookup(lookup_from(&[("MESH_STORE_BACKEND", "redis")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "backend"));
    }

    #[test]
    fn test_extension_with_leading_dot_rejected() {
        let config = StoreConfig::new().with_extension(".json");
        let err = config.validate().unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("extension"));
        assert!(msg.contains(".json"));
    }

    #[test]
    fn test_empty_identifier_rejected() {
        let config = StoreConfig::new().with_identifier("");
        assert!(config.validate().is_err());
    }
}
