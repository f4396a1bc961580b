//! Artifact module format.
//!
//! The filesystem adapter persists each artifact as a self-describing module
//! document rather than a bare payload. A module names the primitives it needs
//! to be loaded (`imports`) and carries a `default` export: either a plain
//! value or a constructor expression (for schemas, "build from this SDL
//! source"). Loading a module means resolving its imports and evaluating the
//! default export through the owning strategy.
//!
//! ```json
//! {
//!   "format": "mesh-module/1",
//!   "identifier": ".mesh/schema",
//!   "imports": ["build_schema", "source"],
//!   "digest": "sha256:…",
//!   "default": {
//!     "kind": "schema",
//!     "source": { "name": ".mesh/schema", "body": "type Query { … }" },
//!     "assume_valid": true
//!   }
//! }
//! ```
//!
//! JSON string encoding is the escaping layer, so embedded text of any shape
//! (backticks, `${`, quotes, newlines) round-trips byte-for-byte.

use mesh_core::{compute_content_digest, CodecError, MeshResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current module format tag.
pub const MODULE_FORMAT: &str = "mesh-module/1";

/// Primitive that rebuilds a schema from SDL.
pub const IMPORT_BUILD_SCHEMA: &str = "build_schema";

/// Primitive that wraps SDL text with its source name.
pub const IMPORT_SOURCE: &str = "source";

/// Every primitive a module may import.
pub const KNOWN_IMPORTS: [&str; 2] = [IMPORT_BUILD_SCHEMA, IMPORT_SOURCE];

/// Named SDL text embedded in a schema module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSource {
    pub name: String,
    pub body: String,
}

/// Default export of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleExport {
    /// Plain JSON value.
    Json { value: Value },
    /// Raw text, exported verbatim.
    Text { value: String },
    /// Schema constructed at load time from SDL.
    Schema {
        source: ModuleSource,
        /// Skip validation while rebuilding.
        assume_valid: bool,
    },
}

impl ModuleExport {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ModuleExport::Json { .. } => "json",
            ModuleExport::Text { .. } => "text",
            ModuleExport::Schema { .. } => "schema",
        }
    }

    /// Imports the export needs to be evaluated.
    pub fn required_imports(&self) -> Vec<String> {
        match self {
            ModuleExport::Schema { .. } => KNOWN_IMPORTS.iter().map(|s| s.to_string()).collect(),
            _ => Vec::new(),
        }
    }
}

/// A generated artifact module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactModule {
    pub format: String,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ModuleExport>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub exports: Map<String, Value>,
}

impl ArtifactModule {
    /// Module whose default export is `export`, with imports and digest filled in.
    pub fn with_default(identifier: &str, export: ModuleExport) -> MeshResult<Self> {
        let digest = export_digest(identifier, &export)?;
        Ok(Self {
            format: MODULE_FORMAT.to_string(),
            identifier: identifier.to_string(),
            imports: export.required_imports(),
            digest: Some(digest),
            default: Some(export),
            exports: Map::new(),
        })
    }

    /// Source text of the module, normalised.
    pub fn render(&self) -> MeshResult<String> {
        let text = serde_json::to_string_pretty(self).map_err(|e| CodecError::Encode {
            identifier: self.identifier.clone(),
            reason: e.to_string(),
        })?;
        Ok(normalize_module_text(&text))
    }

    /// Parse module text generated for `identifier` and resolve its imports.
    pub fn parse(text: &str, identifier: &str) -> MeshResult<Self> {
        let module: ArtifactModule =
            serde_json::from_str(text).map_err(|e| CodecError::Decode {
                identifier: identifier.to_string(),
                reason: e.to_string(),
            })?;

        if module.format != MODULE_FORMAT {
            return Err(CodecError::UnsupportedFormat {
                identifier: identifier.to_string(),
                found: module.format,
            }
            .into());
        }

        if module.identifier != identifier {
            return Err(CodecError::IdentifierMismatch {
                identifier: identifier.to_string(),
                found: module.identifier,
            }
            .into());
        }

        if let Some(unknown) = module
            .imports
            .iter()
            .find(|i| !KNOWN_IMPORTS.contains(&i.as_str()))
        {
            return Err(CodecError::UnresolvedImport {
                identifier: identifier.to_string(),
                import: unknown.clone(),
            }
            .into());
        }

        Ok(module)
    }

    /// The default export, or the named exports as a JSON object when the
    /// module has no default.
    pub fn into_default_export(self, identifier: &str) -> MeshResult<ModuleExport> {
        let Some(export) = self.default else {
            return Ok(ModuleExport::Json {
                value: Value::Object(self.exports),
            });
        };

        if let Some(expected) = self.digest {
            let actual = export_digest(identifier, &export)?;
            if actual != expected {
                return Err(CodecError::DigestMismatch {
                    identifier: identifier.to_string(),
                    expected,
                    actual,
                }
                .into());
            }
        }

        Ok(export)
    }
}

fn export_digest(identifier: &str, export: &ModuleExport) -> MeshResult<String> {
    let canonical = serde_json::to_vec(export).map_err(|e| CodecError::Encode {
        identifier: identifier.to_string(),
        reason: e.to_string(),
    })?;
    Ok(compute_content_digest(&canonical))
}

/// Strip trailing whitespace from every line and end with exactly one newline.
///
/// Only whitespace outside string literals can sit at a line end in a JSON
/// document, so this never alters embedded values.
pub fn normalize_module_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 1);
    for line in text.lines() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    while out.ends_with("\n\n") {
        out.pop();
    }
    if out.is_empty() {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_core::MeshError;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_render_then_parse_returns_default() {
        let module =
            ArtifactModule::with_default("root/x", ModuleExport::Json { value: json!({"a": 1}) })
                .unwrap();
        let text = module.render().unwrap();
        assert!(text.ends_with("}\n"));

        let parsed = ArtifactModule::parse(&text, "root/x").unwrap();
        assert_eq!(parsed, module);
        assert_eq!(
            parsed.into_default_export("root/x").unwrap(),
            ModuleExport::Json { value: json!({"a": 1}) }
        );
    }

    #[test]
    fn test_schema_export_declares_imports() {
        let module = ArtifactModule::with_default(
            "root/schema",
            ModuleExport::Schema {
                source: ModuleSource {
                    name: "root/schema".to_string(),
                    body: "type Query { a: Int }".to_string(),
                },
                assume_valid: true,
            },
        )
        .unwrap();
        assert_eq!(module.imports, vec!["build_schema", "source"]);
    }

    #[test]
    fn test_module_without_default_exports_namespace() {
        let text = r#"{ "format": "mesh-module/1", "identifier": "k", "exports": { "a": 1 } }"#;
        let export = ArtifactModule::parse(text, "k")
            .unwrap()
            .into_default_export("k")
            .unwrap();
        assert_eq!(export, ModuleExport::Json { value: json!({"a": 1}) });
    }

    #[test]
    fn test_unknown_format_rejected() {
        let text = r#"{ "format": "esm", "identifier": "k" }"#;
        let err = ArtifactModule::parse(text, "k").unwrap_err();
        assert!(matches!(err, MeshError::Codec(CodecError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_unknown_import_rejected() {
        let text = r#"{ "format": "mesh-module/1", "identifier": "k", "imports": ["eval"] }"#;
        let err = ArtifactModule::parse(text, "k").unwrap_err();
        assert!(matches!(
            err,
            MeshError::Codec(CodecError::UnresolvedImport { ref import, .. }) if import == "eval"
        ));
    }

    #[test]
    fn test_tampered_default_fails_digest() {
        let module =
            ArtifactModule::with_default("k", ModuleExport::Text { value: "one".to_string() })
                .unwrap();
        let tampered = module.render().unwrap().replace("\"one\"", "\"two\"");
        let err = ArtifactModule::parse(&tampered, "k")
            .unwrap()
            .into_default_export("k")
            .unwrap_err();
        assert!(matches!(err, MeshError::Codec(CodecError::DigestMismatch { .. })));
    }

    #[test]
    fn test_module_loaded_under_other_key_rejected() {
        let text = ArtifactModule::with_default("root/a", ModuleExport::Text { value: "v".to_string() })
            .unwrap()
            .render()
            .unwrap();
        let err = ArtifactModule::parse(&text, "root/b").unwrap_err();
        assert!(matches!(
            err,
            MeshError::Codec(CodecError::IdentifierMismatch { ref identifier, ref found })
                if identifier == "root/b" && found == "root/a"
        ));
    }

    #[test]
    fn test_float_values_survive_reparse() {
        for value in [1.0715660391465826e-75, 0.1, -2.5e300, 5e-324, 1.7976931348623157e308] {
            let export = ModuleExport::Json { value: json!({ "f": value }) };
            let text = ArtifactModule::with_default("k", export.clone())
                .unwrap()
                .render()
                .unwrap();
            let loaded = ArtifactModule::parse(&text, "k")
                .unwrap()
                .into_default_export("k")
                .unwrap();
            assert_eq!(loaded, export);
        }
    }

    #[test]
    fn test_normalize_trims_line_ends() {
        assert_eq!(normalize_module_text("{  \n  \"a\": 1   \n}\n\n\n"), "{\n  \"a\": 1\n}\n");
        assert_eq!(normalize_module_text(""), "\n");
    }

    proptest! {
        #[test]
        fn prop_float_round_trips_exactly(
            value in any::<f64>().prop_filter("finite", |f| f.is_finite()),
        ) {
            let export = ModuleExport::Json { value: json!(value) };
            let text = ArtifactModule::with_default("k", export.clone()).unwrap().render().unwrap();
            let loaded = ArtifactModule::parse(&text, "k").unwrap().into_default_export("k").unwrap();
            prop_assert_eq!(loaded, export);
        }

        #[test]
        fn prop_text_round_trips_exactly(value in ".*") {
            let module = ArtifactModule::with_default(
                "k",
                ModuleExport::Text { value: value.clone() },
            ).unwrap();
            let text = module.render().unwrap();
            let export = ArtifactModule::parse(&text, "k").unwrap().into_default_export("k").unwrap();
            prop_assert_eq!(export, ModuleExport::Text { value });
        }
    }
}
