//! Schema model types
//!
//! Pure data: every definition keeps declaration order, and applied
//! directives / default values are kept in their printed literal form so that
//! printing and rebuilding a schema is lossless.

use std::fmt;

/// Scalars every schema may reference without defining.
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Directives every schema may apply without defining.
pub const BUILTIN_DIRECTIVES: [&str; 5] = ["skip", "include", "deprecated", "specifiedBy", "oneOf"];

/// Reference to a type in a field, argument or input field position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn list(of: TypeRef) -> Self {
        TypeRef::List(Box::new(of))
    }

    pub fn non_null(of: TypeRef) -> Self {
        TypeRef::NonNull(Box::new(of))
    }

    /// Innermost named type.
    pub fn named_type(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(of) | TypeRef::NonNull(of) => of.named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(of) => write!(f, "[{}]", of),
            TypeRef::NonNull(of) => write!(f, "{}!", of),
        }
    }
}

/// A directive applied to a definition, with arguments in printed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedDirective {
    pub name: String,
    pub arguments: Vec<(String, String)>,
}

impl AppliedDirective {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.push((name.into(), value.into()));
        self
    }
}

/// Argument, input field or directive argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputValue {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    /// Default value literal, e.g. `10` or `"abc"`.
    pub default_value: Option<String>,
    pub directives: Vec<AppliedDirective>,
}

impl InputValue {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            default_value: None,
            directives: Vec::new(),
        }
    }

    /// Non-null without a default: callers must supply it.
    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default_value.is_none()
    }
}

/// Field of an object or interface type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<InputValue>,
    pub ty: TypeRef,
    pub directives: Vec<AppliedDirective>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: Vec::new(),
            ty,
            directives: Vec::new(),
        }
    }

    pub fn argument(&self, name: &str) -> Option<&InputValue> {
        self.arguments.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub description: Option<String>,
    pub directives: Vec<AppliedDirective>,
}

/// Kind-specific body of a named type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Object {
        implements: Vec<String>,
        fields: Vec<Field>,
    },
    Interface {
        implements: Vec<String>,
        fields: Vec<Field>,
    },
    Union {
        members: Vec<String>,
    },
    Enum {
        values: Vec<EnumValue>,
    },
    InputObject {
        fields: Vec<InputValue>,
    },
}

impl TypeKind {
    /// Human readable kind, as used in change messages.
    pub fn label(&self) -> &'static str {
        match self {
            TypeKind::Scalar => "a Scalar type",
            TypeKind::Object { .. } => "an Object type",
            TypeKind::Interface { .. } => "an Interface type",
            TypeKind::Union { .. } => "a Union type",
            TypeKind::Enum { .. } => "an Enum type",
            TypeKind::InputObject { .. } => "an Input type",
        }
    }

    /// SDL keyword introducing this kind.
    pub fn keyword(&self) -> &'static str {
        match self {
            TypeKind::Scalar => "scalar",
            TypeKind::Object { .. } => "type",
            TypeKind::Interface { .. } => "interface",
            TypeKind::Union { .. } => "union",
            TypeKind::Enum { .. } => "enum",
            TypeKind::InputObject { .. } => "input",
        }
    }

    pub fn same_kind(&self, other: &TypeKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// May appear in argument and input field positions.
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            TypeKind::Scalar | TypeKind::Enum { .. } | TypeKind::InputObject { .. }
        )
    }

    /// May appear in field result positions.
    pub fn is_output(&self) -> bool {
        !matches!(self, TypeKind::InputObject { .. })
    }
}

/// A named type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    pub name: String,
    pub description: Option<String>,
    pub directives: Vec<AppliedDirective>,
    pub kind: TypeKind,
}

impl NamedType {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            directives: Vec::new(),
            kind,
        }
    }

    /// Output fields of object and interface types.
    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            TypeKind::Object { fields, .. } | TypeKind::Interface { fields, .. } => fields,
            _ => &[],
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().iter().find(|f| f.name == name)
    }

    pub fn interfaces(&self) -> &[String] {
        match &self.kind {
            TypeKind::Object { implements, .. } | TypeKind::Interface { implements, .. } => {
                implements
            }
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveDefinition {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<InputValue>,
    pub repeatable: bool,
    /// Locations in SDL spelling, e.g. `FIELD_DEFINITION`.
    pub locations: Vec<String>,
}

/// Explicit `schema { ... }` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDefinition {
    pub description: Option<String>,
    pub directives: Vec<AppliedDirective>,
    pub query: Option<String>,
    pub mutation: Option<String>,
    pub subscription: Option<String>,
}

impl SchemaDefinition {
    /// Whether any root operation type is declared.
    pub fn has_roots(&self) -> bool {
        self.query.is_some() || self.mutation.is_some() || self.subscription.is_some()
    }
}

/// A GraphQL schema built from SDL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub definition: Option<SchemaDefinition>,
    pub types: Vec<NamedType>,
    pub directives: Vec<DirectiveDefinition>,
}

impl Schema {
    pub fn get_type(&self, name: &str) -> Option<&NamedType> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn get_directive(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directives.iter().find(|d| d.name == name)
    }

    /// Defined here, or a built-in scalar.
    pub fn has_type(&self, name: &str) -> bool {
        BUILTIN_SCALARS.contains(&name) || self.get_type(name).is_some()
    }

    pub fn query_type(&self) -> Option<&str> {
        self.root_type(|d| d.query.as_deref(), "Query")
    }

    pub fn mutation_type(&self) -> Option<&str> {
        self.root_type(|d| d.mutation.as_deref(), "Mutation")
    }

    pub fn subscription_type(&self) -> Option<&str> {
        self.root_type(|d| d.subscription.as_deref(), "Subscription")
    }

    /// Declared root, or the conventionally named type when no root is declared.
    fn root_type<'a, F>(&'a self, pick: F, conventional: &'static str) -> Option<&'a str>
    where
        F: Fn(&'a SchemaDefinition) -> Option<&'a str>,
    {
        match &self.definition {
            Some(definition) if definition.has_roots() => pick(definition),
            _ => self.get_type(conventional).map(|t| t.name.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_display() {
        let ty = TypeRef::non_null(TypeRef::list(TypeRef::non_null(TypeRef::named("String"))));
        assert_eq!(ty.to_string(), "[String!]!");
        assert_eq!(ty.named_type(), "String");
        assert!(ty.is_non_null());
    }

    #[test]
    fn test_required_input_value() {
        let mut arg = InputValue::new("limit", TypeRef::non_null(TypeRef::named("Int")));
        assert!(arg.is_required());
        arg.default_value = Some("10".to_string());
        assert!(!arg.is_required());
    }

    #[test]
    fn test_root_types_default_to_conventional_names() {
        let schema = Schema {
            types: vec![NamedType::new(
                "Query",
                TypeKind::Object {
                    implements: vec![],
                    fields: vec![Field::new("ok", TypeRef::named("Boolean"))],
                },
            )],
            ..Default::default()
        };
        assert_eq!(schema.query_type(), Some("Query"));
        assert_eq!(schema.mutation_type(), None);
        assert!(schema.has_type("ID"));
        assert!(!schema.has_type("Missing"));
    }

    #[test]
    fn test_definition_without_roots_falls_back_to_conventional_names() {
        let mut schema = Schema {
            definition: Some(SchemaDefinition {
                directives: vec![AppliedDirective::new("link").with_argument("url", "\"x\"")],
                ..Default::default()
            }),
            types: vec![
                NamedType::new("Query", TypeKind::Scalar),
                NamedType::new("Mutation", TypeKind::Scalar),
            ],
            ..Default::default()
        };
        assert_eq!(schema.query_type(), Some("Query"));
        assert_eq!(schema.mutation_type(), Some("Mutation"));

        if let Some(definition) = schema.definition.as_mut() {
            definition.query = Some("Root".to_string());
        }
        assert_eq!(schema.query_type(), Some("Root"));
        assert_eq!(schema.mutation_type(), None);
    }
}
