//! Build a [`Schema`] from SDL text.
//!
//! Parsing is delegated to `async-graphql-parser`; this module lowers its AST
//! into the schema model, merges `extend` definitions and, unless the caller
//! marks the source as trusted, validates type references.

use async_graphql_parser::types::{
    BaseType, ConstDirective, DirectiveDefinition as AstDirectiveDefinition, FieldDefinition,
    InputValueDefinition, SchemaDefinition as AstSchemaDefinition, Type, TypeDefinition,
    TypeKind as AstTypeKind, TypeSystemDefinition,
};
use async_graphql_parser::Positioned;
use async_graphql_value::ConstValue;
use mesh_core::SchemaError;

use crate::model::*;

/// Options controlling [`Schema::build`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Skip validation; the SDL is known to come from a valid schema.
    pub assume_valid: bool,
}

impl BuildOptions {
    pub fn trusted() -> Self {
        Self { assume_valid: true }
    }
}

impl Schema {
    /// Build and validate a schema from SDL.
    pub fn parse(sdl: &str) -> Result<Schema, SchemaError> {
        Self::build(sdl, BuildOptions::default())
    }

    /// Build a schema from SDL produced by a previous successful build.
    pub fn parse_trusted(sdl: &str) -> Result<Schema, SchemaError> {
        Self::build(sdl, BuildOptions::trusted())
    }

    pub fn build(sdl: &str, options: BuildOptions) -> Result<Schema, SchemaError> {
        let document = async_graphql_parser::parse_schema(sdl).map_err(|e| SchemaError::Parse {
            reason: e.to_string(),
        })?;

        let mut builder = Builder::default();
        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema) => builder.schema_definition(schema.node),
                TypeSystemDefinition::Type(ty) => builder.type_definition(ty.node),
                TypeSystemDefinition::Directive(directive) => {
                    builder.directive_definition(directive.node)
                }
            }
        }

        builder.finish(options)
    }
}

#[derive(Default)]
struct Builder {
    schema: Schema,
    extensions: Vec<NamedType>,
    errors: Vec<String>,
}

impl Builder {
    fn schema_definition(&mut self, ast: AstSchemaDefinition) {
        let definition = self.schema.definition.get_or_insert_with(Default::default);
        if !ast.extend && definition.has_roots() {
            self.errors
                .push("Must provide only one schema definition.".to_string());
        }
        definition.directives.extend(lower_directives(&ast.directives));
        if let Some(query) = ast.query {
            definition.query = Some(query.node.as_str().to_string());
        }
        if let Some(mutation) = ast.mutation {
            definition.mutation = Some(mutation.node.as_str().to_string());
        }
        if let Some(subscription) = ast.subscription {
            definition.subscription = Some(subscription.node.as_str().to_string());
        }
    }

    fn type_definition(&mut self, ast: TypeDefinition) {
        let named = NamedType {
            name: ast.name.node.as_str().to_string(),
            description: ast.description.map(|d| d.node),
            directives: lower_directives(&ast.directives),
            kind: lower_kind(ast.kind),
        };

        if ast.extend {
            self.extensions.push(named);
            return;
        }

        if self.schema.get_type(&named.name).is_some() {
            self.errors.push(format!(
                "There can be only one type named \"{}\".",
                named.name
            ));
            return;
        }
        self.schema.types.push(named);
    }

    fn directive_definition(&mut self, ast: AstDirectiveDefinition) {
        let name = ast.name.node.as_str().to_string();
        if self.schema.get_directive(&name).is_some() {
            self.errors.push(format!(
                "There can be only one directive named \"@{}\".",
                name
            ));
            return;
        }
        self.schema.directives.push(DirectiveDefinition {
            name,
            description: ast.description.map(|d| d.node),
            arguments: ast.arguments.into_iter().map(|a| lower_input_value(a.node)).collect(),
            repeatable: ast.is_repeatable,
            locations: ast
                .locations
                .iter()
                .map(|loc| screaming_snake(&format!("{:?}", loc.node)))
                .collect(),
        });
    }

    fn finish(mut self, options: BuildOptions) -> Result<Schema, SchemaError> {
        for extension in std::mem::take(&mut self.extensions) {
            self.apply_extension(extension, options);
        }

        if !options.assume_valid {
            let reasons = validate(&self.schema);
            self.errors.extend(reasons);
            if !self.errors.is_empty() {
                return Err(SchemaError::Invalid {
                    reasons: self.errors,
                });
            }
        }

        Ok(self.schema)
    }

    fn apply_extension(&mut self, extension: NamedType, options: BuildOptions) {
        let Some(target) = self.schema.types.iter_mut().find(|t| t.name == extension.name) else {
            if options.assume_valid {
                self.schema.types.push(extension);
            } else {
                self.errors.push(format!(
                    "Cannot extend type \"{}\" because it is not defined.",
                    extension.name
                ));
            }
            return;
        };

        if !target.kind.same_kind(&extension.kind) {
            self.errors.push(format!(
                "Cannot extend non-{} type \"{}\".",
                extension.kind.keyword(),
                extension.name
            ));
            return;
        }

        target.directives.extend(extension.directives);
        match (&mut target.kind, extension.kind) {
            (
                TypeKind::Object { implements, fields },
                TypeKind::Object {
                    implements: more_implements,
                    fields: more_fields,
                },
            )
            | (
                TypeKind::Interface { implements, fields },
                TypeKind::Interface {
                    implements: more_implements,
                    fields: more_fields,
                },
            ) => {
                implements.extend(more_implements);
                fields.extend(more_fields);
            }
            (TypeKind::Union { members }, TypeKind::Union { members: more }) => {
                members.extend(more)
            }
            (TypeKind::Enum { values }, TypeKind::Enum { values: more }) => values.extend(more),
            (TypeKind::InputObject { fields }, TypeKind::InputObject { fields: more }) => {
                fields.extend(more)
            }
            _ => {}
        }
    }
}

fn lower_kind(kind: AstTypeKind) -> TypeKind {
    match kind {
        AstTypeKind::Scalar => TypeKind::Scalar,
        AstTypeKind::Object(object) => TypeKind::Object {
            implements: names(&object.implements),
            fields: object.fields.into_iter().map(|f| lower_field(f.node)).collect(),
        },
        AstTypeKind::Interface(interface) => TypeKind::Interface {
            implements: names(&interface.implements),
            fields: interface.fields.into_iter().map(|f| lower_field(f.node)).collect(),
        },
        AstTypeKind::Union(union) => TypeKind::Union {
            members: names(&union.members),
        },
        AstTypeKind::Enum(enum_type) => TypeKind::Enum {
            values: enum_type
                .values
                .into_iter()
                .map(|v| EnumValue {
                    name: v.node.value.node.as_str().to_string(),
                    description: v.node.description.map(|d| d.node),
                    directives: lower_directives(&v.node.directives),
                })
                .collect(),
        },
        AstTypeKind::InputObject(input) => TypeKind::InputObject {
            fields: input.fields.into_iter().map(|f| lower_input_value(f.node)).collect(),
        },
    }
}

fn names(list: &[Positioned<async_graphql_value::Name>]) -> Vec<String> {
    list.iter().map(|n| n.node.as_str().to_string()).collect()
}

fn lower_field(ast: FieldDefinition) -> Field {
    Field {
        name: ast.name.node.as_str().to_string(),
        description: ast.description.map(|d| d.node),
        arguments: ast.arguments.into_iter().map(|a| lower_input_value(a.node)).collect(),
        ty: lower_type(&ast.ty.node),
        directives: lower_directives(&ast.directives),
    }
}

fn lower_input_value(ast: InputValueDefinition) -> InputValue {
    InputValue {
        name: ast.name.node.as_str().to_string(),
        description: ast.description.map(|d| d.node),
        ty: lower_type(&ast.ty.node),
        default_value: ast.default_value.map(|v| print_value(&v.node)),
        directives: lower_directives(&ast.directives),
    }
}

fn lower_type(ty: &Type) -> TypeRef {
    let base = match &ty.base {
        BaseType::Named(name) => TypeRef::Named(name.as_str().to_string()),
        BaseType::List(of) => TypeRef::List(Box::new(lower_type(of))),
    };
    if ty.nullable {
        base
    } else {
        TypeRef::NonNull(Box::new(base))
    }
}

fn lower_directives(directives: &[Positioned<ConstDirective>]) -> Vec<AppliedDirective> {
    directives
        .iter()
        .map(|d| AppliedDirective {
            name: d.node.name.node.as_str().to_string(),
            arguments: d
                .node
                .arguments
                .iter()
                .map(|(name, value)| (name.node.as_str().to_string(), print_value(&value.node)))
                .collect(),
        })
        .collect()
}

/// Print a constant value as a GraphQL literal.
pub(crate) fn print_value(value: &ConstValue) -> String {
    match value {
        ConstValue::Null => "null".to_string(),
        ConstValue::Number(n) => n.to_string(),
        ConstValue::String(s) => crate::printer::quote(s),
        ConstValue::Boolean(b) => b.to_string(),
        ConstValue::Binary(bytes) => crate::printer::quote(&String::from_utf8_lossy(bytes.as_ref())),
        ConstValue::Enum(name) => name.as_str().to_string(),
        ConstValue::List(items) => {
            let items: Vec<String> = items.iter().map(print_value).collect();
            format!("[{}]", items.join(", "))
        }
        ConstValue::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k.as_str(), print_value(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// `FieldDefinition` -> `FIELD_DEFINITION`
fn screaming_snake(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    for (i, ch) in camel.chars().enumerate() {
        if ch.is_ascii_uppercase() && i > 0 {
            out.push('_');
        }
        out.push(ch.to_ascii_uppercase());
    }
    out
}

fn validate(schema: &Schema) -> Vec<String> {
    let mut errors = Vec::new();

    match schema.query_type() {
        None => errors.push("Query root type must be provided.".to_string()),
        Some(name) => check_root(schema, "Query", name, &mut errors),
    }
    if let Some(name) = schema.mutation_type() {
        check_root(schema, "Mutation", name, &mut errors);
    }
    if let Some(name) = schema.subscription_type() {
        check_root(schema, "Subscription", name, &mut errors);
    }

    if let Some(definition) = &schema.definition {
        check_applied(schema, &definition.directives, "schema", &mut errors);
    }

    for ty in &schema.types {
        check_applied(schema, &ty.directives, &ty.name, &mut errors);

        for iface in ty.interfaces() {
            match schema.get_type(iface).map(|t| &t.kind) {
                Some(TypeKind::Interface { .. }) => {}
                Some(_) => errors.push(format!(
                    "Type \"{}\" must only implement Interface types, it cannot implement \"{}\".",
                    ty.name, iface
                )),
                None => errors.push(format!("Unknown type \"{}\".", iface)),
            }
        }

        for field in ty.fields() {
            let at = format!("{}.{}", ty.name, field.name);
            check_output(schema, &field.ty, &at, &mut errors);
            check_applied(schema, &field.directives, &at, &mut errors);
            for arg in &field.arguments {
                check_input(schema, &arg.ty, &format!("{}({}:)", at, arg.name), &mut errors);
            }
        }

        match &ty.kind {
            TypeKind::Union { members } => {
                for member in members {
                    match schema.get_type(member).map(|t| &t.kind) {
                        Some(TypeKind::Object { .. }) => {}
                        Some(_) => errors.push(format!(
                            "Union type \"{}\" can only include Object types, it cannot include \"{}\".",
                            ty.name, member
                        )),
                        None => errors.push(format!("Unknown type \"{}\".", member)),
                    }
                }
            }
            TypeKind::InputObject { fields } => {
                for field in fields {
                    check_input(
                        schema,
                        &field.ty,
                        &format!("{}.{}", ty.name, field.name),
                        &mut errors,
                    );
                }
            }
            _ => {}
        }
    }

    for directive in &schema.directives {
        for arg in &directive.arguments {
            check_input(
                schema,
                &arg.ty,
                &format!("@{}({}:)", directive.name, arg.name),
                &mut errors,
            );
        }
    }

    errors
}

fn check_root(schema: &Schema, operation: &str, name: &str, errors: &mut Vec<String>) {
    match schema.get_type(name).map(|t| &t.kind) {
        Some(TypeKind::Object { .. }) => {}
        Some(_) => errors.push(format!(
            "{} root type must be Object type, it cannot be {}.",
            operation, name
        )),
        None => errors.push(format!(
            "{} root type \"{}\" is not defined.",
            operation, name
        )),
    }
}

fn check_output(schema: &Schema, ty: &TypeRef, at: &str, errors: &mut Vec<String>) {
    let name = ty.named_type();
    if BUILTIN_SCALARS.contains(&name) {
        return;
    }
    match schema.get_type(name) {
        None => errors.push(format!("Unknown type \"{}\" at {}.", name, at)),
        Some(t) if !t.kind.is_output() => errors.push(format!(
            "The type of {} must be Output Type but got: {}.",
            at, ty
        )),
        Some(_) => {}
    }
}

fn check_input(schema: &Schema, ty: &TypeRef, at: &str, errors: &mut Vec<String>) {
    let name = ty.named_type();
    if BUILTIN_SCALARS.contains(&name) {
        return;
    }
    match schema.get_type(name) {
        None => errors.push(format!("Unknown type \"{}\" at {}.", name, at)),
        Some(t) if !t.kind.is_input() => errors.push(format!(
            "The type of {} must be Input Type but got: {}.",
            at, ty
        )),
        Some(_) => {}
    }
}

fn check_applied(schema: &Schema, directives: &[AppliedDirective], at: &str, errors: &mut Vec<String>) {
    for directive in directives {
        if BUILTIN_DIRECTIVES.contains(&directive.name.as_str()) {
            continue;
        }
        if schema.get_directive(&directive.name).is_none() {
            errors.push(format!("Unknown directive \"@{}\" on {}.", directive.name, at));
        }
    }
}
