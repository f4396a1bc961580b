//! SDL printer for the schema model
//!
//! Directives (applied and defined) and descriptions are preserved, so
//! `Schema::build(&print_schema(&s), ..)` yields a schema equal to `s`.

use std::fmt::Write;

use crate::model::*;

const INDENT: &str = "  ";

/// Print a schema as SDL.
pub fn print_schema(schema: &Schema) -> String {
    let mut blocks: Vec<String> = Vec::new();

    if let Some(definition) = schema.definition.as_ref().and_then(print_schema_definition) {
        blocks.push(definition);
    }
    for directive in &schema.directives {
        blocks.push(print_directive_definition(directive));
    }
    for ty in &schema.types {
        blocks.push(print_type(ty));
    }

    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

/// Quote a string as a GraphQL string literal.
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn print_description(description: &Option<String>, indent: &str, out: &mut String) {
    if let Some(description) = description {
        out.push_str(indent);
        out.push_str(&quote(description));
        out.push('\n');
    }
}

fn print_directives(directives: &[AppliedDirective]) -> String {
    let mut out = String::new();
    for directive in directives {
        out.push_str(" @");
        out.push_str(&directive.name);
        if !directive.arguments.is_empty() {
            let args: Vec<String> = directive
                .arguments
                .iter()
                .map(|(name, value)| format!("{}: {}", name, value))
                .collect();
            let _ = write!(out, "({})", args.join(", "));
        }
    }
    out
}

fn print_input_value(value: &InputValue) -> String {
    let mut out = String::new();
    if let Some(description) = &value.description {
        out.push_str(&quote(description));
        out.push(' ');
    }
    let _ = write!(out, "{}: {}", value.name, value.ty);
    if let Some(default) = &value.default_value {
        let _ = write!(out, " = {}", default);
    }
    out.push_str(&print_directives(&value.directives));
    out
}

fn print_arguments(arguments: &[InputValue]) -> String {
    if arguments.is_empty() {
        return String::new();
    }
    let args: Vec<String> = arguments.iter().map(print_input_value).collect();
    format!("({})", args.join(", "))
}

/// Without declared roots only the directives are kept, as `extend schema`.
fn print_schema_definition(definition: &SchemaDefinition) -> Option<String> {
    if !definition.has_roots() {
        if definition.directives.is_empty() {
            return None;
        }
        return Some(format!(
            "extend schema{}",
            print_directives(&definition.directives)
        ));
    }

    let mut out = String::new();
    print_description(&definition.description, "", &mut out);
    out.push_str("schema");
    out.push_str(&print_directives(&definition.directives));
    out.push_str(" {\n");
    let roots = [
        ("query", &definition.query),
        ("mutation", &definition.mutation),
        ("subscription", &definition.subscription),
    ];
    for (operation, name) in roots {
        if let Some(name) = name {
            let _ = writeln!(out, "{}{}: {}", INDENT, operation, name);
        }
    }
    out.push('}');
    Some(out)
}

fn print_directive_definition(directive: &DirectiveDefinition) -> String {
    let mut out = String::new();
    print_description(&directive.description, "", &mut out);
    let _ = write!(
        out,
        "directive @{}{}",
        directive.name,
        print_arguments(&directive.arguments)
    );
    if directive.repeatable {
        out.push_str(" repeatable");
    }
    let _ = write!(out, " on {}", directive.locations.join(" | "));
    out
}

fn print_type(ty: &NamedType) -> String {
    let mut out = String::new();
    print_description(&ty.description, "", &mut out);
    out.push_str(ty.kind.keyword());
    out.push(' ');
    out.push_str(&ty.name);

    match &ty.kind {
        TypeKind::Scalar => {
            out.push_str(&print_directives(&ty.directives));
        }
        TypeKind::Object { implements, fields } | TypeKind::Interface { implements, fields } => {
            if !implements.is_empty() {
                let _ = write!(out, " implements {}", implements.join(" & "));
            }
            out.push_str(&print_directives(&ty.directives));
            if !fields.is_empty() {
                out.push_str(" {\n");
                for field in fields {
                    print_description(&field.description, INDENT, &mut out);
                    let _ = writeln!(
                        out,
                        "{}{}{}: {}{}",
                        INDENT,
                        field.name,
                        print_arguments(&field.arguments),
                        field.ty,
                        print_directives(&field.directives)
                    );
                }
                out.push('}');
            }
        }
        TypeKind::Union { members } => {
            out.push_str(&print_directives(&ty.directives));
            if !members.is_empty() {
                let _ = write!(out, " = {}", members.join(" | "));
            }
        }
        TypeKind::Enum { values } => {
            out.push_str(&print_directives(&ty.directives));
            if !values.is_empty() {
                out.push_str(" {\n");
                for value in values {
                    print_description(&value.description, INDENT, &mut out);
                    let _ = writeln!(
                        out,
                        "{}{}{}",
                        INDENT,
                        value.name,
                        print_directives(&value.directives)
                    );
                }
                out.push('}');
            }
        }
        TypeKind::InputObject { fields } => {
            out.push_str(&print_directives(&ty.directives));
            if !fields.is_empty() {
                out.push_str(" {\n");
                for field in fields {
                    let _ = writeln!(out, "{}{}", INDENT, print_input_value(field));
                }
                out.push('}');
            }
        }
    }
    out
}
