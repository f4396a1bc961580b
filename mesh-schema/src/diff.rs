//! Structural schema diff with change criticality.
//!
//! Every difference between two schemas becomes a [`Change`] classified as
//! breaking, dangerous or safe for existing clients.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::*;

/// How a change affects existing clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Criticality {
    NonBreaking,
    Dangerous,
    Breaking,
}

impl Criticality {
    /// Breaking and dangerous changes must not overwrite a stored schema.
    pub fn is_rejected(self) -> bool {
        matches!(self, Criticality::Breaking | Criticality::Dangerous)
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Criticality::NonBreaking => "NON_BREAKING",
            Criticality::Dangerous => "DANGEROUS",
            Criticality::Breaking => "BREAKING",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    TypeAdded,
    TypeRemoved,
    TypeKindChanged,
    TypeDescriptionChanged,
    RootOperationChanged,
    UnionMemberAdded,
    UnionMemberRemoved,
    EnumValueAdded,
    EnumValueRemoved,
    InterfaceAdded,
    InterfaceRemoved,
    FieldAdded,
    FieldRemoved,
    FieldTypeChanged,
    FieldTypeChangedSafely,
    FieldDescriptionChanged,
    RequiredInputFieldAdded,
    OptionalInputFieldAdded,
    InputFieldRemoved,
    InputFieldTypeChanged,
    InputFieldTypeChangedSafely,
    InputFieldDefaultValueChanged,
    RequiredArgAdded,
    OptionalArgAdded,
    ArgRemoved,
    ArgTypeChanged,
    ArgTypeChangedSafely,
    ArgDefaultValueChanged,
    DirectiveAdded,
    DirectiveRemoved,
    DirectiveArgRemoved,
    DirectiveArgTypeChanged,
    DirectiveArgTypeChangedSafely,
    RequiredDirectiveArgAdded,
    OptionalDirectiveArgAdded,
    DirectiveLocationAdded,
    DirectiveLocationRemoved,
    DirectiveRepeatableAdded,
    DirectiveRepeatableRemoved,
}

impl ChangeKind {
    pub fn criticality(self) -> Criticality {
        use ChangeKind::*;
        match self {
            TypeRemoved
            | TypeKindChanged
            | RootOperationChanged
            | UnionMemberRemoved
            | EnumValueRemoved
            | InterfaceRemoved
            | FieldRemoved
            | FieldTypeChanged
            | RequiredInputFieldAdded
            | InputFieldRemoved
            | InputFieldTypeChanged
            | RequiredArgAdded
            | ArgRemoved
            | ArgTypeChanged
            | DirectiveRemoved
            | DirectiveArgRemoved
            | DirectiveArgTypeChanged
            | RequiredDirectiveArgAdded
            | DirectiveLocationRemoved
            | DirectiveRepeatableRemoved => Criticality::Breaking,

            UnionMemberAdded
            | EnumValueAdded
            | InterfaceAdded
            | OptionalInputFieldAdded
            | OptionalArgAdded
            | ArgDefaultValueChanged
            | InputFieldDefaultValueChanged => Criticality::Dangerous,

            TypeAdded
            | TypeDescriptionChanged
            | FieldAdded
            | FieldTypeChangedSafely
            | FieldDescriptionChanged
            | InputFieldTypeChangedSafely
            | ArgTypeChangedSafely
            | DirectiveArgTypeChangedSafely
            | DirectiveAdded
            | OptionalDirectiveArgAdded
            | DirectiveLocationAdded
            | DirectiveRepeatableAdded => Criticality::NonBreaking,
        }
    }
}

/// One difference between two schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub kind: ChangeKind,
    pub criticality: Criticality,
    /// Dotted location, e.g. `Query.user.id`.
    pub path: String,
    pub message: String,
}

impl Change {
    fn new(kind: ChangeKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            criticality: kind.criticality(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.criticality, self.message)
    }
}

/// Compute every change from `old` to `new`.
pub fn diff(old: &Schema, new: &Schema) -> Vec<Change> {
    let mut changes = Vec::new();
    diff_roots(old, new, &mut changes);
    diff_types(old, new, &mut changes);
    diff_directives(old, new, &mut changes);
    changes
}

/// Only the changes that make an overwrite unsafe.
pub fn rejected_changes(old: &Schema, new: &Schema) -> Vec<Change> {
    diff(old, new)
        .into_iter()
        .filter(|c| c.criticality.is_rejected())
        .collect()
}

fn diff_roots(old: &Schema, new: &Schema, changes: &mut Vec<Change>) {
    let roots = [
        ("query", old.query_type(), new.query_type()),
        ("mutation", old.mutation_type(), new.mutation_type()),
        ("subscription", old.subscription_type(), new.subscription_type()),
    ];
    for (operation, before, after) in roots {
        // A newly introduced root is an addition, caught as TypeAdded.
        if let Some(before) = before {
            if Some(before) != after {
                changes.push(Change::new(
                    ChangeKind::RootOperationChanged,
                    operation,
                    format!(
                        "Schema {} root has changed from {} to {}.",
                        operation,
                        before,
                        after.unwrap_or("nothing")
                    ),
                ));
            }
        }
    }
}

fn diff_types(old: &Schema, new: &Schema, changes: &mut Vec<Change>) {
    for old_type in &old.types {
        let Some(new_type) = new.get_type(&old_type.name) else {
            changes.push(Change::new(
                ChangeKind::TypeRemoved,
                &old_type.name,
                format!("{} was removed.", old_type.name),
            ));
            continue;
        };

        if !old_type.kind.same_kind(&new_type.kind) {
            changes.push(Change::new(
                ChangeKind::TypeKindChanged,
                &old_type.name,
                format!(
                    "{} changed from {} to {}.",
                    old_type.name,
                    old_type.kind.label(),
                    new_type.kind.label()
                ),
            ));
            continue;
        }

        if old_type.description != new_type.description {
            changes.push(Change::new(
                ChangeKind::TypeDescriptionChanged,
                &old_type.name,
                format!("Description of {} changed.", old_type.name),
            ));
        }

        match (&old_type.kind, &new_type.kind) {
            (
                TypeKind::Object {
                    implements: old_ifaces,
                    fields: old_fields,
                },
                TypeKind::Object {
                    implements: new_ifaces,
                    fields: new_fields,
                },
            )
            | (
                TypeKind::Interface {
                    implements: old_ifaces,
                    fields: old_fields,
                },
                TypeKind::Interface {
                    implements: new_ifaces,
                    fields: new_fields,
                },
            ) => {
                diff_interfaces(&old_type.name, old_ifaces, new_ifaces, changes);
                diff_fields(&old_type.name, old_fields, new_fields, changes);
            }
            (TypeKind::Union { members: old_members }, TypeKind::Union { members: new_members }) => {
                diff_union(&old_type.name, old_members, new_members, changes);
            }
            (TypeKind::Enum { values: old_values }, TypeKind::Enum { values: new_values }) => {
                diff_enum(&old_type.name, old_values, new_values, changes);
            }
            (
                TypeKind::InputObject { fields: old_fields },
                TypeKind::InputObject { fields: new_fields },
            ) => {
                diff_input_fields(&old_type.name, old_fields, new_fields, changes);
            }
            _ => {}
        }
    }

    for new_type in &new.types {
        if old.get_type(&new_type.name).is_none() {
            changes.push(Change::new(
                ChangeKind::TypeAdded,
                &new_type.name,
                format!("Type {} was added.", new_type.name),
            ));
        }
    }
}

fn diff_interfaces(type_name: &str, old: &[String], new: &[String], changes: &mut Vec<Change>) {
    for iface in old.iter().filter(|i| !new.contains(i)) {
        changes.push(Change::new(
            ChangeKind::InterfaceRemoved,
            type_name,
            format!("{} no longer implements interface {}.", type_name, iface),
        ));
    }
    for iface in new.iter().filter(|i| !old.contains(i)) {
        changes.push(Change::new(
            ChangeKind::InterfaceAdded,
            type_name,
            format!("{} added to interfaces implemented by {}.", iface, type_name),
        ));
    }
}

fn diff_fields(type_name: &str, old: &[Field], new: &[Field], changes: &mut Vec<Change>) {
    for old_field in old {
        let path = format!("{}.{}", type_name, old_field.name);
        let Some(new_field) = new.iter().find(|f| f.name == old_field.name) else {
            changes.push(Change::new(
                ChangeKind::FieldRemoved,
                &path,
                format!("{} was removed.", path),
            ));
            continue;
        };

        if old_field.ty != new_field.ty {
            let kind = if is_safe_output_change(&old_field.ty, &new_field.ty) {
                ChangeKind::FieldTypeChangedSafely
            } else {
                ChangeKind::FieldTypeChanged
            };
            changes.push(Change::new(
                kind,
                &path,
                format!(
                    "{} changed type from {} to {}.",
                    path, old_field.ty, new_field.ty
                ),
            ));
        }

        if old_field.description != new_field.description {
            changes.push(Change::new(
                ChangeKind::FieldDescriptionChanged,
                &path,
                format!("Description of {} changed.", path),
            ));
        }

        diff_arguments(&path, &old_field.arguments, &new_field.arguments, changes);
    }

    for new_field in new.iter().filter(|f| !old.iter().any(|o| o.name == f.name)) {
        let path = format!("{}.{}", type_name, new_field.name);
        changes.push(Change::new(
            ChangeKind::FieldAdded,
            &path,
            format!("Field {} was added.", path),
        ));
    }
}

fn diff_arguments(owner: &str, old: &[InputValue], new: &[InputValue], changes: &mut Vec<Change>) {
    for old_arg in old {
        let path = format!("{}.{}", owner, old_arg.name);
        let Some(new_arg) = new.iter().find(|a| a.name == old_arg.name) else {
            changes.push(Change::new(
                ChangeKind::ArgRemoved,
                &path,
                format!("{} arg {} was removed.", owner, old_arg.name),
            ));
            continue;
        };

        if old_arg.ty != new_arg.ty {
            let kind = if is_safe_input_change(&old_arg.ty, &new_arg.ty) {
                ChangeKind::ArgTypeChangedSafely
            } else {
                ChangeKind::ArgTypeChanged
            };
            changes.push(Change::new(
                kind,
                &path,
                format!(
                    "{} arg {} has changed type from {} to {}.",
                    owner, old_arg.name, old_arg.ty, new_arg.ty
                ),
            ));
        } else if old_arg.default_value.is_some() && old_arg.default_value != new_arg.default_value {
            changes.push(Change::new(
                ChangeKind::ArgDefaultValueChanged,
                &path,
                format!(
                    "{} arg {} has changed defaultValue from {} to {}.",
                    owner,
                    old_arg.name,
                    old_arg.default_value.as_deref().unwrap_or("none"),
                    new_arg.default_value.as_deref().unwrap_or("none")
                ),
            ));
        }
    }

    for new_arg in new.iter().filter(|a| !old.iter().any(|o| o.name == a.name)) {
        let path = format!("{}.{}", owner, new_arg.name);
        if new_arg.is_required() {
            changes.push(Change::new(
                ChangeKind::RequiredArgAdded,
                &path,
                format!("A required arg {} on {} was added.", new_arg.name, owner),
            ));
        } else {
            changes.push(Change::new(
                ChangeKind::OptionalArgAdded,
                &path,
                format!("An optional arg {} on {} was added.", new_arg.name, owner),
            ));
        }
    }
}

fn diff_input_fields(
    type_name: &str,
    old: &[InputValue],
    new: &[InputValue],
    changes: &mut Vec<Change>,
) {
    for old_field in old {
        let path = format!("{}.{}", type_name, old_field.name);
        let Some(new_field) = new.iter().find(|f| f.name == old_field.name) else {
            changes.push(Change::new(
                ChangeKind::InputFieldRemoved,
                &path,
                format!("{} was removed.", path),
            ));
            continue;
        };

        if old_field.ty != new_field.ty {
            let kind = if is_safe_input_change(&old_field.ty, &new_field.ty) {
                ChangeKind::InputFieldTypeChangedSafely
            } else {
                ChangeKind::InputFieldTypeChanged
            };
            changes.push(Change::new(
                kind,
                &path,
                format!(
                    "{} changed type from {} to {}.",
                    path, old_field.ty, new_field.ty
                ),
            ));
        }

        if old_field.default_value != new_field.default_value {
            changes.push(Change::new(
                ChangeKind::InputFieldDefaultValueChanged,
                &path,
                format!(
                    "{} has changed defaultValue from {} to {}.",
                    path,
                    old_field.default_value.as_deref().unwrap_or("none"),
                    new_field.default_value.as_deref().unwrap_or("none")
                ),
            ));
        }
    }

    for new_field in new.iter().filter(|f| !old.iter().any(|o| o.name == f.name)) {
        let path = format!("{}.{}", type_name, new_field.name);
        if new_field.is_required() {
            changes.push(Change::new(
                ChangeKind::RequiredInputFieldAdded,
                &path,
                format!(
                    "A required field {} on input type {} was added.",
                    new_field.name, type_name
                ),
            ));
        } else {
            changes.push(Change::new(
                ChangeKind::OptionalInputFieldAdded,
                &path,
                format!(
                    "An optional field {} on input type {} was added.",
                    new_field.name, type_name
                ),
            ));
        }
    }
}

fn diff_union(type_name: &str, old: &[String], new: &[String], changes: &mut Vec<Change>) {
    for member in old.iter().filter(|m| !new.contains(m)) {
        changes.push(Change::new(
            ChangeKind::UnionMemberRemoved,
            type_name,
            format!("{} was removed from union type {}.", member, type_name),
        ));
    }
    for member in new.iter().filter(|m| !old.contains(m)) {
        changes.push(Change::new(
            ChangeKind::UnionMemberAdded,
            type_name,
            format!("{} was added to union type {}.", member, type_name),
        ));
    }
}

fn diff_enum(type_name: &str, old: &[EnumValue], new: &[EnumValue], changes: &mut Vec<Change>) {
    for value in old.iter().filter(|v| !new.iter().any(|n| n.name == v.name)) {
        changes.push(Change::new(
            ChangeKind::EnumValueRemoved,
            format!("{}.{}", type_name, value.name),
            format!("{} was removed from enum type {}.", value.name, type_name),
        ));
    }
    for value in new.iter().filter(|v| !old.iter().any(|o| o.name == v.name)) {
        changes.push(Change::new(
            ChangeKind::EnumValueAdded,
            format!("{}.{}", type_name, value.name),
            format!("{} was added to enum type {}.", value.name, type_name),
        ));
    }
}

fn diff_directives(old: &Schema, new: &Schema, changes: &mut Vec<Change>) {
    for old_directive in &old.directives {
        let path = format!("@{}", old_directive.name);
        let Some(new_directive) = new.get_directive(&old_directive.name) else {
            changes.push(Change::new(
                ChangeKind::DirectiveRemoved,
                &path,
                format!("{} was removed.", path),
            ));
            continue;
        };

        for arg in &old_directive.arguments {
            let arg_path = format!("{}.{}", path, arg.name);
            let Some(new_arg) = new_directive.arguments.iter().find(|a| a.name == arg.name) else {
                changes.push(Change::new(
                    ChangeKind::DirectiveArgRemoved,
                    arg_path,
                    format!("{} was removed from {}.", arg.name, path),
                ));
                continue;
            };
            if arg.ty != new_arg.ty {
                let kind = if is_safe_input_change(&arg.ty, &new_arg.ty) {
                    ChangeKind::DirectiveArgTypeChangedSafely
                } else {
                    ChangeKind::DirectiveArgTypeChanged
                };
                changes.push(Change::new(
                    kind,
                    arg_path,
                    format!(
                        "{} arg {} has changed type from {} to {}.",
                        path, arg.name, arg.ty, new_arg.ty
                    ),
                ));
            }
        }
        for arg in &new_directive.arguments {
            if old_directive.arguments.iter().any(|a| a.name == arg.name) {
                continue;
            }
            let (kind, adjective) = if arg.is_required() {
                (ChangeKind::RequiredDirectiveArgAdded, "required")
            } else {
                (ChangeKind::OptionalDirectiveArgAdded, "optional")
            };
            changes.push(Change::new(
                kind,
                format!("{}.{}", path, arg.name),
                format!("A {} arg {} on directive {} was added.", adjective, arg.name, path),
            ));
        }

        if old_directive.repeatable && !new_directive.repeatable {
            changes.push(Change::new(
                ChangeKind::DirectiveRepeatableRemoved,
                &path,
                format!("Repeatable flag was removed from {}.", path),
            ));
        } else if !old_directive.repeatable && new_directive.repeatable {
            changes.push(Change::new(
                ChangeKind::DirectiveRepeatableAdded,
                &path,
                format!("Repeatable flag was added to {}.", path),
            ));
        }

        for location in &old_directive.locations {
            if !new_directive.locations.contains(location) {
                changes.push(Change::new(
                    ChangeKind::DirectiveLocationRemoved,
                    &path,
                    format!("{} was removed from {}.", location, path),
                ));
            }
        }
        for location in &new_directive.locations {
            if !old_directive.locations.contains(location) {
                changes.push(Change::new(
                    ChangeKind::DirectiveLocationAdded,
                    &path,
                    format!("{} was added to {}.", location, path),
                ));
            }
        }
    }

    for new_directive in &new.directives {
        if old.get_directive(&new_directive.name).is_none() {
            changes.push(Change::new(
                ChangeKind::DirectiveAdded,
                format!("@{}", new_directive.name),
                format!("Directive @{} was added.", new_directive.name),
            ));
        }
    }
}

/// Whether clients reading a field typed `old` can still read `new`.
fn is_safe_output_change(old: &TypeRef, new: &TypeRef) -> bool {
    match (old, new) {
        (TypeRef::List(old_of), TypeRef::List(new_of)) => is_safe_output_change(old_of, new_of),
        (TypeRef::List(_), TypeRef::NonNull(new_of)) => is_safe_output_change(old, new_of),
        (TypeRef::NonNull(old_of), TypeRef::NonNull(new_of)) => {
            is_safe_output_change(old_of, new_of)
        }
        (TypeRef::Named(old_name), TypeRef::Named(new_name)) => old_name == new_name,
        (TypeRef::Named(_), TypeRef::NonNull(new_of)) => is_safe_output_change(old, new_of),
        _ => false,
    }
}

/// Whether clients sending a value typed `old` still satisfy `new`.
fn is_safe_input_change(old: &TypeRef, new: &TypeRef) -> bool {
    match (old, new) {
        (TypeRef::List(old_of), TypeRef::List(new_of)) => is_safe_input_change(old_of, new_of),
        (TypeRef::NonNull(old_of), TypeRef::NonNull(new_of)) => is_safe_input_change(old_of, new_of),
        (TypeRef::NonNull(old_of), _) => is_safe_input_change(old_of, new),
        (TypeRef::Named(old_name), TypeRef::Named(new_name)) => old_name == new_name,
        _ => false,
    }
}
