//! Rules 2-7: semantic checks over the typed schema.
//!
//! Each rule walks the whole schema before the next one starts, so issues come
//! out grouped by rule and in declared order within a rule.

use crate::issue::ValidationIssue;
use blok_core::schema::{
    BUILTIN_USER_TABLE, CREDENTIAL_FIELDS, FieldSpec, FieldType, ForeignKeyRef, Schema, TableSpec,
    is_implicit_field, is_reserved_table,
};
use blok_core::naming::{entity_name, pascal_case};
use std::collections::{HashMap, HashSet};

/// Rule 2: every field declares a supported type.
pub(crate) fn check_types(schema: &Schema, issues: &mut Vec<ValidationIssue>) {
    for (table, spec) in schema.tables() {
        for (field, field_spec) in spec.fields() {
            match field_spec.kind() {
                None => issues.push(ValidationIssue::missing_type(table, field)),
                Some(FieldType::Unsupported(name)) => issues.push(ValidationIssue::unknown_type(
                    table,
                    field,
                    name,
                    &FieldType::SUPPORTED,
                )),
                Some(_) => {}
            }
        }
    }
}

/// Rule 3: type-mandatory properties are present and usable.
pub(crate) fn check_properties(schema: &Schema, issues: &mut Vec<ValidationIssue>) {
    for (table, spec) in schema.tables() {
        for (field, field_spec) in spec.fields() {
            check_field_properties(table, field, field_spec, issues);
        }
    }
}

fn check_field_properties(
    table: &str,
    field: &str,
    spec: &FieldSpec,
    issues: &mut Vec<ValidationIssue>,
) {
    match spec.kind() {
        Some(FieldType::String) => match spec.max_length {
            None => issues.push(ValidationIssue::missing_property(
                table,
                field,
                "string",
                "max_length",
            )),
            Some(0) => issues.push(ValidationIssue::invalid_property(
                table,
                field,
                "max_length must be greater than zero",
            )),
            Some(_) => {}
        },
        Some(FieldType::Decimal) => match (spec.precision, spec.scale) {
            (None, _) => issues.push(ValidationIssue::missing_property(
                table,
                field,
                "decimal",
                "precision",
            )),
            (Some(_), None) => issues.push(ValidationIssue::missing_property(
                table,
                field,
                "decimal",
                "scale",
            )),
            (Some(0), Some(_)) => issues.push(ValidationIssue::invalid_property(
                table,
                field,
                "precision must be greater than zero",
            )),
            (Some(precision), Some(scale)) if scale > precision => {
                issues.push(ValidationIssue::invalid_property(
                    table,
                    field,
                    format!("scale ({}) exceeds precision ({})", scale, precision),
                ))
            }
            _ => {}
        },
        _ => {}
    }

    if let Some(values) = &spec.enum_values {
        if values.is_empty() {
            issues.push(ValidationIssue::invalid_property(
                table,
                field,
                "enum must list at least one value",
            ));
        } else {
            let mut seen = HashSet::new();
            if let Some(duplicate) = values.iter().find(|v| !seen.insert(v.as_str())) {
                issues.push(ValidationIssue::invalid_property(
                    table,
                    field,
                    format!("enum value '{}' is listed more than once", duplicate),
                ));
            }
        }
    }
}

/// Rule 4: implicit fields are never declared.
pub(crate) fn check_implicit_fields(schema: &Schema, issues: &mut Vec<ValidationIssue>) {
    for (table, spec) in schema.tables() {
        for (field, _) in spec.fields() {
            if is_implicit_field(field) {
                issues.push(ValidationIssue::reserved_field(table, field));
            }
        }
    }
}

/// Rule 5: reserved authentication-table names.
///
/// A reserved name is accepted only for a profile-style table that links to
/// the built-in user entity and carries no credentials of its own.
pub(crate) fn check_reserved_tables(schema: &Schema, issues: &mut Vec<ValidationIssue>) {
    for (table, spec) in schema.tables() {
        if is_reserved_table(table) && !is_user_linkage(table, spec) {
            issues.push(ValidationIssue::reserved_table(table, BUILTIN_USER_TABLE));
        }
    }
}

fn is_user_linkage(table: &str, spec: &TableSpec) -> bool {
    if table == BUILTIN_USER_TABLE {
        return false;
    }
    let links = spec.fields().any(|(_, field)| field.links_to_builtin_user());
    let has_credentials = spec
        .fields()
        .any(|(name, _)| CREDENTIAL_FIELDS.contains(&name));
    links && !has_credentials
}

/// Rule 6: every foreign key is `table.field` and resolves.
pub(crate) fn check_foreign_keys(schema: &Schema, issues: &mut Vec<ValidationIssue>) {
    for (table, spec) in schema.tables() {
        for (field, field_spec) in spec.fields() {
            let Some(target) = field_spec.foreign_key.as_deref() else {
                continue;
            };
            match ForeignKeyRef::parse(target) {
                None => issues.push(ValidationIssue::malformed_foreign_key(table, field, target)),
                Some(reference) if !schema.resolves(&reference) => issues.push(
                    ValidationIssue::unresolved_foreign_key(table, field, target),
                ),
                Some(_) => {}
            }
        }
    }
}

/// Rule 7: no two tables produce the same component or type name.
///
/// List views are named after the table, forms and interfaces after its
/// singular, so `task` and `tasks` would both write `TaskFormView.tsx`.
pub(crate) fn check_generated_names(schema: &Schema, issues: &mut Vec<ValidationIssue>) {
    let mut owners: HashMap<String, &str> = HashMap::new();
    for table in schema.table_names() {
        let entity = entity_name(table);
        let names = [
            format!("{}View", pascal_case(table)),
            format!("{}FormView", entity),
            entity,
        ];
        let clash = names
            .iter()
            .find_map(|name| owners.get(name).map(|owner| (name.clone(), *owner)));
        match clash {
            Some((name, owner)) => {
                issues.push(ValidationIssue::name_collision(table, owner, &name));
            }
            None => {
                for name in names {
                    owners.insert(name, table);
                }
            }
        }
    }
}
