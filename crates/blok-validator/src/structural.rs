//! Rule 1: document shape.
//!
//! Works on the raw JSON so that shape problems can be reported precisely
//! instead of surfacing as a single deserialization error. Tables that pass
//! are handed to the typed rules as a [`Schema`].

use crate::issue::{IssuePath, ValidationIssue};
use blok_core::schema::{FieldSpec, Schema, TableSpec};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]{0,62}$").expect("identifier pattern compiles"));

/// True if `name` is a valid table or field identifier.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Check document shape and return the structurally sound part of the schema.
pub(crate) fn check(document: &Value, issues: &mut Vec<ValidationIssue>) -> Schema {
    let mut schema = Schema::new();

    let Some(tables) = document.as_object() else {
        issues.push(ValidationIssue::not_an_object(IssuePath::document(), "Schema"));
        return schema;
    };

    if tables.is_empty() {
        issues.push(ValidationIssue::empty_schema());
        return schema;
    }

    for (table_name, table_value) in tables {
        if !is_identifier(table_name) {
            issues.push(ValidationIssue::invalid_identifier(
                IssuePath::table(table_name),
                table_name,
            ));
        }

        let Some(fields) = table_value.as_object() else {
            issues.push(ValidationIssue::not_an_object(
                IssuePath::table(table_name),
                &format!("Table '{}'", table_name),
            ));
            continue;
        };

        if is_nested_wrapper(fields) {
            issues.push(ValidationIssue::nested_fields_wrapper(table_name));
            continue;
        }

        if fields.is_empty() {
            issues.push(ValidationIssue::empty_table(table_name));
            continue;
        }

        if let Some(table) = check_table(table_name, fields, issues) {
            schema.insert(table_name.clone(), table);
        }
    }

    schema
}

/// `{"tasks": {"fields": {"title": {...}}}}`: a `fields` key whose value is
/// itself a map of field objects.
fn is_nested_wrapper(fields: &Map<String, Value>) -> bool {
    match fields.get("fields") {
        Some(Value::Object(inner)) => {
            inner.is_empty() || (inner.values().all(Value::is_object) && !inner.contains_key("type"))
        }
        _ => false,
    }
}

fn check_table(
    table_name: &str,
    fields: &Map<String, Value>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<TableSpec> {
    let mut table = TableSpec::new();
    let mut sound = true;

    for (field_name, field_value) in fields {
        if !is_identifier(field_name) {
            issues.push(ValidationIssue::invalid_identifier(
                IssuePath::field(table_name, field_name),
                field_name,
            ));
        }

        if !field_value.is_object() {
            issues.push(ValidationIssue::not_an_object(
                IssuePath::field(table_name, field_name),
                &format!("Field '{}.{}'", table_name, field_name),
            ));
            sound = false;
            continue;
        }

        match FieldSpec::deserialize(field_value) {
            Ok(spec) => table.insert(field_name.clone(), spec),
            Err(e) => {
                issues.push(ValidationIssue::malformed_field(
                    table_name,
                    field_name,
                    &e.to_string(),
                ));
                sound = false;
            }
        }
    }

    if !sound {
        tracing::debug!(table = %table_name, "table excluded from semantic checks");
    }
    sound.then_some(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueKind;
    use serde_json::json;

    fn run(document: Value) -> (Vec<ValidationIssue>, Schema) {
        let mut issues = Vec::new();
        let schema = check(&document, &mut issues);
        (issues, schema)
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("tasks"));
        assert!(is_identifier("order_items2"));
        assert!(!is_identifier("Tasks"));
        assert!(!is_identifier("2tasks"));
        assert!(!is_identifier("task-list"));
        assert!(!is_identifier(""));
        assert!(!is_identifier(&"a".repeat(64)));
        assert!(is_identifier(&"a".repeat(63)));
    }

    #[test]
    fn rejects_non_object_document() {
        let (issues, schema) = run(json!(["tasks"]));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Structural);
        assert!(schema.is_empty());
    }

    #[test]
    fn rejects_empty_document() {
        let (issues, _) = run(json!({}));
        assert_eq!(issues, vec![ValidationIssue::empty_schema()]);
    }

    #[test]
    fn rejects_nested_fields_wrapper() {
        let (issues, schema) = run(json!({
            "tasks": { "fields": { "title": { "type": "string", "max_length": 10 } } }
        }));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Structural);
        assert!(issues[0].message.contains("nested"));
        assert!(!schema.has_table("tasks"));
    }

    #[test]
    fn a_field_named_fields_is_not_a_wrapper() {
        let (issues, schema) = run(json!({
            "forms": { "fields": { "type": "json" } }
        }));
        assert!(issues.is_empty());
        assert!(schema.has_table("forms"));
    }

    #[test]
    fn malformed_field_excludes_table() {
        let (issues, schema) = run(json!({
            "tasks": { "title": { "type": "string", "max_length": "long" } },
            "projects": { "name": { "type": "string", "max_length": 10 } }
        }));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, IssuePath::field("tasks", "title"));
        assert!(!schema.has_table("tasks"));
        assert!(schema.has_table("projects"));
    }

    #[test]
    fn non_object_field_is_structural() {
        let (issues, _) = run(json!({ "tasks": { "title": "string" } }));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Structural);
    }

    #[test]
    fn bad_identifiers_are_reported_but_table_kept() {
        let (issues, schema) = run(json!({
            "Tasks": { "Title": { "type": "string", "max_length": 10 } }
        }));
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.kind == IssueKind::InvalidIdentifier));
        assert!(schema.has_table("Tasks"));
    }
}
