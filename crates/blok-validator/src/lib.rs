//! Blok Schema Validator
//!
//! Static checks over a schema document, run before anything touches the
//! remote platform or the filesystem. Rules are applied in order and every
//! issue is collected, so a caller gets the complete report in one pass:
//!
//! 1. **Structure** - flat `table → field → spec` mapping, valid identifiers
//! 2. **Types** - every field declares a type from the closed set
//! 3. **Properties** - string needs `max_length`, decimal needs `precision`/`scale`
//! 4. **Implicit fields** - `id`, `created_at`, `updated_at` are never declared
//! 5. **Reserved tables** - no second user table next to `app_users`
//! 6. **Foreign keys** - every `table.field` target resolves
//! 7. **Generated names** - no two tables share a component or type name

pub mod issue;
mod rules;
mod structural;

pub use issue::{IssueKind, IssuePath, ValidationIssue};
pub use structural::is_identifier;

use blok_core::schema::Schema;
use serde_json::Value;

/// Validate a raw schema document. An empty list means the schema is acceptable.
pub fn validate(document: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let schema = structural::check(document, &mut issues);
    run_semantic_rules(&schema, &mut issues);

    tracing::debug!(
        tables = schema.len(),
        issues = issues.len(),
        "schema validated"
    );
    issues
}

/// Validate an already-parsed schema (identifier and semantic rules only).
pub fn validate_schema(schema: &Schema) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for (table, spec) in schema.tables() {
        if !is_identifier(table) {
            issues.push(ValidationIssue::invalid_identifier(
                IssuePath::table(table),
                table,
            ));
        }
        for (field, _) in spec.fields() {
            if !is_identifier(field) {
                issues.push(ValidationIssue::invalid_identifier(
                    IssuePath::field(table, field),
                    field,
                ));
            }
        }
    }
    run_semantic_rules(schema, &mut issues);
    issues
}

/// Validate a document and return the parsed schema if it is acceptable.
pub fn parse_valid(document: &Value) -> Result<Schema, Vec<ValidationIssue>> {
    let issues = validate(document);
    if !issues.is_empty() {
        return Err(issues);
    }
    Schema::from_value(document).map_err(|e| {
        vec![ValidationIssue::new(
            IssuePath::document(),
            IssueKind::Structural,
            e.to_string(),
        )]
    })
}

fn run_semantic_rules(schema: &Schema, issues: &mut Vec<ValidationIssue>) {
    rules::check_types(schema, issues);
    rules::check_properties(schema, issues);
    rules::check_implicit_fields(schema, issues);
    rules::check_reserved_tables(schema, issues);
    rules::check_foreign_keys(schema, issues);
    rules::check_generated_names(schema, issues);
}
