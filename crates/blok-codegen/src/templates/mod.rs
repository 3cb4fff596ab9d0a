//! Source templates for each artifact kind.
//!
//! Templates are plain `format!` strings over the schema; nothing here reads
//! the clock, the environment, or the filesystem, so output is a pure
//! function of the inputs.

pub mod api_service;
pub mod dashboard;
pub mod form;
pub mod navbar;
pub mod routes;
pub mod types;
pub mod view;

use crate::error::CodegenError;
use crate::type_mapper::{self, TargetType};
use blok_core::schema::{FieldSpec, TableSpec};

/// Field linking a row to its owner; set by the backend, never edited.
pub const OWNER_FIELD: &str = "user_id";

/// Maximum number of columns shown in a list view.
pub const MAX_LIST_COLUMNS: usize = 5;

/// Banner for files that are fully generated.
pub fn banner(title: &str) -> String {
    format!(
        "// ============================================================================\n\
         // {}\n\
         // Generated by blok. Do not edit manually.\n\
         // ============================================================================\n",
        title
    )
}

/// Banner for files that mix generated regions with hand-written code.
pub fn shared_banner(title: &str) -> String {
    format!(
        "// ============================================================================\n\
         // {}\n\
         // Generated regions are rewritten by blok; edit outside them.\n\
         // ============================================================================\n",
        title
    )
}

/// Quote a string as a TypeScript string literal.
pub fn ts_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Map a field, attaching its location to the error.
pub fn target(table: &str, field: &str, spec: &FieldSpec) -> Result<TargetType, CodegenError> {
    type_mapper::map(spec).map_err(|e| CodegenError::UnsupportedType {
        table: table.to_string(),
        field: field.to_string(),
        type_name: e.type_name,
    })
}

/// A field as seen by the templates.
pub struct FieldView<'a> {
    pub name: &'a str,
    pub spec: &'a FieldSpec,
    pub target: TargetType,
}

/// All fields of a table with their mapped types, in declared order.
pub fn fields<'a>(table: &str, spec: &'a TableSpec) -> Result<Vec<FieldView<'a>>, CodegenError> {
    spec.fields()
        .map(|(name, field)| {
            target(table, name, field).map(|target| FieldView {
                name,
                spec: field,
                target,
            })
        })
        .collect()
}

/// Fields shown as list columns: no owner link, no JSON, at most five.
pub fn list_columns<'a, 'b>(fields: &'b [FieldView<'a>]) -> Vec<&'b FieldView<'a>> {
    fields
        .iter()
        .filter(|f| f.name != OWNER_FIELD && f.target != TargetType::Json)
        .take(MAX_LIST_COLUMNS)
        .collect()
}

/// Fields a user can edit in a form.
pub fn editable<'a, 'b>(fields: &'b [FieldView<'a>]) -> Vec<&'b FieldView<'a>> {
    fields.iter().filter(|f| f.name != OWNER_FIELD).collect()
}

/// Initial form value for a field.
pub fn default_literal(field: &FieldView<'_>) -> String {
    if let Some(default) = &field.spec.default {
        return default.to_string();
    }
    match &field.target {
        TargetType::Boolean => "false".to_string(),
        TargetType::Integer | TargetType::Decimal { .. } => "0".to_string(),
        TargetType::Json => "{}".to_string(),
        _ => "\"\"".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blok_core::schema::FieldType;
    use serde_json::json;

    #[test]
    fn ts_string_escapes() {
        assert_eq!(ts_string("plain"), "\"plain\"");
        assert_eq!(ts_string("say \"hi\""), r#""say \"hi\"""#);
    }

    #[test]
    fn list_columns_skip_owner_and_json_and_cap_at_five() {
        let table = TableSpec::new()
            .with_field("user_id", FieldSpec::of(FieldType::Uuid))
            .with_field("meta", FieldSpec::of(FieldType::Json))
            .with_field("a", FieldSpec::of(FieldType::Text))
            .with_field("b", FieldSpec::of(FieldType::Text))
            .with_field("c", FieldSpec::of(FieldType::Text))
            .with_field("d", FieldSpec::of(FieldType::Text))
            .with_field("e", FieldSpec::of(FieldType::Text))
            .with_field("f", FieldSpec::of(FieldType::Text));
        let fields = fields("t", &table).unwrap();
        let names: Vec<_> = list_columns(&fields).iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn default_literals() {
        let mut with_default = FieldSpec::string(10);
        with_default.default = Some(json!("todo"));
        let table = TableSpec::new()
            .with_field("done", FieldSpec::of(FieldType::Boolean))
            .with_field("count", FieldSpec::of(FieldType::Integer))
            .with_field("title", FieldSpec::string(10))
            .with_field("status", with_default)
            .with_field("meta", FieldSpec::of(FieldType::Json));
        let fields = fields("t", &table).unwrap();
        let literals: Vec<_> = fields.iter().map(default_literal).collect();
        assert_eq!(literals, vec!["false", "0", "\"\"", "\"todo\"", "{}"]);
    }
}
