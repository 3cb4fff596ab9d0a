//! Validation issue types.
//!
//! Every issue carries the offending table/field path, a kind grouped by the
//! rule that produced it, and a human-readable message.

use serde::Serialize;
use std::fmt;

/// Location of an issue inside the schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuePath {
    /// `None` for document-level issues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IssuePath {
    pub fn document() -> Self {
        Self {
            table: None,
            field: None,
        }
    }

    pub fn table(table: &str) -> Self {
        Self {
            table: Some(table.to_string()),
            field: None,
        }
    }

    pub fn field(table: &str, field: &str) -> Self {
        Self {
            table: Some(table.to_string()),
            field: Some(field.to_string()),
        }
    }
}

impl fmt::Display for IssuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.table, &self.field) {
            (None, _) => write!(f, "<schema>"),
            (Some(table), None) => write!(f, "{}", table),
            (Some(table), Some(field)) => write!(f, "{}.{}", table, field),
        }
    }
}

/// One problem found in a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: IssuePath,
    pub kind: IssueKind,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: IssuePath, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }

    // =========================================================================
    // STRUCTURAL
    // =========================================================================

    pub fn not_an_object(path: IssuePath, what: &str) -> Self {
        Self::new(
            path,
            IssueKind::Structural,
            format!("{} must be a JSON object", what),
        )
    }

    pub fn empty_schema() -> Self {
        Self::new(
            IssuePath::document(),
            IssueKind::Structural,
            "Schema must declare at least one table",
        )
    }

    pub fn empty_table(table: &str) -> Self {
        Self::new(
            IssuePath::table(table),
            IssueKind::Structural,
            format!("Table '{}' must declare at least one field", table),
        )
    }

    pub fn nested_fields_wrapper(table: &str) -> Self {
        Self::new(
            IssuePath::table(table),
            IssueKind::Structural,
            format!(
                "Table '{}' wraps its fields in a nested \"fields\" object; declare fields directly under the table",
                table
            ),
        )
    }

    pub fn malformed_field(table: &str, field: &str, detail: &str) -> Self {
        Self::new(
            IssuePath::field(table, field),
            IssueKind::Structural,
            format!("Field '{}.{}' is malformed: {}", table, field, detail),
        )
    }

    pub fn invalid_identifier(path: IssuePath, name: &str) -> Self {
        Self::new(
            path,
            IssueKind::InvalidIdentifier,
            format!(
                "'{}' is not a valid identifier (lowercase letters, digits and underscores, starting with a letter, at most 63 characters)",
                name
            ),
        )
    }

    // =========================================================================
    // TYPES AND PROPERTIES
    // =========================================================================

    pub fn missing_type(table: &str, field: &str) -> Self {
        Self::new(
            IssuePath::field(table, field),
            IssueKind::MissingType,
            format!("Field '{}.{}' does not declare a type", table, field),
        )
    }

    pub fn unknown_type(table: &str, field: &str, type_name: &str, supported: &[&str]) -> Self {
        Self::new(
            IssuePath::field(table, field),
            IssueKind::UnknownType,
            format!(
                "Field '{}.{}' has unknown type '{}' (supported: {})",
                table,
                field,
                type_name,
                supported.join(", ")
            ),
        )
    }

    pub fn missing_property(table: &str, field: &str, type_name: &str, property: &str) -> Self {
        Self::new(
            IssuePath::field(table, field),
            IssueKind::MissingProperty,
            format!(
                "Field '{}.{}' of type {} requires '{}'",
                table, field, type_name, property
            ),
        )
    }

    pub fn invalid_property(table: &str, field: &str, detail: impl fmt::Display) -> Self {
        Self::new(
            IssuePath::field(table, field),
            IssueKind::InvalidProperty,
            format!("Field '{}.{}': {}", table, field, detail),
        )
    }

    // =========================================================================
    // RESERVED NAMES
    // =========================================================================

    pub fn reserved_field(table: &str, field: &str) -> Self {
        Self::new(
            IssuePath::field(table, field),
            IssueKind::ReservedFieldName,
            format!(
                "Field '{}.{}' is created automatically and must not be declared",
                table, field
            ),
        )
    }

    pub fn reserved_table(table: &str, builtin: &str) -> Self {
        Self::new(
            IssuePath::table(table),
            IssueKind::ReservedTableName,
            format!(
                "Table '{}' duplicates the built-in user entity; link to it with a 'user_id' field (\"foreign_key\": \"{}.id\") and keep credentials out of this table",
                table, builtin
            ),
        )
    }

    // =========================================================================
    // FOREIGN KEYS
    // =========================================================================

    pub fn malformed_foreign_key(table: &str, field: &str, target: &str) -> Self {
        Self::new(
            IssuePath::field(table, field),
            IssueKind::InvalidForeignKey,
            format!(
                "Field '{}.{}' has foreign_key '{}', expected \"table.field\"",
                table, field, target
            ),
        )
    }

    pub fn unresolved_foreign_key(table: &str, field: &str, target: &str) -> Self {
        Self::new(
            IssuePath::field(table, field),
            IssueKind::UnresolvedForeignKey,
            format!(
                "Field '{}.{}' references '{}', which is not declared in this schema",
                table, field, target
            ),
        )
    }

    // =========================================================================
    // GENERATED NAMES
    // =========================================================================

    pub fn name_collision(table: &str, other: &str, name: &str) -> Self {
        Self::new(
            IssuePath::table(table),
            IssueKind::NameCollision,
            format!(
                "Table '{}' generates '{}', which table '{}' already generates; rename one of them",
                table, name, other
            ),
        )
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Categories of schema issues, in rule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    // Rule 1
    /// Document shape is wrong (not a flat two-level mapping, malformed field).
    Structural,
    /// Table or field name does not match the identifier pattern.
    InvalidIdentifier,

    // Rule 2
    /// Field has no `type`.
    MissingType,
    /// Field type is outside the closed set.
    UnknownType,

    // Rule 3
    /// A type-mandatory property is absent.
    MissingProperty,
    /// A property has an unusable value.
    InvalidProperty,

    // Rule 4
    /// Field uses an implicit field name.
    ReservedFieldName,

    // Rule 5
    /// Table uses a reserved authentication-table name.
    ReservedTableName,

    // Rule 6
    /// Foreign key is not `table.field`.
    InvalidForeignKey,
    /// Foreign key target does not exist.
    UnresolvedForeignKey,

    // Rule 7
    /// Two tables map to the same generated component or type name.
    NameCollision,
}
