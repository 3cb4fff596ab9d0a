//! Declarative table/field schema.
//!
//! A schema is a flat two-level mapping: table name → field name → [`FieldSpec`].
//! Declaration order is preserved end to end because it drives the order of
//! everything generated from the schema.
//!
//! ```json
//! {
//!   "tasks": {
//!     "title":  { "type": "string", "max_length": 200, "required": true },
//!     "status": { "type": "string", "max_length": 20, "enum": ["todo", "done"] },
//!     "user_id": { "type": "uuid", "foreign_key": "app_users.id" }
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Built-in user entity provided by the platform.
pub const BUILTIN_USER_TABLE: &str = "app_users";

/// Primary key of the built-in user entity.
pub const BUILTIN_USER_KEY: &str = "id";

/// Fields every table gets implicitly. They must never be declared.
pub const IMPLICIT_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Table names conventionally meaning "the people who log in".
pub const RESERVED_TABLE_NAMES: [&str; 10] = [
    "users",
    "user",
    "customers",
    "customer",
    "employees",
    "employee",
    "members",
    "member",
    "accounts",
    "app_users",
];

/// Field names that carry credentials and belong to the built-in user entity.
pub const CREDENTIAL_FIELDS: [&str; 4] = ["email", "password", "password_hash", "username"];

/// Returns true if the name is one of the implicit fields.
pub fn is_implicit_field(name: &str) -> bool {
    IMPLICIT_FIELDS.contains(&name)
}

/// Returns true if the name is a reserved authentication-table name.
pub fn is_reserved_table(name: &str) -> bool {
    RESERVED_TABLE_NAMES.contains(&name)
}

// =============================================================================
// FIELD TYPES
// =============================================================================

/// Closed set of field kinds understood by the platform.
///
/// Unknown names are kept as [`FieldType::Unsupported`] so that a schema can be
/// loaded and reported on rather than rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Text,
    Integer,
    Decimal,
    Boolean,
    Uuid,
    Date,
    Datetime,
    Json,
    Unsupported(String),
}

impl FieldType {
    /// Every supported type name, in documentation order.
    pub const SUPPORTED: [&'static str; 9] = [
        "string", "text", "integer", "decimal", "boolean", "uuid", "date", "datetime", "json",
    ];

    /// Parse a type name. `identifier` is accepted as an alias of `uuid`.
    pub fn parse(name: &str) -> Self {
        match name {
            "string" => FieldType::String,
            "text" => FieldType::Text,
            "integer" => FieldType::Integer,
            "decimal" => FieldType::Decimal,
            "boolean" => FieldType::Boolean,
            "uuid" | "identifier" => FieldType::Uuid,
            "date" => FieldType::Date,
            "datetime" => FieldType::Datetime,
            "json" => FieldType::Json,
            other => FieldType::Unsupported(other.to_string()),
        }
    }

    /// Canonical type name.
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Uuid => "uuid",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Json => "json",
            FieldType::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, FieldType::Unsupported(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Decimal)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::Datetime)
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        FieldType::parse(&value)
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// FIELDS, TABLES, SCHEMA
// =============================================================================

/// One field's type and constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Declared type. `None` when the document omits `type`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// `"table.field"` reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,

    /// Allowed values, in declared order.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl FieldSpec {
    /// Create a field of the given type with no constraints.
    pub fn of(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Self::default()
        }
    }

    /// Bounded string field.
    pub fn string(max_length: u32) -> Self {
        Self {
            max_length: Some(max_length),
            ..Self::of(FieldType::String)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_foreign_key(mut self, target: impl Into<String>) -> Self {
        self.foreign_key = Some(target.into());
        self
    }

    /// Declared type, or `None` if the document left it out.
    pub fn kind(&self) -> Option<&FieldType> {
        self.field_type.as_ref()
    }

    /// Non-empty enum values, if any.
    pub fn enum_values(&self) -> Option<&[String]> {
        self.enum_values.as_deref().filter(|values| !values.is_empty())
    }

    /// Parsed foreign key target, if present and well formed.
    pub fn foreign_key_ref(&self) -> Option<ForeignKeyRef> {
        self.foreign_key.as_deref().and_then(ForeignKeyRef::parse)
    }

    /// True if this field links to the built-in user entity.
    pub fn links_to_builtin_user(&self) -> bool {
        self.foreign_key_ref()
            .is_some_and(|fk| fk.table == BUILTIN_USER_TABLE)
    }
}

/// Parsed `"table.field"` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub table: String,
    pub field: String,
}

impl ForeignKeyRef {
    /// Parse a `table.field` reference. Both halves must be non-empty.
    pub fn parse(reference: &str) -> Option<Self> {
        let (table, field) = reference.split_once('.')?;
        if table.is_empty() || field.is_empty() || field.contains('.') {
            return None;
        }
        Some(Self {
            table: table.to_string(),
            field: field.to_string(),
        })
    }
}

impl fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.field)
    }
}

/// Ordered set of fields for one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableSpec {
    fields: IndexMap<String, FieldSpec>,
}

impl TableSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) {
        self.fields.insert(name.into(), spec);
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Fields in declared order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Complete schema: table name → [`TableSpec`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: IndexMap<String, TableSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a schema from a JSON document.
    pub fn from_value(document: &Value) -> Result<Self, SchemaError> {
        Self::deserialize(document).map_err(SchemaError::from)
    }

    /// Parse a schema from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(text).map_err(SchemaError::from)
    }

    /// Builder-style table insertion.
    pub fn with_table(mut self, name: impl Into<String>, table: TableSpec) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, table: TableSpec) {
        self.tables.insert(name.into(), table);
    }

    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.get(name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Tables in declared order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableSpec)> {
        self.tables.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// True if `table.field` names a declared field, the implicit key of a
    /// declared table, or the built-in user key.
    pub fn resolves(&self, target: &ForeignKeyRef) -> bool {
        if target.table == BUILTIN_USER_TABLE {
            return target.field == BUILTIN_USER_KEY;
        }
        match self.table(&target.table) {
            Some(table) => table.has_field(&target.field) || is_implicit_field(&target.field),
            None => false,
        }
    }

    /// Canonical JSON encoding (declared order, defaults omitted).
    pub fn canonical_json(&self) -> Result<String, SchemaError> {
        serde_json::to_string(self).map_err(SchemaError::from)
    }

    /// Content hash of the canonical encoding.
    pub fn version(&self) -> Result<SchemaVersion, SchemaError> {
        let canonical = self.canonical_json()?;
        Ok(SchemaVersion::of_bytes(canonical.as_bytes()))
    }
}

/// Identifies the exact schema content an artifact was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaVersion(String);

impl SchemaVersion {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, enough for logs and reports.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error type for schema parsing.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
