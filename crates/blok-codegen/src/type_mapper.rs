//! Field type → target-language type.
//!
//! The mapping is total over the closed type set; anything else is an
//! [`UnsupportedType`]. Enum fields become a closed union of their literal
//! values, in declared order, whatever their base type.

use blok_core::schema::{FieldSpec, FieldType};
use std::fmt;

/// Target-language representation of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetType {
    /// Text with optional length bound (`string` carries one, `text` does not).
    Text { max_length: Option<u32> },
    /// 64-bit integer.
    Integer,
    /// Fixed-point numeric.
    Decimal {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    Boolean,
    /// Opaque identifier.
    Identifier,
    Date,
    DateTime,
    /// Untyped structured value.
    Json,
    /// Closed union of literal values.
    Union(Vec<String>),
}

impl TargetType {
    /// TypeScript spelling used in generated sources.
    pub fn typescript(&self) -> String {
        match self {
            TargetType::Text { .. }
            | TargetType::Identifier
            | TargetType::Date
            | TargetType::DateTime => "string".to_string(),
            TargetType::Integer | TargetType::Decimal { .. } => "number".to_string(),
            TargetType::Boolean => "boolean".to_string(),
            TargetType::Json => "Record<string, unknown>".to_string(),
            TargetType::Union(values) => values
                .iter()
                .map(|v| crate::templates::ts_string(v))
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TargetType::Integer | TargetType::Decimal { .. })
    }

    /// True for `text`: unbounded prose, rendered as a multi-line input.
    pub fn is_long_text(&self) -> bool {
        matches!(self, TargetType::Text { max_length: None })
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.typescript())
    }
}

/// The field's type is missing or outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported type '{type_name}'")]
pub struct UnsupportedType {
    pub type_name: String,
}

/// Map a field to its target type.
pub fn map(field: &FieldSpec) -> Result<TargetType, UnsupportedType> {
    let kind = field.kind().ok_or_else(|| UnsupportedType {
        type_name: "<missing>".to_string(),
    })?;

    let base = match kind {
        FieldType::String => TargetType::Text {
            max_length: field.max_length,
        },
        FieldType::Text => TargetType::Text { max_length: None },
        FieldType::Integer => TargetType::Integer,
        FieldType::Decimal => TargetType::Decimal {
            precision: field.precision,
            scale: field.scale,
        },
        FieldType::Boolean => TargetType::Boolean,
        FieldType::Uuid => TargetType::Identifier,
        FieldType::Date => TargetType::Date,
        FieldType::Datetime => TargetType::DateTime,
        FieldType::Json => TargetType::Json,
        FieldType::Unsupported(name) => {
            return Err(UnsupportedType {
                type_name: name.clone(),
            });
        }
    };

    Ok(match field.enum_values() {
        Some(values) => TargetType::Union(values.to_vec()),
        None => base,
    })
}
