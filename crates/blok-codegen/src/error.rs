//! Error types for code generation and artifact writes.

use std::path::PathBuf;

/// Errors raised while generating or writing artifacts.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// A field type reached the generator that the type mapper does not know.
    /// The validator should have rejected it, so this is an internal fault.
    #[error("unsupported type '{type_name}' for field {table}.{field}")]
    UnsupportedType {
        table: String,
        field: String,
        type_name: String,
    },

    #[error("table '{0}' is not declared in the schema")]
    UnknownTable(String),

    #[error("filesystem error at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The existing file has generated-region markers that cannot be matched up.
    #[error("generated region markers in {} are malformed: {detail}", path.display())]
    MalformedRegion { path: PathBuf, detail: String },

    #[error(transparent)]
    Schema(#[from] blok_core::SchemaError),
}

impl CodegenError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CodegenError::FileSystem {
            path: path.into(),
            source,
        }
    }
}
