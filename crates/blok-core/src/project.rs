//! Project identity for one provisioning run.

use crate::naming::slugify;
use crate::schema::{Schema, SchemaError, SchemaVersion};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A project is created once per pipeline run and is immutable afterwards,
/// except for schema revisions which are tracked through `schema_version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Display name, e.g. "Task Manager".
    pub name: String,
    /// URL-safe name derived from `name`.
    pub slug: String,
    #[serde(default)]
    pub description: String,
    /// Directory the project directory is created in.
    pub destination: PathBuf,
    pub schema: Schema,
    pub schema_version: SchemaVersion,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        destination: impl Into<PathBuf>,
        schema: Schema,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let schema_version = schema.version()?;
        Ok(Self {
            slug: slugify(&name),
            name,
            description: description.into(),
            destination: destination.into(),
            schema,
            schema_version,
            created_at: Utc::now(),
        })
    }

    /// Root of the generated application: `destination/slug`.
    pub fn root(&self) -> PathBuf {
        self.destination.join(&self.slug)
    }

    /// Replace the schema, recording the new version.
    pub fn revise_schema(&mut self, schema: Schema) -> Result<(), SchemaError> {
        self.schema_version = schema.version()?;
        self.schema = schema;
        Ok(())
    }

    /// True if `root` is this project's root directory.
    pub fn is_rooted_at(&self, root: &Path) -> bool {
        self.root() == root
    }
}
