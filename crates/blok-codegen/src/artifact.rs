//! Generated artifacts and where they live in the client project.

use blok_core::naming::{entity_name, pascal_case};
use blok_core::schema::SchemaVersion;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kinds of generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "table", rename_all = "snake_case")]
pub enum ArtifactKind {
    Types,
    ApiService,
    EntityView(String),
    EntityForm(String),
    Dashboard,
    Routes,
    Navigation,
}

impl ArtifactKind {
    /// Path relative to the project root.
    pub fn relative_path(&self) -> PathBuf {
        match self {
            ArtifactKind::Types => PathBuf::from("src/types/generated.ts"),
            ArtifactKind::ApiService => PathBuf::from("src/services/appApi.ts"),
            ArtifactKind::EntityView(table) => {
                PathBuf::from(VIEWS_DIR).join(format!("{}View.tsx", pascal_case(table)))
            }
            ArtifactKind::EntityForm(table) => {
                PathBuf::from(VIEWS_DIR).join(format!("{}FormView.tsx", entity_name(table)))
            }
            ArtifactKind::Dashboard => PathBuf::from(VIEWS_DIR).join("DashboardView.tsx"),
            ArtifactKind::Routes => PathBuf::from("src/App.tsx"),
            ArtifactKind::Navigation => PathBuf::from("src/config/Navbar.tsx"),
        }
    }

    /// Table this artifact is derived from, for per-entity kinds.
    pub fn table(&self) -> Option<&str> {
        match self {
            ArtifactKind::EntityView(table) | ArtifactKind::EntityForm(table) => Some(table),
            _ => None,
        }
    }

    /// True if the file may carry hand-authored content around generated regions.
    pub fn is_shared(&self) -> bool {
        matches!(self, ArtifactKind::Routes | ArtifactKind::Navigation)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Types => write!(f, "types"),
            ArtifactKind::ApiService => write!(f, "api-service"),
            ArtifactKind::EntityView(table) => write!(f, "view:{}", table),
            ArtifactKind::EntityForm(table) => write!(f, "form:{}", table),
            ArtifactKind::Dashboard => write!(f, "dashboard"),
            ArtifactKind::Routes => write!(f, "routes"),
            ArtifactKind::Navigation => write!(f, "navigation"),
        }
    }
}

/// Directory holding generated views.
pub const VIEWS_DIR: &str = "src/components/views";

/// One generated file (or set of generated regions inside a file).
///
/// `content` never embeds the schema version, so unrelated schema changes do
/// not touch per-entity files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Relative to the project root.
    pub path: PathBuf,
    pub content: String,
    /// Schema the content was derived from.
    pub schema_version: SchemaVersion,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, content: String, schema_version: SchemaVersion) -> Self {
        Self {
            path: kind.relative_path(),
            kind,
            content,
            schema_version,
        }
    }
}
