//! Artifact generation.
//!
//! [`CodeGenerator`] turns a schema into [`Artifact`] values. It never touches
//! the filesystem; the caller hands artifacts to an
//! [`ArtifactWriter`](crate::writer::ArtifactWriter).

use crate::artifact::{Artifact, ArtifactKind};
use crate::error::CodegenError;
use crate::templates;
use blok_core::config::CodegenConfig;
use blok_core::schema::{Schema, TableSpec};

/// Settings that shape generated sources but not their structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Shown in the navbar and dashboard heading.
    pub app_name: String,
    pub auth_package: String,
    pub crud_package: String,
    /// Fallback API base URL when the environment variable is unset.
    pub api_url: String,
    pub api_url_env: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self::from_config(&CodegenConfig::default(), "Blok App")
    }
}

impl GeneratorOptions {
    pub fn from_config(config: &CodegenConfig, app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            auth_package: config.auth_package.clone(),
            crud_package: config.crud_package.clone(),
            api_url: config.default_api_url.clone(),
            api_url_env: config.api_url_env.clone(),
        }
    }

    /// Point the generated client at a deployed API.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

/// Produces one artifact per kind from a schema.
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    options: GeneratorOptions,
}

impl CodeGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn types(&self, schema: &Schema) -> Result<Artifact, CodegenError> {
        let content = templates::types::render(schema)?;
        Ok(Artifact::new(ArtifactKind::Types, content, schema.version()?))
    }

    pub fn api_service(&self, schema: &Schema) -> Result<Artifact, CodegenError> {
        let content = templates::api_service::render(schema, &self.options);
        Ok(Artifact::new(ArtifactKind::ApiService, content, schema.version()?))
    }

    pub fn entity_view(&self, schema: &Schema, table: &str) -> Result<Artifact, CodegenError> {
        let spec = table_spec(schema, table)?;
        let content = templates::view::render(table, spec)?;
        Ok(Artifact::new(
            ArtifactKind::EntityView(table.to_string()),
            content,
            schema.version()?,
        ))
    }

    pub fn entity_form(&self, schema: &Schema, table: &str) -> Result<Artifact, CodegenError> {
        let spec = table_spec(schema, table)?;
        let content = templates::form::render(table, spec)?;
        Ok(Artifact::new(
            ArtifactKind::EntityForm(table.to_string()),
            content,
            schema.version()?,
        ))
    }

    pub fn dashboard(&self, schema: &Schema) -> Result<Artifact, CodegenError> {
        let content = templates::dashboard::render(schema, &self.options.app_name);
        Ok(Artifact::new(ArtifactKind::Dashboard, content, schema.version()?))
    }

    pub fn routes(&self, schema: &Schema) -> Result<Artifact, CodegenError> {
        let content = templates::routes::render(schema);
        Ok(Artifact::new(ArtifactKind::Routes, content, schema.version()?))
    }

    pub fn navigation(&self, schema: &Schema) -> Result<Artifact, CodegenError> {
        let content = templates::navbar::render(schema, &self.options.app_name);
        Ok(Artifact::new(ArtifactKind::Navigation, content, schema.version()?))
    }

    /// Generate a single artifact by kind.
    pub fn generate(&self, schema: &Schema, kind: &ArtifactKind) -> Result<Artifact, CodegenError> {
        match kind {
            ArtifactKind::Types => self.types(schema),
            ArtifactKind::ApiService => self.api_service(schema),
            ArtifactKind::EntityView(table) => self.entity_view(schema, table),
            ArtifactKind::EntityForm(table) => self.entity_form(schema, table),
            ArtifactKind::Dashboard => self.dashboard(schema),
            ArtifactKind::Routes => self.routes(schema),
            ArtifactKind::Navigation => self.navigation(schema),
        }
    }

    /// Every artifact kind for `schema`, shared files first, then per-entity
    /// view and form in declared table order.
    pub fn kinds(schema: &Schema) -> Vec<ArtifactKind> {
        let mut kinds = vec![ArtifactKind::Types, ArtifactKind::ApiService];
        for table in schema.table_names() {
            kinds.push(ArtifactKind::EntityView(table.to_string()));
            kinds.push(ArtifactKind::EntityForm(table.to_string()));
        }
        kinds.extend([
            ArtifactKind::Dashboard,
            ArtifactKind::Routes,
            ArtifactKind::Navigation,
        ]);
        kinds
    }

    pub fn generate_all(&self, schema: &Schema) -> Result<Vec<Artifact>, CodegenError> {
        Self::kinds(schema)
            .iter()
            .map(|kind| self.generate(schema, kind))
            .collect()
    }
}

fn table_spec<'a>(schema: &'a Schema, table: &str) -> Result<&'a TableSpec, CodegenError> {
    schema
        .table(table)
        .ok_or_else(|| CodegenError::UnknownTable(table.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tasks_schema() -> Schema {
        Schema::from_value(&json!({
            "tasks": {
                "title": { "type": "string", "max_length": 200, "required": true },
                "status": { "type": "string", "max_length": 20, "enum": ["todo", "done"] },
                "user_id": { "type": "uuid", "foreign_key": "app_users.id" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn generation_is_deterministic() {
        let generator = CodeGenerator::default();
        let first = generator.generate_all(&tasks_schema()).unwrap();
        let second = generator.generate_all(&tasks_schema()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn kinds_cover_shared_and_per_entity_artifacts() {
        let kinds: Vec<String> = CodeGenerator::kinds(&tasks_schema())
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            kinds,
            vec![
                "types",
                "api-service",
                "view:tasks",
                "form:tasks",
                "dashboard",
                "routes",
                "navigation"
            ]
        );
    }

    #[test]
    fn entity_artifacts_are_independent_of_other_tables() {
        let generator = CodeGenerator::default();
        let before = tasks_schema();
        let mut after = before.clone();
        after.insert(
            "projects",
            TableSpec::new().with_field(
                "name",
                blok_core::schema::FieldSpec::string(100).required(),
            ),
        );

        let view_before = generator.entity_view(&before, "tasks").unwrap();
        let view_after = generator.entity_view(&after, "tasks").unwrap();
        assert_eq!(view_before.content, view_after.content);
        assert_ne!(view_before.schema_version, view_after.schema_version);

        let form_before = generator.entity_form(&before, "tasks").unwrap();
        let form_after = generator.entity_form(&after, "tasks").unwrap();
        assert_eq!(form_before.content, form_after.content);
    }

    #[test]
    fn unknown_table_is_an_error() {
        let err = CodeGenerator::default()
            .entity_view(&tasks_schema(), "projects")
            .unwrap_err();
        assert!(matches!(err, CodegenError::UnknownTable(t) if t == "projects"));
    }

    #[test]
    fn options_flow_into_sources() {
        let options = GeneratorOptions::default().with_api_url("https://api.example.test");
        let generator = CodeGenerator::new(GeneratorOptions {
            app_name: "Task Tracker".to_string(),
            ..options
        });
        let api = generator.api_service(&tasks_schema()).unwrap();
        assert!(api.content.contains("|| \"https://api.example.test\";"));
        let nav = generator.navigation(&tasks_schema()).unwrap();
        assert!(nav.content.contains("export const APP_NAME = \"Task Tracker\";"));
    }
}
