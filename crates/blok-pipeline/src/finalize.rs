//! Project finalization: template cleanup, manifest, environment file.

use crate::error::PipelineError;
use blok_codegen::ArtifactWriter;
use blok_codegen::artifact::VIEWS_DIR;
use blok_core::Project;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST: &str = "package.json";
pub const ENV_FILE: &str = ".env";
pub const ENV_EXAMPLE: &str = ".env.example";
pub const MANIFEST_VERSION: &str = "1.0.0";

/// Remove template views that have no place in a generated app. Paths in
/// `keep` (relative to the root) were generated by this run and survive even
/// when their name is on the list.
/// Returns the paths removed, relative to the root.
pub fn cleanup_template(
    root: &Path,
    files: &[String],
    keep: &[PathBuf],
) -> Result<Vec<PathBuf>, PipelineError> {
    let writer = ArtifactWriter::new(root);
    let mut removed = Vec::new();
    for name in files {
        let relative = Path::new(VIEWS_DIR).join(name);
        if keep.contains(&relative) {
            tracing::debug!(path = %relative.display(), "Keeping generated view");
            continue;
        }
        if writer.remove(&relative)? {
            removed.push(relative);
        }
    }
    tracing::debug!(removed = removed.len(), "Template views cleaned up");
    Ok(removed)
}

/// Stamp the project's name, description and version into `package.json`,
/// keeping every other key in place.
pub fn update_manifest(root: &Path, project: &Project) -> Result<PathBuf, PipelineError> {
    let path = root.join(MANIFEST);
    let mut manifest = match fs::read_to_string(&path) {
        Ok(content) => serde_json::from_str::<Map<String, Value>>(&content).map_err(|e| {
            PipelineError::fs(&path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
        Err(e) => return Err(PipelineError::fs(&path, e)),
    };

    manifest.insert("name".to_string(), Value::String(project.slug.clone()));
    manifest.insert(
        "description".to_string(),
        Value::String(project.description.clone()),
    );
    manifest.insert(
        "version".to_string(),
        Value::String(MANIFEST_VERSION.to_string()),
    );

    let mut content = serde_json::to_string_pretty(&Value::Object(manifest))
        .map_err(|e| PipelineError::Internal(e.to_string()))?;
    content.push('\n');
    ArtifactWriter::new(root).write(Path::new(MANIFEST), &content)?;
    Ok(PathBuf::from(MANIFEST))
}

/// Set `key=value` in `.env`, seeding it from `.env.example` when missing.
pub fn configure_env(root: &Path, key: &str, value: &str) -> Result<PathBuf, PipelineError> {
    let existing = match fs::read_to_string(root.join(ENV_FILE)) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            match fs::read_to_string(root.join(ENV_EXAMPLE)) {
                Ok(example) => example,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
                Err(e) => return Err(PipelineError::fs(root.join(ENV_EXAMPLE), e)),
            }
        }
        Err(e) => return Err(PipelineError::fs(root.join(ENV_FILE), e)),
    };

    let content = set_env_var(&existing, key, value);
    ArtifactWriter::new(root).write(Path::new(ENV_FILE), &content)?;
    Ok(PathBuf::from(ENV_FILE))
}

fn set_env_var(content: &str, key: &str, value: &str) -> String {
    let prefix = format!("{}=", key);
    let assignment = format!("{}{}", prefix, value);
    let mut replaced = false;
    let mut lines: Vec<String> = content
        .lines()
        .map(|line| {
            if line.starts_with(&prefix) {
                replaced = true;
                assignment.clone()
            } else {
                line.to_string()
            }
        })
        .collect();
    if !replaced {
        lines.push(assignment);
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
