//! Transactional artifact writer.
//!
//! Content is staged in a temporary file next to the target and renamed into
//! place, so readers see either the old file or the new one. When the target
//! already carries the same generated regions as the new content, only the
//! region bodies are replaced. Identical bytes are never rewritten.

use crate::artifact::Artifact;
use crate::error::CodegenError;
use crate::region;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// What a write did to the target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Created,
    Replaced,
    /// Only generated regions changed; surrounding text was kept.
    RegionsUpdated,
    /// Resulting bytes equal the existing bytes; the file was not touched.
    Unchanged,
}

impl WriteOutcome {
    pub fn modified(&self) -> bool {
        !matches!(self, WriteOutcome::Unchanged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    /// Relative to the writer root.
    pub path: PathBuf,
    pub outcome: WriteOutcome,
}

/// Writes artifacts below a project root.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a generated artifact to its path.
    pub fn write_artifact(&self, artifact: &Artifact) -> Result<WriteResult, CodegenError> {
        self.write(&artifact.path, &artifact.content)
    }

    /// Write `content` to `relative` (under the root).
    pub fn write(&self, relative: &Path, content: &str) -> Result<WriteResult, CodegenError> {
        let target = self.root.join(relative);

        let existing = match fs::read_to_string(&target) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(CodegenError::fs(&target, e)),
        };

        let (final_content, outcome) = match &existing {
            None => (content.to_string(), WriteOutcome::Created),
            Some(old) => match region::splice(old, content).map_err(|detail| {
                CodegenError::MalformedRegion {
                    path: target.clone(),
                    detail,
                }
            })? {
                Some(spliced) => (spliced, WriteOutcome::RegionsUpdated),
                None => (content.to_string(), WriteOutcome::Replaced),
            },
        };

        if existing.as_deref() == Some(final_content.as_str()) {
            tracing::debug!(path = %relative.display(), "artifact unchanged");
            return Ok(WriteResult {
                path: relative.to_path_buf(),
                outcome: WriteOutcome::Unchanged,
            });
        }

        write_atomic(&target, final_content.as_bytes())?;
        tracing::debug!(path = %relative.display(), ?outcome, "artifact written");

        Ok(WriteResult {
            path: relative.to_path_buf(),
            outcome,
        })
    }

    /// Remove a file if it exists. Returns whether anything was removed.
    pub fn remove(&self, relative: &Path) -> Result<bool, CodegenError> {
        let target = self.root.join(relative);
        match fs::remove_file(&target) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CodegenError::fs(target, e)),
        }
    }
}

/// Stage `bytes` in a temp file beside `target`, then rename over it.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), CodegenError> {
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| CodegenError::fs(parent, e))?;

    let mut staged =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| CodegenError::fs(parent, e))?;
    staged
        .write_all(bytes)
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|e| CodegenError::fs(staged.path(), e))?;
    staged
        .persist(target)
        .map_err(|e| CodegenError::fs(target, e.error))?;
    Ok(())
}
