//! Starting file tree for a new project.
//!
//! Both sources fill a staging directory next to the target and rename it
//! into place, so a failed provision leaves nothing at the target.

use crate::error::TemplateError;
use async_trait::async_trait;
use blok_core::config::TemplateConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use walkdir::WalkDir;

#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Create `target` populated with the template. Fails if `target` exists.
    async fn provision(&self, target: &Path) -> Result<(), TemplateError>;

    /// Human-readable origin, for logs and reports.
    fn describe(&self) -> String;
}

/// Pick the source configured in `config`.
pub fn from_config(config: &TemplateConfig) -> Arc<dyn TemplateSource> {
    match &config.local_path {
        Some(path) => Arc::new(LocalTemplateSource::new(path)),
        None => Arc::new(GitTemplateSource::new(
            &config.repository,
            &config.branch,
            config.clone_timeout(),
        )),
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> TemplateError + '_ {
    move |source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A staging directory beside `target`. Dropping it removes whatever is left.
fn stage(target: &Path) -> Result<(tempfile::TempDir, PathBuf), TemplateError> {
    if target.exists() {
        return Err(TemplateError::DestinationExists(target.to_path_buf()));
    }
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(io_err(parent))?;

    let staging = tempfile::Builder::new()
        .prefix(".blok-stage-")
        .tempdir_in(parent)
        .map_err(io_err(parent))?;
    let tree = staging.path().join("tree");
    Ok((staging, tree))
}

fn commit(tree: &Path, target: &Path) -> Result<(), TemplateError> {
    if target.exists() {
        return Err(TemplateError::DestinationExists(target.to_path_buf()));
    }
    fs::rename(tree, target).map_err(io_err(target))
}

/// Shallow clone of a git repository, detached from its history.
#[derive(Debug, Clone)]
pub struct GitTemplateSource {
    repository: String,
    branch: String,
    timeout: Duration,
}

impl GitTemplateSource {
    pub fn new(repository: impl Into<String>, branch: impl Into<String>, timeout: Duration) -> Self {
        Self {
            repository: repository.into(),
            branch: branch.into(),
            timeout,
        }
    }

    async fn git(&self, operation: &str, args: &[&str], cwd: Option<&Path>) -> Result<(), TemplateError> {
        let mut cmd = Command::new("git");
        cmd.args(args).kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| TemplateError::TimedOut(self.timeout))?
            .map_err(|e| TemplateError::Git {
                operation: operation.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(TemplateError::Git {
                operation: operation.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TemplateSource for GitTemplateSource {
    async fn provision(&self, target: &Path) -> Result<(), TemplateError> {
        let (_staging, tree) = stage(target)?;
        let tree_arg = tree.to_string_lossy().into_owned();

        tracing::info!(repository = %self.repository, branch = %self.branch, "Cloning template");
        self.git(
            "clone",
            &[
                "clone",
                "--depth",
                "1",
                "--branch",
                self.branch.as_str(),
                self.repository.as_str(),
                tree_arg.as_str(),
            ],
            None,
        )
        .await?;

        let git_dir = tree.join(".git");
        if git_dir.exists() {
            fs::remove_dir_all(&git_dir).map_err(io_err(&git_dir))?;
        }
        if let Err(e) = self.git("init", &["init", "--quiet"], Some(&tree)).await {
            tracing::warn!(error = %e, "git init failed; continuing without a repository");
        }

        commit(&tree, target)
    }

    fn describe(&self) -> String {
        format!("{}#{}", self.repository, self.branch)
    }
}

/// Copy of a local directory. `.git` and `node_modules` are skipped.
#[derive(Debug, Clone)]
pub struct LocalTemplateSource {
    source: PathBuf,
}

impl LocalTemplateSource {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

const SKIPPED: [&str; 2] = [".git", "node_modules"];

fn copy_tree(source: &Path, tree: &Path) -> Result<usize, TemplateError> {
    let mut copied = 0;
    let walker = WalkDir::new(source).into_iter().filter_entry(|e| {
        e.depth() == 0 || !SKIPPED.iter().any(|s| e.file_name() == *s)
    });
    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| TemplateError::Io {
                path: entry.path().to_path_buf(),
                source: std::io::Error::other(e),
            })?;
        let dest = tree.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(io_err(&dest))?;
        } else {
            fs::copy(entry.path(), &dest).map_err(io_err(&dest))?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[async_trait]
impl TemplateSource for LocalTemplateSource {
    async fn provision(&self, target: &Path) -> Result<(), TemplateError> {
        if !self.source.is_dir() {
            return Err(TemplateError::Io {
                path: self.source.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "template directory not found"),
            });
        }
        let (staging, tree) = stage(target)?;
        let source = self.source.clone();
        let target = target.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let copied = copy_tree(&source, &tree)?;
            commit(&tree, &target)?;
            drop(staging);
            tracing::info!(source = %source.display(), files = copied, "Template copied");
            Ok::<(), TemplateError>(())
        })
        .await
        .map_err(|e| TemplateError::Io {
            path: self.source.clone(),
            source: std::io::Error::other(e),
        })?
    }

    fn describe(&self) -> String {
        self.source.display().to_string()
    }
}
