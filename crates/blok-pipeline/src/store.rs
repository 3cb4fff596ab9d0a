//! Run persistence.
//!
//! Each run is one JSON file under the runs directory, named after the
//! project root (`<slug>-<hash8>.json`). Writes stage a temp file in the same
//! directory and rename it into place.

use crate::error::StoreError;
use crate::run::PipelineRun;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Where runs are saved between invocations.
pub trait RunStore: Send + Sync {
    fn save(&self, run: &PipelineRun) -> Result<(), StoreError>;

    /// Load the run for a project root. Steps that were running when the
    /// run was saved come back as pending.
    fn load(&self, root: &Path) -> Result<Option<PipelineRun>, StoreError>;

    fn list(&self) -> Result<Vec<PipelineRun>, StoreError>;
}

/// Stable key for a project root.
pub fn run_key(root: &Path) -> String {
    let slug = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "run".to_string());
    let digest = Sha256::digest(root.to_string_lossy().as_bytes());
    format!("{}-{}", slug, &hex::encode(digest)[..8])
}

pub struct FileRunStore {
    directory: PathBuf,
    cache: RwLock<HashMap<String, PipelineRun>>,
}

impl FileRunStore {
    pub fn new(directory: impl AsRef<Path>) -> Result<Self, StoreError> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory).map_err(|source| StoreError::Io {
            path: directory.clone(),
            source,
        })?;
        Ok(Self {
            directory,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, root: &Path) -> PathBuf {
        self.directory.join(format!("{}.json", run_key(root)))
    }

    fn read(path: &Path) -> Result<PipelineRun, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl RunStore for FileRunStore {
    fn save(&self, run: &PipelineRun) -> Result<(), StoreError> {
        let path = self.path_for(&run.root);
        let json = serde_json::to_vec_pretty(run).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        let io = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        let mut staged = tempfile::NamedTempFile::new_in(&self.directory).map_err(io)?;
        staged.write_all(&json).map_err(io)?;
        staged.as_file().sync_all().map_err(io)?;
        staged.persist(&path).map_err(|e| io(e.error))?;

        let mut cache = self.cache.write().map_err(|_| StoreError::LockError)?;
        cache.insert(run_key(&run.root), run.clone());
        tracing::debug!(run_id = %run.id, path = %path.display(), "Run saved");
        Ok(())
    }

    fn load(&self, root: &Path) -> Result<Option<PipelineRun>, StoreError> {
        let key = run_key(root);
        let cached = {
            let cache = self.cache.read().map_err(|_| StoreError::LockError)?;
            cache.get(&key).cloned()
        };

        let mut run = match cached {
            Some(run) => run,
            None => {
                let path = self.path_for(root);
                if !path.exists() {
                    return Ok(None);
                }
                Self::read(&path)?
            }
        };

        let recovered = run.recover_interrupted();
        if recovered > 0 {
            tracing::warn!(run_id = %run.id, steps = recovered, "Interrupted steps reset to pending");
        }
        Ok(Some(run))
    }

    fn list(&self) -> Result<Vec<PipelineRun>, StoreError> {
        let entries = fs::read_dir(&self.directory).map_err(|source| StoreError::Io {
            path: self.directory.clone(),
            source,
        })?;

        let mut runs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.directory.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                match Self::read(&path) {
                    Ok(run) => runs.push(run),
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable run file"),
                }
            }
        }
        runs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanOptions;
    use crate::run::StepStatus;
    use blok_core::Project;
    use blok_core::schema::Schema;
    use serde_json::json;
    use tempfile::TempDir;

    fn run(destination: &Path) -> PipelineRun {
        let schema = Schema::from_value(&json!({ "tasks": { "title": { "type": "text" } } })).unwrap();
        let project = Project::new("Task Manager", "", destination, schema).unwrap();
        let root = project.root();
        PipelineRun::new(project, root, PlanOptions::default(), None)
    }

    #[test]
    fn key_is_slug_plus_hash() {
        let key = run_key(Path::new("/srv/apps/task-manager"));
        assert!(key.starts_with("task-manager-"));
        assert_eq!(key.len(), "task-manager-".len() + 8);
        assert_ne!(key, run_key(Path::new("/srv/other/task-manager")));
    }

    #[test]
    fn save_then_load_from_a_fresh_store() {
        let dir = TempDir::new().unwrap();
        let mut saved = run(Path::new("/srv/apps"));
        saved.mark_running(0);
        saved.mark_done(0, vec![PathBuf::from("package.json")]);
        saved.mark_running(1);

        FileRunStore::new(dir.path()).unwrap().save(&saved).unwrap();

        let store = FileRunStore::new(dir.path()).unwrap();
        let loaded = store.load(&saved.root).unwrap().unwrap();
        assert_eq!(loaded.id, saved.id);
        assert!(loaded.steps[0].status.is_done());
        assert_eq!(loaded.steps[1].status, StepStatus::Pending);
        assert_eq!(loaded.generated_files(), vec![PathBuf::from("package.json")]);
    }

    #[test]
    fn missing_run_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileRunStore::new(dir.path()).unwrap();
        assert!(store.load(Path::new("/nowhere/app")).unwrap().is_none());
    }

    #[test]
    fn list_skips_garbage() {
        let dir = TempDir::new().unwrap();
        let store = FileRunStore::new(dir.path()).unwrap();
        store.save(&run(Path::new("/srv/a"))).unwrap();
        store.save(&run(Path::new("/srv/b"))).unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        assert_eq!(store.list().unwrap().len(), 2);
    }
}
