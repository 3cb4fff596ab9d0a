//! Shared fixtures for pipeline tests: an in-process platform, a local
//! template directory and a file-backed run store, all under one temp dir.

use async_trait::async_trait;
use blok_core::BlokConfig;
use blok_deploy::{
    DeploymentRequest, Environment, JobHandle, JobState, JobStatus, PlatformApi, PlatformError,
    ProjectInfo,
};
use blok_pipeline::{FileRunStore, LocalTemplateSource, NoopInstaller, PipelineOrchestrator};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const STAGING_URL: &str = "https://tm01-staging.platform.test";

// =============================================================================
// PLATFORM
// =============================================================================

/// Accepts every submission and reports a fixed job state.
pub struct FakePlatform {
    state: Mutex<JobState>,
    submits: AtomicU32,
    polls: AtomicU32,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(JobState::Succeeded),
            submits: AtomicU32::new(0),
            polls: AtomicU32::new(0),
        }
    }

    pub fn set_state(&self, state: JobState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn submits(&self) -> u32 {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn create_deployment(
        &self,
        _request: &DeploymentRequest,
    ) -> Result<JobHandle, PlatformError> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(JobHandle {
            project_id: format!("proj-{}", n),
            project_code: "tm01".to_string(),
            job_id: format!("job-{}", n),
        })
    }

    async fn get_job_status(&self, _job_id: &str) -> Result<JobStatus, PlatformError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let state = *self.state.lock().unwrap();
        Ok(JobStatus {
            state,
            log: None,
            error: (state == JobState::Failed).then(|| "migration failed".to_string()),
        })
    }

    async fn get_project_info(&self, _project_id: &str) -> Result<ProjectInfo, PlatformError> {
        Ok(ProjectInfo {
            staging_url: Some(STAGING_URL.to_string()),
            ..Default::default()
        })
    }

    async fn delete_project(&self, _project_id: &str) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn rollback_project(
        &self,
        _project_id: &str,
        _version: &str,
        _environment: Environment,
    ) -> Result<Option<String>, PlatformError> {
        Ok(None)
    }
}

// =============================================================================
// HARNESS
// =============================================================================

pub struct Harness {
    pub workspace: TempDir,
    pub platform: Arc<FakePlatform>,
    pub store: Arc<FileRunStore>,
}

impl Harness {
    pub fn new() -> Self {
        let workspace = TempDir::new().unwrap();
        write_template(&workspace.path().join("template"));
        fs::create_dir_all(workspace.path().join("projects")).unwrap();
        let store = FileRunStore::new(workspace.path().join("runs")).unwrap();
        Self {
            workspace,
            platform: Arc::new(FakePlatform::new()),
            store: Arc::new(store),
        }
    }

    pub fn template_dir(&self) -> PathBuf {
        self.workspace.path().join("template")
    }

    pub fn destination(&self) -> PathBuf {
        self.workspace.path().join("projects")
    }

    pub fn config(&self) -> BlokConfig {
        let mut config = BlokConfig::default();
        config.deployment.poll_floor_ms = 5;
        config.deployment.poll_ceiling_ms = 20;
        config.deployment.timeout_secs = 5;
        config.deployment.wait_for_deployment = true;
        config.install.enabled = false;
        config
    }

    pub fn orchestrator(&self) -> PipelineOrchestrator {
        PipelineOrchestrator::new(self.config(), self.platform.clone(), self.store.clone())
            .with_template(Arc::new(LocalTemplateSource::new(self.template_dir())))
            .with_installer(Arc::new(NoopInstaller))
    }
}

fn write_template(dir: &Path) {
    let views = dir.join("src/components/views");
    fs::create_dir_all(&views).unwrap();
    fs::create_dir_all(dir.join("node_modules/react")).unwrap();
    fs::write(
        dir.join("package.json"),
        "{\n  \"name\": \"template\",\n  \"version\": \"0.0.0\",\n  \"scripts\": { \"dev\": \"vite\" }\n}\n",
    )
    .unwrap();
    fs::write(dir.join(".env.example"), "VITE_DATABASE_API_URL=\nVITE_APP_MODE=dev\n").unwrap();
    fs::write(dir.join("src/App.tsx"), "export default function App() { return null; }\n").unwrap();
    fs::write(views.join("BillingView.tsx"), "export default function BillingView() {}\n").unwrap();
    fs::write(views.join("HomeView.tsx"), "export default function HomeView() {}\n").unwrap();
    fs::write(dir.join("node_modules/react/index.js"), "module.exports = {};\n").unwrap();
}

// =============================================================================
// SCHEMAS
// =============================================================================

pub fn task_schema() -> Value {
    json!({
        "tasks": {
            "title": { "type": "string", "max_length": 200, "required": true },
            "status": { "type": "string", "max_length": 20, "enum": ["todo", "in_progress", "done"] },
            "done": { "type": "boolean" },
            "user_id": { "type": "uuid", "foreign_key": "app_users.id" }
        },
        "projects": {
            "name": { "type": "string", "max_length": 100, "required": true },
            "notes": { "type": "text" }
        }
    })
}

pub fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative))
        .unwrap_or_else(|e| panic!("{} not readable: {}", relative, e))
}
