//! `blok create`, `blok scaffold` and `blok resume`.

use super::{Output, open_store, read_schema};
use anyhow::{Context, Result};
use blok_core::BlokConfig;
use blok_deploy::{CancellationHandle, HttpPlatform, PlatformApi};
use blok_pipeline::{DestinationRegistry, PipelineOrchestrator, ResumeOptions, RunRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct CreateArgs {
    pub name: String,
    pub schema: PathBuf,
    pub description: String,
    pub destination: PathBuf,
    pub wait: Option<bool>,
    pub install: Option<bool>,
}

pub async fn create(config: BlokConfig, args: CreateArgs, output: Output) -> Result<()> {
    let document = read_schema(&args.schema)?;
    let mut request = RunRequest::create(args.name, args.destination, document)
        .with_description(args.description);
    request.wait_for_deployment = args.wait;
    request.install_dependencies = args.install;

    let orchestrator = orchestrator(config, true)?;
    let report = orchestrator.run(request).await.context("Run failed to start")?;
    output.report(&report)
}

pub async fn scaffold(
    config: BlokConfig,
    root: PathBuf,
    schema: &Path,
    name: Option<String>,
    api_url: Option<String>,
    output: Output,
) -> Result<()> {
    let document = read_schema(schema)?;
    let name = name
        .or_else(|| {
            std::path::absolute(&root)
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| "App".to_string());

    let orchestrator = orchestrator(config, false)?;
    let report = orchestrator
        .run(RunRequest::scaffold(name, root, document, api_url))
        .await
        .context("Run failed to start")?;
    output.report(&report)
}

pub async fn resume(config: BlokConfig, root: &Path, resubmit: bool, output: Output) -> Result<()> {
    let orchestrator = orchestrator(config, true)?;
    let report = orchestrator
        .resume(root, ResumeOptions { resubmit })
        .await
        .with_context(|| format!("Failed to resume run for {}", root.display()))?;
    output.report(&report)
}

/// Wire the orchestrator to the real platform and the on-disk run store.
/// Leases are backed by lock files next to the saved runs, so two `blok`
/// processes never work on one root. Ctrl-C stops waiting on the
/// deployment; a second Ctrl-C exits.
fn orchestrator(config: BlokConfig, needs_platform: bool) -> Result<PipelineOrchestrator> {
    let platform: Arc<dyn PlatformApi> = match HttpPlatform::from_config(&config.platform) {
        Ok(platform) => Arc::new(platform),
        Err(e) if needs_platform => {
            return Err(e).context("Platform client unavailable");
        }
        Err(_) => Arc::new(Offline),
    };
    let store = open_store(&config)?;
    let registry = DestinationRegistry::with_lock_dir(store.directory().join("locks"));
    let store = Arc::new(store);

    let cancel = CancellationHandle::new();
    let signal = cancel.signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; stopping after the current step (Ctrl-C again to exit)");
            cancel.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });

    Ok(PipelineOrchestrator::new(config, platform, store)
        .with_registry(registry)
        .with_cancellation(signal))
}

/// Stand-in for scaffold runs, which never talk to the platform.
struct Offline;

#[async_trait::async_trait]
impl PlatformApi for Offline {
    async fn create_deployment(
        &self,
        _request: &blok_deploy::DeploymentRequest,
    ) -> Result<blok_deploy::JobHandle, blok_deploy::PlatformError> {
        Err(offline())
    }

    async fn get_job_status(
        &self,
        _job_id: &str,
    ) -> Result<blok_deploy::JobStatus, blok_deploy::PlatformError> {
        Err(offline())
    }

    async fn get_project_info(
        &self,
        _project_id: &str,
    ) -> Result<blok_deploy::ProjectInfo, blok_deploy::PlatformError> {
        Err(offline())
    }

    async fn delete_project(&self, _project_id: &str) -> Result<(), blok_deploy::PlatformError> {
        Err(offline())
    }

    async fn rollback_project(
        &self,
        _project_id: &str,
        _version: &str,
        _environment: blok_deploy::Environment,
    ) -> Result<Option<String>, blok_deploy::PlatformError> {
        Err(offline())
    }
}

fn offline() -> blok_deploy::PlatformError {
    blok_deploy::PlatformError::Network("platform not configured".to_string())
}
