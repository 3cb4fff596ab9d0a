//! Drives a run through its plan.
//!
//! Steps run one at a time in plan order, except that all ready per-entity
//! generation steps run together on the blocking pool. The run is saved
//! after every state change, so an interrupted run can be resumed; a resumed
//! run skips done steps and polls an already-submitted deployment instead
//! of submitting again.

use crate::error::{PipelineError, StepError};
use crate::finalize;
use crate::install::{self, DependencyInstaller};
use crate::plan::{PlanOptions, RunMode, StepKind};
use crate::registry::DestinationRegistry;
use crate::report::RunReport;
use crate::run::{BackendSummary, PipelineRun, RunOutcome};
use crate::store::RunStore;
use crate::template::{self, TemplateSource};
use blok_codegen::{ArtifactWriter, CodeGenerator, GeneratorOptions};
use blok_core::{BlokConfig, Project};
use blok_deploy::{CancellationSignal, DeployError, DeploymentClient, JobState, PlatformApi};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// A request to provision (or scaffold) one project.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub name: String,
    pub description: String,
    /// `create`: parent directory of the new project.
    /// `scaffold`: the existing project root.
    pub destination: PathBuf,
    /// Raw schema document; validated before anything else happens.
    pub schema: Value,
    pub mode: RunMode,
    /// `scaffold`: API the generated client talks to.
    pub api_url: Option<String>,
    /// Overrides `deployment.wait_for_deployment`.
    pub wait_for_deployment: Option<bool>,
    /// Overrides `install.enabled`.
    pub install_dependencies: Option<bool>,
}

impl RunRequest {
    pub fn create(name: impl Into<String>, destination: impl Into<PathBuf>, schema: Value) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            destination: destination.into(),
            schema,
            mode: RunMode::Create,
            api_url: None,
            wait_for_deployment: None,
            install_dependencies: None,
        }
    }

    pub fn scaffold(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        schema: Value,
        api_url: Option<String>,
    ) -> Self {
        Self {
            mode: RunMode::Scaffold,
            api_url,
            ..Self::create(name, root, schema)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResumeOptions {
    /// Drop the saved deployment handle and submit again.
    pub resubmit: bool,
}

pub struct PipelineOrchestrator {
    config: BlokConfig,
    deployer: DeploymentClient,
    template: Arc<dyn TemplateSource>,
    installer: Arc<dyn DependencyInstaller>,
    store: Arc<dyn RunStore>,
    registry: DestinationRegistry,
    cancel: CancellationSignal,
}

impl PipelineOrchestrator {
    pub fn new(config: BlokConfig, platform: Arc<dyn PlatformApi>, store: Arc<dyn RunStore>) -> Self {
        let deployer = DeploymentClient::new(
            platform,
            config.deployment.clone(),
            config.platform.clone(),
        );
        Self {
            template: template::from_config(&config.template),
            installer: install::from_config(&config.install),
            deployer,
            store,
            registry: DestinationRegistry::new(),
            cancel: CancellationSignal::never(),
            config,
        }
    }

    pub fn with_template(mut self, template: Arc<dyn TemplateSource>) -> Self {
        self.template = template;
        self
    }

    pub fn with_installer(mut self, installer: Arc<dyn DependencyInstaller>) -> Self {
        self.installer = installer;
        self
    }

    pub fn with_registry(mut self, registry: DestinationRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Stop waiting on deployments when `signal` fires.
    pub fn with_cancellation(mut self, signal: CancellationSignal) -> Self {
        self.cancel = signal;
        self
    }

    pub fn registry(&self) -> &DestinationRegistry {
        &self.registry
    }

    /// Validate, plan and execute a new run.
    ///
    /// A saved run for the same root is only replaced when it finished and
    /// never submitted a deployment; anything else has to be resumed.
    pub async fn run(&self, request: RunRequest) -> Result<RunReport, PipelineError> {
        self.config.validate()?;
        let schema = blok_validator::parse_valid(&request.schema).map_err(|issues| {
            tracing::error!(issues = issues.len(), project = %request.name, "Schema rejected");
            PipelineError::Validation(issues)
        })?;

        let destination = absolute(&request.destination);
        let project = Project::new(request.name, request.description, destination.clone(), schema)?;
        let root = match request.mode {
            RunMode::Create => project.root(),
            RunMode::Scaffold => destination,
        };
        let options = PlanOptions {
            mode: request.mode,
            wait_for_deployment: request
                .wait_for_deployment
                .unwrap_or(self.config.deployment.wait_for_deployment),
            install_dependencies: request
                .install_dependencies
                .unwrap_or(self.config.install.enabled),
            configure_env: request.mode == RunMode::Scaffold && request.api_url.is_some(),
        };

        let _lease = self.registry.acquire(&root)?;
        if let Some(existing) = self.store.load(&root)? {
            if existing.outcome() != RunOutcome::Succeeded || existing.deployment.is_some() {
                tracing::error!(
                    run_id = %existing.id,
                    outcome = ?existing.outcome(),
                    root = %root.display(),
                    "Saved run would be replaced"
                );
                return Err(PipelineError::ExistingRun {
                    root,
                    run_id: existing.id,
                });
            }
        }
        let run = PipelineRun::new(project, root, options, request.api_url);
        self.store.save(&run)?;
        tracing::info!(
            run_id = %run.id,
            project = %run.project.name,
            root = %run.root.display(),
            mode = %run.mode(),
            steps = run.steps.len(),
            "Run started"
        );
        self.execute(run).await
    }

    /// Continue the saved run for `root`.
    pub async fn resume(
        &self,
        root: &Path,
        options: ResumeOptions,
    ) -> Result<RunReport, PipelineError> {
        let root = absolute(root);
        let _lease = self.registry.acquire(&root)?;
        let mut run = self
            .store
            .load(&root)?
            .ok_or_else(|| PipelineError::RunNotFound(root.clone()))?;

        if options.resubmit && run.deployment.is_some() {
            tracing::warn!(run_id = %run.id, "Discarding submitted deployment; it will be submitted again");
            run.discard_deployment();
        }
        self.store.save(&run)?;
        tracing::info!(run_id = %run.id, root = %run.root.display(), "Run resumed");
        self.execute(run).await
    }

    async fn execute(&self, mut run: PipelineRun) -> Result<RunReport, PipelineError> {
        loop {
            let ready = run.ready_steps();
            if ready.is_empty() {
                break;
            }
            let entity: Vec<usize> = ready
                .iter()
                .copied()
                .filter(|i| run.steps[*i].kind.is_entity())
                .collect();

            let succeeded = if entity.is_empty() {
                self.run_step(&mut run, ready[0]).await?
            } else {
                self.run_entity_group(&mut run, &entity).await?
            };
            if !succeeded {
                break;
            }
        }

        let report = RunReport::from_run(&run, &self.installer.manual_command());
        match report.outcome {
            RunOutcome::Succeeded => {
                tracing::info!(run_id = %run.id, files = report.generated_files.len(), "Run succeeded")
            }
            _ => tracing::error!(
                run_id = %run.id,
                step = report.blocking_error.as_ref().map(|b| b.step.as_str()).unwrap_or("-"),
                "Run stopped"
            ),
        }
        Ok(report)
    }

    async fn run_step(&self, run: &mut PipelineRun, index: usize) -> Result<bool, PipelineError> {
        let kind = run.steps[index].kind.clone();
        run.mark_running(index);
        self.store.save(run)?;
        tracing::info!(step = %kind, attempt = run.steps[index].attempts, "Step started");

        let started = Instant::now();
        match self.perform(run, &kind).await {
            Ok(files) => {
                run.mark_done(index, files);
                self.store.save(run)?;
                tracing::info!(
                    step = %kind,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Step completed"
                );
                Ok(true)
            }
            Err(e) => {
                tracing::error!(step = %kind, error = %e, "Step failed");
                run.mark_failed(index, StepError::from(&e));
                self.store.save(run)?;
                Ok(false)
            }
        }
    }

    /// Run every ready per-entity step in parallel. Each failure is recorded
    /// against its own step; the others still complete.
    async fn run_entity_group(
        &self,
        run: &mut PipelineRun,
        indices: &[usize],
    ) -> Result<bool, PipelineError> {
        let generator = self.generator(run);
        let schema = Arc::new(run.project.schema.clone());
        let mut tasks = JoinSet::new();

        for &index in indices {
            let artifact = run.steps[index].kind.artifact().ok_or_else(|| {
                PipelineError::Internal(format!("{} has no artifact", run.steps[index].kind))
            })?;
            run.mark_running(index);

            let generator = generator.clone();
            let schema = schema.clone();
            let writer = ArtifactWriter::new(&run.root);
            tasks.spawn_blocking(move || {
                let written = generator
                    .generate(&schema, &artifact)
                    .and_then(|a| writer.write_artifact(&a));
                (index, written)
            });
        }
        self.store.save(run)?;
        tracing::info!(steps = indices.len(), "Generating entity artifacts");

        let mut failures = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(written))) => {
                    tracing::debug!(
                        step = %run.steps[index].kind,
                        path = %written.path.display(),
                        outcome = ?written.outcome,
                        "Step completed"
                    );
                    run.mark_done(index, vec![written.path]);
                }
                Ok((index, Err(e))) => {
                    let e = PipelineError::from(e);
                    tracing::error!(step = %run.steps[index].kind, error = %e, "Step failed");
                    run.mark_failed(index, StepError::from(&e));
                    failures += 1;
                }
                Err(join_err) => {
                    self.store.save(run)?;
                    return Err(PipelineError::Internal(format!(
                        "entity generation task panicked: {}",
                        join_err
                    )));
                }
            }
        }
        self.store.save(run)?;

        if failures > 0 {
            tracing::error!(failed = failures, total = indices.len(), "Entity generation incomplete");
        }
        Ok(failures == 0)
    }

    async fn perform(
        &self,
        run: &mut PipelineRun,
        kind: &StepKind,
    ) -> Result<Vec<PathBuf>, PipelineError> {
        match kind {
            StepKind::ProvisionTemplate => {
                tracing::debug!(source = %self.template.describe(), "Provisioning template");
                self.template.provision(&run.root).await?;
                Ok(Vec::new())
            }
            StepKind::SubmitDeployment => {
                if let Some(handle) = run.deployment.as_ref() {
                    tracing::info!(job_id = %handle.job_id, "Deployment already submitted; not resubmitting");
                } else {
                    let handle = self.deployer.submit(&run.project).await?;
                    run.backend = Some(BackendSummary {
                        project_id: handle.project_id.clone(),
                        project_code: handle.project_code.clone(),
                        job_id: handle.job_id.clone(),
                        ..Default::default()
                    });
                    run.deployment = Some(handle);
                    // Saved before anything else can fail so a retry never resubmits.
                    self.store.save(run)?;
                }
                if !run.options.wait_for_deployment {
                    self.resolve_api_url(run).await;
                }
                Ok(Vec::new())
            }
            StepKind::AwaitDeployment => {
                let handle = run.deployment.clone().ok_or_else(|| {
                    PipelineError::Internal("no submitted deployment to wait for".to_string())
                })?;
                let waited = self
                    .deployer
                    .await_completion(&handle, self.config.deployment.timeout(), self.cancel.clone())
                    .await;

                let state = match &waited {
                    Ok(result) => Some(result.state),
                    Err(DeployError::Failed { .. }) => Some(JobState::Failed),
                    Err(DeployError::TimedOut { .. }) => Some(JobState::TimedOut),
                    Err(_) => None,
                };
                if let (Some(backend), Some(state)) = (run.backend.as_mut(), state) {
                    backend.state = Some(state);
                }

                let result = waited?;
                tracing::debug!(polls = result.polls, "Deployment finished");
                self.resolve_api_url(run).await;
                Ok(Vec::new())
            }
            StepKind::CleanupTemplate => {
                finalize::cleanup_template(
                    &run.root,
                    &self.config.template.cleanup_files,
                    &run.generated_files(),
                )?;
                Ok(Vec::new())
            }
            StepKind::FinalizeManifest => Ok(vec![finalize::update_manifest(&run.root, &run.project)?]),
            StepKind::ConfigureEnv => match &run.api_url {
                Some(url) => Ok(vec![finalize::configure_env(
                    &run.root,
                    &self.config.codegen.api_url_env,
                    url,
                )?]),
                None => {
                    tracing::warn!("No API URL known; leaving .env untouched");
                    Ok(Vec::new())
                }
            },
            StepKind::InstallDependencies => {
                self.installer.install(&run.root).await?;
                Ok(Vec::new())
            }
            generate => {
                let artifact = generate.artifact().ok_or_else(|| {
                    PipelineError::Internal(format!("{} has no artifact", generate))
                })?;
                let artifact = self.generator(run).generate(&run.project.schema, &artifact)?;
                let written = ArtifactWriter::new(&run.root).write_artifact(&artifact)?;
                tracing::debug!(path = %written.path.display(), outcome = ?written.outcome, "Artifact written");
                Ok(vec![written.path])
            }
        }
    }

    fn generator(&self, run: &PipelineRun) -> CodeGenerator {
        let mut options = GeneratorOptions::from_config(&self.config.codegen, run.project.name.clone());
        if let Some(url) = &run.api_url {
            options = options.with_api_url(url.clone());
        }
        CodeGenerator::new(options)
    }

    async fn resolve_api_url(&self, run: &mut PipelineRun) {
        let Some(handle) = run.deployment.clone() else {
            return;
        };
        let url = self.deployer.staging_url(&handle).await;
        tracing::info!(staging_url = %url, "Backend API resolved");
        if let Some(backend) = run.backend.as_mut() {
            backend.staging_url = Some(url.clone());
        }
        run.api_url = Some(url);
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
