//! Step plan.
//!
//! Steps live in an arena addressed by index; each step lists the indices it
//! depends on. A plan is built once per run and persisted with it.

use blok_codegen::ArtifactKind;
use blok_core::schema::Schema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a step does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "step", content = "table", rename_all = "kebab-case")]
pub enum StepKind {
    ProvisionTemplate,
    SubmitDeployment,
    AwaitDeployment,
    GenerateTypes,
    GenerateApiService,
    GenerateView(String),
    GenerateForm(String),
    GenerateDashboard,
    UpdateRoutes,
    UpdateNavbar,
    CleanupTemplate,
    FinalizeManifest,
    ConfigureEnv,
    InstallDependencies,
}

impl StepKind {
    /// Per-entity steps run together as a parallel, failure-isolated group.
    pub fn is_entity(&self) -> bool {
        matches!(self, StepKind::GenerateView(_) | StepKind::GenerateForm(_))
    }

    pub fn table(&self) -> Option<&str> {
        match self {
            StepKind::GenerateView(t) | StepKind::GenerateForm(t) => Some(t),
            _ => None,
        }
    }

    /// The artifact a generation step produces.
    pub fn artifact(&self) -> Option<ArtifactKind> {
        match self {
            StepKind::GenerateTypes => Some(ArtifactKind::Types),
            StepKind::GenerateApiService => Some(ArtifactKind::ApiService),
            StepKind::GenerateView(t) => Some(ArtifactKind::EntityView(t.clone())),
            StepKind::GenerateForm(t) => Some(ArtifactKind::EntityForm(t.clone())),
            StepKind::GenerateDashboard => Some(ArtifactKind::Dashboard),
            StepKind::UpdateRoutes => Some(ArtifactKind::Routes),
            StepKind::UpdateNavbar => Some(ArtifactKind::Navigation),
            _ => None,
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::ProvisionTemplate => f.write_str("provision-template"),
            StepKind::SubmitDeployment => f.write_str("submit-deployment"),
            StepKind::AwaitDeployment => f.write_str("await-deployment"),
            StepKind::GenerateTypes => f.write_str("generate-types"),
            StepKind::GenerateApiService => f.write_str("generate-api-service"),
            StepKind::GenerateView(t) => write!(f, "generate-view:{}", t),
            StepKind::GenerateForm(t) => write!(f, "generate-form:{}", t),
            StepKind::GenerateDashboard => f.write_str("generate-dashboard"),
            StepKind::UpdateRoutes => f.write_str("update-routes"),
            StepKind::UpdateNavbar => f.write_str("update-navbar"),
            StepKind::CleanupTemplate => f.write_str("cleanup-template"),
            StepKind::FinalizeManifest => f.write_str("finalize-manifest"),
            StepKind::ConfigureEnv => f.write_str("configure-env"),
            StepKind::InstallDependencies => f.write_str("install-dependencies"),
        }
    }
}

/// Which plan to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// New project: template, deployment, generation, finalization.
    #[default]
    Create,
    /// Existing project: generation only, against a caller-supplied API.
    Scaffold,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Create => f.write_str("create"),
            RunMode::Scaffold => f.write_str("scaffold"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOptions {
    pub mode: RunMode,
    pub wait_for_deployment: bool,
    pub install_dependencies: bool,
    /// Scaffold only: write the API URL into `.env`.
    pub configure_env: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::Create,
            wait_for_deployment: true,
            install_dependencies: true,
            configure_env: false,
        }
    }
}

/// A step and the indices of the steps it waits for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub kind: StepKind,
    pub depends_on: Vec<usize>,
}

#[derive(Default)]
struct Builder {
    steps: Vec<PlannedStep>,
}

impl Builder {
    fn push(&mut self, kind: StepKind, depends_on: &[usize]) -> usize {
        self.steps.push(PlannedStep {
            kind,
            depends_on: depends_on.to_vec(),
        });
        self.steps.len() - 1
    }
}

/// Build the step arena for `schema`.
pub fn build(schema: &Schema, options: &PlanOptions) -> Vec<PlannedStep> {
    let mut b = Builder::default();

    let (template, backend) = match options.mode {
        RunMode::Create => {
            let template = b.push(StepKind::ProvisionTemplate, &[]);
            let submit = b.push(StepKind::SubmitDeployment, &[]);
            let backend = if options.wait_for_deployment {
                b.push(StepKind::AwaitDeployment, &[submit])
            } else {
                submit
            };
            (Some(template), Some(backend))
        }
        RunMode::Scaffold => (None, None),
    };

    let types = b.push(StepKind::GenerateTypes, &opt(template));
    let api_deps: Vec<usize> = template.into_iter().chain(backend).collect();
    let api = b.push(StepKind::GenerateApiService, &api_deps);

    let mut entities = Vec::new();
    for table in schema.table_names() {
        entities.push(b.push(StepKind::GenerateView(table.to_string()), &[types, api]));
        entities.push(b.push(StepKind::GenerateForm(table.to_string()), &[types, api]));
    }

    let dashboard = b.push(StepKind::GenerateDashboard, &entities);
    let routes = b.push(StepKind::UpdateRoutes, &[dashboard]);
    let navbar = b.push(StepKind::UpdateNavbar, &[routes]);

    match options.mode {
        RunMode::Create => {
            let cleanup = b.push(StepKind::CleanupTemplate, &[navbar]);
            let manifest = b.push(StepKind::FinalizeManifest, &[cleanup]);
            let mut env_deps = vec![manifest];
            env_deps.extend(backend);
            let env = b.push(StepKind::ConfigureEnv, &env_deps);
            if options.install_dependencies {
                b.push(StepKind::InstallDependencies, &[env]);
            }
        }
        RunMode::Scaffold => {
            if options.configure_env {
                b.push(StepKind::ConfigureEnv, &[navbar]);
            }
        }
    }

    b.steps
}

fn opt(index: Option<usize>) -> Vec<usize> {
    index.into_iter().collect()
}
