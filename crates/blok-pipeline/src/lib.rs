//! Resumable provisioning pipeline for Blok.
//!
//! A run validates the schema, provisions the client template, submits the
//! backend deployment, generates client artifacts and finalizes the project.
//! Every step's state is persisted so a failed or interrupted run can be
//! resumed without repeating completed work.

pub mod error;
pub mod finalize;
pub mod install;
pub mod orchestrator;
pub mod plan;
pub mod registry;
pub mod report;
pub mod run;
pub mod store;
pub mod template;

pub use error::{
    EntityFailure, ErrorKind, InstallError, PipelineError, StepError, StoreError, TemplateError,
};
pub use install::{CommandInstaller, DependencyInstaller, NoopInstaller};
pub use orchestrator::{PipelineOrchestrator, ResumeOptions, RunRequest};
pub use plan::{PlanOptions, RunMode, StepKind};
pub use registry::{DestinationLease, DestinationRegistry};
pub use report::RunReport;
pub use run::{BackendSummary, PipelineRun, RunOutcome, StepRecord, StepStatus};
pub use store::{FileRunStore, RunStore};
pub use template::{GitTemplateSource, LocalTemplateSource, TemplateSource};
