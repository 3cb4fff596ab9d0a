//! Error types for the provisioning pipeline.

use blok_codegen::CodegenError;
use blok_deploy::DeployError;
use blok_validator::ValidationIssue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the pipeline and its steps.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The schema failed static checks; nothing was touched.
    #[error("schema has {} issue(s)", .0.len())]
    Validation(Vec<ValidationIssue>),

    #[error("another run already holds {}", .0.display())]
    DestinationBusy(PathBuf),

    #[error("no saved run for {}", .0.display())]
    RunNotFound(PathBuf),

    /// A saved run for this root is unfinished or owns a deployment.
    #[error("{} already has run {run_id}; continue it with `blok resume` or choose another destination", root.display())]
    ExistingRun { root: PathBuf, run_id: Uuid },

    #[error(transparent)]
    Config(#[from] blok_core::ConfigError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("filesystem error at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Schema(#[from] blok_core::SchemaError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Classification recorded with a failed step.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Validation(_) => ErrorKind::Validation,
            PipelineError::DestinationBusy(_) => ErrorKind::DestinationBusy,
            PipelineError::RunNotFound(_) | PipelineError::Store(_) => ErrorKind::Store,
            PipelineError::ExistingRun { .. } => ErrorKind::ExistingRun,
            PipelineError::Config(_) => ErrorKind::Config,
            PipelineError::Deploy(e) => match e {
                DeployError::Rejected(_) => ErrorKind::DeploymentRejected,
                DeployError::Failed { .. } => ErrorKind::DeploymentFailed,
                DeployError::TimedOut { .. } => ErrorKind::DeploymentTimedOut,
                DeployError::Cancelled { .. } => ErrorKind::Cancelled,
                DeployError::Network { .. } | DeployError::Platform(_) => ErrorKind::Network,
            },
            PipelineError::Codegen(e) => match e {
                CodegenError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
                CodegenError::FileSystem { .. } | CodegenError::MalformedRegion { .. } => {
                    ErrorKind::FileSystem
                }
                CodegenError::UnknownTable(_) | CodegenError::Schema(_) => ErrorKind::Internal,
            },
            PipelineError::Template(_) => ErrorKind::Template,
            PipelineError::Install(_) => ErrorKind::Install,
            PipelineError::FileSystem { .. } => ErrorKind::FileSystem,
            PipelineError::Schema(_) | PipelineError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Error classes as they appear in reports and persisted runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    DeploymentRejected,
    DeploymentFailed,
    DeploymentTimedOut,
    FileSystem,
    UnsupportedType,
    DestinationBusy,
    ExistingRun,
    PartialGenerationFailure,
    Cancelled,
    Template,
    Install,
    Network,
    Store,
    Config,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::DeploymentRejected => "deployment rejected",
            ErrorKind::DeploymentFailed => "deployment failed",
            ErrorKind::DeploymentTimedOut => "deployment timed out",
            ErrorKind::FileSystem => "filesystem",
            ErrorKind::UnsupportedType => "unsupported type",
            ErrorKind::DestinationBusy => "destination busy",
            ErrorKind::ExistingRun => "existing run",
            ErrorKind::PartialGenerationFailure => "partial generation failure",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Template => "template",
            ErrorKind::Install => "install",
            ErrorKind::Network => "network",
            ErrorKind::Store => "store",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// A failure as recorded against a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&PipelineError> for StepError {
    fn from(err: &PipelineError) -> Self {
        StepError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// One per-entity generation step that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFailure {
    pub step: String,
    pub table: String,
    pub error: StepError,
}

/// Errors from obtaining the starting file tree.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("destination {} already exists", .0.display())]
    DestinationExists(PathBuf),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("git {operation} failed: {message}")]
    Git { operation: String, message: String },

    #[error("template clone timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("failed to walk template directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Errors from the dependency install step.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}: {stderr}", code.map_or_else(|| "a signal".to_string(), |c| format!("status {}", c)))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} timed out after {}s", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
}

/// Errors from persisting runs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("run store lock poisoned")]
    LockError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_errors_classify() {
        let err = PipelineError::from(DeployError::Rejected("bad".into()));
        assert_eq!(err.kind(), ErrorKind::DeploymentRejected);
        let err = PipelineError::from(DeployError::Cancelled {
            job_id: "j".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn step_error_keeps_message() {
        let err = PipelineError::DestinationBusy(PathBuf::from("/tmp/app"));
        let step = StepError::from(&err);
        assert_eq!(step.kind, ErrorKind::DestinationBusy);
        assert_eq!(step.message, "another run already holds /tmp/app");
    }

    #[test]
    fn existing_run_points_to_resume() {
        let err = PipelineError::ExistingRun {
            root: PathBuf::from("/tmp/app"),
            run_id: Uuid::nil(),
        };
        assert_eq!(err.kind(), ErrorKind::ExistingRun);
        assert!(err.to_string().contains("blok resume"));
    }

    #[test]
    fn install_failure_message() {
        let err = InstallError::Failed {
            program: "npm".into(),
            code: Some(1),
            stderr: "ERESOLVE".into(),
        };
        assert_eq!(err.to_string(), "npm exited with status 1: ERESOLVE");
    }
}
