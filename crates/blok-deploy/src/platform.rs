//! The remote platform seam.
//!
//! [`PlatformApi`] is what the deployment client and the pipeline talk to.
//! [`HttpPlatform`](crate::http::HttpPlatform) is the production
//! implementation; tests substitute their own.

use crate::error::PlatformError;
use async_trait::async_trait;
use blok_core::schema::Schema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of a deployment submission.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentRequest {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub schema: Schema,
}

/// Identifies a submitted deployment. Persisted with a run so that a resumed
/// run polls the same job instead of submitting again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub project_id: String,
    pub project_code: String,
    pub job_id: String,
}

/// Normalized job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl JobState {
    /// Map the platform's status string. Unknown states count as running so
    /// the caller keeps polling until its own timeout.
    pub fn from_remote(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "pending" | "queued" => JobState::Queued,
            "running" | "in_progress" | "deploying" => JobState::Running,
            "completed" | "succeeded" | "success" => JobState::Succeeded,
            "failed" | "error" => JobState::Failed,
            "timed_out" | "timeout" => JobState::TimedOut,
            other => {
                tracing::warn!(status = %other, "Unknown job status, treating as running");
                JobState::Running
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::TimedOut
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
            JobState::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}

/// One observation of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub state: JobState,
    pub log: Option<String>,
    pub error: Option<String>,
}

/// Deployed project details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub staging_url: Option<String>,
    #[serde(default)]
    pub production_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Target environment for a rollback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Staging,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Staging => f.write_str("staging"),
            Environment::Production => f.write_str("production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// Remote platform operations.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Submit a project for deployment. Not idempotent.
    async fn create_deployment(&self, request: &DeploymentRequest)
    -> Result<JobHandle, PlatformError>;

    async fn get_job_status(&self, job_id: &str) -> Result<JobStatus, PlatformError>;

    async fn get_project_info(&self, project_id: &str) -> Result<ProjectInfo, PlatformError>;

    async fn delete_project(&self, project_id: &str) -> Result<(), PlatformError>;

    /// Roll a project back; returns the rollback job id if the platform reports one.
    async fn rollback_project(
        &self,
        project_id: &str,
        version: &str,
        environment: Environment,
    ) -> Result<Option<String>, PlatformError>;
}
