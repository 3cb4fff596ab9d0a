//! HTTP implementation of [`PlatformApi`] over `reqwest`.

use crate::error::PlatformError;
use crate::platform::{
    DeploymentRequest, Environment, JobHandle, JobState, JobStatus, PlatformApi, ProjectInfo,
};
use async_trait::async_trait;
use blok_core::config::PlatformConfig;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

#[derive(Deserialize)]
struct CreateResponse {
    project_id: String,
    #[serde(default)]
    project_code: Option<String>,
    #[serde(default)]
    job_id: Option<String>,
}

#[derive(Deserialize)]
struct JobResponse {
    status: String,
    #[serde(default, alias = "logs")]
    log: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct RollbackResponse {
    #[serde(default)]
    job_id: Option<String>,
}

/// Platform client with bearer-token auth and a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpPlatform {
    client: Client,
    base_url: String,
}

impl HttpPlatform {
    pub fn new(
        base_url: impl Into<String>,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, PlatformError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| PlatformError::Decode(format!("invalid API key: {}", e)))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build from configuration, reading the API key from the configured
    /// environment variable.
    pub fn from_config(config: &PlatformConfig) -> Result<Self, PlatformError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PlatformError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(&config.base_url, &api_key, config.request_timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into a [`PlatformError`], pulling the
    /// message out of a JSON error body when there is one.
    async fn check(response: Response) -> Result<Response, PlatformError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                ["detail", "message", "error"]
                    .iter()
                    .find_map(|key| v.get(*key).map(render_message))
            })
            .unwrap_or(body);
        Err(PlatformError::from_status(status, message))
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, PlatformError> {
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }
}

fn render_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl PlatformApi for HttpPlatform {
    async fn create_deployment(
        &self,
        request: &DeploymentRequest,
    ) -> Result<JobHandle, PlatformError> {
        tracing::debug!(project = %request.name, "Submitting deployment");
        let response = self
            .client
            .post(self.url("/mcp/projects"))
            .json(request)
            .send()
            .await?;
        let created: CreateResponse = Self::json(response).await?;
        let job_id = created
            .job_id
            .ok_or_else(|| PlatformError::Decode("create response has no job_id".to_string()))?;

        Ok(JobHandle {
            project_code: created
                .project_code
                .unwrap_or_else(|| created.project_id.clone()),
            project_id: created.project_id,
            job_id,
        })
    }

    async fn get_job_status(&self, job_id: &str) -> Result<JobStatus, PlatformError> {
        let response = self
            .client
            .get(self.url(&format!("/mcp/jobs/{}", job_id)))
            .send()
            .await?;
        let job: JobResponse = Self::json(response).await?;
        Ok(JobStatus {
            state: JobState::from_remote(&job.status),
            log: job.log,
            error: job.error,
        })
    }

    async fn get_project_info(&self, project_id: &str) -> Result<ProjectInfo, PlatformError> {
        let response = self
            .client
            .get(self.url(&format!("/mcp/projects/{}/info", project_id)))
            .send()
            .await?;
        Self::json(response).await
    }

    async fn delete_project(&self, project_id: &str) -> Result<(), PlatformError> {
        let response = self
            .client
            .delete(self.url(&format!("/mcp/projects/{}", project_id)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn rollback_project(
        &self,
        project_id: &str,
        version: &str,
        environment: Environment,
    ) -> Result<Option<String>, PlatformError> {
        let response = self
            .client
            .post(self.url(&format!("/mcp/projects/{}/rollback", project_id)))
            .json(&serde_json::json!({
                "version": version,
                "environment": environment,
            }))
            .send()
            .await?;
        let rollback: RollbackResponse = Self::json(response).await?;
        Ok(rollback.job_id)
    }
}
