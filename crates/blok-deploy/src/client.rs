//! Deployment submission and completion polling.

use crate::backoff::PollBackoff;
use crate::cancel::CancellationSignal;
use crate::error::{DeployError, PlatformError};
use crate::platform::{DeploymentRequest, Environment, JobHandle, JobState, PlatformApi};
use blok_core::Project;
use blok_core::config::{DeploymentConfig, PlatformConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of waiting for a job to reach a successful terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    pub job_id: String,
    pub state: JobState,
    pub log: Option<String>,
    /// Status requests made, including the final one.
    pub polls: u32,
    /// Sleeps between polls. Non-decreasing, except that the last one may be
    /// cut short by the overall timeout.
    pub intervals: Vec<Duration>,
    pub elapsed: Duration,
}

/// Submits projects to the platform and waits for their deployment jobs.
#[derive(Clone)]
pub struct DeploymentClient {
    platform: Arc<dyn PlatformApi>,
    config: DeploymentConfig,
    platform_config: PlatformConfig,
}

impl DeploymentClient {
    pub fn new(
        platform: Arc<dyn PlatformApi>,
        config: DeploymentConfig,
        platform_config: PlatformConfig,
    ) -> Self {
        Self {
            platform,
            config,
            platform_config,
        }
    }

    pub fn config(&self) -> &DeploymentConfig {
        &self.config
    }

    /// Submit the project's schema. Never retried: a second call creates a
    /// second remote project.
    pub async fn submit(&self, project: &Project) -> Result<JobHandle, DeployError> {
        let request = DeploymentRequest {
            name: project.name.clone(),
            description: project.description.clone(),
            schema: project.schema.clone(),
        };

        let handle = self
            .platform
            .create_deployment(&request)
            .await
            .map_err(|e| match e {
                PlatformError::Rejected { message, .. } => DeployError::Rejected(message),
                other => DeployError::Platform(other),
            })?;

        tracing::info!(
            project = %project.name,
            project_id = %handle.project_id,
            job_id = %handle.job_id,
            "Deployment submitted"
        );
        Ok(handle)
    }

    /// Poll until the job succeeds, fails, times out, or `cancel` fires.
    ///
    /// Cancellation only stops the local wait; the remote job keeps running.
    pub async fn await_completion(
        &self,
        handle: &JobHandle,
        timeout: Duration,
        mut cancel: CancellationSignal,
    ) -> Result<DeploymentResult, DeployError> {
        let job_id = handle.job_id.clone();
        let started = Instant::now();
        let deadline = started + timeout;
        let mut backoff = PollBackoff::from_config(&self.config);
        let mut intervals = Vec::new();
        let mut polls = 0u32;
        let mut failures = 0u32;

        tracing::info!(job_id = %job_id, timeout_secs = timeout.as_secs(), "Waiting for deployment");

        loop {
            if cancel.is_cancelled() {
                return Err(DeployError::Cancelled { job_id });
            }

            polls += 1;
            match self.platform.get_job_status(&job_id).await {
                Ok(status) => {
                    failures = 0;
                    tracing::debug!(job_id = %job_id, poll = polls, state = %status.state, "Job status");
                    match status.state {
                        JobState::Succeeded => {
                            let elapsed = started.elapsed();
                            tracing::info!(
                                job_id = %job_id,
                                polls,
                                elapsed_ms = elapsed.as_millis() as u64,
                                "Deployment succeeded"
                            );
                            return Ok(DeploymentResult {
                                job_id,
                                state: status.state,
                                log: status.log,
                                polls,
                                intervals,
                                elapsed,
                            });
                        }
                        JobState::Failed => {
                            return Err(DeployError::Failed {
                                job_id,
                                message: status
                                    .error
                                    .unwrap_or_else(|| "deployment failed".to_string()),
                                log: status.log,
                            });
                        }
                        JobState::TimedOut => {
                            return Err(DeployError::TimedOut {
                                job_id,
                                elapsed: started.elapsed(),
                            });
                        }
                        JobState::Queued | JobState::Running => {}
                    }
                }
                Err(e) if e.is_transient() => {
                    failures += 1;
                    if failures > self.config.max_network_retries {
                        return Err(DeployError::Network {
                            attempts: failures,
                            source: e,
                        });
                    }
                    tracing::warn!(
                        job_id = %job_id,
                        attempt = failures,
                        error = %e,
                        "Job status request failed, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(DeployError::TimedOut {
                    job_id,
                    elapsed: now - started,
                });
            }
            let interval = backoff
                .next_interval()
                .min(deadline - now)
                .max(backoff.floor());
            intervals.push(interval);
            tracing::debug!(job_id = %job_id, delay_ms = interval.as_millis() as u64, "Next poll");

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => {
                    tracing::warn!(job_id = %job_id, "Deployment wait cancelled; remote job continues");
                    return Err(DeployError::Cancelled { job_id });
                }
            }
        }
    }

    /// Submit and, when configured, wait with the configured timeout.
    pub async fn deploy(
        &self,
        project: &Project,
        cancel: CancellationSignal,
    ) -> Result<(JobHandle, Option<DeploymentResult>), DeployError> {
        let handle = self.submit(project).await?;
        if !self.config.wait_for_deployment {
            return Ok((handle, None));
        }
        let result = self
            .await_completion(&handle, self.config.timeout(), cancel)
            .await?;
        Ok((handle, Some(result)))
    }

    /// Staging URL reported by the platform, or the configured fallback.
    pub async fn staging_url(&self, handle: &JobHandle) -> String {
        match self.platform.get_project_info(&handle.project_id).await {
            Ok(info) => match info.staging_url {
                Some(url) if !url.is_empty() => return url,
                _ => {}
            },
            Err(e) => {
                tracing::warn!(
                    project_id = %handle.project_id,
                    error = %e,
                    "Could not fetch project info, using fallback staging URL"
                );
            }
        }
        self.platform_config.staging_url(&handle.project_code)
    }

    /// Delete a remote project. Only ever invoked explicitly.
    pub async fn delete_project(&self, project_id: &str) -> Result<(), DeployError> {
        self.platform.delete_project(project_id).await?;
        tracing::info!(project_id = %project_id, "Project deleted");
        Ok(())
    }

    pub async fn rollback_project(
        &self,
        project_id: &str,
        version: &str,
        environment: Environment,
    ) -> Result<Option<String>, DeployError> {
        let job_id = self
            .platform
            .rollback_project(project_id, version, environment)
            .await?;
        tracing::info!(project_id = %project_id, version = %version, environment = %environment, "Rollback requested");
        Ok(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationHandle;
    use crate::platform::{JobStatus, ProjectInfo};
    use async_trait::async_trait;
    use blok_core::schema::Schema;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct ScriptedPlatform {
        statuses: Mutex<VecDeque<Result<JobState, PlatformError>>>,
        reject_submit: bool,
        staging_url: Option<String>,
        polls: AtomicU32,
    }

    impl ScriptedPlatform {
        fn with_states(states: Vec<Result<JobState, PlatformError>>) -> Self {
            Self {
                statuses: Mutex::new(states.into()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl PlatformApi for ScriptedPlatform {
        async fn create_deployment(
            &self,
            request: &DeploymentRequest,
        ) -> Result<JobHandle, PlatformError> {
            if self.reject_submit {
                return Err(PlatformError::Rejected {
                    status: 422,
                    message: format!("{} has an invalid schema", request.name),
                });
            }
            Ok(handle())
        }

        async fn get_job_status(&self, _job_id: &str) -> Result<JobStatus, PlatformError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(JobState::Running));
            next.map(|state| JobStatus {
                state,
                log: Some(format!("state={}", state)),
                error: (state == JobState::Failed).then(|| "migration failed".to_string()),
            })
        }

        async fn get_project_info(&self, _project_id: &str) -> Result<ProjectInfo, PlatformError> {
            Ok(ProjectInfo {
                staging_url: self.staging_url.clone(),
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
            Ok(Some("job-rollback".to_string()))
        }
    }

    fn handle() -> JobHandle {
        JobHandle {
            project_id: "p-1".to_string(),
            project_code: "abc123".to_string(),
            job_id: "job-1".to_string(),
        }
    }

    fn client(platform: Arc<ScriptedPlatform>) -> DeploymentClient {
        DeploymentClient::new(platform, DeploymentConfig::default(), PlatformConfig::default())
    }

    fn network() -> PlatformError {
        PlatformError::Network("connection reset".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn queued_running_succeeded() {
        let platform = Arc::new(ScriptedPlatform::with_states(vec![
            Ok(JobState::Queued),
            Ok(JobState::Running),
            Ok(JobState::Succeeded),
        ]));
        let result = client(platform.clone())
            .await_completion(&handle(), Duration::from_secs(300), CancellationSignal::never())
            .await
            .unwrap();

        assert_eq!(result.state, JobState::Succeeded);
        assert_eq!(result.polls, 3);
        assert_eq!(result.intervals.len(), 2);
        assert!(result.intervals.windows(2).all(|w| w[0] <= w[1]));
        assert!(result.intervals.iter().all(|d| *d >= Duration::from_millis(2000)));
        assert_eq!(result.log.as_deref(), Some("state=succeeded"));
        assert_eq!(platform.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_job_carries_log() {
        let platform = Arc::new(ScriptedPlatform::with_states(vec![
            Ok(JobState::Running),
            Ok(JobState::Failed),
        ]));
        let err = client(platform)
            .await_completion(&handle(), Duration::from_secs(300), CancellationSignal::never())
            .await
            .unwrap_err();
        match err {
            DeployError::Failed { job_id, message, log } => {
                assert_eq!(job_id, "job-1");
                assert_eq!(message, "migration failed");
                assert_eq!(log.as_deref(), Some("state=failed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn remote_timeout_is_not_retried() {
        let platform = Arc::new(ScriptedPlatform::with_states(vec![Ok(JobState::TimedOut)]));
        let err = client(platform.clone())
            .await_completion(&handle(), Duration::from_secs(300), CancellationSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::TimedOut { .. }));
        assert_eq!(platform.polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn local_timeout() {
        let platform = Arc::new(ScriptedPlatform::default());
        let err = client(platform)
            .await_completion(&handle(), Duration::from_secs(30), CancellationSignal::never())
            .await
            .unwrap_err();
        match err {
            DeployError::TimedOut { elapsed, .. } => assert!(elapsed >= Duration::from_secs(30)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_absorbed() {
        let platform = Arc::new(ScriptedPlatform::with_states(vec![
            Err(network()),
            Err(network()),
            Ok(JobState::Running),
            Err(network()),
            Ok(JobState::Succeeded),
        ]));
        let result = client(platform)
            .await_completion(&handle(), Duration::from_secs(300), CancellationSignal::never())
            .await
            .unwrap();
        assert_eq!(result.polls, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn too_many_consecutive_network_failures() {
        let platform = Arc::new(ScriptedPlatform::with_states(
            (0..10).map(|_| Err(network())).collect(),
        ));
        let err = client(platform)
            .await_completion(&handle(), Duration::from_secs(300), CancellationSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Network { attempts: 6, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_poll_error_stops_immediately() {
        let platform = Arc::new(ScriptedPlatform::with_states(vec![Err(
            PlatformError::Unauthorized("expired key".to_string()),
        )]));
        let err = client(platform)
            .await_completion(&handle(), Duration::from_secs(300), CancellationSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Platform(PlatformError::Unauthorized(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_local_wait() {
        let platform = Arc::new(ScriptedPlatform::default());
        let cancel = CancellationHandle::new();
        let signal = cancel.signal();
        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            cancel.cancel();
        });

        let err = client(platform)
            .await_completion(&handle(), Duration::from_secs(300), signal)
            .await
            .unwrap_err();
        trigger.await.unwrap();
        assert!(matches!(err, DeployError::Cancelled { job_id } if job_id == "job-1"));
    }

    #[tokio::test]
    async fn rejected_submission() {
        let platform = Arc::new(ScriptedPlatform {
            reject_submit: true,
            ..Default::default()
        });
        let project = Project::new("Task Manager", "", "/tmp", Schema::new()).unwrap();
        let err = client(platform).submit(&project).await.unwrap_err();
        assert!(matches!(err, DeployError::Rejected(msg) if msg.contains("Task Manager")));
    }

    #[tokio::test]
    async fn staging_url_prefers_platform_value() {
        let platform = Arc::new(ScriptedPlatform {
            staging_url: Some("https://tasks.example.test".to_string()),
            ..Default::default()
        });
        assert_eq!(client(platform).staging_url(&handle()).await, "https://tasks.example.test");

        let fallback = client(Arc::new(ScriptedPlatform::default()))
            .staging_url(&handle())
            .await;
        assert_eq!(fallback, "https://abc123-staging.customersblok.rationalbloks.com");
    }
}
