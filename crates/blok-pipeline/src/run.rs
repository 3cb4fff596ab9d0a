//! Persisted state of one pipeline run.

use crate::error::StepError;
use crate::plan::{self, PlanOptions, RunMode, StepKind};
use blok_core::Project;
use blok_deploy::{JobHandle, JobState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Lifecycle of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running {
        started_at: DateTime<Utc>,
    },
    Done {
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    },
    Failed {
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        error: StepError,
    },
}

impl StepStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, StepStatus::Done { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running { .. } => "running",
            StepStatus::Done { .. } => "done",
            StepStatus::Failed { .. } => "failed",
        }
    }

    pub fn error(&self) -> Option<&StepError> {
        match self {
            StepStatus::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn duration_ms(&self) -> Option<u64> {
        match self {
            StepStatus::Done {
                started_at,
                finished_at,
            }
            | StepStatus::Failed {
                started_at,
                finished_at,
                ..
            } => Some((*finished_at - *started_at).num_milliseconds().max(0) as u64),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub kind: StepKind,
    pub depends_on: Vec<usize>,
    pub status: StepStatus,
    pub attempts: u32,
    /// Files this step wrote, relative to the project root.
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

/// What the run knows about the remote backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSummary {
    pub project_id: String,
    pub project_code: String,
    pub job_id: String,
    #[serde(default)]
    pub state: Option<JobState>,
    #[serde(default)]
    pub staging_url: Option<String>,
}

/// Overall state derived from the steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded,
    Failed,
    Incomplete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub project: Project,
    /// Directory the application lives in.
    pub root: PathBuf,
    pub options: PlanOptions,
    pub steps: Vec<StepRecord>,
    /// Present once the deployment was submitted; a resumed run polls this
    /// job instead of submitting again.
    #[serde(default)]
    pub deployment: Option<JobHandle>,
    #[serde(default)]
    pub backend: Option<BackendSummary>,
    /// API base URL baked into generated sources and `.env`.
    #[serde(default)]
    pub api_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PipelineRun {
    pub fn new(
        project: Project,
        root: impl Into<PathBuf>,
        options: PlanOptions,
        api_url: Option<String>,
    ) -> Self {
        let steps = plan::build(&project.schema, &options)
            .into_iter()
            .map(|p| StepRecord {
                kind: p.kind,
                depends_on: p.depends_on,
                status: StepStatus::Pending,
                attempts: 0,
                files: Vec::new(),
            })
            .collect();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project,
            root: root.into(),
            options,
            steps,
            deployment: None,
            backend: None,
            api_url,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mode(&self) -> RunMode {
        self.options.mode
    }

    pub fn step(&self, kind: &StepKind) -> Option<&StepRecord> {
        self.steps.iter().find(|s| &s.kind == kind)
    }

    /// Steps not yet done whose dependencies are all done, in plan order.
    pub fn ready_steps(&self) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s.status, StepStatus::Pending | StepStatus::Failed { .. }))
            .filter(|(_, s)| s.depends_on.iter().all(|d| self.steps[*d].status.is_done()))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn outcome(&self) -> RunOutcome {
        if self.steps.iter().all(|s| s.status.is_done()) {
            RunOutcome::Succeeded
        } else if self.steps.iter().any(|s| s.status.error().is_some()) {
            RunOutcome::Failed
        } else {
            RunOutcome::Incomplete
        }
    }

    pub fn mark_running(&mut self, index: usize) {
        let step = &mut self.steps[index];
        step.attempts += 1;
        step.status = StepStatus::Running {
            started_at: Utc::now(),
        };
        self.updated_at = Utc::now();
    }

    pub fn mark_done(&mut self, index: usize, files: Vec<PathBuf>) {
        let step = &mut self.steps[index];
        step.status = StepStatus::Done {
            started_at: started_at(&step.status),
            finished_at: Utc::now(),
        };
        step.files = files;
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self, index: usize, error: StepError) {
        let step = &mut self.steps[index];
        step.status = StepStatus::Failed {
            started_at: started_at(&step.status),
            finished_at: Utc::now(),
            error,
        };
        self.updated_at = Utc::now();
    }

    /// Steps interrupted mid-flight go back to pending. Returns how many.
    pub fn recover_interrupted(&mut self) -> usize {
        let mut count = 0;
        for step in &mut self.steps {
            if matches!(step.status, StepStatus::Running { .. }) {
                step.status = StepStatus::Pending;
                count += 1;
            }
        }
        count
    }

    /// Forget the submitted deployment so the next resume submits again.
    /// The submission step and everything downstream of it is reset.
    pub fn discard_deployment(&mut self) {
        self.deployment = None;
        self.backend = None;
        if let Some(submit) = self
            .steps
            .iter()
            .position(|s| s.kind == StepKind::SubmitDeployment)
        {
            self.reset_with_dependents(submit);
        }
    }

    fn reset_with_dependents(&mut self, index: usize) {
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            if self.steps[i].status != StepStatus::Pending {
                self.steps[i].status = StepStatus::Pending;
            }
            for (j, step) in self.steps.iter().enumerate() {
                if step.depends_on.contains(&i) && step.status != StepStatus::Pending {
                    stack.push(j);
                }
            }
        }
    }

    /// Every file written by a done step, in plan order.
    pub fn generated_files(&self) -> Vec<PathBuf> {
        self.steps
            .iter()
            .filter(|s| s.status.is_done())
            .flat_map(|s| s.files.iter().cloned())
            .collect()
    }
}

fn started_at(status: &StepStatus) -> DateTime<Utc> {
    match status {
        StepStatus::Running { started_at }
        | StepStatus::Done { started_at, .. }
        | StepStatus::Failed { started_at, .. } => *started_at,
        StepStatus::Pending => Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use blok_core::schema::Schema;
    use serde_json::json;

    fn run() -> PipelineRun {
        let schema = Schema::from_value(&json!({ "tasks": { "title": { "type": "text" } } })).unwrap();
        let project = Project::new("Task Manager", "", "/tmp/apps", schema).unwrap();
        let root = project.root();
        PipelineRun::new(project, root, PlanOptions::default(), None)
    }

    fn index(run: &PipelineRun, name: &str) -> usize {
        run.steps.iter().position(|s| s.kind.to_string() == name).unwrap()
    }

    #[test]
    fn only_roots_are_ready_initially() {
        let run = run();
        let ready: Vec<String> = run.ready_steps().iter().map(|i| run.steps[*i].kind.to_string()).collect();
        assert_eq!(ready, vec!["provision-template", "submit-deployment"]);
    }

    #[test]
    fn failed_steps_are_ready_again() {
        let mut run = run();
        let template = index(&run, "provision-template");
        run.mark_running(template);
        run.mark_failed(
            template,
            StepError {
                kind: ErrorKind::Template,
                message: "clone failed".into(),
            },
        );
        assert!(run.ready_steps().contains(&template));
        assert_eq!(run.outcome(), RunOutcome::Failed);
        assert_eq!(run.steps[template].attempts, 1);
    }

    #[test]
    fn running_steps_reload_as_pending() {
        let mut run = run();
        let submit = index(&run, "submit-deployment");
        run.mark_running(submit);
        let json = serde_json::to_string(&run).unwrap();
        let mut loaded: PipelineRun = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.recover_interrupted(), 1);
        assert_eq!(loaded.steps[submit].status, StepStatus::Pending);
        assert_eq!(loaded.steps[submit].attempts, 1);
    }

    #[test]
    fn discard_deployment_resets_downstream() {
        let mut run = run();
        for name in ["provision-template", "submit-deployment", "await-deployment", "generate-types"] {
            let i = index(&run, name);
            run.mark_running(i);
            run.mark_done(i, Vec::new());
        }
        run.deployment = Some(JobHandle {
            project_id: "p".into(),
            project_code: "c".into(),
            job_id: "j".into(),
        });

        run.discard_deployment();
        assert!(run.deployment.is_none());
        assert!(run.steps[index(&run, "provision-template")].status.is_done());
        assert!(run.steps[index(&run, "generate-types")].status.is_done());
        assert_eq!(run.steps[index(&run, "submit-deployment")].status, StepStatus::Pending);
        assert_eq!(run.steps[index(&run, "await-deployment")].status, StepStatus::Pending);
    }

    #[test]
    fn status_serializes_tagged() {
        let value = serde_json::to_value(StepStatus::Pending).unwrap();
        assert_eq!(value, json!({ "state": "pending" }));
    }
}
