//! Summary of a run for humans and machines.

use crate::error::{EntityFailure, ErrorKind, StepError};
use crate::plan::RunMode;
use crate::run::{BackendSummary, PipelineRun, RunOutcome};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Local dev server opened after `npm run dev`.
const DEV_SERVER_URL: &str = "http://localhost:5173";

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: String,
    pub status: &'static str,
    pub attempts: u32,
    pub duration_ms: Option<u64>,
    pub error: Option<StepError>,
}

/// The first failure that stopped the run.
#[derive(Debug, Clone, Serialize)]
pub struct BlockingError {
    pub step: String,
    pub error: StepError,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub project: String,
    pub root: PathBuf,
    pub mode: RunMode,
    pub outcome: RunOutcome,
    pub steps: Vec<StepReport>,
    pub blocking_error: Option<BlockingError>,
    pub entity_failures: Vec<EntityFailure>,
    pub generated_files: Vec<PathBuf>,
    pub backend: Option<BackendSummary>,
    pub next_steps: Vec<String>,
}

impl RunReport {
    pub fn from_run(run: &PipelineRun, install_command: &str) -> Self {
        let steps: Vec<StepReport> = run
            .steps
            .iter()
            .map(|s| StepReport {
                name: s.kind.to_string(),
                status: s.status.label(),
                attempts: s.attempts,
                duration_ms: s.status.duration_ms(),
                error: s.status.error().cloned(),
            })
            .collect();

        let entity_failures: Vec<EntityFailure> = run
            .steps
            .iter()
            .filter_map(|s| {
                let table = s.kind.table()?;
                let error = s.status.error()?;
                Some(EntityFailure {
                    step: s.kind.to_string(),
                    table: table.to_string(),
                    error: error.clone(),
                })
            })
            .collect();

        let blocking_error = if entity_failures.len() > 1 {
            Some(BlockingError {
                step: "generate-entities".to_string(),
                error: StepError {
                    kind: ErrorKind::PartialGenerationFailure,
                    message: format!(
                        "{} entity artifact(s) failed to generate",
                        entity_failures.len()
                    ),
                },
            })
        } else {
            run.steps.iter().find_map(|s| {
                s.status.error().map(|e| BlockingError {
                    step: s.kind.to_string(),
                    error: e.clone(),
                })
            })
        };

        let outcome = run.outcome();
        let next_steps = next_steps(run, outcome, install_command);

        Self {
            run_id: run.id,
            project: run.project.name.clone(),
            root: run.root.clone(),
            mode: run.mode(),
            outcome,
            steps,
            blocking_error,
            entity_failures,
            generated_files: run.generated_files(),
            backend: run.backend.clone(),
            next_steps,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == RunOutcome::Succeeded
    }
}

fn next_steps(run: &PipelineRun, outcome: RunOutcome, install_command: &str) -> Vec<String> {
    let mut hints = Vec::new();
    if outcome != RunOutcome::Succeeded {
        hints.push(format!("blok resume {}", run.root.display()));
        return hints;
    }

    if let Some(url) = run.backend.as_ref().and_then(|b| b.staging_url.as_ref()) {
        hints.push(format!("Backend API: {}", url));
    }
    hints.push(format!("cd {}", run.root.display()));
    let installed = run
        .step(&crate::plan::StepKind::InstallDependencies)
        .is_some_and(|s| s.status.is_done());
    if installed {
        hints.push("npm run dev".to_string());
    } else {
        hints.push(format!("{} && npm run dev", install_command));
    }
    hints.push(format!("Open {}", DEV_SERVER_URL));
    hints
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.outcome {
            RunOutcome::Succeeded => "succeeded",
            RunOutcome::Failed => "failed",
            RunOutcome::Incomplete => "incomplete",
        };
        writeln!(f, "{} ({}) {}", self.project, self.mode, outcome)?;
        writeln!(f, "  root: {}", self.root.display())?;
        writeln!(f)?;

        for step in &self.steps {
            let duration = step
                .duration_ms
                .map(|ms| format!("{}ms", ms))
                .unwrap_or_default();
            write!(f, "  {:<8} {:<28} {:>8}", step.status, step.name, duration)?;
            if step.attempts > 1 {
                write!(f, "  (attempts: {})", step.attempts)?;
            }
            writeln!(f)?;
        }

        if let Some(blocking) = &self.blocking_error {
            writeln!(f)?;
            writeln!(f, "error at {}: {}", blocking.step, blocking.error)?;
        }
        for failure in &self.entity_failures {
            writeln!(f, "  {} ({}): {}", failure.step, failure.table, failure.error.message)?;
        }

        if let Some(backend) = &self.backend {
            writeln!(f)?;
            writeln!(f, "backend: project {} (job {})", backend.project_code, backend.job_id)?;
            if let Some(state) = backend.state {
                writeln!(f, "  deployment: {}", state)?;
            }
        }

        if !self.generated_files.is_empty() {
            writeln!(f)?;
            writeln!(f, "generated {} file(s)", self.generated_files.len())?;
        }

        if !self.next_steps.is_empty() {
            writeln!(f)?;
            writeln!(f, "next steps:")?;
            for hint in &self.next_steps {
                writeln!(f, "  {}", hint)?;
            }
        }
        Ok(())
    }
}
