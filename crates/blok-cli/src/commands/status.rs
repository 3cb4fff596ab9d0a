//! `blok status`: saved runs from the run store.

use super::{Output, open_store};
use anyhow::{Context, Result};
use blok_core::BlokConfig;
use blok_pipeline::{RunReport, RunStore, install};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct RunSummary {
    run_id: String,
    project: String,
    root: PathBuf,
    outcome: blok_pipeline::RunOutcome,
    updated_at: chrono::DateTime<chrono::Utc>,
}

pub fn execute(config: &BlokConfig, root: Option<&Path>, output: Output) -> Result<()> {
    let store = open_store(config)?;

    match root {
        Some(root) => {
            let root = std::path::absolute(root)
                .with_context(|| format!("Invalid project root: {}", root.display()))?;
            let run = store
                .load(&root)?
                .with_context(|| format!("No saved run for {}", root.display()))?;
            let install_command = install::from_config(&config.install).manual_command();
            let report = RunReport::from_run(&run, &install_command);
            output.emit(&report, || report.to_string())
        }
        None => {
            let runs: Vec<RunSummary> = store
                .list()?
                .into_iter()
                .map(|run| RunSummary {
                    run_id: run.id.to_string(),
                    outcome: run.outcome(),
                    project: run.project.name,
                    root: run.root,
                    updated_at: run.updated_at,
                })
                .collect();

            output.emit(&runs, || {
                if runs.is_empty() {
                    return "No saved runs.".to_string();
                }
                runs.iter()
                    .map(|r| {
                        format!(
                            "{:<11} {:<24} {}  ({})",
                            format!("{:?}", r.outcome).to_lowercase(),
                            r.project,
                            r.root.display(),
                            r.updated_at.format("%Y-%m-%d %H:%M")
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}
