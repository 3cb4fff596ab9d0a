//! Subcommand implementations and the helpers they share.

pub mod cleanup;
pub mod run;
pub mod status;
pub mod validate;

use anyhow::{Context, Result};
use blok_core::BlokConfig;
use blok_pipeline::{FileRunStore, RunReport};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// How results are printed. Logs always go to stderr.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", human());
        }
        Ok(())
    }

    /// Print a report; an unsuccessful run becomes the command's error.
    pub fn report(&self, report: &RunReport) -> Result<()> {
        self.emit(report, || report.to_string())?;
        if !report.succeeded() {
            anyhow::bail!(
                "Run {} did not complete ({})",
                report.run_id,
                report
                    .blocking_error
                    .as_ref()
                    .map(|b| b.step.as_str())
                    .unwrap_or("incomplete")
            );
        }
        Ok(())
    }
}

/// Read a schema document. YAML is accepted for `.yaml`/`.yml`, JSON otherwise.
pub fn read_schema(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema: {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let document = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML schema: {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON schema: {}", path.display()))?
    };
    Ok(document)
}

pub fn open_store(config: &BlokConfig) -> Result<FileRunStore> {
    FileRunStore::new(&config.state.runs_dir).with_context(|| {
        format!(
            "Failed to open run store: {}",
            config.state.runs_dir.display()
        )
    })
}
