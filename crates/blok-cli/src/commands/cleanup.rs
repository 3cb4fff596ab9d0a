//! `blok cleanup`: explicit removal or rollback of a remote project.
//!
//! Failed or cancelled runs leave their remote project in place; this is the
//! only path that touches it afterwards.

use super::{Output, open_store};
use anyhow::{Context, Result};
use blok_core::BlokConfig;
use blok_deploy::{DeploymentClient, Environment, HttpPlatform};
use blok_pipeline::RunStore;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

fn client(config: &BlokConfig) -> Result<DeploymentClient> {
    let platform = HttpPlatform::from_config(&config.platform).context("Platform client unavailable")?;
    Ok(DeploymentClient::new(
        Arc::new(platform),
        config.deployment.clone(),
        config.platform.clone(),
    ))
}

/// Accept either a remote project id or a project root whose saved run
/// recorded one.
fn resolve_project_id(config: &BlokConfig, project: &str) -> Result<String> {
    let path = Path::new(project);
    if !path.is_dir() {
        return Ok(project.to_string());
    }
    let root = std::path::absolute(path)?;
    let run = open_store(config)?
        .load(&root)?
        .with_context(|| format!("No saved run for {}", root.display()))?;
    run.backend
        .map(|b| b.project_id)
        .with_context(|| format!("Run for {} never submitted a deployment", root.display()))
}

pub async fn delete(config: &BlokConfig, project: &str) -> Result<()> {
    let project_id = resolve_project_id(config, project)?;
    client(config)?
        .delete_project(&project_id)
        .await
        .with_context(|| format!("Failed to delete project {}", project_id))?;
    println!("Deleted project {}", project_id);
    Ok(())
}

pub async fn rollback(
    config: &BlokConfig,
    project: &str,
    version: &str,
    environment: Environment,
    output: Output,
) -> Result<()> {
    let project_id = resolve_project_id(config, project)?;
    let job_id = client(config)?
        .rollback_project(&project_id, version, environment)
        .await
        .with_context(|| format!("Failed to roll back project {}", project_id))?;

    let result = json!({
        "project_id": project_id,
        "version": version,
        "environment": environment,
        "job_id": job_id,
    });
    output.emit(&result, || match &job_id {
        Some(job) => format!(
            "Rollback of {} to version {} on {} queued as job {}",
            project_id, version, environment, job
        ),
        None => format!(
            "Rollback of {} to version {} on {} requested",
            project_id, version, environment
        ),
    })
}
