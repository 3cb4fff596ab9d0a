//! Dependency installation for a generated project.

use crate::error::InstallError;
use async_trait::async_trait;
use blok_core::config::InstallConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

#[async_trait]
pub trait DependencyInstaller: Send + Sync {
    async fn install(&self, root: &Path) -> Result<(), InstallError>;

    /// Command shown to the user when installation was skipped or failed.
    fn manual_command(&self) -> String;
}

/// The configured package manager. `enabled` only decides whether a run
/// plans the install step; a request can still opt in when it is off.
pub fn from_config(config: &InstallConfig) -> Arc<dyn DependencyInstaller> {
    Arc::new(CommandInstaller::from_config(config))
}

/// Runs a package manager in the project root.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandInstaller {
    pub fn from_config(config: &InstallConfig) -> Self {
        Self::new(&config.program, config.args.clone(), config.timeout())
    }

    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }
}

#[async_trait]
impl DependencyInstaller for CommandInstaller {
    async fn install(&self, root: &Path) -> Result<(), InstallError> {
        tracing::info!(program = %self.program, root = %root.display(), "Installing dependencies");
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(root)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| InstallError::TimedOut {
                program: self.program.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| InstallError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(InstallError::Failed {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn manual_command(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Skips installation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstaller;

#[async_trait]
impl DependencyInstaller for NoopInstaller {
    async fn install(&self, root: &Path) -> Result<(), InstallError> {
        tracing::debug!(root = %root.display(), "Dependency install skipped");
        Ok(())
    }

    fn manual_command(&self) -> String {
        "npm install".to_string()
    }
}
