//! Configuration types for Blok.
//!
//! Configuration is loaded from a single optional YAML file (`blok.yaml`).
//! Every section has defaults, so an empty file (or no file) is valid.
//!
//! # Sections
//!
//! - **platform**: remote API base URL, API key variable, request timeout
//! - **deployment**: poll backoff, overall timeout, network retry budget
//! - **template**: starting file tree and the template files to remove
//! - **codegen**: packages and defaults used by generated sources
//! - **install**: dependency install command
//! - **state**: where persisted pipeline runs live
//! - **logging**: default log filter

pub mod platform;
pub mod scaffold;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use platform::{DeploymentConfig, PlatformConfig};
pub use scaffold::{CodegenConfig, InstallConfig, TemplateConfig};

/// Complete Blok configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlokConfig {
    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub deployment: DeploymentConfig,

    #[serde(default)]
    pub template: TemplateConfig,

    #[serde(default)]
    pub codegen: CodegenConfig,

    #[serde(default)]
    pub install: InstallConfig,

    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Persisted run state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Directory holding one JSON file per pipeline run.
    #[serde(default = "default_runs_dir")]
    pub runs_dir: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            runs_dir: default_runs_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (e.g. "info", "blok_pipeline=debug").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_runs_dir() -> PathBuf {
    PathBuf::from(".blok/runs")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BlokConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise from `./blok.yaml` if present,
    /// otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new("blok.yaml");
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Reject values that make the pipeline misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.deployment;
        if d.poll_floor_ms == 0 {
            return Err(ConfigError::Config(
                "deployment.poll_floor_ms must be greater than zero".to_string(),
            ));
        }
        if d.poll_floor_ms > d.poll_ceiling_ms {
            return Err(ConfigError::Config(format!(
                "deployment.poll_floor_ms ({}) exceeds deployment.poll_ceiling_ms ({})",
                d.poll_floor_ms, d.poll_ceiling_ms
            )));
        }
        if !(0.0..=1.0).contains(&d.jitter_ratio) {
            return Err(ConfigError::Config(format!(
                "deployment.jitter_ratio must be between 0 and 1, got {}",
                d.jitter_ratio
            )));
        }
        if self.platform.base_url.trim().is_empty() {
            return Err(ConfigError::Config(
                "platform.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = BlokConfig::from_yaml("").unwrap();
        assert_eq!(config.deployment.poll_floor_ms, 2_000);
        assert_eq!(config.install.program, "npm");
        assert_eq!(config.install.timeout_secs, 300);
        assert_eq!(config.state.runs_dir, PathBuf::from(".blok/runs"));
        assert_eq!(config.template.cleanup_files.len(), 9);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = r#"
deployment:
  poll_floor_ms: 500
  poll_ceiling_ms: 4000
install:
  enabled: false
logging:
  level: debug
"#;
        let config = BlokConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.deployment.poll_floor_ms, 500);
        assert_eq!(config.deployment.poll_ceiling_ms, 4000);
        assert_eq!(config.deployment.max_network_retries, 5);
        assert!(!config.install.enabled);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.platform.api_key_env, "BLOK_API_KEY");
    }

    #[test]
    fn rejects_floor_above_ceiling() {
        let yaml = "deployment:\n  poll_floor_ms: 9000\n  poll_ceiling_ms: 1000\n";
        let err = BlokConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Config(_)));
    }

    #[test]
    fn rejects_out_of_range_jitter() {
        let yaml = "deployment:\n  jitter_ratio: 1.5\n";
        assert!(BlokConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn staging_url_substitutes_project_code() {
        let config = BlokConfig::default();
        assert_eq!(
            config.platform.staging_url("abc123"),
            "https://abc123-staging.customersblok.rationalbloks.com"
        );
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "state:\n  runs_dir: /var/lib/blok").unwrap();
        let config = BlokConfig::from_file(file.path()).unwrap();
        assert_eq!(config.state.runs_dir, PathBuf::from("/var/lib/blok"));
    }
}
