//! Remote platform and deployment polling configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the remote platform API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the platform API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Staging URL used when the platform does not report one.
    /// `{project_code}` is substituted.
    #[serde(default = "default_staging_url_template")]
    pub staging_url_template: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout_secs(),
            staging_url_template: default_staging_url_template(),
        }
    }
}

impl PlatformConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Fallback staging URL for a project code.
    pub fn staging_url(&self, project_code: &str) -> String {
        self.staging_url_template
            .replace("{project_code}", project_code)
    }
}

/// Backoff and timeout settings for deployment polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// First (and minimum) poll interval in milliseconds.
    #[serde(default = "default_poll_floor_ms")]
    pub poll_floor_ms: u64,

    /// Maximum poll interval in milliseconds.
    #[serde(default = "default_poll_ceiling_ms")]
    pub poll_ceiling_ms: u64,

    /// Additive jitter as a fraction of the current interval (0.0 - 1.0).
    #[serde(default = "default_jitter_ratio")]
    pub jitter_ratio: f64,

    /// Overall wait budget in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Consecutive network failures tolerated while polling.
    #[serde(default = "default_max_network_retries")]
    pub max_network_retries: u32,

    /// Whether `create` waits for the backend before generating code.
    #[serde(default = "default_true")]
    pub wait_for_deployment: bool,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            poll_floor_ms: default_poll_floor_ms(),
            poll_ceiling_ms: default_poll_ceiling_ms(),
            jitter_ratio: default_jitter_ratio(),
            timeout_secs: default_timeout_secs(),
            max_network_retries: default_max_network_retries(),
            wait_for_deployment: true,
        }
    }
}

impl DeploymentConfig {
    pub fn poll_floor(&self) -> Duration {
        Duration::from_millis(self.poll_floor_ms)
    }

    pub fn poll_ceiling(&self) -> Duration {
        Duration::from_millis(self.poll_ceiling_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://logicblok.rationalbloks.com".to_string()
}

fn default_api_key_env() -> String {
    "BLOK_API_KEY".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_staging_url_template() -> String {
    "https://{project_code}-staging.customersblok.rationalbloks.com".to_string()
}

fn default_poll_floor_ms() -> u64 {
    2_000
}

fn default_poll_ceiling_ms() -> u64 {
    15_000
}

fn default_jitter_ratio() -> f64 {
    0.2
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_network_retries() -> u32 {
    5
}
