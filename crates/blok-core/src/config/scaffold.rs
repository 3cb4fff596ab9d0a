//! Client application scaffolding configuration.
//!
//! Covers the starting file tree, the packages the generated code imports,
//! and the dependency install step.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where the starting file tree comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Git repository to clone.
    #[serde(default = "default_repository")]
    pub repository: String,

    /// Branch to clone.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Local directory to copy instead of cloning.
    #[serde(default)]
    pub local_path: Option<PathBuf>,

    #[serde(default = "default_clone_timeout_secs")]
    pub clone_timeout_secs: u64,

    /// Template views removed after generation (relative to `src/components/views`).
    #[serde(default = "default_cleanup_files")]
    pub cleanup_files: Vec<String>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            branch: default_branch(),
            local_path: None,
            clone_timeout_secs: default_clone_timeout_secs(),
            cleanup_files: default_cleanup_files(),
        }
    }
}

impl TemplateConfig {
    pub fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.clone_timeout_secs)
    }
}

/// Packages and defaults baked into generated sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodegenConfig {
    /// Package providing `createAuthApi`.
    #[serde(default = "default_auth_package")]
    pub auth_package: String,

    /// Package providing `initApi` / `getApi`.
    #[serde(default = "default_crud_package")]
    pub crud_package: String,

    /// API URL used when the backend URL is not known yet.
    #[serde(default = "default_api_url")]
    pub default_api_url: String,

    /// Environment variable the client reads the API URL from.
    #[serde(default = "default_api_url_env")]
    pub api_url_env: String,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            auth_package: default_auth_package(),
            crud_package: default_crud_package(),
            default_api_url: default_api_url(),
            api_url_env: default_api_url_env(),
        }
    }
}

/// Dependency install step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_program")]
    pub program: String,

    #[serde(default = "default_args")]
    pub args: Vec<String>,

    #[serde(default = "default_install_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_program(),
            args: default_args(),
            timeout_secs: default_install_timeout_secs(),
        }
    }
}

impl InstallConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_repository() -> String {
    "https://github.com/velosovictor/rationalbloksfront.git".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_clone_timeout_secs() -> u64 {
    120
}

fn default_cleanup_files() -> Vec<String> {
    [
        "ProjectsView.tsx",
        "ProjectSettingsView.tsx",
        "BillingView.tsx",
        "TemplatesView.tsx",
        "DocumentationViewNew.tsx",
        "JsonSchemaIDE.tsx",
        "PaymentSuccessView.tsx",
        "PaymentCancelView.tsx",
        "SupportView.tsx",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_auth_package() -> String {
    "@rationalbloks/universalfront".to_string()
}

fn default_crud_package() -> String {
    "@rationalbloks/frontbuilderblok".to_string()
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_url_env() -> String {
    "VITE_DATABASE_API_URL".to_string()
}

fn default_program() -> String {
    "npm".to_string()
}

fn default_args() -> Vec<String> {
    vec!["install".to_string()]
}

fn default_install_timeout_secs() -> u64 {
    300
}
