//! Shared model for the Blok provisioning pipeline.
//!
//! - [`schema`]: the declarative table/field schema and its content version
//! - [`naming`]: identifier conversions used by generated sources
//! - [`project`]: project identity for a pipeline run
//! - [`config`]: YAML configuration

pub mod config;
pub mod naming;
pub mod project;
pub mod schema;

pub use config::{
    BlokConfig, CodegenConfig, ConfigError, DeploymentConfig, InstallConfig, LoggingConfig,
    PlatformConfig, StateConfig, TemplateConfig,
};
pub use project::Project;
pub use schema::{
    BUILTIN_USER_TABLE, FieldSpec, FieldType, ForeignKeyRef, Schema, SchemaError, SchemaVersion,
    TableSpec,
};
