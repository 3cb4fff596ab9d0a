//! Remote platform client for Blok.
//!
//! - [`platform`]: the [`PlatformApi`] seam and its wire-independent types
//! - [`http`]: the `reqwest` implementation
//! - [`client`]: submission and backoff polling on top of any [`PlatformApi`]

pub mod backoff;
pub mod cancel;
pub mod client;
pub mod error;
pub mod http;
pub mod platform;

pub use backoff::PollBackoff;
pub use cancel::{CancellationHandle, CancellationSignal};
pub use client::{DeploymentClient, DeploymentResult};
pub use error::{DeployError, PlatformError};
pub use http::HttpPlatform;
pub use platform::{
    DeploymentRequest, Environment, JobHandle, JobState, JobStatus, PlatformApi, ProjectInfo,
};
