//! Client code generation for Blok projects.
//!
//! - [`type_mapper`]: schema field types to target-language types
//! - [`generator`]: one [`Artifact`] per kind, pure over the schema
//! - [`writer`]: atomic writes that preserve hand-edited text outside
//!   generated regions

pub mod artifact;
pub mod error;
pub mod generator;
pub mod region;
pub mod templates;
pub mod type_mapper;
pub mod writer;

pub use artifact::{Artifact, ArtifactKind};
pub use error::CodegenError;
pub use generator::{CodeGenerator, GeneratorOptions};
pub use type_mapper::{TargetType, UnsupportedType};
pub use writer::{ArtifactWriter, WriteOutcome, WriteResult};
