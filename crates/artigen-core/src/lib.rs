//! Artigen Core Library
//!
//! Domain models and the artifact generation workflow: projects own typed
//! content, artifacts turn prompt templates into prompts, and the workflow
//! sends those prompts to a generation service and stores the result.

pub mod artifact;
pub mod config;
pub mod error;
pub mod generation;
pub mod project;

pub use artifact::model::{ArtifactType, Prompt, PromptTemplate};
pub use artifact::Artifact;
pub use config::ArtigenConfig;
pub use error::{ArtigenError, ArtigenResult};
pub use generation::client::{GenerationClient, HttpGenerationClient, ServiceConfig};
pub use generation::{generate_artifact, GenerationReport, GenerationRequest, GenerationWorkflow};
pub use project::model::Project;
pub use project::{initialize_project, InitRequest};
