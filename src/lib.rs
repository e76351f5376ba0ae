//! Configuration-driven solution packaging pipeline.
//!
//! Turns a versioned software component into one or more distributable,
//! variant-specific archive packages:
//! - flat two-level configuration with `{{section.key}}` templating
//! - dotted version management with bounded-component rollover
//! - a typed solution manifest rewritten from configuration per variant
//! - a fail-fast staged pipeline with guaranteed work-directory cleanup
//! - size-validated artifact emission, one file per requested variant
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod config;
pub mod envctx;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod publish;
pub mod tool;
pub mod version;

// Re-export commonly used types
pub use config::ConfigStore;
pub use error::{Error, Result, Warning};
pub use manifest::ManifestDocument;
pub use pipeline::{Orchestrator, PipelineContext, PipelineRun, RunStatus, Stage};
pub use publish::{PackageArtifact, Variant, VariantSelection};
pub use version::Version;
