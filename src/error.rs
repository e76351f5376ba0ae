//! Error types for packaging pipeline operations.
//!
//! Fatal conditions abort the pipeline at the failing stage; non-fatal
//! conditions are accumulated as [`Warning`]s on the run and never demote a
//! successful run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for all pipeline operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be found
    #[error("configuration file not found: {}", path.display())]
    ConfigNotFound {
        /// Path that was probed
        path: PathBuf,
    },

    /// Configuration is present but unusable
    #[error("configuration error: {reason}")]
    Config {
        /// Reason for the error
        reason: String,
    },

    /// Required input file missing before the build ran
    #[error("validation failed: required file missing: {}", path.display())]
    Validation {
        /// Missing file path
        path: PathBuf,
    },

    /// A shelled-out build/packaging tool failed
    #[error("external tool `{tool}` failed: {reason}")]
    ExternalTool {
        /// Program name as invoked
        tool: String,
        /// Exit status or spawn failure description
        reason: String,
    },

    /// Version string did not match the dotted-integer form
    ///
    /// Recoverable at the bump-version call site, which degrades to the
    /// fixed default `0.0.1` with a recorded warning.
    #[error("unparsable version string: {input:?}")]
    VersionFormat {
        /// Offending input
        input: String,
    },

    /// Required identity/publisher field missing during manifest transformation
    #[error("missing required manifest field: {field}")]
    ManifestField {
        /// Dotted config key of the missing field
        field: String,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Non-fatal conditions accumulated on a [`PipelineRun`](crate::pipeline::PipelineRun).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// An expected build output was not found after the build stage
    MissingBuildOutput(PathBuf),

    /// Component descriptor version was unparsable; the run fell back to 0.0.1
    VersionFallback {
        /// The string that failed to parse
        input: String,
    },

    /// Component descriptor was unreadable; schema name derived from config
    DescriptorFallback {
        /// Path of the descriptor that could not be read
        path: PathBuf,
    },

    /// Produced artifact smaller than the configured minimum size
    ArtifactSize {
        /// Artifact path
        path: PathBuf,
        /// Actual byte size
        size: u64,
        /// Configured minimum
        minimum: u64,
    },

    /// A user-supplied post-packaging hook failed
    PostHook {
        /// Hook command as configured
        command: String,
        /// Failure description
        reason: String,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingBuildOutput(path) => {
                write!(f, "expected build output missing: {}", path.display())
            }
            Self::VersionFallback { input } => {
                write!(f, "unparsable version {input:?}, using fallback 0.0.1")
            }
            Self::DescriptorFallback { path } => write!(
                f,
                "component descriptor unreadable ({}), deriving schema name from configuration",
                path.display()
            ),
            Self::ArtifactSize {
                path,
                size,
                minimum,
            } => write!(
                f,
                "artifact {} is {size} bytes, below the configured minimum of {minimum}",
                path.display()
            ),
            Self::PostHook { command, reason } => {
                write!(f, "post-packaging hook `{command}` failed: {reason}")
            }
        }
    }
}
