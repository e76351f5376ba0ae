//! Run-wide context shared by all pipeline stages.

use crate::config::ConfigStore;
use crate::publish::Variant;
use crate::tool::ToolRunner;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Build configuration passed to the external build tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BuildConfiguration {
    /// Development build.
    Debug,
    /// Optimized build.
    Release,
}

impl BuildConfiguration {
    /// Name as passed on the build tool command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }
}

/// Context for one pipeline run.
///
/// Holds the merged configuration, the resolved directory layout, and the
/// tool runner seam. One context serves exactly one run; concurrent runs
/// against the same working directory are unsupported and must be serialized
/// externally.
pub struct PipelineContext {
    /// Merged configuration (file values plus CLI overrides).
    pub cfg: ConfigStore,
    /// Project root; relative configuration paths resolve against this.
    pub project_dir: PathBuf,
    /// Transient packaging working directory, recreated fresh each run.
    pub work_dir: PathBuf,
    /// Output directory receiving the produced artifacts.
    pub output_dir: PathBuf,
    /// Package variants requested for this run, in packaging order.
    pub variants: Vec<Variant>,
    /// Whether the Clean stage removes prior artifacts.
    pub clean: bool,
    /// Build configuration forwarded to the build tool.
    pub build_configuration: BuildConfiguration,
    /// External tool invocation seam.
    pub runner: Arc<dyn ToolRunner>,
}

impl PipelineContext {
    /// Creates a context from configuration, deriving the directory layout
    /// from `build.output_dir` / `build.work_dir` (defaults `dist` /
    /// `.solpack`) relative to the project directory.
    pub fn new(
        cfg: ConfigStore,
        project_dir: PathBuf,
        variants: Vec<Variant>,
        clean: bool,
        build_configuration: BuildConfiguration,
        runner: Arc<dyn ToolRunner>,
    ) -> Self {
        let output_dir = project_dir.join(cfg.get_or("build", "output_dir", "dist"));
        let work_dir = project_dir.join(cfg.get_or("build", "work_dir", ".solpack"));
        Self {
            cfg,
            project_dir,
            work_dir,
            output_dir,
            variants,
            clean,
            build_configuration,
            runner,
        }
    }

    /// Resolves a configuration-supplied path against the project directory.
    pub fn resolve_path(&self, value: &str) -> PathBuf {
        let path = Path::new(value);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    /// Path of the component descriptor file (`build.component_descriptor`,
    /// default `component.json`).
    pub fn component_descriptor(&self) -> PathBuf {
        self.resolve_path(self.cfg.get_or("build", "component_descriptor", "component.json"))
    }

    /// Path of the packaging metadata file (`build.package_metadata`,
    /// default `package.json`).
    pub fn package_metadata(&self) -> PathBuf {
        self.resolve_path(self.cfg.get_or("build", "package_metadata", "package.json"))
    }
}
