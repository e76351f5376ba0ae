//! Staged pipeline orchestration.
//!
//! Stages run strictly in order; the first failure stops scheduling, the
//! transient packaging working directory is removed best-effort, and the run
//! terminates with the originating stage name and cause. Non-fatal
//! conditions accumulate as warnings and never demote a successful run.

mod context;
mod stages;

pub use context::{BuildConfiguration, PipelineContext};

use crate::error::{Error, Warning};
use crate::manifest::ManifestDocument;
use crate::manifest::transform::ComponentReference;
use crate::publish::PackageArtifact;
use crate::version::Version;

/// One ordered, independently failable pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Required input files exist.
    Validate,
    /// Remove prior output artifacts (when enabled).
    Clean,
    /// Install build dependencies.
    InstallDeps,
    /// Increment and synchronize the component version.
    BumpVersion,
    /// Run the external build tool.
    Build,
    /// Expected build outputs exist (warning only).
    ValidateBuildOutput,
    /// Recreate the packaging work directory with a fresh manifest.
    InitPackagingStructure,
    /// Apply configuration onto the manifest.
    TransformManifest,
    /// Rebuild the root component list from the component descriptor.
    AddComponentReference,
    /// Package each requested variant.
    PackageVariants,
    /// Check artifact sizes (warning only).
    ValidateArtifacts,
    /// Run the user post-packaging hook (warning only).
    RunPostHooks,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Self; 12] = [
        Self::Validate,
        Self::Clean,
        Self::InstallDeps,
        Self::BumpVersion,
        Self::Build,
        Self::ValidateBuildOutput,
        Self::InitPackagingStructure,
        Self::TransformManifest,
        Self::AddComponentReference,
        Self::PackageVariants,
        Self::ValidateArtifacts,
        Self::RunPostHooks,
    ];

    /// Human-readable stage name, as surfaced in failure reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Clean => "clean",
            Self::InstallDeps => "install-deps",
            Self::BumpVersion => "bump-version",
            Self::Build => "build",
            Self::ValidateBuildOutput => "validate-build-output",
            Self::InitPackagingStructure => "init-packaging-structure",
            Self::TransformManifest => "transform-manifest",
            Self::AddComponentReference => "add-component-reference",
            Self::PackageVariants => "package-variants",
            Self::ValidateArtifacts => "validate-artifacts",
            Self::RunPostHooks => "run-post-hooks",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminal status of a pipeline run.
#[derive(Debug)]
pub enum RunStatus {
    /// All stages completed; warnings may still be attached.
    Success,
    /// A stage failed; no later stage was scheduled.
    Failed {
        /// The stage that failed.
        stage: Stage,
        /// Underlying cause.
        cause: Error,
    },
}

/// Outcome of one pipeline run.
#[derive(Debug)]
pub struct PipelineRun {
    /// Artifacts produced before the run terminated.
    pub artifacts: Vec<PackageArtifact>,
    /// Accumulated non-fatal warnings.
    pub warnings: Vec<Warning>,
    /// Terminal status.
    pub status: RunStatus,
}

impl PipelineRun {
    /// Whether the run reached a successful terminal status.
    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Success)
    }
}

/// Drives the ordered stage sequence for one run.
pub struct Orchestrator {
    ctx: PipelineContext,
    warnings: Vec<Warning>,
    artifacts: Vec<PackageArtifact>,
    reference: Option<ComponentReference>,
    manifest: Option<ManifestDocument>,
}

impl Orchestrator {
    /// Creates an orchestrator for the given context.
    pub fn new(ctx: PipelineContext) -> Self {
        Self {
            ctx,
            warnings: Vec::new(),
            artifacts: Vec::new(),
            reference: None,
            manifest: None,
        }
    }

    /// Runs all stages in order, fail-fast.
    pub async fn run(mut self) -> PipelineRun {
        for stage in Stage::ALL {
            log::info!("stage {stage} starting");
            if let Err(cause) = self.execute(stage).await {
                log::error!("stage {stage} failed: {cause}");
                self.cleanup_work_dir();
                return PipelineRun {
                    artifacts: self.artifacts,
                    warnings: self.warnings,
                    status: RunStatus::Failed { stage, cause },
                };
            }
            log::info!("stage {stage} finished");
        }

        PipelineRun {
            artifacts: self.artifacts,
            warnings: self.warnings,
            status: RunStatus::Success,
        }
    }

    async fn execute(&mut self, stage: Stage) -> crate::error::Result<()> {
        match stage {
            Stage::Validate => self.validate(),
            Stage::Clean => self.clean(),
            Stage::InstallDeps => self.install_deps().await,
            Stage::BumpVersion => self.bump_version(),
            Stage::Build => self.build().await,
            Stage::ValidateBuildOutput => self.validate_build_output(),
            Stage::InitPackagingStructure => self.init_packaging_structure(),
            Stage::TransformManifest => self.transform_manifest(),
            Stage::AddComponentReference => self.add_component_reference(),
            Stage::PackageVariants => self.package_variants().await,
            Stage::ValidateArtifacts => self.validate_artifacts(),
            Stage::RunPostHooks => self.run_post_hooks().await,
        }
    }

    /// Best-effort removal of the transient packaging working directory.
    fn cleanup_work_dir(&self) {
        if self.ctx.work_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.ctx.work_dir) {
                log::warn!(
                    "failed to remove work directory {}: {e}",
                    self.ctx.work_dir.display()
                );
            }
        }
    }

    fn push_warning(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Merges the run version into the working configuration, where the
    /// manifest transform reads it from.
    fn set_version(&mut self, version: Version) {
        self.ctx.cfg = self
            .ctx
            .cfg
            .with_overrides([("solution", "version", version.to_string().as_str())]);
    }

    fn set_reference(&mut self, reference: ComponentReference) {
        self.reference = Some(reference);
    }

    fn set_manifest(&mut self, manifest: ManifestDocument) {
        self.manifest = Some(manifest);
    }

    fn record_artifact(&mut self, artifact: PackageArtifact) {
        self.artifacts.push(artifact);
    }
}
