//! Package publishing: per-variant manifest finalization, packaging tool
//! invocation, and artifact validation.
//!
//! When both variants are requested the manifest file is read-modify-written
//! twice; the two packaging invocations are strictly sequential within one
//! run, never reordered or overlapped.

use crate::config::ConfigStore;
use crate::error::{Error, Result, Warning};
use crate::manifest::{ManifestDocument, transform};
use crate::tool::{ToolCommand, ToolRunner};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One packaging form of the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Editable/development form; finalization flag off.
    Unmanaged,
    /// Locked/production form; finalization flag on.
    Managed,
}

impl Variant {
    /// Tag used in artifact filenames and tool arguments.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Unmanaged => "unmanaged",
            Self::Managed => "managed",
        }
    }

    /// Finalization flag value for this variant.
    pub fn managed(&self) -> bool {
        matches!(self, Self::Managed)
    }
}

/// Variant selection as requested on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum VariantSelection {
    /// Only the editable form.
    Unmanaged,
    /// Only the locked form.
    Managed,
    /// Both forms, unmanaged first.
    Both,
}

impl VariantSelection {
    /// Expands the selection into the ordered variant list for a run.
    pub fn variants(&self) -> Vec<Variant> {
        match self {
            Self::Unmanaged => vec![Variant::Unmanaged],
            Self::Managed => vec![Variant::Managed],
            Self::Both => vec![Variant::Unmanaged, Variant::Managed],
        }
    }
}

/// A produced, on-disk package file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageArtifact {
    /// Logical solution name.
    pub name: String,
    /// Variant this artifact was packaged as.
    pub variant: Variant,
    /// Location on disk.
    pub path: PathBuf,
    /// Byte size, taken after the packaging tool exited.
    pub size: u64,
}

/// Drives the external packaging tool once per requested variant.
pub struct PackagePublisher {
    runner: Arc<dyn ToolRunner>,
    tool: String,
    archive_ext: String,
}

impl PackagePublisher {
    /// Creates a publisher reading the tool name (`build.pack_tool`, default
    /// `pack`) and archive extension (`build.archive_ext`, default `zip`)
    /// from configuration.
    pub fn new(cfg: &ConfigStore, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            runner,
            tool: cfg.get_or("build", "pack_tool", "pack").to_string(),
            archive_ext: cfg.get_or("build", "archive_ext", "zip").to_string(),
        }
    }

    /// Destination filename for a variant:
    /// `{componentName}_v{version}_{variant}.{archiveExt}`.
    pub fn artifact_path(&self, output_dir: &Path, doc: &ManifestDocument, variant: Variant) -> PathBuf {
        output_dir.join(format!(
            "{}_v{}_{}.{}",
            doc.identity.unique_name,
            doc.identity.version,
            variant.tag(),
            self.archive_ext
        ))
    }

    /// Packages one variant.
    ///
    /// Toggles the manifest finalization flag, persists the manifest, invokes
    /// the packaging tool, and stats the produced file.
    ///
    /// # Errors
    ///
    /// [`Error::ExternalTool`] when the tool fails or produces no artifact.
    pub async fn publish(
        &self,
        doc: &mut ManifestDocument,
        manifest_path: &Path,
        variant: Variant,
        output_dir: &Path,
    ) -> Result<PackageArtifact> {
        transform::set_finalization(doc, variant.managed());
        doc.save(manifest_path)?;

        std::fs::create_dir_all(output_dir)?;
        let destination = self.artifact_path(output_dir, doc, variant);

        let command = ToolCommand::new(&self.tool)
            .arg("--manifest")
            .arg(manifest_path.display().to_string())
            .arg("--variant")
            .arg(variant.tag())
            .arg("--out")
            .arg(destination.display().to_string());
        self.runner.run(&command).await?;

        let metadata = std::fs::metadata(&destination).map_err(|e| Error::ExternalTool {
            tool: self.tool.clone(),
            reason: format!(
                "exited successfully but produced no artifact at {}: {e}",
                destination.display()
            ),
        })?;

        log::info!(
            "packaged {} variant at {} ({} bytes)",
            variant.tag(),
            destination.display(),
            metadata.len()
        );

        Ok(PackageArtifact {
            name: doc.identity.unique_name.clone(),
            variant,
            path: destination,
            size: metadata.len(),
        })
    }
}

/// Checks each artifact's byte size against the configured minimum
/// (`validation.min_package_bytes`).
///
/// Undersized artifacts are a sanity-check warning, never a failure.
pub fn validate_artifacts(cfg: &ConfigStore, artifacts: &[PackageArtifact]) -> Vec<Warning> {
    let minimum: u64 = cfg
        .get("validation", "min_package_bytes")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    artifacts
        .iter()
        .filter(|a| a.size < minimum)
        .map(|a| Warning::ArtifactSize {
            path: a.path.clone(),
            size: a.size,
            minimum,
        })
        .collect()
}
