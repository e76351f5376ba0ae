//! Stage implementations for the packaging pipeline.

use super::Orchestrator;
use crate::config::template;
use crate::error::{Error, Result, Warning};
use crate::manifest::{MANIFEST_FILE, ManifestDocument, transform};
use crate::publish::PackagePublisher;
use crate::tool::ToolCommand;
use crate::version::Version;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Splits a comma-separated configuration list, dropping empty entries.
fn config_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Splits a configured command line into program and arguments.
///
/// Whitespace splitting only; arguments never pass through a shell.
fn split_command(line: &str) -> Option<(String, Vec<String>)> {
    let mut parts = line.split_whitespace().map(String::from);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

impl Orchestrator {
    /// Checks that every configured required input file exists. Fatal on the
    /// first missing file, before any external tool runs.
    pub(super) fn validate(&mut self) -> Result<()> {
        for entry in config_list(self.ctx.cfg.get("validation", "required_files")) {
            let path = self.ctx.resolve_path(&entry);
            if !path.exists() {
                return Err(Error::Validation { path });
            }
        }
        Ok(())
    }

    /// Removes prior output artifacts matching the current and legacy naming
    /// patterns so reruns are idempotent. Skipped when cleaning is disabled.
    pub(super) fn clean(&mut self) -> Result<()> {
        if !self.ctx.clean {
            log::debug!("clean disabled, keeping prior artifacts");
            return Ok(());
        }
        let Some(name) = template::lookup(&self.ctx.cfg, "solution", "name") else {
            return Ok(());
        };
        let ext = self.ctx.cfg.get_or("build", "archive_ext", "zip");

        // Current `{name}_v*` and legacy `{name}-v*` artifact names.
        let patterns = [
            format!("{}/{name}_v*.{ext}", self.ctx.output_dir.display()),
            format!("{}/{name}-v*.{ext}", self.ctx.output_dir.display()),
        ];
        for pattern in &patterns {
            let matches = glob::glob(pattern).map_err(|e| Error::Config {
                reason: format!("bad artifact pattern {pattern:?}: {e}"),
            })?;
            for path in matches.flatten() {
                log::info!("removing prior artifact {}", path.display());
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Runs the configured dependency-install tool, if any.
    pub(super) async fn install_deps(&mut self) -> Result<()> {
        let Some(tool) = self.ctx.cfg.get_non_empty("build", "install_tool") else {
            log::debug!("no install tool configured");
            return Ok(());
        };
        let command = ToolCommand::new(tool)
            .args(self.ctx.cfg.get_or("build", "install_args", "").split_whitespace())
            .current_dir(&self.ctx.project_dir);
        self.ctx.runner.run(&command).await?;
        Ok(())
    }

    /// Determines the run version and synchronizes it across descriptors.
    ///
    /// A version pinned in configuration is used verbatim; otherwise the
    /// component descriptor's version is incremented with rollover. Either
    /// way an unparsable version degrades to `0.0.1` with a warning rather
    /// than aborting.
    pub(super) fn bump_version(&mut self) -> Result<()> {
        let pinned = self
            .ctx
            .cfg
            .get_non_empty("solution", "version")
            .map(String::from);
        let mut fallback = None;
        let version = match pinned {
            Some(pinned) => match Version::parse(&pinned) {
                Ok(version) => version,
                Err(_) => {
                    fallback = Some(Warning::VersionFallback { input: pinned });
                    Version::fallback()
                }
            },
            None => {
                let raw = read_descriptor_version(&self.ctx.component_descriptor());
                match Version::parse(&raw) {
                    Ok(version) => version.increment(),
                    Err(_) => {
                        fallback = Some(Warning::VersionFallback { input: raw });
                        Version::fallback()
                    }
                }
            }
        };
        if let Some(warning) = fallback {
            self.push_warning(warning);
        }

        let descriptor = self.ctx.component_descriptor();
        let metadata = self.ctx.package_metadata();
        let targets: Vec<&Path> = [&descriptor, &metadata]
            .into_iter()
            .filter(|p| p.exists())
            .map(|p| p.as_path())
            .collect();
        crate::version::sync(&version, &targets)?;

        log::info!("run version {version}");
        self.set_version(version);
        Ok(())
    }

    /// Runs the external build tool with the selected build configuration.
    pub(super) async fn build(&mut self) -> Result<()> {
        let Some(tool) = self.ctx.cfg.get_non_empty("build", "tool") else {
            log::debug!("no build tool configured");
            return Ok(());
        };
        let command = ToolCommand::new(tool)
            .args(self.ctx.cfg.get_or("build", "args", "").split_whitespace())
            .args(["--configuration", self.ctx.build_configuration.as_str()])
            .current_dir(&self.ctx.project_dir);
        self.ctx.runner.run(&command).await?;
        Ok(())
    }

    /// Checks configured expected build outputs. Missing outputs are a
    /// warning; the build may have succeeded via an alternate path.
    pub(super) fn validate_build_output(&mut self) -> Result<()> {
        for entry in config_list(self.ctx.cfg.get("validation", "expected_outputs")) {
            let path = self.ctx.resolve_path(&entry);
            if !path.exists() {
                self.push_warning(Warning::MissingBuildOutput(path));
            }
        }
        Ok(())
    }

    /// Recreates the packaging work directory with a fresh default manifest.
    pub(super) fn init_packaging_structure(&mut self) -> Result<()> {
        if self.ctx.work_dir.exists() {
            std::fs::remove_dir_all(&self.ctx.work_dir)?;
        }
        std::fs::create_dir_all(&self.ctx.work_dir)?;

        let doc = ManifestDocument::default();
        doc.save(&self.ctx.work_dir.join(MANIFEST_FILE))?;
        self.set_manifest(doc);
        Ok(())
    }

    /// Applies configuration onto the manifest for the initial (unmanaged)
    /// pass and persists it.
    pub(super) fn transform_manifest(&mut self) -> Result<()> {
        let (reference, warning) =
            transform::load_component_reference(&self.ctx.component_descriptor(), &self.ctx.cfg);
        if let Some(warning) = warning {
            self.push_warning(warning);
        }

        let doc = self.manifest.as_mut().ok_or_else(|| Error::Config {
            reason: "packaging structure not initialized".into(),
        })?;
        transform::apply(doc, &self.ctx.cfg, &reference, false)?;
        doc.save(&self.ctx.work_dir.join(MANIFEST_FILE))?;

        self.set_reference(reference);
        Ok(())
    }

    /// Rebuilds the root component list from the component descriptor and
    /// persists the manifest. The list is fully replaced, never appended.
    pub(super) fn add_component_reference(&mut self) -> Result<()> {
        let reference = self.reference.clone().ok_or_else(|| Error::Config {
            reason: "component reference not loaded".into(),
        })?;
        let doc = self.manifest.as_mut().ok_or_else(|| Error::Config {
            reason: "packaging structure not initialized".into(),
        })?;
        transform::replace_root_components(doc, &reference);
        doc.save(&self.ctx.work_dir.join(MANIFEST_FILE))?;
        Ok(())
    }

    /// Packages each requested variant, strictly sequentially. The shared
    /// manifest file is re-written before every invocation, so the variants
    /// must never be reordered or overlapped.
    pub(super) async fn package_variants(&mut self) -> Result<()> {
        let publisher = PackagePublisher::new(&self.ctx.cfg, Arc::clone(&self.ctx.runner));
        let manifest_path = self.ctx.work_dir.join(MANIFEST_FILE);
        let output_dir = self.ctx.output_dir.clone();

        for variant in self.ctx.variants.clone() {
            let doc = self.manifest.as_mut().ok_or_else(|| Error::Config {
                reason: "packaging structure not initialized".into(),
            })?;
            let artifact = publisher
                .publish(doc, &manifest_path, variant, &output_dir)
                .await?;
            self.record_artifact(artifact);
        }
        Ok(())
    }

    /// Checks produced artifact sizes against the configured minimum.
    pub(super) fn validate_artifacts(&mut self) -> Result<()> {
        for warning in crate::publish::validate_artifacts(&self.ctx.cfg, &self.artifacts) {
            self.push_warning(warning);
        }
        Ok(())
    }

    /// Runs the configured post-packaging hook. Hook failure is a warning;
    /// it never discards an otherwise-successful run.
    pub(super) async fn run_post_hooks(&mut self) -> Result<()> {
        let Some(hook) = self.ctx.cfg.get_non_empty("scripts", "post_package") else {
            return Ok(());
        };
        let resolved = template::resolve(hook, &self.ctx.cfg);
        let Some((program, args)) = split_command(&resolved) else {
            return Ok(());
        };

        let command = ToolCommand::new(program)
            .args(args)
            .current_dir(&self.ctx.project_dir);
        if let Err(e) = self.ctx.runner.run(&command).await {
            self.push_warning(Warning::PostHook {
                command: resolved,
                reason: e.to_string(),
            });
        }
        Ok(())
    }
}

/// Reads the `version` field from a JSON descriptor, returning an empty
/// string when the file or field is unavailable. The caller treats the empty
/// string as unparsable and degrades to the fallback version.
fn read_descriptor_version(path: &Path) -> String {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
        .and_then(|doc| doc.get("version").and_then(Value::as_str).map(String::from))
        .unwrap_or_default()
}
