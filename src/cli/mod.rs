//! Command line interface for the packaging pipeline.

mod args;

pub use args::Args;

use crate::config::ConfigStore;
use crate::envctx::CiContext;
use crate::error::Error;
use crate::pipeline::{Orchestrator, PipelineContext, RunStatus};
use crate::tool::ProcessRunner;
use std::path::PathBuf;
use std::sync::Arc;

/// Main CLI entry point. Returns the process exit code.
pub async fn run() -> anyhow::Result<i32> {
    let args = Args::parse_args();
    if let Err(reason) = args.validate() {
        eprintln!("Invalid arguments: {reason}");
        return Ok(2);
    }

    let ci = CiContext::detect(args.ci_mode);

    let cfg = match ConfigStore::load(&args.config) {
        Ok(cfg) => cfg.with_overrides(args.overrides()),
        Err(e @ Error::ConfigNotFound { .. }) => {
            eprintln!("{}", ci.format_error(&e.to_string()));
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };

    let project_dir = args
        .config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let runner = Arc::new(ProcessRunner::new(crate::tool::timeout_from(&cfg)));
    let ctx = PipelineContext::new(
        cfg,
        project_dir,
        args.package_variant.variants(),
        args.clean,
        args.build_configuration,
        runner,
    );

    let run = Orchestrator::new(ctx).run().await;

    for warning in &run.warnings {
        println!("{}", ci.format_warning(&warning.to_string()));
    }

    match &run.status {
        RunStatus::Success => {
            println!("{}", ci.format_section("Artifacts"));
            for artifact in &run.artifacts {
                println!(
                    "  {} ({} bytes) [{}]",
                    artifact.path.display(),
                    artifact.size,
                    artifact.variant.tag()
                );
            }
            if !run.warnings.is_empty() {
                println!("completed with {} warning(s)", run.warnings.len());
            }
            Ok(0)
        }
        RunStatus::Failed { stage, cause } => {
            eprintln!("{}", ci.format_error(&format!("stage {stage} failed: {cause}")));
            Ok(1)
        }
    }
}
