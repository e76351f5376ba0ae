//! End-to-end pipeline scenarios with an injected tool runner.

use async_trait::async_trait;
use solpack::error::{Error, Warning};
use solpack::pipeline::{BuildConfiguration, Orchestrator, PipelineContext, RunStatus, Stage};
use solpack::publish::VariantSelection;
use solpack::tool::{ToolCommand, ToolOutput, ToolRunner};
use solpack::{ConfigStore, Result, Variant};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Records every invocation; fabricates artifacts for the packaging tool and
/// fails for configured program names.
struct MockRunner {
    calls: Mutex<Vec<ToolCommand>>,
    fail_programs: Vec<String>,
    artifact_bytes: usize,
}

impl MockRunner {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_programs: Vec::new(),
            artifact_bytes: 2048,
        }
    }

    fn failing_on(program: &str) -> Self {
        Self {
            fail_programs: vec![program.to_string()],
            ..Self::new()
        }
    }

    fn with_artifact_bytes(bytes: usize) -> Self {
        Self {
            artifact_bytes: bytes,
            ..Self::new()
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ToolRunner for MockRunner {
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        self.calls.lock().unwrap().push(command.clone());

        if self.fail_programs.iter().any(|p| p == command.program()) {
            return Err(Error::ExternalTool {
                tool: command.program().to_string(),
                reason: "exit code 1: induced failure".into(),
            });
        }

        // The packaging tool contract: the artifact exists at --out on exit 0.
        if command.program() == "pack" {
            let args = command.arg_list();
            let out = args
                .iter()
                .position(|a| a == "--out")
                .and_then(|i| args.get(i + 1))
                .expect("pack invoked without --out");
            let path = Path::new(out);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, vec![0u8; self.artifact_bytes]).unwrap();
        }

        Ok(ToolOutput::default())
    }
}

const BASE_CFG: &str = "\
solution:
  name: Acme
  version: 1.2.3
publisher:
  name: AcmeCorp
  prefix: acme
";

fn write_descriptor(dir: &Path, version: &str) {
    std::fs::write(
        dir.join("component.json"),
        format!(r#"{{"namespace":"Acme","constructor":"Widget","version":"{version}"}}"#),
    )
    .unwrap();
}

fn context(
    dir: &TempDir,
    cfg_text: &str,
    selection: VariantSelection,
    runner: Arc<MockRunner>,
) -> PipelineContext {
    PipelineContext::new(
        ConfigStore::parse(cfg_text),
        dir.path().to_path_buf(),
        selection.variants(),
        true,
        BuildConfiguration::Release,
        runner,
    )
}

#[tokio::test]
async fn both_variants_produce_two_named_artifacts() {
    let dir = TempDir::new().unwrap();
    write_descriptor(dir.path(), "0.0.1");
    let runner = Arc::new(MockRunner::new());

    let ctx = context(&dir, BASE_CFG, VariantSelection::Both, Arc::clone(&runner));
    let run = Orchestrator::new(ctx).run().await;

    assert!(run.is_success(), "status: {:?}", run.status);
    assert_eq!(run.artifacts.len(), 2);
    assert_eq!(run.artifacts[0].variant, Variant::Unmanaged);
    assert_eq!(run.artifacts[1].variant, Variant::Managed);

    for (artifact, expected) in run.artifacts.iter().zip([
        "Acme_v1.2.3_unmanaged.zip",
        "Acme_v1.2.3_managed.zip",
    ]) {
        assert_eq!(artifact.path.file_name().unwrap().to_str().unwrap(), expected);
        assert!(artifact.path.exists(), "missing {}", artifact.path.display());
    }
}

#[tokio::test]
async fn missing_required_input_fails_before_any_tool_invocation() {
    let dir = TempDir::new().unwrap();
    write_descriptor(dir.path(), "0.0.1");
    let cfg = format!("{BASE_CFG}validation:\n  required_files: input/control.ts\n");
    let runner = Arc::new(MockRunner::new());

    let ctx = context(&dir, &cfg, VariantSelection::Unmanaged, Arc::clone(&runner));
    let run = Orchestrator::new(ctx).run().await;

    match run.status {
        RunStatus::Failed { stage, cause } => {
            assert_eq!(stage, Stage::Validate);
            assert!(matches!(cause, Error::Validation { .. }));
        }
        RunStatus::Success => panic!("run must fail"),
    }
    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn malformed_version_falls_back_with_warning() {
    let dir = TempDir::new().unwrap();
    write_descriptor(dir.path(), "0.0.1");
    let cfg = "\
solution:
  name: Acme
  version: '7'
publisher:
  name: AcmeCorp
";
    let runner = Arc::new(MockRunner::new());

    let ctx = context(&dir, cfg, VariantSelection::Unmanaged, runner);
    let run = Orchestrator::new(ctx).run().await;

    assert!(run.is_success(), "status: {:?}", run.status);
    assert!(run
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::VersionFallback { input } if input == "7")));
    assert_eq!(
        run.artifacts[0].path.file_name().unwrap().to_str().unwrap(),
        "Acme_v0.0.1_unmanaged.zip"
    );
}

#[tokio::test]
async fn undersized_artifact_warns_but_run_succeeds() {
    let dir = TempDir::new().unwrap();
    write_descriptor(dir.path(), "0.0.1");
    let cfg = format!("{BASE_CFG}validation:\n  min_package_bytes: 1024\n");
    let runner = Arc::new(MockRunner::with_artifact_bytes(200));

    let ctx = context(&dir, &cfg, VariantSelection::Unmanaged, runner);
    let run = Orchestrator::new(ctx).run().await;

    assert!(run.is_success(), "status: {:?}", run.status);
    let sizes: Vec<_> = run
        .warnings
        .iter()
        .filter(|w| matches!(w, Warning::ArtifactSize { size: 200, minimum: 1024, .. }))
        .collect();
    assert_eq!(sizes.len(), 1);
}

#[tokio::test]
async fn tool_failure_removes_transient_work_directory() {
    let dir = TempDir::new().unwrap();
    write_descriptor(dir.path(), "0.0.1");
    let runner = Arc::new(MockRunner::failing_on("pack"));

    let ctx = context(&dir, BASE_CFG, VariantSelection::Unmanaged, runner);
    let work_dir = ctx.work_dir.clone();
    let run = Orchestrator::new(ctx).run().await;

    match run.status {
        RunStatus::Failed { stage, cause } => {
            assert_eq!(stage, Stage::PackageVariants);
            assert!(matches!(cause, Error::ExternalTool { .. }));
        }
        RunStatus::Success => panic!("run must fail"),
    }
    assert!(!work_dir.exists(), "work directory must be cleaned up");
}

#[tokio::test]
async fn descriptor_version_is_incremented_and_synced() {
    let dir = TempDir::new().unwrap();
    write_descriptor(dir.path(), "0.0.99");
    std::fs::write(
        dir.path().join("package.json"),
        r#"{"name":"acme-widget","version":"0.0.99"}"#,
    )
    .unwrap();

    // No version pinned in configuration: bump from the descriptor.
    let cfg = "\
solution:
  name: Acme
publisher:
  name: AcmeCorp
";
    let runner = Arc::new(MockRunner::new());
    let ctx = context(&dir, cfg, VariantSelection::Unmanaged, runner);
    let run = Orchestrator::new(ctx).run().await;

    assert!(run.is_success(), "status: {:?}", run.status);
    assert_eq!(
        run.artifacts[0].path.file_name().unwrap().to_str().unwrap(),
        "Acme_v0.1.0_unmanaged.zip"
    );

    for file in ["component.json", "package.json"] {
        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(file)).unwrap())
                .unwrap();
        assert_eq!(doc["version"], "0.1.0", "{file} out of sync");
    }
}

#[tokio::test]
async fn clean_removes_stale_artifacts() {
    let dir = TempDir::new().unwrap();
    write_descriptor(dir.path(), "0.0.1");
    let dist = dir.path().join("dist");
    std::fs::create_dir_all(&dist).unwrap();
    let stale = dist.join("Acme_v0.0.1_unmanaged.zip");
    let legacy = dist.join("Acme-v0.0.1.zip");
    let unrelated = dist.join("Other_v1.0.0_unmanaged.zip");
    for path in [&stale, &legacy, &unrelated] {
        std::fs::write(path, b"stale").unwrap();
    }

    let runner = Arc::new(MockRunner::new());
    let ctx = context(&dir, BASE_CFG, VariantSelection::Unmanaged, runner);
    let run = Orchestrator::new(ctx).run().await;

    assert!(run.is_success(), "status: {:?}", run.status);
    assert!(!stale.exists());
    assert!(!legacy.exists());
    assert!(unrelated.exists(), "other components' artifacts are kept");
    assert!(dist.join("Acme_v1.2.3_unmanaged.zip").exists());
}

#[tokio::test]
async fn post_hook_failure_is_a_warning_not_a_failure() {
    let dir = TempDir::new().unwrap();
    write_descriptor(dir.path(), "0.0.1");
    let cfg = format!("{BASE_CFG}scripts:\n  post_package: notify --solution {{{{solution.name}}}}\n");
    let runner = Arc::new(MockRunner::failing_on("notify"));

    let ctx = context(&dir, &cfg, VariantSelection::Unmanaged, Arc::clone(&runner));
    let run = Orchestrator::new(ctx).run().await;

    assert!(run.is_success(), "status: {:?}", run.status);
    assert!(run
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::PostHook { command, .. } if command == "notify --solution Acme")));

    // The hook was actually invoked with the template resolved.
    let calls = runner.calls.lock().unwrap();
    let hook = calls.iter().find(|c| c.program() == "notify").unwrap();
    assert_eq!(hook.arg_list(), ["--solution", "Acme"]);
}

#[tokio::test]
async fn missing_build_output_is_a_warning() {
    let dir = TempDir::new().unwrap();
    write_descriptor(dir.path(), "0.0.1");
    let cfg = format!("{BASE_CFG}validation:\n  expected_outputs: out/bundle.js\n");
    let runner = Arc::new(MockRunner::new());

    let ctx = context(&dir, &cfg, VariantSelection::Unmanaged, runner);
    let run = Orchestrator::new(ctx).run().await;

    assert!(run.is_success(), "status: {:?}", run.status);
    assert!(run
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::MissingBuildOutput(_))));
}

#[tokio::test]
async fn build_tool_receives_configuration_flag() {
    let dir = TempDir::new().unwrap();
    write_descriptor(dir.path(), "0.0.1");
    let cfg = format!("{BASE_CFG}build:\n  tool: msbuild\n  args: /t:build\n");
    let runner = Arc::new(MockRunner::new());

    let ctx = context(&dir, &cfg, VariantSelection::Unmanaged, Arc::clone(&runner));
    let run = Orchestrator::new(ctx).run().await;

    assert!(run.is_success(), "status: {:?}", run.status);
    let calls = runner.calls.lock().unwrap();
    let build = calls.iter().find(|c| c.program() == "msbuild").unwrap();
    assert_eq!(build.arg_list(), ["/t:build", "--configuration", "Release"]);
}

#[tokio::test]
async fn manifest_reflects_variant_finalization_flag() {
    let dir = TempDir::new().unwrap();
    write_descriptor(dir.path(), "0.0.1");
    let runner = Arc::new(MockRunner::new());

    let ctx = context(&dir, BASE_CFG, VariantSelection::Both, runner);
    let work_manifest = ctx.work_dir.join("manifest.json");
    let run = Orchestrator::new(ctx).run().await;

    assert!(run.is_success(), "status: {:?}", run.status);
    // Both variants requested: the managed pass wrote the manifest last.
    let doc = solpack::ManifestDocument::load(&work_manifest).unwrap();
    assert!(doc.identity.managed);
    assert_eq!(doc.root_components.len(), 1);
    assert_eq!(doc.root_components[0].schema_name, "Acme.Widget");
}
