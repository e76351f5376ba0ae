//! CLI surface tests driving the binary.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn missing_config_file_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("solpack")
        .unwrap()
        .current_dir(dir.path())
        .args(["--config", "does-not-exist.cfg"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn invalid_name_override_is_rejected() {
    Command::cargo_bin("solpack")
        .unwrap()
        .args(["--name", "9bad"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not a valid identifier"));
}

#[test]
fn help_lists_pipeline_flags() {
    Command::cargo_bin("solpack")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--package-variant"))
        .stdout(predicate::str::contains("--publisher-prefix"))
        .stdout(predicate::str::contains("--ci-mode"));
}
