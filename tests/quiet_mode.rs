use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_file(path: &PathBuf, content: &str) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let mut f = fs::File::create(path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
}

#[test]
fn render_quiet_suppresses_non_essential_output() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(
        &root.join("manifests/svc.yaml"),
        "kind: Service\nmetadata:\n  name: web\nspec:\n  selector:\n    app: web\n",
    );
    let out = root.join("diagram.puml");

    // Without quiet: expect the summary line
    let mut cmd_no_quiet = Command::cargo_bin("kuml").unwrap();
    cmd_no_quiet.arg("render").arg(root.join("manifests")).arg("-o").arg(&out);
    cmd_no_quiet
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1 elements and 0 relationships to"));

    // With quiet: nothing on stdout, the file is still written
    fs::remove_file(&out).unwrap();
    let mut cmd_quiet = Command::cargo_bin("kuml").unwrap();
    cmd_quiet.arg("-q").arg("render").arg(root.join("manifests")).arg("-o").arg(&out);
    cmd_quiet.assert().success().stdout(predicate::str::is_empty());
    assert!(out.exists());
}

#[test]
fn verbose_logs_go_to_stderr() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(&root.join("pod.yaml"), "kind: Pod\nmetadata:\n  name: web\n");

    let mut cmd = Command::cargo_bin("kuml").unwrap();
    cmd.env_remove("KUML_LOG").env_remove("RUST_LOG");
    cmd.arg("-v").arg("render").arg(root);
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("@startuml"))
        .stderr(predicate::str::contains("loading manifests"));
}
