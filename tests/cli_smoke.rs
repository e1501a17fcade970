use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Simple CLI smoke test: render a directory, then query it
#[test]
fn cli_render_and_query_smoke() {
    // Arrange: a directory with a workload and its service
    let dir = tempdir().unwrap();
    let root = dir.path();
    let k8s = root.join("k8s");
    fs::create_dir_all(&k8s).unwrap();

    write_file(&k8s.join("deploy.yaml"), r"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: api-server
spec:
  selector:
    matchLabels:
      app: api
  template:
    metadata:
      labels:
        app: api
    spec:
      volumes:
        - name: config
          configMap:
            name: api-config
");
    write_file(&k8s.join("svc.yml"), r"
apiVersion: v1
kind: Service
metadata:
  name: api
spec:
  selector:
    app: api
  ports:
    - port: 8080
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: api-config
");

    // Act: render with link labels
    let mut cmd = Command::cargo_bin("kuml").unwrap();
    cmd.arg("render").arg(&k8s).arg("-s");

    // Assert
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("@startuml\n"))
        .stdout(predicate::str::contains(
            "rectangle \"kind: Deployment\\nname: api-server\" as default_Deployment_api_server",
        ))
        .stdout(predicate::str::contains("default_ReplicaSet_api_server -DOWN-> default_Pod_api_server"))
        .stdout(predicate::str::contains(
            "default_Pod_api_server -DOWN-> default_ConfigMap_api_config : \".spec.volume.configMap\"",
        ))
        .stdout(predicate::str::contains("default_Service_api -RIGHT-> default_Pod_api_server : \"app : api\""))
        .stdout(predicate::str::ends_with("@enduml\n"));

    // Act: query relations of the pod as JSON
    let mut cmd2 = Command::cargo_bin("kuml").unwrap();
    cmd2.arg("query").arg("related")
        .arg(&k8s)
        .arg("--resource").arg("default_Pod_api_server")
        .arg("--format").arg("json");
    cmd2.assert().success().stdout(predicate::str::contains("default_ConfigMap_api_config"));
}

#[test]
fn cli_rejects_missing_input() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("kuml").unwrap();
    cmd.arg("render").arg(dir.path().join("absent.yaml"));
    cmd.assert().failure().stderr(predicate::str::contains("Build failed"));
}

#[test]
fn cli_generates_completions() {
    let mut cmd = Command::cargo_bin("kuml").unwrap();
    cmd.arg("completions").arg("bash");
    cmd.assert().success().stdout(predicate::str::contains("kuml"));
}

fn write_file(path: &PathBuf, content: &str) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
}
