use assert_cmd::Command;
use std::path::Path;
use tempfile::TempDir;

const DATASTORE: &str = r#"{
  "controllers": {
    "acme-ctrl": {
      "name": "acme-ctrl",
      "state": "ready",
      "endpoints": ["35.190.1.2:17070"],
      "uuid": "abc-123",
      "caCert": "CERT",
      "models": ["acme-ctrl/m1"]
    }
  },
  "models": {
    "acme-ctrl/m1": {
      "key": "acme-ctrl/m1",
      "name": "m1",
      "controller": "acme-ctrl",
      "state": "ready",
      "uuid": "uuid-m1",
      "credential": "acme-cred",
      "access": { "alice": "admin" }
    }
  },
  "credentials": []
}"#;

fn jujusys(datastore: &Path) -> Command {
    let mut cmd = Command::cargo_bin("jujusys").unwrap();
    cmd.env_remove("JUJUSYS_CONFIG")
        .env_remove("JUJUSYS_ADMIN_PASSWORD")
        .env_remove("RUST_LOG")
        .arg("--datastore")
        .arg(datastore);
    cmd
}

#[test]
fn status_shows_controller_and_models() {
    let dir = TempDir::new().unwrap();
    let datastore = dir.path().join("jujusys.json");
    std::fs::write(&datastore, DATASTORE).unwrap();

    let output = jujusys(&datastore)
        .args(["status", "acme-ctrl", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["controller"]["uuid"], "abc-123");
    assert_eq!(status["models"][0]["key"], "acme-ctrl/m1");
    assert_eq!(status["models"][0]["access"]["alice"], "admin");
    assert_eq!(
        status["grants"],
        serde_json::json!([{ "model": "acme-ctrl/m1", "user": "alice", "role": "admin" }])
    );

    let output = jujusys(&datastore)
        .args(["status", "acme-ctrl"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("acme-ctrl: ready"), "{}", stdout);
    assert!(stdout.contains("model m1: ready\n    alice: admin"), "{}", stdout);
}

#[test]
fn status_of_unknown_controller_fails() {
    let dir = TempDir::new().unwrap();
    let output = jujusys(&dir.path().join("jujusys.json"))
        .args(["status", "nope"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("'nope' was not found"));
}

#[test]
fn bootstrap_requires_admin_password() {
    let dir = TempDir::new().unwrap();
    let output = jujusys(&dir.path().join("jujusys.json"))
        .args(["bootstrap", "acme-ctrl", "us-east1", "acme-cred", "--user", "alice"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("admin password"));
}
