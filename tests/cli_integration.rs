//! Command-line behavior of the `defectscope` binary.

use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn defectscope() -> Command {
    let mut cmd = Command::cargo_bin("defectscope").unwrap();
    cmd.env_remove("DEFECTSCOPE_MODEL").env_remove("RUST_LOG");
    cmd
}

/// Train a small model into `dir` and return its path.
fn trained_model(dir: &TempDir) -> std::path::PathBuf {
    let config = dir.path().join("train.toml");
    fs::write(&config, "[training]\nensemble_size = 2\nepochs = 40\n").unwrap();
    let model = dir.path().join("m.model");
    defectscope()
        .args(["train", "--samples", "200", "--seed", "7", "--config"])
        .arg(&config)
        .arg("--output")
        .arg(&model)
        .assert()
        .success();
    model
}

#[test]
fn test_init_creates_config_and_refuses_overwrite() {
    let temp = TempDir::new().unwrap();

    defectscope()
        .args(["init", "--path"])
        .arg(temp.path())
        .assert()
        .success();
    let contents = fs::read_to_string(temp.path().join(".defectscope.toml")).unwrap();
    assert!(contents.contains("[training]"));

    defectscope()
        .args(["init", "--path"])
        .arg(temp.path())
        .assert()
        .failure();
    defectscope()
        .args(["init", "--force", "--path"])
        .arg(temp.path())
        .assert()
        .success();
}

#[test]
fn test_train_writes_model_blob() {
    let temp = TempDir::new().unwrap();
    let model = trained_model(&temp);
    let bytes = fs::read(model).unwrap();
    assert!(bytes.starts_with(b"DSCM"));
}

#[test]
fn test_analyze_json_report() {
    let temp = TempDir::new().unwrap();
    let model = trained_model(&temp);
    let src = temp.path().join("pkg");
    fs::create_dir(&src).unwrap();
    fs::write(
        src.join("wide.py"),
        "def wide(a, b, c, d, e, f):\n    return a + b\n",
    )
    .unwrap();

    let output = defectscope()
        .args(["analyze", "--format", "json", "--model"])
        .arg(&model)
        .arg(&src)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["succeeded"], 1);
    let result = &json["results"][0];
    assert!(result["unit_id"].as_str().unwrap().ends_with("wide.py"));
    assert_eq!(result["findings"][0]["category"], "LONG_PARAMETER_LIST");
    assert_eq!(result["features"].as_array().unwrap().len(), 9);
}

#[test]
fn test_analyze_exits_nonzero_on_parse_failure() {
    let temp = TempDir::new().unwrap();
    let model = trained_model(&temp);
    let file = temp.path().join("broken.py");
    fs::write(&file, "def (:\n").unwrap();

    defectscope()
        .args(["analyze", "--format", "json", "--model"])
        .arg(&model)
        .arg(&file)
        .assert()
        .code(1);
}

#[test]
fn test_analyze_rejects_unknown_model_blob() {
    let temp = TempDir::new().unwrap();
    let model = temp.path().join("bogus.model");
    fs::write(&model, b"nope").unwrap();
    let file = temp.path().join("a.py");
    fs::write(&file, "x = 1\n").unwrap();

    defectscope()
        .args(["analyze", "--model"])
        .arg(&model)
        .arg(&file)
        .assert()
        .failure();
}
