//! Integration tests for the docmatch CLI.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TEMPLATE: &str = r#"{
    "template_id": "tech_std",
    "name": "Technical standard",
    "document_type": "docx",
    "elements": [
        {
            "name": "document_number",
            "element_kind": "code",
            "patterns": ["TP-\\d{3}-\\d{3}-\\d{3}"],
            "position_hints": {"y_range": [0, 150], "typical_height": 30}
        },
        {
            "name": "effective_date",
            "element_kind": "date",
            "patterns": ["시행일[:\\s]*(\\d{2}\\.\\d{2}\\.\\d{2})"]
        },
        {
            "name": "author",
            "element_kind": "text",
            "patterns": ["작성자[:\\s]*([가-힣]+)"],
            "required": false
        }
    ]
}"#;

const DOCUMENT: &str = r#"{
    "sections": [
        {
            "blocks": [
                {"text": "TP-030-030-050", "bbox": {"x1": 50, "y1": 20, "x2": 400, "y2": 50, "page": 1}, "type": "text"},
                {"text": "시행일: 25.07.28 Rev.10", "bbox": {"x1": 50, "y1": 60, "x2": 400, "y2": 90, "page": 1}, "type": "text"}
            ]
        }
    ],
    "metadata": {"author": "김철수"}
}"#;

fn docmatch() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_docmatch"));
    // Keep the user's real config out of the tests
    cmd.env("XDG_CONFIG_HOME", "/nonexistent-docmatch-config");
    cmd
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("templates")).unwrap();
    fs::write(dir.path().join("templates/tech_std.json"), TEMPLATE).unwrap();
    fs::write(dir.path().join("document.json"), DOCUMENT).unwrap();
    dir
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_match_prints_result() {
    let dir = workspace();
    let output = docmatch()
        .args(["match", path_str(&dir.path().join("document.json")), "--templates"])
        .arg(dir.path().join("templates"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let result: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(result["template_id"], "tech_std");
    assert_eq!(
        result["matched_fields"]["document_number"]["value"],
        "TP-030-030-050"
    );
    assert_eq!(result["matched_fields"]["effective_date"]["value"], "25.07.28");
    assert_eq!(result["matched_fields"]["author"]["method"], "metadata");
    assert!(result["missing_fields"].as_array().unwrap().is_empty());
}

#[test]
fn test_match_without_templates_falls_back() {
    let dir = workspace();
    docmatch()
        .arg("match")
        .arg(dir.path().join("document.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"template_id\": \"fallback_template\""))
        .stdout(predicate::str::contains("\"strategy_used\": \"exact\""));
}

#[test]
fn test_single_strategy() {
    let dir = workspace();
    docmatch()
        .arg("match")
        .arg(dir.path().join("document.json"))
        .arg("--templates")
        .arg(dir.path().join("templates"))
        .args(["--template", "tech_std", "--strategy", "position"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"strategy_used\": \"position\""));
}

#[test]
fn test_unknown_strategy_rejected() {
    let dir = workspace();
    docmatch()
        .arg("match")
        .arg(dir.path().join("document.json"))
        .args(["--template", "tech_std", "--strategy", "magic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown strategy"));
}

#[test]
fn test_output_and_derived_template() {
    let dir = workspace();
    let output = dir.path().join("result.json");
    let derived = dir.path().join("derived.json");

    docmatch()
        .arg("match")
        .arg(dir.path().join("document.json"))
        .arg("--templates")
        .arg(dir.path().join("templates"))
        .arg("--output")
        .arg(&output)
        .arg("--derive-template")
        .arg(&derived)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Output written"));

    assert!(output.exists());
    let definition: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&derived).unwrap()).unwrap();
    assert_eq!(definition["template_id"], "document_template");
    assert_eq!(definition["document_type"], "docx");
}

#[test]
fn test_missing_document() {
    docmatch()
        .args(["match", "/nonexistent/document.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Document not found"));
}

#[test]
fn test_templates_list() {
    let dir = workspace();
    docmatch()
        .args(["templates", "list", "--builtin", "--templates"])
        .arg(dir.path().join("templates"))
        .assert()
        .success()
        .stdout(predicate::str::contains("technical_standard_v1"))
        .stdout(predicate::str::contains("tech_std"));
}

#[test]
fn test_templates_validate() {
    let dir = workspace();
    let broken = dir.path().join("broken.json");
    fs::write(&broken, r#"{"template_id": "", "name": "x"}"#).unwrap();

    docmatch()
        .args(["templates", "validate"])
        .arg(dir.path().join("templates/tech_std.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("tech_std (3 fields)"));

    docmatch()
        .args(["templates", "validate"])
        .arg(&broken)
        .assert()
        .failure();
}

#[test]
fn test_config_init_and_show() {
    let dir = workspace();
    let config = dir.path().join("config.json");

    docmatch()
        .args(["config", "init", "--output"])
        .arg(&config)
        .assert()
        .success();
    assert!(config.exists());

    docmatch()
        .args(["config", "init", "--output"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    docmatch()
        .arg("--config")
        .arg(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("confidence_floor"));
}

#[test]
fn test_config_path_follows_flag() {
    let dir = workspace();
    let config = dir.path().join("nested/config.json");

    docmatch()
        .arg("--config")
        .arg(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(path_str(&config)))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("not created"));

    docmatch()
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    docmatch()
        .arg("--config")
        .arg(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));

    fs::write(&config, r#"{"selection": {"confidence_floor": 2.0}}"#).unwrap();
    docmatch()
        .arg("--config")
        .arg(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("invalid"));
}
