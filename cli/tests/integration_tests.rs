use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_schema-bind")
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("failed to write fixture");
    path
}

/// JSON bundle with a nested item model and a route-level schema.
fn shop_bundle(dir: &TempDir) -> PathBuf {
    let bundle = serde_json::json!({
        "version": "1.0.0",
        "generated_at": "2026-01-01T00:00:00Z",
        "schemas": [
            {
                "name": "Item",
                "fields": [
                    {"name": "name", "source": "body", "type": "str", "required": true},
                    {"name": "price", "source": "body", "type": "float", "required": true},
                    {
                        "name": "tags",
                        "source": "body",
                        "type": {"set": "str"},
                        "required": false,
                        "default": []
                    }
                ]
            },
            {
                "name": "UpdateItem",
                "fields": [
                    {
                        "name": "item_id",
                        "source": "path",
                        "type": "int",
                        "required": true,
                        "constraints": [{"gt": 0.0}, {"le": 1000.0}]
                    },
                    {"name": "item", "source": "body", "type": {"nested": "Item"}, "required": true},
                    {"name": "importance", "source": "body", "type": "int", "required": true}
                ]
            }
        ]
    });
    write_file(dir, "bundle.json", &bundle.to_string())
}

fn run(args: &[&str]) -> Output {
    Command::new(bin())
        .args(args)
        .output()
        .expect("failed to run schema-bind")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("fixture path should be valid UTF-8")
}

#[test]
fn test_validate_accepts_a_well_formed_bundle() {
    let dir = TempDir::new().unwrap();
    let bundle = shop_bundle(&dir);

    let out = run(&["validate", path_str(&bundle)]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Validated 1 bundle file(s) with 2 schema(s)"));
}

#[test]
fn test_validate_reports_every_configuration_error() {
    let dir = TempDir::new().unwrap();
    let bundle = serde_json::json!({
        "version": "1.0.0",
        "generated_at": "2026-01-01T00:00:00Z",
        "schemas": [
            {
                "name": "Broken",
                "fields": [
                    {"name": "a", "source": "body", "type": "str", "required": true},
                    {"name": "a", "source": "body", "type": "str", "required": true},
                    {"name": "image", "source": "body", "type": {"nested": "Missing"}, "required": true}
                ]
            }
        ]
    });
    let path = write_file(&dir, "broken.json", &bundle.to_string());

    let out = run(&["validate", path_str(&path)]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("duplicate field in schema 'Broken': a"));
    assert!(stderr.contains("unknown schema reference 'Missing'"));
    assert!(stderr.contains("2 configuration error(s) found"));
}

#[test]
fn test_bind_produces_a_bound_report() {
    let dir = TempDir::new().unwrap();
    let bundle = shop_bundle(&dir);
    let request = serde_json::json!({
        "path": {"item_id": "42"},
        "body": {
            "item": {"name": "Foo", "price": 42.0, "tags": ["rock", "rock", "metal"]},
            "importance": 5
        }
    });
    let fixture = write_file(&dir, "request.json", &request.to_string());

    let out = run(&[
        "bind",
        "--bundle",
        path_str(&bundle),
        "--schemas",
        "UpdateItem",
        path_str(&fixture),
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let report: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("report should be JSON");
    assert_eq!(report["bound"], 1);
    assert_eq!(report["rejected"], 0);
    assert_eq!(report["results"][0]["ok"], true);
    assert_eq!(report["results"][0]["bound"]["item_id"], 42);
    // Set fields deduplicate on bind.
    assert_eq!(
        report["results"][0]["bound"]["item"]["tags"],
        serde_json::json!(["rock", "metal"])
    );
}

#[test]
fn test_bind_rejection_reports_errors_and_fails() {
    let dir = TempDir::new().unwrap();
    let bundle = shop_bundle(&dir);
    let request = serde_json::json!({
        "path": {"item_id": "1001"},
        "body": {"item": {"name": "Foo", "price": 42.0}}
    });
    let fixture = write_file(&dir, "request.json", &request.to_string());

    let out = run(&[
        "bind",
        "--bundle",
        path_str(&bundle),
        "--schemas",
        "UpdateItem",
        path_str(&fixture),
    ]);
    assert!(!out.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("report should be JSON");
    assert_eq!(report["rejected"], 1);
    assert_eq!(report["results"][0]["ok"], false);

    let errors = report["results"][0]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["type"], "less_than_equal");
    assert_eq!(errors[0]["loc"], serde_json::json!(["path", "item_id"]));
    assert_eq!(errors[1]["type"], "missing");
    assert_eq!(errors[1]["loc"], serde_json::json!(["body", "importance"]));
}

#[test]
fn test_bind_rejects_unknown_schema_name() {
    let dir = TempDir::new().unwrap();
    let bundle = shop_bundle(&dir);
    let fixture = write_file(&dir, "request.json", "{}");

    let out = run(&[
        "bind",
        "--bundle",
        path_str(&bundle),
        "--schemas",
        "Nope",
        path_str(&fixture),
    ]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unknown schema in binding set: Nope"));
}

#[test]
fn test_yaml_bundles_are_accepted() {
    let dir = TempDir::new().unwrap();
    let yaml = r#"
version: "1.0.0"
generated_at: "2026-01-01T00:00:00Z"
schemas:
  - name: ReadItems
    fields:
      - name: q
        source: query
        type:
          optional: str
        required: false
"#;
    let path = write_file(&dir, "bundle.yaml", yaml);

    let out = run(&["validate", path_str(&path)]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
}

#[test]
fn test_bundle_merges_inputs_into_one_file() {
    let dir = TempDir::new().unwrap();
    let bundle = shop_bundle(&dir);
    let output = dir.path().join("merged.json");

    let out = run(&[
        "bundle",
        path_str(&bundle),
        "--output",
        path_str(&output),
        "--name",
        "shop-api",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let merged: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(merged["name"], "shop-api");
    assert_eq!(merged["schemas"].as_array().unwrap().len(), 2);
}
