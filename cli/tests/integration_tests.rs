use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn defc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_defc"))
        .args(args)
        .output()
        .expect("failed to run defc")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// Writes a small inheritance chain: base (with a system region) <- case <- subcase.
fn write_definitions(dir: &Path) -> PathBuf {
    let defs = dir.join("definitions");
    fs::create_dir_all(&defs).unwrap();

    let base = serde_json::json!({
        "identifier": "base",
        "abstract": true,
        "fields": [
            { "name": "title", "type": "an..180", "order": 1 },
            { "name": "legacy", "type": "an..10", "order": 2 }
        ],
        "regions": [
            { "identifier": "audit", "display_type": "system" }
        ]
    });
    fs::write(defs.join("base.json"), serde_json::to_string_pretty(&base).unwrap()).unwrap();

    fs::write(
        defs.join("case.yaml"),
        r#"identifier: case
parent: base
fields:
  - name: caseNumber
    type: n..10
    order: 3
  - name: legacy
    display_type: delete
"#,
    )
    .unwrap();

    fs::write(
        defs.join("subcase.json"),
        r#"{ "identifier": "subcase", "parent": "case" }"#,
    )
    .unwrap();

    defs
}

// ---------------------------------------------------------------------------
// compile
// ---------------------------------------------------------------------------

#[test]
fn compile_writes_package_with_hash_and_report() {
    let dir = TempDir::new().unwrap();
    let defs = write_definitions(dir.path());
    let output = dir.path().join("out/compiled.json");
    let report = dir.path().join("out/report.json");

    let result = defc(&[
        "compile",
        path_str(&defs),
        "--output",
        path_str(&output),
        "--report",
        path_str(&report),
    ]);
    assert!(
        result.status.success(),
        "compile failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    let package: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let definitions = package["definitions"].as_array().unwrap();
    let ids: Vec<&str> = definitions
        .iter()
        .map(|d| d["identifier"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["base", "case", "subcase"]);
    assert_eq!(package["bundle_hash"].as_str().unwrap().len(), 64);
    assert!(package["generated_at"].as_str().unwrap().ends_with('Z'));

    let subcase = &definitions[2];
    let fields: Vec<&str> = subcase["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "caseNumber"]);
    assert!(subcase["regions"].as_array().is_none_or(|r| r.is_empty()));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    let removals = report["removals"].as_array().unwrap();
    assert_eq!(removals.len(), 5);
    assert_eq!(removals[0]["definition"], "base");
    assert_eq!(removals[0]["reason"], "system");
}

#[test]
fn compile_honors_config_exclusions_and_yaml_output() {
    let dir = TempDir::new().unwrap();
    let defs = write_definitions(dir.path());
    let config = dir.path().join("defc.yml");
    fs::write(
        &config,
        r#"version: "1.0"
exclude: [subcase]
compile:
  parallel: true
  jobs: 2
output:
  format: yaml
  include_report: true
"#,
    )
    .unwrap();
    let output = dir.path().join("compiled.yaml");

    let result = defc(&[
        "compile",
        path_str(&defs),
        "--output",
        path_str(&output),
        "--config",
        path_str(&config),
    ]);
    assert!(
        result.status.success(),
        "compile failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    let package: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(package["definitions"].as_sequence().unwrap().len(), 2);
    assert!(dir.path().join("compiled.report.yaml").exists());
}

#[test]
fn compile_fails_on_missing_parent() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("orphan.json");
    fs::write(&input, r#"{ "identifier": "orphan", "parent": "ghost" }"#).unwrap();
    let output = dir.path().join("compiled.json");

    let result = defc(&["compile", path_str(&input), "--output", path_str(&output)]);
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
    assert!(stderr.contains("orphan -> ghost"), "stderr: {stderr}");
    assert!(!output.exists());
}

// ---------------------------------------------------------------------------
// validate / tree
// ---------------------------------------------------------------------------

#[test]
fn validate_reports_summary() {
    let dir = TempDir::new().unwrap();
    let defs = write_definitions(dir.path());

    let result = defc(&["validate", path_str(&defs)]);
    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(
        stdout.contains("Validated 3 definition(s) in 1 inheritance tree(s)."),
        "stdout: {stdout}"
    );
}

#[test]
fn validate_rejects_cycle() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    fs::write(&a, r#"{ "identifier": "a", "parent": "b" }"#).unwrap();
    fs::write(&b, r#"{ "identifier": "b", "parent": "a" }"#).unwrap();

    let result = defc(&["validate", path_str(&a), path_str(&b)]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("a -> b -> a"));
}

#[test]
fn tree_prints_indented_forest() {
    let dir = TempDir::new().unwrap();
    let defs = write_definitions(dir.path());

    let result = defc(&["tree", path_str(&defs)]);
    assert!(result.status.success());
    assert_eq!(
        String::from_utf8_lossy(&result.stdout),
        "base (abstract)\n  case\n    subcase\n"
    );
}
