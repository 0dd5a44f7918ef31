//! Integration tests for the ddl-export binary.
//!
//! Tests cover:
//! - generate: files written, --dry-run, glob arguments, config files
//! - Exit codes for mapping errors and partial failures
//! - Persistence unit selection
//! - schema and completions subcommands

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn ddl_export_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ddl-export"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn run_generate(args: &[&str], out: &Path) -> Output {
    ddl_export_bin()
        .arg("generate")
        .args(args)
        .arg("-o")
        .arg(out)
        .output()
        .expect("Failed to execute ddl-export")
}

#[test]
fn test_generate_writes_scripts() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("ddl");
    let output = run_generate(
        &[fixture("library.yaml").to_str().unwrap(), "--dialect", "postgres"],
        &out,
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Generated DDL for 2 tables [dialect: postgres]"));

    let create = fs::read_to_string(out.join("create.sql")).unwrap();
    assert!(create.contains("CREATE TABLE \"Author\""));
    assert!(out.join("drop.sql").exists());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("process persistence unit: library"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("ddl");
    let output = run_generate(
        &[fixture("library.yaml").to_str().unwrap(), "--dry-run", "--no-drop"],
        &out,
    );
    assert!(output.status.success());
    assert!(!out.exists());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CREATE TABLE Author"));
    assert!(!stdout.contains("DROP TABLE"));
}

#[test]
fn test_mapping_error_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("ddl");
    let output = run_generate(&[fixture("unmappable.yaml").to_str().unwrap()], &out);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Sensor.location"), "stderr: {}", stderr);
    assert!(stderr.contains("geometry"));
    assert!(!out.exists());
}

#[test]
fn test_partial_failure_keeps_other_script() {
    let dir = TempDir::new().unwrap();
    let entities = dir.path().join("tokens.yaml");
    fs::write(
        &entities,
        "entities:\n  - name: Token\n    primary_key: [id]\n    fields:\n      - { name: id, type: uuid }\n",
    )
    .unwrap();
    let out = dir.path().join("ddl");

    let output = run_generate(&[entities.to_str().unwrap(), "-d", "ansi"], &out);
    assert!(!output.status.success());
    assert!(!out.join("create.sql").exists());
    assert!(out.join("drop.sql").exists());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 script(s) failed"));
}

#[test]
fn test_unit_required_when_ambiguous() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("ddl");

    let output = run_generate(&[fixture("units.yaml").to_str().unwrap()], &out);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("billing"), "stderr: {}", stderr);
    assert!(stderr.contains("hr"));

    let output = run_generate(
        &[fixture("units.yaml").to_str().unwrap(), "--unit", "billing"],
        &out,
    );
    assert!(output.status.success());
    let create = fs::read_to_string(out.join("create.sql")).unwrap();
    assert!(create.contains("CREATE TABLE Invoice"));
    assert!(create.contains("CREATE TABLE AuditLog"));
    assert!(!create.contains("Person"));
}

#[test]
fn test_glob_argument() {
    let dir = TempDir::new().unwrap();
    let model = dir.path().join("model");
    fs::create_dir_all(&model).unwrap();
    fs::copy(fixture("library.yaml"), model.join("library.yaml")).unwrap();
    fs::write(
        model.join("audit.yaml"),
        "entities:\n  - name: Audit\n    primary_key: [id]\n    fields:\n      - { name: id, type: long }\n",
    )
    .unwrap();
    let out = dir.path().join("ddl");

    let pattern = model.join("*.yaml");
    let output = run_generate(&[pattern.to_str().unwrap()], &out);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let create = fs::read_to_string(out.join("create.sql")).unwrap();
    assert!(create.contains("CREATE TABLE Audit"));
    assert!(create.contains("CREATE TABLE Book"));
}

#[test]
fn test_config_file_and_flag_precedence() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("ddl-export.yaml");
    fs::write(
        &config,
        "dialect: mysql\ndelimiter: GO\ncreate_file: schema.sql\ngenerate_drop: false\n",
    )
    .unwrap();
    let out = dir.path().join("ddl");

    let output = run_generate(
        &[
            fixture("library.yaml").to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
            "--delimiter",
            "$$",
        ],
        &out,
    );
    assert!(output.status.success());
    assert!(!out.join("drop.sql").exists());

    let create = fs::read_to_string(out.join("schema.sql")).unwrap();
    assert!(create.contains("CREATE TABLE `Author`"));
    assert!(create.contains("\n$$\n"));
    assert!(!create.contains("\nGO\n"));
}

#[test]
fn test_env_var_sets_dialect() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("ddl");
    let output = ddl_export_bin()
        .env("DDL_EXPORT_DIALECT", "mysql")
        .arg("generate")
        .arg(fixture("library.yaml"))
        .arg("--dry-run")
        .arg("-o")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("ENGINE=InnoDB"));
}

#[test]
fn test_unknown_dialect_rejected() {
    let dir = TempDir::new().unwrap();
    let output = run_generate(
        &[fixture("library.yaml").to_str().unwrap(), "-d", "oracle"],
        &dir.path().join("ddl"),
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown dialect"));
}

#[test]
fn test_unknown_encoding_fails_both_scripts() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("ddl");
    let output = run_generate(
        &[fixture("library.yaml").to_str().unwrap(), "--encoding", "EBCDIC"],
        &out,
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("2 script(s) failed"));
    assert!(!out.join("create.sql").exists());
}

#[test]
fn test_missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let output = run_generate(&["/nonexistent/entities.yaml"], &dir.path().join("ddl"));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn test_schema_subcommand_lists_all() {
    let output = ddl_export_bin().arg("schema").output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json.get("entities").is_some());
    assert!(json.get("config").is_some());
    assert!(json.get("generate").is_some());
}

#[test]
fn test_schema_subcommand_writes_files() {
    let dir = TempDir::new().unwrap();
    let output = ddl_export_bin()
        .arg("schema")
        .arg("-o")
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    for name in ["config", "entities", "generate"] {
        assert!(dir.path().join(format!("{name}.schema.json")).is_file());
    }
}

#[test]
fn test_schema_unknown_name() {
    let output = ddl_export_bin().arg("schema").arg("split").output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown schema: split"));
}

#[test]
fn test_completions() {
    let output = ddl_export_bin().arg("completions").arg("bash").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("ddl-export"));
}
