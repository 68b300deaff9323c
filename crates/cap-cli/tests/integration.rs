//! Integration tests for CLI commands.

use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn make_record(id: &str, day: u32) -> Value {
    json!({
        "cap_id": id,
        "timestamp": format!("2025-10-{:02}T12:00:00Z", day),
        "domain": "Research",
        "ems": 0.87,
        "hci": 0.81,
        "body": {"test": "CLI round"}
    })
}

fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

fn create_corpus() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write_json(&temp_dir.path().join("a.json"), &make_record("cap-a", 1));
    write_json(&temp_dir.path().join("b.json"), &make_record("cap-b", 2));
    temp_dir
}

fn cli() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cap"));
    cmd.env_remove("FALCONFORGE_WEBHOOK_SECRET")
        .env_remove("CAP_CORPUS_ROOT")
        .env_remove("CAP_LEDGER_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn run_cli(args: &[&str]) -> (bool, String, String) {
    run_with(cli().args(args))
}

fn run_with(cmd: &mut Command) -> (bool, String, String) {
    let output = cmd.output().expect("Failed to execute CLI");
    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    (output.status.success(), stdout, stderr)
}

fn run_with_stdin(args: &[&str], input: &str) -> (bool, String, String) {
    let mut child = cli()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    (
        output.status.success(),
        String::from_utf8(output.stdout).unwrap(),
        String::from_utf8(output.stderr).unwrap(),
    )
}

#[test]
fn test_canonicalize_command() {
    let (success, stdout, _) =
        run_with_stdin(&["canonicalize"], r#"{"b": 2.0, "a": "  x   y ", "c": [1.23456789]}"#);
    assert!(success);
    assert_eq!(stdout, "{\"a\":\"x y\",\"b\":2,\"c\":[1.234568]}\n");
}

#[test]
fn test_canonicalize_rejects_invalid_json() {
    let (success, _, stderr) = run_with_stdin(&["canonicalize"], "{nope");
    assert!(!success);
    assert!(stderr.contains("Invalid JSON"));
}

#[test]
fn test_recover_to_stdout() {
    let (success, stdout, _) = run_with_stdin(&["recover"], "{cap_id: abc, domain: Research}");
    assert!(success);
    let value: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value, json!({"cap_id": "abc", "domain": "Research"}));
}

#[test]
fn test_recover_fallback_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("raw.txt");
    let out = temp_dir.path().join("cap.json");
    fs::write(&input, "no braces here").unwrap();

    let (success, _, _) = run_cli(&[
        "recover",
        input.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ]);
    assert!(success);
    assert_eq!(fs::read_to_string(&out).unwrap(), "{}\n");
}

#[test]
fn test_sign_and_verify_signature() {
    let temp_dir = create_corpus();
    let record = temp_dir.path().join("a.json");

    let (success, stdout, _) = run_cli(&["sign", record.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.trim().starts_with("SHA256:"));
    assert!(temp_dir.path().join("a.json.bak").exists());

    let (success, stdout, _) = run_cli(&["verify-signature", record.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.starts_with("VALID"));

    let mut tampered: Value = serde_json::from_slice(&fs::read(&record).unwrap()).unwrap();
    tampered["body"]["test"] = json!("changed");
    write_json(&record, &tampered);

    let (success, stdout, _) =
        run_cli(&["verify-signature", record.to_str().unwrap(), "--json"]);
    assert!(!success);
    let verdict: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(verdict["verdict"], json!("invalid"));
}

#[test]
fn test_sign_missing_source() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.json");
    let (success, _, stderr) = run_cli(&["sign", missing.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("source not found"));
}

#[test]
fn test_link_and_verify_chain() {
    let temp_dir = create_corpus();
    let root = temp_dir.path().to_str().unwrap();

    let (success, _, _) = run_cli(&["verify-chain", "--root", root, "--strict"]);
    assert!(!success, "unlinked corpus must fail strict verification");

    let (success, stdout, _) = run_cli(&["link", "--root", root, "--json"]);
    assert!(success);
    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["records"], json!(2));
    assert_eq!(report["unchanged"], json!(0));

    let (success, stdout, _) = run_cli(&["verify-chain", "--root", root, "--json", "--strict"]);
    assert!(success);
    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["status"], json!("valid"));

    let (success, stdout, _) = run_cli(&["link", "--root", root, "--json"]);
    assert!(success);
    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["unchanged"], json!(2));
}

#[test]
fn test_link_uses_corpus_root_from_env() {
    let temp_dir = create_corpus();
    let (success, stdout, _) =
        run_with(cli().env("CAP_CORPUS_ROOT", temp_dir.path()).args(["link"]));
    assert!(success);
    assert!(stdout.contains("2 records, 2 rewritten"));
}

#[test]
fn test_link_empty_corpus_fails() {
    let temp_dir = TempDir::new().unwrap();
    let (success, _, stderr) = run_cli(&["link", "--root", temp_dir.path().to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("no CAP records found"));
}

#[test]
fn test_check_ledger_local_file() {
    let temp_dir = TempDir::new().unwrap();
    let artifact = temp_dir.path().join("artifact.json");

    fs::write(&artifact, r#"{"cap_id":"c1"}"#).unwrap();
    let (success, stdout, _) = run_cli(&["check-ledger", artifact.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.starts_with("SKIPPED"));

    fs::write(
        &artifact,
        r#"{"cap_id":"c1","ledger_hash":"0000000000000000000000000000000000000000"}"#,
    )
    .unwrap();
    let (success, stdout, _) =
        run_cli(&["check-ledger", artifact.to_str().unwrap(), "--json"]);
    assert!(!success);
    let verdict: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(verdict["result"], json!("mismatch"));
}

#[test]
fn test_check_ledger_requires_source() {
    let (success, _, stderr) = run_cli(&["check-ledger"]);
    assert!(!success);
    assert!(stderr.contains("no ledger URL configured"));
}

#[test]
fn test_webhook_sign_and_verify() {
    let temp_dir = TempDir::new().unwrap();
    let body = temp_dir.path().join("body.json");
    fs::write(&body, r#"{"cap_id":"c1"}"#).unwrap();
    let body = body.to_str().unwrap();

    let (success, stdout, _) = run_with(
        cli()
            .env("FALCONFORGE_WEBHOOK_SECRET", "s3cret")
            .args(["webhook-sign", body]),
    );
    assert!(success);
    let signature = stdout.trim().to_string();
    assert!(signature.starts_with("sha256="));

    let (success, _, _) = run_with(cli().env("FALCONFORGE_WEBHOOK_SECRET", "s3cret").args([
        "webhook-verify",
        body,
        "--signature",
        &signature,
    ]));
    assert!(success);

    let (success, stdout, _) = run_with(cli().env("FALCONFORGE_WEBHOOK_SECRET", "other").args([
        "webhook-verify",
        body,
        "--signature",
        &signature,
    ]));
    assert!(!success);
    assert!(stdout.contains("INVALID"));
}

#[test]
fn test_webhook_requires_secret() {
    let temp_dir = TempDir::new().unwrap();
    let body = temp_dir.path().join("body.json");
    fs::write(&body, "{}").unwrap();
    let (success, _, stderr) = run_cli(&["webhook-sign", body.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("webhook secret is not configured"));
}

#[test]
fn test_list_command() {
    let temp_dir = create_corpus();
    let root = temp_dir.path().to_str().unwrap();

    let (success, stdout, _) = run_cli(&["list", "--root", root]);
    assert!(success);
    assert!(stdout.contains("CAP_ID"));
    assert!(stdout.contains("cap-a"));
    assert!(stdout.contains("cap-b"));

    let (success, stdout, _) = run_cli(&["list", "--root", root, "--json"]);
    assert!(success);
    let lines: Vec<&str> = stdout.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let entry: Value = serde_json::from_str(line).expect("Invalid JSON");
        assert!(entry["record"]["cap_id"].is_string());
    }
}
