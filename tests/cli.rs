use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

fn run_without_credentials(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_imap_monitor"))
        .args(args)
        .current_dir(dir)
        .env_remove("IMAP_HOST")
        .env_remove("IMAP_USER")
        .env_remove("IMAP_PASS")
        .env("RUST_LOG", "info")
        .env("IMAP_MONITOR_LOG", dir.join("logs/monitor.log"))
        .env("IMAP_MONITOR_STATE", dir.join("state.json"))
        .output()
        .expect("run imap_monitor")
}

#[test]
fn missing_configuration_is_a_json_error() {
    let dir = tempdir().unwrap();
    let out = run_without_credentials(dir.path(), &["--json", "--dry-run"]);

    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8(out.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(v["status"], "error");
    assert_eq!(
        v["error"],
        "Missing required env vars: IMAP_HOST, IMAP_USER, IMAP_PASS"
    );
    assert!(!dir.path().join("state.json").exists());
}

#[test]
fn missing_configuration_is_one_human_line() {
    let dir = tempdir().unwrap();
    let out = run_without_credentials(dir.path(), &[]);

    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "ERROR: Missing required env vars: IMAP_HOST, IMAP_USER, IMAP_PASS\n"
    );

    let log = std::fs::read_to_string(dir.path().join("logs/monitor.log")).unwrap();
    assert!(log.contains("ERROR: Missing required env vars"));
}
