//! End-to-end tests of the `segsort` binary.

use std::process::{Command, Output};

fn segsort(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_segsort")).args(args).output().expect("failed to run segsort")
}

#[test]
fn test_simulate_succeeds() {
    let output = segsort(&["simulate", "--ranks", "3", "--records-per-rank", "50", "--sort", "src-off"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Sort finished on 3 rank(s)"), "stderr: {stderr}");
}

#[test]
fn test_simulate_rejects_zero_ranks() {
    let output = segsort(&["simulate", "--ranks", "0"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--ranks must be at least 1"));
}

#[test]
fn test_simulate_rejects_unknown_sort_type() {
    let output = segsort(&["simulate", "--sort", "by-colour"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("by-colour"));
}

#[test]
fn test_simulate_reports_insufficient_records() {
    let output = segsort(&["simulate", "--ranks", "4", "--records-per-rank", "2"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("multi-rank sort needs at least"));
}

#[test]
fn test_schema_for_keys_reports_tight_extent() {
    let output = segsort(&["schema", "--keys", "inline", "--tight"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("extent: 4 bytes (189-192)"), "stdout: {stdout}");
}

#[test]
fn test_schema_for_sort_type_lists_its_keys() {
    let output = segsort(&["schema", "--sort", "line-roff"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for key in ["inline", "crossline", "offset", "ltn", "gtn"] {
        assert!(stdout.contains(key), "missing {key} in: {stdout}");
    }
    assert!(stdout.contains("extent: 240 bytes"));
}

#[test]
fn test_schema_rejects_sort_and_keys_together() {
    let output = segsort(&["schema", "--sort", "line-roff", "--keys", "inline"]);
    assert!(!output.status.success());
}
