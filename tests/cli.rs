//! Command-line behavior of the `textdex` binary.

mod common;

use common::temp_file;
use std::process::Command;

/// Run textdex with `args` and return (stdout, stderr, success)
fn run_textdex(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_textdex"))
        .args(args)
        .output()
        .expect("Failed to run textdex");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

#[test]
fn test_skip_bom_shifts_offsets() {
    let file = temp_file("\u{FEFF}ab\ncd".as_bytes());
    let path = file.path().to_str().unwrap();

    let (stdout, stderr, ok) = run_textdex(&["--skip-bom", "line", path, "1"]);
    assert!(ok, "textdex failed: {}", stderr);
    assert_eq!(stdout.trim(), "6");

    let (stdout, stderr, ok) = run_textdex(&["--skip-bom", "char", path, "0"]);
    assert!(ok, "textdex failed: {}", stderr);
    assert_eq!(stdout.trim(), "3");
}

#[test]
fn test_skip_bom_keeps_larger_configured_skip() {
    let file = temp_file("\u{FEFF}ab\ncd".as_bytes());
    let config = temp_file(br#"{"headerSkipBytes": 4}"#);
    let path = file.path().to_str().unwrap();
    let config_path = config.path().to_str().unwrap();

    let (stdout, stderr, ok) =
        run_textdex(&["--config", config_path, "--skip-bom", "stats", path, "--json"]);
    assert!(ok, "textdex failed: {}", stderr);
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["headerSkipBytes"], 4);
    assert_eq!(summary["characters"], 4);
    assert_eq!(summary["lines"], 2);
}

#[test]
fn test_without_skip_bom_the_mark_is_a_character() {
    let file = temp_file("\u{FEFF}ab\ncd".as_bytes());
    let path = file.path().to_str().unwrap();
    let (stdout, _, ok) = run_textdex(&["stats", path, "--json"]);
    assert!(ok);
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["headerSkipBytes"], 0);
    assert_eq!(summary["characters"], 6);
}

#[test]
fn test_line_out_of_range_fails() {
    let file = temp_file(b"one\ntwo");
    let path = file.path().to_str().unwrap();
    let (_, stderr, ok) = run_textdex(&["line", path, "5"]);
    assert!(!ok);
    assert!(stderr.contains("failed to locate line 5"), "{}", stderr);
}
