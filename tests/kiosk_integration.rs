//! Kiosk Integration Tests
//!
//! These tests run the tallyspin-kiosk binary end-to-end in fast mode
//! and check the tally it reports.

use assert_cmd::Command;
use predicates::prelude::*;

// ============================================================================
// Test Utilities
// ============================================================================

fn kiosk_cmd() -> Command {
    Command::cargo_bin("tallyspin-kiosk").expect("Failed to find tallyspin-kiosk binary")
}

// ============================================================================
// Run Tests
// ============================================================================

#[test]
fn test_fast_run_reports_consistent_tally() {
    kiosk_cmd()
        .args(["--fast", "--widgets", "2", "--clicks", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tallyspin Kiosk"))
        .stdout(predicate::str::contains("counter document: counters/clicks"))
        .stdout(predicate::str::is_match(r"final shared count: \d+").unwrap())
        .stdout(predicate::str::is_match(r"tally consistent:\s+yes").unwrap());
}

#[test]
fn test_single_widget_run() {
    kiosk_cmd()
        .args(["--fast", "--widgets", "1", "--clicks", "6"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"clicks sent:\s+6").unwrap())
        .stdout(predicate::str::is_match(r"tally consistent:\s+yes").unwrap());
}

#[test]
fn test_clicks_before_the_client_are_dropped() {
    // The client arrives long after the script is done, so every click
    // is dropped unarmed and the counter stays at zero.
    kiosk_cmd()
        .args([
            "--fast",
            "--widgets",
            "2",
            "--clicks",
            "5",
            "--ready-after-ms",
            "1500",
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"accepted:\s+0\b").unwrap())
        .stdout(predicate::str::is_match(r"dropped \(unarmed\):\s+5").unwrap())
        .stdout(predicate::str::contains("final shared count: 0"))
        .stdout(predicate::str::is_match(r"tally consistent:\s+yes").unwrap());
}

// ============================================================================
// Argument Tests
// ============================================================================

#[test]
fn test_zero_widgets_fails() {
    kiosk_cmd()
        .args(["--fast", "--widgets", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one widget"));
}

#[test]
fn test_help_works() {
    kiosk_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("shared counter"));
}

#[test]
fn test_version() {
    kiosk_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}
