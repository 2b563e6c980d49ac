//! Integration tests for login/logout commands.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

/// Test: login stores the session record.
#[test]
fn test_login_stores_session() {
    let temp = tempdir().unwrap();
    let session_path = temp.path().join("session.json");

    cargo_bin_cmd!("paceline")
        .env("PACELINE_HOME", temp.path())
        .args(["login", "--email", "mentee@example.com", "--name", "Mentee"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as mentee@example.com"));

    assert!(session_path.exists(), "session.json should exist");

    let contents = fs::read_to_string(&session_path).unwrap();
    assert!(contents.contains("mentee@example.com"));
    assert!(contents.contains("\"uid\""));
    assert!(contents.contains("signed_in_at"));
}

/// Test: logout clears the session record.
#[test]
fn test_logout_clears_session() {
    let temp = tempdir().unwrap();
    let session_path = temp.path().join("session.json");

    cargo_bin_cmd!("paceline")
        .env("PACELINE_HOME", temp.path())
        .args(["login", "--email", "mentee@example.com"])
        .assert()
        .success();
    assert!(session_path.exists());

    cargo_bin_cmd!("paceline")
        .env("PACELINE_HOME", temp.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out"));

    assert!(!session_path.exists(), "session.json should be removed");
}

/// Test: logout when not signed in shows message.
#[test]
fn test_logout_when_not_signed_in() {
    let temp = tempdir().unwrap();

    cargo_bin_cmd!("paceline")
        .env("PACELINE_HOME", temp.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in"));
}

/// Test: login rejects an empty email.
#[test]
fn test_login_rejects_empty_email() {
    let temp = tempdir().unwrap();

    cargo_bin_cmd!("paceline")
        .env("PACELINE_HOME", temp.path())
        .args(["login", "--email", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty"));
}

/// Test: login rejects a value with no '@'.
#[test]
fn test_login_rejects_invalid_email() {
    let temp = tempdir().unwrap();

    cargo_bin_cmd!("paceline")
        .env("PACELINE_HOME", temp.path())
        .args(["login", "--email", "not-an-email"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not look like an email"));
}

/// Test: session.json has restricted permissions on Unix.
#[cfg(unix)]
#[test]
fn test_session_file_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempdir().unwrap();
    let session_path = temp.path().join("session.json");

    cargo_bin_cmd!("paceline")
        .env("PACELINE_HOME", temp.path())
        .args(["login", "--email", "mentee@example.com"])
        .assert()
        .success();

    let mode = fs::metadata(&session_path).unwrap().permissions().mode();
    assert_eq!(
        mode & 0o777,
        0o600,
        "session.json should have 0600 permissions"
    );
}

/// Test: status reflects login state.
#[test]
fn test_status_reflects_login_state() {
    let temp = tempdir().unwrap();

    cargo_bin_cmd!("paceline")
        .env("PACELINE_HOME", temp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in: no"))
        .stdout(predicate::str::contains("Cached session flag: unset"));

    cargo_bin_cmd!("paceline")
        .env("PACELINE_HOME", temp.path())
        .args(["login", "--email", "mentee@example.com", "--name", "Mentee"])
        .assert()
        .success();

    cargo_bin_cmd!("paceline")
        .env("PACELINE_HOME", temp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in: yes (Mentee)"));
}
