// End-to-end checks on the compiled binary. Both scenarios exit before
// any network call is made, so no server is needed.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn missing_password_prints_usage_and_exits_1() {
    Command::cargo_bin("spbackup")
        .unwrap()
        .env_remove("SP_PASSWORD")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("SP_PASSWORD"))
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn empty_directory_warns_and_exits_0() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("spbackup")
        .unwrap()
        .env("SP_PASSWORD", "secret")
        // Unroutable on purpose: this run must never reach the network.
        .env("SP_SERVER_URL", "http://127.0.0.1:9")
        .arg(dir.path())
        .assert()
        .code(0)
        .stderr(predicate::str::contains("No .txt files found"));
}

#[test]
fn missing_directory_warns_and_exits_0() {
    let dir = tempfile::tempdir().unwrap();
    let gone = dir.path().join("not-there");
    Command::cargo_bin("spbackup")
        .unwrap()
        .env("SP_PASSWORD", "secret")
        .env("SP_SERVER_URL", "http://127.0.0.1:9")
        .arg(&gone)
        .assert()
        .code(0)
        .stderr(predicate::str::contains("Cannot read directory"));
}
