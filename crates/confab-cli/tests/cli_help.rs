use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("confab")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("send"))
        .stdout(predicate::str::contains("sessions"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("--base-url"));
}

#[test]
fn test_sessions_help_shows_subcommands() {
    cargo_bin_cmd!("confab")
        .args(["sessions", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn test_send_help_shows_options() {
    cargo_bin_cmd!("confab")
        .args(["send", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--file"))
        .stdout(predicate::str::contains("--session"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("confab")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}
