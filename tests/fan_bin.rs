use assert_cmd::Command;
use predicates::prelude::*;

fn fan() -> Command {
    let mut cmd = Command::cargo_bin("fan").unwrap();
    cmd.env_remove("fan_runtime").env_remove("fan_launcher_debug");
    cmd
}

#[test]
fn test_unknown_runtime_on_cmd_line_fails() {
    fan()
        .args(["--Druntime=bogus", "script.fan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ERROR: Unknown runtime bogus"));
}

#[test]
fn test_unknown_runtime_from_env_fails() {
    fan()
        .env("fan_runtime", "bogus")
        .arg("script.fan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown runtime bogus"));
}

#[test]
fn test_cmd_line_runtime_beats_env() {
    fan()
        .env("fan_runtime", "java")
        .arg("--Druntime=nope")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown runtime nope"));
}

#[test]
fn test_verbose_output() {
    fan()
        .args(["--v", "--Druntime=bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("-- launcher version"))
        .stderr(predicate::str::contains("override prop runtime=bogus"));
}

#[test]
fn test_debug_env_enables_verbose() {
    fan()
        .env("fan_launcher_debug", "1")
        .arg("--Druntime=bogus")
        .assert()
        .failure()
        .stderr(predicate::str::contains("-- runtime = bogus"));
}

#[cfg(unix)]
#[test]
fn test_non_unicode_argument_exits_with_failure_code() {
    use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

    fan()
        .arg("script.fan")
        .arg(OsStr::from_bytes(b"caf\xe9.fan"))
        .assert()
        .code(255)
        .stderr(predicate::str::contains("ERROR: Invalid argument"))
        .stderr(predicate::str::contains("panicked").not());
}
