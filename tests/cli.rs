//! Binary-level tests. Anything touching a real display or the OS hotkey
//! hook is out of scope here; these cover argument handling only.

use assert_cmd::Command;
use predicates::prelude::*;

fn quickshot() -> Command {
    Command::cargo_bin("quickshot").unwrap()
}

#[test]
fn help_describes_the_tool() {
    quickshot()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("screenshot"))
        .stdout(predicate::str::contains("--listen"))
        .stdout(predicate::str::contains("--region"));
}

#[test]
fn no_args_prints_usage() {
    quickshot()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("print_screen"));
}

#[test]
fn malformed_region_spec_is_rejected() {
    quickshot()
        .args(["--region", "not-a-rect"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid region"))
        .stderr(predicate::str::contains("X,Y,WxH"));
}

#[test]
fn zero_area_region_spec_is_rejected() {
    quickshot()
        .args(["--region", "0,0,0x100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-zero area"));
}

#[test]
fn version_flag_works() {
    quickshot()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quickshot"));
}
