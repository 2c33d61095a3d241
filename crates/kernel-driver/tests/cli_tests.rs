//! End-to-end tests driving the `kernel` binary as a subprocess, the same
//! way `faxc-drv`'s `cli_tests.rs` drives `faxc`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn kernel_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_kernel-rs"))
}

#[test]
fn help_mentions_usage() {
    kernel_bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_reports_something() {
    kernel_bin().arg("--version").assert().success();
}

#[test]
fn eval_prints_the_resulting_value() {
    kernel_bin()
        .args(["--eval", "(+ 1 2)"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3"));
}

#[test]
fn eval_runs_every_top_level_form_in_order() {
    kernel_bin()
        .args(["--eval", "($define! x 10) (* x x)"])
        .assert()
        .success()
        .stdout(predicate::str::contains("100"));
}

#[test]
fn batch_mode_exits_non_zero_on_an_unbound_symbol() {
    kernel_bin()
        .args(["--eval", "unbound-name"])
        .assert()
        .failure();
}

#[test]
fn script_file_is_read_and_evaluated() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "(* 6 7)").unwrap();

    kernel_bin()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("42"));
}

#[test]
fn stdin_session_resumes_after_an_error() {
    kernel_bin()
        .write_stdin("unbound-name\n(+ 1 1)\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("2"))
        .stderr(predicate::str::contains("error"));
}

#[test]
fn kernel_config_env_var_is_rejected_when_malformed() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "this is not valid toml = = =").unwrap();

    kernel_bin()
        .env("KERNEL_CONFIG", file.path())
        .args(["--eval", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn kernel_config_file_is_read_and_does_not_disturb_normal_evaluation() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "heap_limit = 10000000").unwrap();

    kernel_bin()
        .env("KERNEL_CONFIG", file.path())
        .args(["--eval", "(+ 1 2)"])
        .assert()
        .success()
        .stdout(predicate::str::contains('3'));
}
