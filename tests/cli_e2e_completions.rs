//! End-to-end tests for the `h5p-deps completions` command.

#[allow(dead_code)]
mod common;
#[allow(unused_imports)]
use common::prelude::*;

#[test]
fn test_completions_help() {
    let mut cmd = cargo_bin_cmd!("h5p-deps");
    cmd.arg("completions")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generate shell completion scripts"))
        .stdout(predicate::str::contains("bash"))
        .stdout(predicate::str::contains("powershell"))
        .stdout(predicate::str::contains("elvish"));
}

#[test]
fn test_completions_bash() {
    let mut cmd = cargo_bin_cmd!("h5p-deps");
    cmd.arg("completions")
        .arg("bash")
        .assert()
        .success()
        .stdout(predicate::str::contains("_h5p__deps()"))
        .stdout(predicate::str::contains("deps"))
        .stdout(predicate::str::contains("audit"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_completions_zsh() {
    let mut cmd = cargo_bin_cmd!("h5p-deps");
    cmd.arg("completions")
        .arg("zsh")
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef h5p-deps"))
        .stdout(predicate::str::contains("bump"));
}

#[test]
fn test_completions_fish() {
    let mut cmd = cargo_bin_cmd!("h5p-deps");
    cmd.arg("completions")
        .arg("fish")
        .assert()
        .success()
        .stdout(predicate::str::contains("complete -c h5p-deps"));
}
