//! End-to-end tests for the `tree` command.

mod common;
use common::prelude::*;

fn chain() -> LibraryFixture {
    LibraryFixture::new()
        .with_registry(&[("H5P.A", "repoA"), ("H5P.B", "repoB"), ("H5P.C", "repoC")])
        .with_library("repoA", "H5P.A", 0, &[("H5P.B", 1, 0)])
        .with_library("repoB", "H5P.B", 0, &[("H5P.C", 1, 0)])
        .with_library("repoC", "H5P.C", 0, &[("H5P.A", 1, 0)])
}

#[test]
fn test_tree_help() {
    let mut cmd = cargo_bin_cmd!("h5p-deps");
    cmd.args(["tree", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Display the dependency tree of a library"))
        .stdout(predicate::str::contains("--depth"));
}

#[test]
fn test_tree_nests_by_required_by() {
    let output = chain()
        .command()
        .args(["tree", "repoA", "--source", "local"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let a = stdout.find("repoA  H5P.A").unwrap();
    let b = stdout.find("repoB  H5P.B").unwrap();
    let c = stdout.find("repoC  H5P.C").unwrap();
    assert!(a < b && b < c);
    // The cycle back to repoA is not expanded again
    assert_eq!(stdout.matches("H5P.A 1.0.0").count(), 1);
}

#[test]
fn test_tree_depth_limit() {
    chain()
        .command()
        .args(["tree", "repoA", "--source", "local", "--depth", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("repoB"))
        .stdout(predicate::str::contains("repoC").not());
}
