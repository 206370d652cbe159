//! Shared test utilities for the E2E tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = LibraryFixture::new()
//!         .with_registry(&[("H5P.A", "repoA")])
//!         .with_library("repoA", "H5P.A", 0, &[]);
//!     fixture.command().arg("audit").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use serde_json::{json, Value};
use std::env;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::should_skip_network_tests;
    pub use super::LibraryFixture;
}

/// Returns `true` if the `SKIP_NETWORK_TESTS` environment variable is set.
#[allow(dead_code)]
pub fn should_skip_network_tests() -> bool {
    env::var("SKIP_NETWORK_TESTS").is_ok()
}

/// A temporary libraries directory plus a registry file beside the libraries.
///
/// ```rust,ignore
/// let fixture = LibraryFixture::new()
///     .with_registry(&[("H5P.A", "repoA"), ("H5P.B", "repoB")])
///     .with_library("repoA", "H5P.A", 0, &[("H5P.B", 1, 0)])
///     .with_library("repoB", "H5P.B", 0, &[]);
///
/// fixture
///     .command()
///     .args(["deps", "repoA", "--source", "local"])
///     .assert()
///     .success();
/// ```
pub struct LibraryFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl LibraryFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `libraries.json` as a list of `(machine name, repo name)`.
    pub fn with_registry(self, entries: &[(&str, &str)]) -> Self {
        let document: Vec<Value> = entries
            .iter()
            .map(|(machine, repo)| {
                json!({ "machineName": machine, "repoName": repo, "organization": "h5p" })
            })
            .collect();
        self.with_file("libraries.json", &Value::Array(document).to_string())
    }

    /// A library at version `1.<minor>.0` with the given preloaded
    /// dependencies `(machine name, major, minor)`.
    pub fn with_library(
        self,
        repo: &str,
        machine_name: &str,
        minor: u32,
        preloaded: &[(&str, u32, u32)],
    ) -> Self {
        self.with_manifest(repo, manifest(machine_name, minor, preloaded, &[]))
    }

    /// Like `with_library`, plus editor dependencies.
    pub fn with_editor_library(
        self,
        repo: &str,
        machine_name: &str,
        preloaded: &[(&str, u32, u32)],
        editor: &[(&str, u32, u32)],
    ) -> Self {
        self.with_manifest(repo, manifest(machine_name, 0, preloaded, editor))
    }

    pub fn with_manifest(self, repo: &str, manifest: Value) -> Self {
        let text = serde_json::to_string_pretty(&manifest).expect("Failed to render manifest");
        self.with_file(&format!("{}/library.json", repo), &text)
    }

    /// A semantics document with one `library` field offering `options`.
    pub fn with_semantics(self, repo: &str, options: &[&str]) -> Self {
        let document = json!([
            { "name": "content", "type": "group", "fields": [
                { "name": "library", "type": "library", "options": options }
            ]}
        ]);
        self.with_file(&format!("{}/semantics.json", repo), &document.to_string())
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Parsed JSON content of a file in the fixture.
    pub fn read_json(&self, path: &str) -> Value {
        let text = std::fs::read_to_string(self.path().join(path)).expect("Failed to read file");
        serde_json::from_str(&text).expect("Invalid JSON")
    }

    /// The `h5p-deps` binary pointed at this fixture through the environment,
    /// with colors off and the cache inside the fixture.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("h5p-deps");
        cmd.current_dir(self.path())
            .env("H5P_DEPS_LIBRARIES", self.path())
            .env("H5P_DEPS_REGISTRY", self.path().join("libraries.json"))
            .env("H5P_DEPS_CACHE", self.path().join(".cache"))
            .env_remove("RUST_LOG")
            .arg("--color=never");
        cmd
    }
}

impl Default for LibraryFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn deps(list: &[(&str, u32, u32)]) -> Vec<Value> {
    list.iter()
        .map(|(name, major, minor)| {
            json!({ "machineName": name, "majorVersion": major, "minorVersion": minor })
        })
        .collect()
}

fn manifest(
    machine_name: &str,
    minor: u32,
    preloaded: &[(&str, u32, u32)],
    editor: &[(&str, u32, u32)],
) -> Value {
    json!({
        "title": machine_name,
        "machineName": machine_name,
        "majorVersion": 1,
        "minorVersion": minor,
        "patchVersion": 0,
        "runnable": 1,
        "preloadedJs": [{ "path": "dist/main.js" }],
        "preloadedDependencies": deps(preloaded),
        "editorDependencies": deps(editor),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_writes_library() {
        let fixture = LibraryFixture::new().with_library("repoA", "H5P.A", 2, &[("H5P.B", 1, 0)]);
        let manifest = fixture.read_json("repoA/library.json");
        assert_eq!(manifest["minorVersion"], 2);
        assert_eq!(manifest["preloadedDependencies"][0]["machineName"], "H5P.B");
    }

    #[test]
    fn test_fixture_writes_registry() {
        let fixture = LibraryFixture::new().with_registry(&[("H5P.A", "repoA")]);
        assert_eq!(fixture.read_json("libraries.json")[0]["repoName"], "repoA");
    }
}
