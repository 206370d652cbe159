//! Packaging Closure
//!
//! Decides which local libraries go into an archive and which of their files
//! are included.
//!
//! Dependencies are matched by `(machine_name, major, minor)` against the
//! identities of local manifests, so a checkout of the wrong minor version is
//! not pulled in just because its machine name matches. Requested libraries
//! without local data are kept in the result so the caller can report them
//! instead of silently dropping them.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::debug;
use walkdir::WalkDir;

use crate::defaults::{DEFAULT_IGNORE_PATTERNS, IGNORE_FILENAME};
use crate::error::Result;
use crate::inventory::LocalInventory;
use crate::library::DependencyRef;
use crate::path::{compile_globs, matches_any};

/// Glob rules for files left out of a package.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    patterns: Vec<Pattern>,
}

impl IgnoreRules {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            patterns: compile_globs(patterns)?,
        })
    }

    /// The built-in rules (VCS metadata, `node_modules`, archives).
    pub fn defaults() -> Result<Self> {
        Self::new(DEFAULT_IGNORE_PATTERNS)
    }

    /// These rules plus the lines of `dir/.h5pignore`, if it exists.
    ///
    /// Blank lines and `#` comments are skipped; a trailing `/` ignores the
    /// whole directory.
    pub fn with_ignore_file(&self, dir: &Path) -> Result<Self> {
        let path = dir.join(IGNORE_FILENAME);
        if !path.is_file() {
            return Ok(self.clone());
        }
        let text = fs::read_to_string(&path)?;
        let extra: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .flat_map(|line| match line.strip_suffix('/') {
                Some(dir) => vec![dir.to_string(), format!("{}/**", dir)],
                None => vec![line.to_string()],
            })
            .collect();

        let mut rules = self.clone();
        rules.patterns.extend(compile_globs(&extra)?);
        Ok(rules)
    }

    /// Whether a `/`-separated path relative to the library directory is
    /// ignored.
    pub fn is_ignored(&self, relative: &str) -> bool {
        matches_any(&self.patterns, relative)
    }
}

/// Files to archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackagePlan {
    /// Paths relative to the libraries directory, grouped by library.
    pub files: Vec<PathBuf>,
    /// Requested libraries with no local checkout.
    pub missing: Vec<String>,
}

pub struct PackagingClosure<'a> {
    inventory: &'a LocalInventory,
}

impl<'a> PackagingClosure<'a> {
    pub fn new(inventory: &'a LocalInventory) -> Self {
        Self { inventory }
    }

    /// `requested` (in order) followed by every local library they
    /// transitively depend on, in depth-first discovery order.
    pub fn closure(&self, requested: &[String]) -> Vec<String> {
        let index = self.inventory.identity_index();
        let mut included: HashSet<String> = HashSet::new();
        let mut result = Vec::new();

        for repo_name in requested {
            if included.insert(repo_name.clone()) {
                result.push(repo_name.clone());
            }
        }
        for repo_name in requested {
            self.collect(repo_name, &index, &mut included, &mut result);
        }
        result
    }

    fn collect(
        &self,
        repo_name: &str,
        index: &HashMap<DependencyRef, &str>,
        included: &mut HashSet<String>,
        result: &mut Vec<String>,
    ) {
        let Some(library) = self.inventory.get(repo_name) else {
            return;
        };
        for dep in library.manifest().all_dependencies() {
            let Some(dep_repo) = index.get(dep) else {
                debug!("{} needs {}, not available locally", repo_name, dep);
                continue;
            };
            if included.insert(dep_repo.to_string()) {
                result.push(dep_repo.to_string());
                self.collect(dep_repo, index, included, result);
            }
        }
    }

    /// List the files of `repo_names`, skipping ignored paths.
    pub fn package_files(&self, repo_names: &[String], rules: &IgnoreRules) -> Result<PackagePlan> {
        let mut plan = PackagePlan::default();
        for repo_name in repo_names {
            let Some(library) = self.inventory.get(repo_name) else {
                plan.missing.push(repo_name.clone());
                continue;
            };
            let rules = rules.with_ignore_file(&library.dir)?;
            let dir = library.dir.as_path();

            let walker = WalkDir::new(dir)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| {
                    entry.depth() == 0 || !rules.is_ignored(&relative_path(dir, entry.path()))
                });
            for entry in walker {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = relative_path(dir, entry.path());
                plan.files.push(Path::new(repo_name).join(relative));
            }
        }
        debug!(
            "Packaging {} files, {} libraries missing",
            plan.files.len(),
            plan.missing.len()
        );
        Ok(plan)
    }
}

/// `/`-separated path of `path` below `base`.
fn relative_path(base: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::MANIFEST_FILENAME;
    use tempfile::TempDir;

    fn write_library(root: &Path, repo: &str, name: &str, minor: u32, deps: &[(&str, u32)]) {
        let deps: Vec<_> = deps
            .iter()
            .map(|(dep, minor)| {
                serde_json::json!({ "machineName": dep, "majorVersion": 1, "minorVersion": minor })
            })
            .collect();
        let manifest = serde_json::json!({
            "machineName": name,
            "majorVersion": 1,
            "minorVersion": minor,
            "patchVersion": 0,
            "preloadedDependencies": deps,
        });
        let dir = root.join(repo);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILENAME), manifest.to_string()).unwrap();
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_closure_with_cycle() {
        let temp = TempDir::new().unwrap();
        write_library(temp.path(), "repoX", "H5P.X", 0, &[("H5P.Y", 0)]);
        write_library(temp.path(), "repoY", "H5P.Y", 0, &[("H5P.X", 0)]);
        let inventory = LocalInventory::load(temp.path()).unwrap();

        let closure = PackagingClosure::new(&inventory).closure(&names(&["repoX"]));
        assert_eq!(closure, names(&["repoX", "repoY"]));
    }

    #[test]
    fn test_closure_matches_exact_minor_version() {
        let temp = TempDir::new().unwrap();
        write_library(temp.path(), "repoA", "H5P.A", 0, &[("H5P.B", 2), ("H5P.C", 0)]);
        write_library(temp.path(), "repoB", "H5P.B", 3, &[]);
        write_library(temp.path(), "repoC", "H5P.C", 0, &[("H5P.D", 0)]);
        write_library(temp.path(), "repoD", "H5P.D", 0, &[]);
        let inventory = LocalInventory::load(temp.path()).unwrap();

        let closure = PackagingClosure::new(&inventory).closure(&names(&["repoA"]));
        assert_eq!(closure, names(&["repoA", "repoC", "repoD"]));
    }

    #[test]
    fn test_closure_keeps_missing_requested_repos() {
        let temp = TempDir::new().unwrap();
        write_library(temp.path(), "repoA", "H5P.A", 0, &[]);
        let inventory = LocalInventory::load(temp.path()).unwrap();

        let closure = PackagingClosure::new(&inventory).closure(&names(&["repoGhost", "repoA"]));
        assert_eq!(closure, names(&["repoGhost", "repoA"]));
    }

    #[test]
    fn test_package_files_applies_ignore_rules() {
        let temp = TempDir::new().unwrap();
        write_library(temp.path(), "repoA", "H5P.A", 0, &[]);
        let dir = temp.path().join("repoA");
        for path in [
            "js/a.js",
            "css/a.css",
            ".git/HEAD",
            "node_modules/x/index.js",
            "build/out.js",
            "notes.txt",
            "old.zip",
        ] {
            let file = dir.join(path);
            fs::create_dir_all(file.parent().unwrap()).unwrap();
            fs::write(file, "x").unwrap();
        }
        fs::write(dir.join(IGNORE_FILENAME), "# local rules\nbuild/\n*.txt\n").unwrap();
        let inventory = LocalInventory::load(temp.path()).unwrap();

        let plan = PackagingClosure::new(&inventory)
            .package_files(&names(&["repoA", "repoGhost"]), &IgnoreRules::defaults().unwrap())
            .unwrap();

        let files: Vec<String> = plan
            .files
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(
            files,
            vec!["repoA/css/a.css", "repoA/js/a.js", "repoA/library.json"]
        );
        assert_eq!(plan.missing, names(&["repoGhost"]));
    }

    #[test]
    fn test_invalid_ignore_pattern_is_an_error() {
        assert!(IgnoreRules::new(["[unclosed"]).is_err());
    }
}
