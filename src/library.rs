//! # Library Data Model
//!
//! Typed records for a library's `library.json` manifest and the identities
//! the dependency graph is built from.
//!
//! - **`LibraryIdentity`**: machine name plus full `major.minor.patch` version.
//! - **`DependencyRef`**: an unresolved edge `(machine_name, major, minor)`.
//!   This triple is also the identity used for dependency matching; patch
//!   versions never distinguish edges.
//! - **`Manifest`**: the typed view of `library.json`. Keys the engine does
//!   not interpret are kept in `extra` so nothing is lost on a round trip.
//! - **`ManifestDocument`**: a manifest together with its raw JSON document,
//!   used when a manifest must be edited and written back with its original
//!   key order intact.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Manifest keys holding dependency lists.
const PRELOADED_DEPENDENCIES: &str = "preloadedDependencies";
const EDITOR_DEPENDENCIES: &str = "editorDependencies";

/// Full identity of a library build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryIdentity {
    pub machine_name: String,
    pub major_version: u32,
    pub minor_version: u32,
    pub patch_version: u32,
}

impl LibraryIdentity {
    /// The `(machine_name, major, minor)` identity used for edge matching.
    pub fn versioned_name(&self) -> DependencyRef {
        DependencyRef::new(&self.machine_name, self.major_version, self.minor_version)
    }

    /// `major.minor.patch`
    pub fn version_string(&self) -> String {
        format!(
            "{}.{}.{}",
            self.major_version, self.minor_version, self.patch_version
        )
    }
}

impl fmt::Display for LibraryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.machine_name, self.version_string())
    }
}

/// A dependency edge as written in a manifest or a semantics option.
///
/// Ordering is by machine name, then numerically by major and minor version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRef {
    pub machine_name: String,
    pub major_version: u32,
    pub minor_version: u32,
}

impl DependencyRef {
    pub fn new(machine_name: &str, major_version: u32, minor_version: u32) -> Self {
        Self {
            machine_name: machine_name.to_string(),
            major_version,
            minor_version,
        }
    }

    /// `major.minor`
    pub fn version(&self) -> String {
        format!("{}.{}", self.major_version, self.minor_version)
    }
}

/// Formats as a semantics option string, e.g. `H5P.Text 1.1`.
impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.machine_name, self.version())
    }
}

/// A file listed in `preloadedJs` / `preloadedCss`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub path: String,
}

/// The asset lists of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestAssets {
    pub preloaded_js: Vec<FileRef>,
    pub preloaded_css: Vec<FileRef>,
}

/// Typed view of a `library.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub machine_name: String,
    pub major_version: u32,
    pub minor_version: u32,
    pub patch_version: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preloaded_js: Vec<FileRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preloaded_css: Vec<FileRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preloaded_dependencies: Vec<DependencyRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub editor_dependencies: Vec<DependencyRef>,
    /// Every other key of the document (title, author, license, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    /// Parse a manifest, attributing failures to `repo_name`.
    pub fn from_json(repo_name: &str, text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::ManifestUnreadable {
            repo_name: repo_name.to_string(),
            message: e.to_string(),
        })
    }

    pub fn identity(&self) -> LibraryIdentity {
        LibraryIdentity {
            machine_name: self.machine_name.clone(),
            major_version: self.major_version,
            minor_version: self.minor_version,
            patch_version: self.patch_version,
        }
    }

    pub fn assets(&self) -> ManifestAssets {
        ManifestAssets {
            preloaded_js: self.preloaded_js.clone(),
            preloaded_css: self.preloaded_css.clone(),
        }
    }

    /// Preloaded followed by editor dependencies.
    pub fn all_dependencies(&self) -> impl Iterator<Item = &DependencyRef> {
        self.preloaded_dependencies
            .iter()
            .chain(self.editor_dependencies.iter())
    }

    /// Whether any dependency list mentions `machine_name`.
    pub fn references(&self, machine_name: &str) -> bool {
        self.all_dependencies()
            .any(|dep| dep.machine_name == machine_name)
    }
}

/// A manifest plus the raw document it was parsed from.
///
/// Edits are applied to the raw document and the typed view is re-derived,
/// so unknown keys and key order survive a write-back.
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    manifest: Manifest,
    raw: Value,
}

impl ManifestDocument {
    pub fn parse(repo_name: &str, text: &str) -> Result<Self> {
        let unreadable = |message: String| Error::ManifestUnreadable {
            repo_name: repo_name.to_string(),
            message,
        };
        let raw: Value = serde_json::from_str(text).map_err(|e| unreadable(e.to_string()))?;
        let manifest =
            serde_json::from_value(raw.clone()).map_err(|e| unreadable(e.to_string()))?;
        Ok(Self { manifest, raw })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Set the library's own minor and patch versions.
    pub fn set_version(&mut self, minor_version: u32, patch_version: u32) -> Result<()> {
        if let Value::Object(map) = &mut self.raw {
            map.insert("minorVersion".to_string(), Value::from(minor_version));
            map.insert("patchVersion".to_string(), Value::from(patch_version));
        }
        self.refresh()
    }

    /// Point every dependency on `machine_name` at `minor_version`.
    ///
    /// Returns the number of edges whose value actually changed.
    pub fn retarget_dependency(&mut self, machine_name: &str, minor_version: u32) -> Result<usize> {
        let mut changed = 0;
        if let Value::Object(map) = &mut self.raw {
            for key in [PRELOADED_DEPENDENCIES, EDITOR_DEPENDENCIES] {
                let Some(Value::Array(deps)) = map.get_mut(key) else {
                    continue;
                };
                for dep in deps.iter_mut().filter_map(Value::as_object_mut) {
                    if dep.get("machineName").and_then(Value::as_str) != Some(machine_name) {
                        continue;
                    }
                    if dep.get("minorVersion").and_then(Value::as_u64)
                        != Some(u64::from(minor_version))
                    {
                        dep.insert("minorVersion".to_string(), Value::from(minor_version));
                        changed += 1;
                    }
                }
            }
        }
        if changed > 0 {
            self.refresh()?;
        }
        Ok(changed)
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(&self.raw)?;
        text.push('\n');
        Ok(text)
    }

    fn refresh(&mut self) -> Result<()> {
        self.manifest = serde_json::from_value(self.raw.clone())?;
        Ok(())
    }
}
