//! # Manifest Sources
//!
//! A `ManifestSource` answers two questions about a library, given its
//! repository name: what does its `library.json` say, and does it have a
//! semantics document. The dependency resolver only ever talks to this trait.
//!
//! ## Implementations
//!
//! - **`LocalSource`**: a directory whose subdirectories are library
//!   checkouts named after their repositories.
//! - **`GitSource`**: shallow-clones a library's repository (URL taken from
//!   the registry) into the on-disk cache through `RepositoryManager`.
//! - **`ChainSource`**: tries several sources in order, moving on only when a
//!   source reports the library as not found.
//!
//! ## Failure Classification
//!
//! "Not found" (`Error::LibraryNotFound`) is distinct from transient failures
//! (`GitClone`, `Io`) so callers can report a missing library
//! differently from a flaky network.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::defaults::{DEFAULT_REF, MANIFEST_FILENAME, SEMANTICS_FILENAME};
use crate::error::{Error, Result};
use crate::git;
use crate::library::Manifest;
use crate::registry::RegistryIndex;
use crate::repository::RepositoryManager;
use crate::semantics::{self, SemanticsField};

/// Where manifests and semantics documents come from.
pub trait ManifestSource: Send + Sync {
    /// The parsed manifest of `repo_name`.
    fn manifest(&self, repo_name: &str) -> Result<Manifest>;

    /// The semantics tree of `repo_name`, or `None` when it has none.
    fn semantics(&self, repo_name: &str) -> Result<Option<Vec<SemanticsField>>>;
}

impl<T: ManifestSource + ?Sized> ManifestSource for Box<T> {
    fn manifest(&self, repo_name: &str) -> Result<Manifest> {
        (**self).manifest(repo_name)
    }

    fn semantics(&self, repo_name: &str) -> Result<Option<Vec<SemanticsField>>> {
        (**self).semantics(repo_name)
    }
}

/// Read `library.json` from a library directory.
pub fn read_manifest(dir: &Path, repo_name: &str) -> Result<Manifest> {
    let path = dir.join(MANIFEST_FILENAME);
    if !path.is_file() {
        return Err(Error::LibraryNotFound {
            repo_name: repo_name.to_string(),
        });
    }
    let text = fs::read_to_string(&path).map_err(|e| Error::ManifestUnreadable {
        repo_name: repo_name.to_string(),
        message: e.to_string(),
    })?;
    Manifest::from_json(repo_name, &text)
}

/// Read `semantics.json` from a library directory, if present.
pub fn read_semantics(dir: &Path) -> Result<Option<Vec<SemanticsField>>> {
    let path = dir.join(SEMANTICS_FILENAME);
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path)?;
    Ok(Some(semantics::parse(&text)?))
}

/// Libraries checked out side by side in one directory.
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ManifestSource for LocalSource {
    fn manifest(&self, repo_name: &str) -> Result<Manifest> {
        read_manifest(&self.root.join(repo_name), repo_name)
    }

    fn semantics(&self, repo_name: &str) -> Result<Option<Vec<SemanticsField>>> {
        read_semantics(&self.root.join(repo_name))
    }
}

/// Libraries fetched from their git repositories.
pub struct GitSource<'a> {
    registry: &'a RegistryIndex,
    repo_manager: RepositoryManager,
    ref_name: String,
}

impl<'a> GitSource<'a> {
    pub fn new(registry: &'a RegistryIndex, repo_manager: RepositoryManager) -> Self {
        Self {
            registry,
            repo_manager,
            ref_name: DEFAULT_REF.to_string(),
        }
    }

    fn checkout(&self, repo_name: &str) -> Result<PathBuf> {
        let entry = self
            .registry
            .by_repo_name(repo_name)
            .ok_or_else(|| Error::LibraryNotFound {
                repo_name: repo_name.to_string(),
            })?;
        let url = entry.clone_url();
        debug!("Fetching {} from {}", repo_name, url);
        self.repo_manager
            .fetch_repository(&url, &self.ref_name)
            .map_err(|e| {
                if git::is_missing_repository(&e) {
                    Error::LibraryNotFound {
                        repo_name: repo_name.to_string(),
                    }
                } else {
                    e
                }
            })
    }
}

impl ManifestSource for GitSource<'_> {
    fn manifest(&self, repo_name: &str) -> Result<Manifest> {
        read_manifest(&self.checkout(repo_name)?, repo_name)
    }

    fn semantics(&self, repo_name: &str) -> Result<Option<Vec<SemanticsField>>> {
        read_semantics(&self.checkout(repo_name)?)
    }
}

/// Several sources consulted in order.
pub struct ChainSource<'a> {
    sources: Vec<Box<dyn ManifestSource + 'a>>,
}

impl<'a> ChainSource<'a> {
    pub fn new(sources: Vec<Box<dyn ManifestSource + 'a>>) -> Self {
        Self { sources }
    }
}

impl ManifestSource for ChainSource<'_> {
    fn manifest(&self, repo_name: &str) -> Result<Manifest> {
        for source in &self.sources {
            match source.manifest(repo_name) {
                Err(e) if e.is_not_found() => continue,
                other => return other,
            }
        }
        Err(Error::LibraryNotFound {
            repo_name: repo_name.to_string(),
        })
    }

    /// Semantics come from the same source that provides the manifest.
    fn semantics(&self, repo_name: &str) -> Result<Option<Vec<SemanticsField>>> {
        for source in &self.sources {
            match source.manifest(repo_name) {
                Ok(_) => return source.semantics(repo_name),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}
