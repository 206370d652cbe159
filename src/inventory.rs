//! # Local Inventory
//!
//! The set of library checkouts in one directory, each mapped to its parsed
//! manifest and optional semantics document. An inventory is loaded once per
//! top-level operation. The resolver, auditor and packaging closure only read
//! it; the version propagator edits documents in place and writes them back
//! through `save_manifest` / `save_semantics`.
//!
//! ## Loading Rules
//!
//! - Every immediate, non-hidden subdirectory containing `library.json` is a
//!   library; its directory name is its repository name.
//! - Libraries are parsed in parallel.
//! - A corrupt manifest excludes the library and is listed in `unreadable`.
//! - A corrupt semantics document is dropped with a warning; the library
//!   keeps its manifest edges.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::defaults::{MANIFEST_FILENAME, SEMANTICS_FILENAME};
use crate::error::{Error, Result};
use crate::library::{DependencyRef, LibraryIdentity, Manifest, ManifestDocument};
use crate::semantics::SemanticsDocument;

/// One library checkout.
#[derive(Debug, Clone)]
pub struct LocalLibrary {
    pub repo_name: String,
    pub dir: PathBuf,
    manifest: ManifestDocument,
    semantics: Option<SemanticsDocument>,
}

impl LocalLibrary {
    /// Read a library directory.
    pub fn load(repo_name: &str, dir: &Path) -> Result<Self> {
        let text = fs::read_to_string(dir.join(MANIFEST_FILENAME)).map_err(|e| {
            Error::ManifestUnreadable {
                repo_name: repo_name.to_string(),
                message: e.to_string(),
            }
        })?;
        let manifest = ManifestDocument::parse(repo_name, &text)?;

        let semantics_path = dir.join(SEMANTICS_FILENAME);
        let semantics = if semantics_path.is_file() {
            match fs::read_to_string(&semantics_path)
                .map_err(Error::from)
                .and_then(|text| SemanticsDocument::parse(&text))
            {
                Ok(doc) => Some(doc),
                Err(e) => {
                    warn!("Ignoring semantics of {}: {}", repo_name, e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            repo_name: repo_name.to_string(),
            dir: dir.to_path_buf(),
            manifest,
            semantics,
        })
    }

    pub fn manifest(&self) -> &Manifest {
        self.manifest.manifest()
    }

    pub fn manifest_document_mut(&mut self) -> &mut ManifestDocument {
        &mut self.manifest
    }

    pub fn semantics(&self) -> Option<&SemanticsDocument> {
        self.semantics.as_ref()
    }

    pub fn semantics_mut(&mut self) -> Option<&mut SemanticsDocument> {
        self.semantics.as_mut()
    }

    pub fn identity(&self) -> LibraryIdentity {
        self.manifest().identity()
    }

    /// Library references embedded in the semantics document.
    ///
    /// A malformed document yields no references and a warning.
    pub fn semantics_refs(&self) -> Vec<DependencyRef> {
        match self.semantics.as_ref().map(SemanticsDocument::library_refs) {
            Some(Ok(refs)) => refs,
            Some(Err(e)) => {
                warn!(
                    "Semantics of {} unavailable, using manifest dependencies only: {}",
                    self.repo_name, e
                );
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Whether the manifest or semantics of this library mention
    /// `machine_name`.
    pub fn references(&self, machine_name: &str) -> bool {
        self.manifest().references(machine_name)
            || self
                .semantics
                .as_ref()
                .is_some_and(|doc| doc.references(machine_name))
    }
}

/// All libraries of one directory.
#[derive(Debug, Default)]
pub struct LocalInventory {
    libraries: BTreeMap<String, LocalLibrary>,
    unreadable: BTreeMap<String, String>,
}

impl LocalInventory {
    /// Scan `root` for library directories.
    pub fn load(root: &Path) -> Result<Self> {
        let mut candidates = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if name.starts_with('.') || !entry.path().join(MANIFEST_FILENAME).is_file() {
                continue;
            }
            candidates.push((name.to_string(), entry.path().to_path_buf()));
        }

        let loaded: Vec<(String, Result<LocalLibrary>)> = candidates
            .par_iter()
            .map(|(name, dir)| (name.clone(), LocalLibrary::load(name, dir)))
            .collect();

        let mut inventory = Self::default();
        for (name, result) in loaded {
            match result {
                Ok(library) => {
                    inventory.libraries.insert(name, library);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", name, e);
                    inventory.unreadable.insert(name, e.to_string());
                }
            }
        }
        debug!(
            "Loaded {} local libraries from {}",
            inventory.libraries.len(),
            root.display()
        );
        Ok(inventory)
    }

    pub fn get(&self, repo_name: &str) -> Option<&LocalLibrary> {
        self.libraries.get(repo_name)
    }

    pub fn get_mut(&mut self, repo_name: &str) -> Option<&mut LocalLibrary> {
        self.libraries.get_mut(repo_name)
    }

    /// Repository names in sorted order.
    pub fn repo_names(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }

    /// Libraries in repository-name order.
    pub fn libraries(&self) -> impl Iterator<Item = &LocalLibrary> {
        self.libraries.values()
    }

    /// Directories whose manifest could not be read, with the reason.
    pub fn unreadable(&self) -> &BTreeMap<String, String> {
        &self.unreadable
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Map from `(machine_name, major, minor)` to the repository realizing it.
    /// When several repositories share an identity the first by name wins.
    pub fn identity_index(&self) -> HashMap<DependencyRef, &str> {
        let mut index = HashMap::new();
        for library in self.libraries.values() {
            index
                .entry(library.identity().versioned_name())
                .or_insert(library.repo_name.as_str());
        }
        index
    }

    /// Resolve a library by repository name or, failing that, machine name.
    pub fn find(&self, name: &str) -> Option<&LocalLibrary> {
        self.get(name).or_else(|| {
            self.libraries
                .values()
                .find(|library| library.manifest().machine_name == name)
        })
    }

    /// Write the (possibly edited) manifest of `repo_name` back to disk.
    pub fn save_manifest(&self, repo_name: &str) -> Result<()> {
        let library = self.require(repo_name)?;
        let text = library.manifest.to_pretty_string()?;
        fs::write(library.dir.join(MANIFEST_FILENAME), text)?;
        Ok(())
    }

    /// Write the (possibly edited) semantics of `repo_name` back to disk.
    pub fn save_semantics(&self, repo_name: &str) -> Result<()> {
        let library = self.require(repo_name)?;
        if let Some(doc) = &library.semantics {
            fs::write(library.dir.join(SEMANTICS_FILENAME), doc.to_pretty_string()?)?;
        }
        Ok(())
    }

    fn require(&self, repo_name: &str) -> Result<&LocalLibrary> {
        self.get(repo_name).ok_or_else(|| Error::LibraryNotFound {
            repo_name: repo_name.to_string(),
        })
    }
}
