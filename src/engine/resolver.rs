//! Dependency Resolution
//!
//! Computes the transitive dependency closure of one root library.
//!
//! ## Process
//!
//! The resolver works level by level (breadth first) rather than by plain
//! recursion:
//!
//! 1.  **Fetch**: every library on the current level has its manifest and
//!     semantics fetched in parallel. Unregistered libraries are not fetched.
//! 2.  **Fold**: results are folded in key order, independent of which fetch
//!     finished first. Each library becomes a `ResolutionEntry` at
//!     `depth = level`, and its edges are enqueued for the next level:
//!     `preloadedDependencies` (tagged `run`), `editorDependencies` in edit
//!     mode (tagged `edit`), and every library option of its semantics
//!     (tagged `semantics`, optional).
//! 3.  **Merge**: the per-level maps are folded from the deepest level up to
//!     level 0, each overwriting earlier keys, so the shallowest occurrence of
//!     a library wins.
//!
//! A library already processed on an earlier level, or already on the
//! current one, is not enqueued again; this keeps cycles finite. When two
//! libraries on the same level enqueue the same dependency, a required edge
//! takes precedence over an optional one.
//!
//! ## Failures
//!
//! Only the root matters: if its manifest cannot be fetched, resolution
//! fails. Any other library whose manifest is missing or corrupt is recorded
//! with `error` set and resolution of its siblings continues.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};

use log::{debug, warn};
use rayon::prelude::*;

use super::{EdgeKind, EdgeTag, Mode, Resolution, ResolutionEntry};
use crate::error::Result;
use crate::library::{DependencyRef, Manifest, ManifestAssets};
use crate::registry::RegistryIndex;
use crate::semantics::{self, SemanticsField};
use crate::source::ManifestSource;

/// A library waiting to be processed on the next level.
#[derive(Debug, Clone)]
struct WorkItem {
    /// `None` when the machine name is not in the registry.
    repo_name: Option<String>,
    machine_name: Option<String>,
    tag: EdgeTag,
    optional: bool,
}

/// Everything fetched for one library.
struct Fetched {
    manifest: Result<Manifest>,
    semantics: Result<Option<Vec<SemanticsField>>>,
}

/// Level-wise dependency closure over a registry and a manifest source.
pub struct DependencyResolver<'a> {
    registry: &'a RegistryIndex,
    source: &'a dyn ManifestSource,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(registry: &'a RegistryIndex, source: &'a dyn ManifestSource) -> Self {
        Self { registry, source }
    }

    /// Resolve every library reachable from `root` (a repository name).
    pub fn resolve(&self, root: &str, mode: Mode) -> Result<Resolution> {
        let mut worklist = BTreeMap::new();
        worklist.insert(
            root.to_string(),
            WorkItem {
                repo_name: Some(root.to_string()),
                machine_name: self
                    .registry
                    .by_repo_name(root)
                    .map(|entry| entry.machine_name.clone()),
                tag: EdgeTag::new(root, EdgeKind::Run),
                optional: false,
            },
        );

        let mut seen: HashSet<String> = HashSet::from([root.to_string()]);
        let mut level_results: Vec<Resolution> = Vec::new();
        let mut level = 0;

        while !worklist.is_empty() {
            debug!("Resolving level {} ({} libraries)", level, worklist.len());
            let current = std::mem::take(&mut worklist);

            let fetched: Vec<Option<Fetched>> = current
                .par_iter()
                .map(|(_, item)| item.repo_name.as_deref().map(|repo| self.fetch(repo)))
                .collect();

            let mut visited = Resolution::new();
            for ((key, item), fetched) in current.into_iter().zip(fetched) {
                let entry = match fetched {
                    None => {
                        debug!("{} is not in the registry", key);
                        unresolved_entry(item, level, None)
                    }
                    Some(Fetched {
                        manifest: Err(e), ..
                    }) => {
                        if level == 0 {
                            return Err(e);
                        }
                        warn!("Cannot read manifest of {}: {}", key, e);
                        unresolved_entry(item, level, Some(e.to_string()))
                    }
                    Some(Fetched {
                        manifest: Ok(manifest),
                        semantics,
                    }) => {
                        // An unregistered root is only known by repo name until now
                        if level == 0 {
                            seen.insert(manifest.machine_name.clone());
                        }
                        self.enqueue_edges(&key, &manifest, semantics, mode, &seen, &mut worklist);
                        ResolutionEntry {
                            repo_name: item.repo_name,
                            machine_name: Some(manifest.machine_name.clone()),
                            identity: Some(manifest.identity()),
                            assets: manifest.assets(),
                            required_by: item.tag,
                            depth: level,
                            optional: item.optional,
                            error: None,
                        }
                    }
                };
                visited.insert(key, entry);
            }

            seen.extend(worklist.keys().cloned());
            level_results.push(visited);
            level += 1;
        }

        // Deepest first, so shallower levels overwrite deeper duplicates
        let mut resolution = Resolution::new();
        for level_map in level_results.into_iter().rev() {
            resolution.extend(level_map);
        }
        Ok(resolution)
    }

    fn fetch(&self, repo_name: &str) -> Fetched {
        let manifest = self.source.manifest(repo_name);
        let semantics = match &manifest {
            Ok(_) => self.source.semantics(repo_name),
            Err(_) => Ok(None),
        };
        Fetched {
            manifest,
            semantics,
        }
    }

    fn enqueue_edges(
        &self,
        repo_name: &str,
        manifest: &Manifest,
        semantics: Result<Option<Vec<SemanticsField>>>,
        mode: Mode,
        seen: &HashSet<String>,
        next: &mut BTreeMap<String, WorkItem>,
    ) {
        for dep in &manifest.preloaded_dependencies {
            self.enqueue(next, seen, dep, EdgeTag::new(repo_name, EdgeKind::Run), false);
        }
        if mode == Mode::Edit {
            for dep in &manifest.editor_dependencies {
                self.enqueue(next, seen, dep, EdgeTag::new(repo_name, EdgeKind::Edit), false);
            }
        }
        for dep in semantic_refs(repo_name, semantics) {
            self.enqueue(
                next,
                seen,
                &dep,
                EdgeTag::new(repo_name, EdgeKind::Semantics),
                true,
            );
        }
    }

    fn enqueue(
        &self,
        next: &mut BTreeMap<String, WorkItem>,
        seen: &HashSet<String>,
        dep: &DependencyRef,
        tag: EdgeTag,
        optional: bool,
    ) {
        let repo_name = self
            .registry
            .repo_name_of(&dep.machine_name)
            .map(str::to_string);
        let key = repo_name
            .clone()
            .unwrap_or_else(|| dep.machine_name.clone());
        if seen.contains(&key) {
            return;
        }

        let item = WorkItem {
            repo_name,
            machine_name: Some(dep.machine_name.clone()),
            tag,
            optional,
        };
        match next.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(item);
            }
            Entry::Occupied(mut slot) => {
                if slot.get().optional && !optional {
                    slot.insert(item);
                }
            }
        }
    }
}

/// Library references of a fetched semantics document. Any failure means
/// "no embedded references" and is logged.
fn semantic_refs(
    repo_name: &str,
    semantics: Result<Option<Vec<SemanticsField>>>,
) -> Vec<DependencyRef> {
    match semantics.and_then(|doc| doc.map(|fields| semantics::extract(&fields)).transpose()) {
        Ok(refs) => refs.unwrap_or_default(),
        Err(e) => {
            warn!(
                "Semantics of {} unavailable, using manifest dependencies only: {}",
                repo_name, e
            );
            Vec::new()
        }
    }
}

fn unresolved_entry(item: WorkItem, depth: usize, error: Option<String>) -> ResolutionEntry {
    ResolutionEntry {
        repo_name: item.repo_name,
        machine_name: item.machine_name,
        identity: None,
        assets: ManifestAssets::default(),
        required_by: item.tag,
        depth,
        optional: item.optional,
        error,
    }
}
