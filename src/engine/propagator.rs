//! Version Propagation
//!
//! Bumps the minor version of a library and cascades the change through the
//! local collection: every library referencing the bumped one (in either
//! manifest dependency list or in a `library` semantics option) is pointed at
//! the new minor version, written back, and bumped in turn.
//!
//! ## Cycle Safety
//!
//! A single `visited` set is threaded through the whole cascade. A library is
//! marked before it is bumped, so each one is bumped at most once even when
//! the reference graph contains cycles. A requested target that is already
//! visited is reported as skipped.
//!
//! ## Partial Writes
//!
//! A dependent whose manifest and semantics are not both written is reported
//! as failed. It is still bumped when at least one rewritten file reached the
//! disk, so the collection never points at a version nobody carries.
//!
//! ## Concurrency
//!
//! Finding referencing libraries is a read-only scan done in parallel. All
//! edits and writes are sequential.

use std::collections::HashSet;
use std::fmt;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::inventory::{LocalInventory, LocalLibrary};
use crate::library::LibraryIdentity;

/// What happened to one library during a bump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum BumpOutcome {
    /// New `major.minor.patch` version.
    Bumped { version: String },
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BumpResult {
    pub repo_name: String,
    #[serde(flatten)]
    pub outcome: BumpOutcome,
}

impl BumpResult {
    pub fn is_bumped(&self) -> bool {
        matches!(self.outcome, BumpOutcome::Bumped { .. })
    }

    fn failed(repo_name: &str, reason: String) -> Self {
        Self {
            repo_name: repo_name.to_string(),
            outcome: BumpOutcome::Failed { reason },
        }
    }
}

/// Result of rewriting the references of one dependent.
struct Retargeted {
    /// Rewritten values that reached the disk.
    saved: usize,
    /// First write that failed, if any.
    error: Option<Error>,
}

impl fmt::Display for BumpResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            BumpOutcome::Bumped { version } => write!(f, "{} -> {}", self.repo_name, version),
            BumpOutcome::Skipped { reason } | BumpOutcome::Failed { reason } => {
                write!(f, "{}: {}", self.repo_name, reason)
            }
        }
    }
}

/// Cascading minor-version bumps over a local inventory.
pub struct VersionPropagator<'a> {
    inventory: &'a mut LocalInventory,
}

impl<'a> VersionPropagator<'a> {
    pub fn new(inventory: &'a mut LocalInventory) -> Self {
        Self { inventory }
    }

    /// Bump every library in `targets` (repository names) and everything
    /// that transitively references them.
    ///
    /// Targets already in `visited` are reported as skipped; every processed
    /// library is added to it. Results are in processing order.
    pub fn bump_minor(
        &mut self,
        targets: &[String],
        visited: &mut HashSet<String>,
    ) -> Vec<BumpResult> {
        let mut results = Vec::new();
        for target in targets {
            if visited.contains(target) {
                debug!("{} already bumped, skipping", target);
                results.push(BumpResult {
                    repo_name: target.clone(),
                    outcome: BumpOutcome::Skipped {
                        reason: "already bumped in this run".to_string(),
                    },
                });
                continue;
            }
            self.bump(target, visited, &mut results);
        }
        results
    }

    fn bump(&mut self, repo_name: &str, visited: &mut HashSet<String>, results: &mut Vec<BumpResult>) {
        visited.insert(repo_name.to_string());

        let identity = match self.bump_version(repo_name) {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Cannot bump {}: {}", repo_name, e);
                results.push(BumpResult::failed(repo_name, e.to_string()));
                return;
            }
        };
        info!("Bumped {} to {}", repo_name, identity.version_string());
        results.push(BumpResult {
            repo_name: repo_name.to_string(),
            outcome: BumpOutcome::Bumped {
                version: identity.version_string(),
            },
        });

        let mut rewritten = Vec::new();
        for dependent in self.referencing(&identity.machine_name) {
            let retargeted =
                match self.retarget(&dependent, &identity.machine_name, identity.minor_version) {
                    Ok(retargeted) => retargeted,
                    Err(e) => {
                        warn!("Cannot update references in {}: {}", dependent, e);
                        results.push(BumpResult::failed(
                            &dependent,
                            format!("references to {} not updated: {}", identity.machine_name, e),
                        ));
                        continue;
                    }
                };
            if let Some(e) = retargeted.error {
                warn!("References in {} only partly written: {}", dependent, e);
                results.push(BumpResult::failed(
                    &dependent,
                    format!(
                        "references to {} only partly written: {}",
                        identity.machine_name, e
                    ),
                ));
            }
            if retargeted.saved > 0 {
                debug!(
                    "Updated {} reference(s) to {} in {}",
                    retargeted.saved, identity.machine_name, dependent
                );
                rewritten.push(dependent);
            }
        }

        for dependent in rewritten {
            if !visited.contains(&dependent) {
                self.bump(&dependent, visited, results);
            }
        }
    }

    /// Increment minor, reset patch, persist.
    fn bump_version(&mut self, repo_name: &str) -> Result<LibraryIdentity> {
        if let Some(reason) = self.inventory.unreadable().get(repo_name) {
            return Err(Error::ManifestUnreadable {
                repo_name: repo_name.to_string(),
                message: reason.clone(),
            });
        }
        let library = self.inventory.get_mut(repo_name).ok_or_else(|| {
            Error::ManifestUnreadable {
                repo_name: repo_name.to_string(),
                message: "no library.json in the libraries directory".to_string(),
            }
        })?;
        let next_minor = library.identity().minor_version + 1;
        library.manifest_document_mut().set_version(next_minor, 0)?;
        let identity = library.identity();
        self.inventory.save_manifest(repo_name)?;
        Ok(identity)
    }

    /// Repository names of every library mentioning `machine_name`.
    fn referencing(&self, machine_name: &str) -> Vec<String> {
        let libraries: Vec<&LocalLibrary> = self.inventory.libraries().collect();
        libraries
            .par_iter()
            .filter(|library| library.references(machine_name))
            .map(|library| library.repo_name.clone())
            .collect()
    }

    /// Point `repo_name`'s references to `machine_name` at `minor_version`
    /// and persist what changed. Both files are attempted even if the first
    /// write fails.
    fn retarget(
        &mut self,
        repo_name: &str,
        machine_name: &str,
        minor_version: u32,
    ) -> Result<Retargeted> {
        let library = self
            .inventory
            .get_mut(repo_name)
            .ok_or_else(|| Error::LibraryNotFound {
                repo_name: repo_name.to_string(),
            })?;

        let in_manifest = library
            .manifest_document_mut()
            .retarget_dependency(machine_name, minor_version)?;
        let in_semantics = match library.semantics_mut() {
            Some(doc) => doc.retarget_library(machine_name, minor_version)?,
            None => 0,
        };

        let mut retargeted = Retargeted {
            saved: 0,
            error: None,
        };
        if in_manifest > 0 {
            match self.inventory.save_manifest(repo_name) {
                Ok(()) => retargeted.saved += in_manifest,
                Err(e) => retargeted.error = Some(e),
            }
        }
        if in_semantics > 0 {
            match self.inventory.save_semantics(repo_name) {
                Ok(()) => retargeted.saved += in_semantics,
                Err(e) => {
                    retargeted.error.get_or_insert(e);
                }
            }
        }
        Ok(retargeted)
    }
}
