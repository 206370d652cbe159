//! The library dependency graph engine.
//!
//! ## Overview
//!
//! Four algorithms, each in its own module:
//! 1. Resolver - level-wise closure of one library's dependencies (`view` / `edit`)
//! 2. Propagator - cascade a minor-version bump through every local dependent
//! 3. Auditor - find diamond dependencies across the local collection
//! 4. Packaging - transitive set of local libraries to archive
//!
//! The resolver works against any `ManifestSource` plus the registry; the
//! other three work over a `LocalInventory` only.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::library::{LibraryIdentity, ManifestAssets};

pub mod auditor;
pub mod packaging;
pub mod propagator;
pub mod resolver;

pub use auditor::{Inconsistency, InconsistencyAuditor};
pub use packaging::{IgnoreRules, PackagePlan, PackagingClosure};
pub use propagator::{BumpOutcome, BumpResult, VersionPropagator};
pub use resolver::DependencyResolver;

/// Which dependency lists the resolver follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Runtime dependencies only.
    #[default]
    View,
    /// Runtime plus editor dependencies.
    Edit,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::View => write!(f, "view"),
            Mode::Edit => write!(f, "edit"),
        }
    }
}

/// Why a library entered the worklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Run,
    Edit,
    Semantics,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Run => write!(f, "run"),
            EdgeKind::Edit => write!(f, "edit"),
            EdgeKind::Semantics => write!(f, "semantics"),
        }
    }
}

/// Diagnostic record of the edge that discovered a library. Never affects
/// what gets resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeTag {
    pub source_repo_name: String,
    pub kind: EdgeKind,
}

impl EdgeTag {
    pub fn new(source_repo_name: &str, kind: EdgeKind) -> Self {
        Self {
            source_repo_name: source_repo_name.to_string(),
            kind,
        }
    }
}

/// One resolved library.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionEntry {
    /// Repository name, `None` when the library is unregistered.
    pub repo_name: Option<String>,
    /// Machine name as referenced, when known.
    pub machine_name: Option<String>,
    /// Identity from the fetched manifest; `None` when unregistered or when
    /// the manifest could not be fetched.
    pub identity: Option<LibraryIdentity>,
    pub assets: ManifestAssets,
    pub required_by: EdgeTag,
    pub depth: usize,
    pub optional: bool,
    /// Why the manifest could not be fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolutionEntry {
    /// Referenced by machine name but absent from the registry.
    pub fn is_unregistered(&self) -> bool {
        self.repo_name.is_none()
    }

    /// Best available display name.
    pub fn name(&self) -> &str {
        self.identity
            .as_ref()
            .map(|id| id.machine_name.as_str())
            .or(self.machine_name.as_deref())
            .or(self.repo_name.as_deref())
            .unwrap_or("<unknown>")
    }
}

/// Resolver output keyed by repository name (registered libraries) or
/// machine name (unregistered ones).
pub type Resolution = BTreeMap<String, ResolutionEntry>;
