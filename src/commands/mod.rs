//! # CLI Command Implementations
//!
//! Each subcommand of `h5p-deps` lives in its own file with an `Args` struct
//! (derived with `clap`) and an `execute` function calling into the
//! `h5p_deps` library.
//!
//! Option groups shared by several commands are defined here and flattened
//! into the per-command `Args`:
//!
//! - [`InventoryArgs`]: where the local library checkouts live.
//! - [`RegistryArgs`]: where the registry comes from.
//! - [`ResolveArgs`]: everything needed to resolve one library.

pub mod audit;
pub mod bump;
pub mod completions;
pub mod deps;
pub mod missing;
pub mod pack;
pub mod registry;
pub mod tree;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use log::debug;

use h5p_deps::cache::CachedSource;
use h5p_deps::defaults::{default_cache_root, DEFAULT_REF, DEFAULT_REGISTRY_URL};
use h5p_deps::engine::{DependencyResolver, Mode, Resolution};
use h5p_deps::inventory::LocalInventory;
use h5p_deps::registry::RegistryIndex;
use h5p_deps::repository::RepositoryManager;
use h5p_deps::source::{ChainSource, GitSource, LocalSource, ManifestSource};
use h5p_deps::suggestions;

/// Location of the local library checkouts.
#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    /// Directory whose subdirectories are library checkouts.
    #[arg(long, value_name = "DIR", env = "H5P_DEPS_LIBRARIES", default_value = ".")]
    pub libraries_dir: PathBuf,
}

impl InventoryArgs {
    pub fn load(&self) -> Result<LocalInventory> {
        let inventory = LocalInventory::load(&self.libraries_dir)
            .map_err(|e| suggestions::libraries_dir_invalid(&self.libraries_dir, e))?;
        for (repo_name, reason) in inventory.unreadable() {
            log::warn!("{} is not a readable library: {}", repo_name, reason);
        }
        if inventory.is_empty() {
            log::warn!("No libraries found in {}", self.libraries_dir.display());
        }
        Ok(inventory)
    }

    /// Map names given on the command line (repository or machine names) to
    /// repository names. Unknown names pass through unchanged.
    pub fn repo_names(inventory: &LocalInventory, names: &[String]) -> Vec<String> {
        names
            .iter()
            .map(|name| {
                inventory
                    .find(name)
                    .map(|library| library.repo_name.clone())
                    .unwrap_or_else(|| name.clone())
            })
            .collect()
    }
}

/// Where the registry is read from.
#[derive(Args, Debug, Clone)]
pub struct RegistryArgs {
    /// Read the registry from a local libraries.json instead of git.
    #[arg(long, value_name = "FILE", env = "H5P_DEPS_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Git repository holding the registry.
    #[arg(
        long,
        value_name = "URL",
        env = "H5P_DEPS_REGISTRY_URL",
        default_value = DEFAULT_REGISTRY_URL
    )]
    pub registry_url: String,

    /// The root directory for the repository cache.
    ///
    /// Defaults to the system cache directory (`~/.cache/h5p-deps` on Linux,
    /// `~/Library/Caches/h5p-deps` on macOS).
    #[arg(long, value_name = "DIR", env = "H5P_DEPS_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Clone the registry again even when a cached copy exists.
    #[arg(long)]
    pub refresh: bool,
}

impl RegistryArgs {
    pub fn repo_manager(&self) -> RepositoryManager {
        RepositoryManager::new(self.cache_root.clone().unwrap_or_else(default_cache_root))
    }

    pub fn load(&self) -> Result<RegistryIndex> {
        let registry = match &self.registry {
            Some(path) => RegistryIndex::from_file(path),
            None => RegistryIndex::fetch(
                &self.repo_manager(),
                &self.registry_url,
                DEFAULT_REF,
                self.refresh,
            ),
        }
        .map_err(suggestions::registry_unavailable)?;
        debug!("Registry has {} libraries", registry.len());
        Ok(registry)
    }
}

/// Which dependency lists to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ModeArg {
    /// Runtime dependencies
    #[default]
    View,
    /// Runtime and editor dependencies
    Edit,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::View => Mode::View,
            ModeArg::Edit => Mode::Edit,
        }
    }
}

/// Where manifests are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum SourceKind {
    /// Only the libraries directory
    Local,
    /// Only git clones of the registered repositories
    Remote,
    /// The libraries directory, then git
    #[default]
    Auto,
}

/// Arguments for commands that resolve one library.
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Library to resolve, by repository name (h5p-foo) or machine name (H5P.Foo).
    pub library: String,

    /// Follow runtime dependencies only (view) or editor dependencies too (edit).
    #[arg(long, value_enum, default_value = "view")]
    pub mode: ModeArg,

    /// Where to read manifests from.
    #[arg(long, value_enum, default_value = "auto")]
    pub source: SourceKind,

    #[command(flatten)]
    pub inventory: InventoryArgs,

    #[command(flatten)]
    pub registry: RegistryArgs,
}

impl ResolveArgs {
    /// Resolve the library, returning its repository name and resolution.
    pub fn resolve(&self) -> Result<(String, Resolution)> {
        let registry = self.registry.load()?;
        let root = self.root_repo_name(&registry);

        let local = LocalSource::new(self.inventory.libraries_dir.clone());
        let remote = || GitSource::new(&registry, self.registry.repo_manager());
        let source: Box<dyn ManifestSource + '_> = match self.source {
            SourceKind::Local => Box::new(local),
            SourceKind::Remote => Box::new(remote()),
            SourceKind::Auto => {
                let chain: Vec<Box<dyn ManifestSource + '_>> =
                    vec![Box::new(local), Box::new(remote())];
                Box::new(ChainSource::new(chain))
            }
        };
        let source = CachedSource::new(source);

        let resolution = DependencyResolver::new(&registry, &source)
            .resolve(&root, self.mode.into())
            .map_err(|e| {
                if e.is_not_found() {
                    suggestions::library_not_found(&self.library, &registry.names())
                } else {
                    anyhow::anyhow!("Failed to resolve {}: {}", self.library, e)
                }
            })?;
        debug!(
            "Resolved {} libraries, {} manifests fetched",
            resolution.len(),
            source.manifests_cached().unwrap_or_default()
        );
        Ok((root, resolution))
    }

    /// Registry first; a local checkout may name an unregistered library.
    fn root_repo_name(&self, registry: &RegistryIndex) -> String {
        if let Some(entry) = registry.lookup(&self.library) {
            return entry.repo_name.clone();
        }
        if self.source != SourceKind::Remote {
            if let Ok(inventory) = LocalInventory::load(&self.inventory.libraries_dir) {
                if let Some(library) = inventory.find(&self.library) {
                    return library.repo_name.clone();
                }
            }
        }
        self.library.clone()
    }
}
