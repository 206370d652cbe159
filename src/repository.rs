//! # High-Level Repository Management
//!
//! This module provides the `RepositoryManager`, which makes remote Git
//! repositories (the registry, and libraries not present locally) available
//! as directories on disk.
//!
//! ## Design
//!
//! The `RepositoryManager` separates the logic of repository management from
//! the concrete Git and cache implementations through two traits:
//!
//! - **`GitOperations`**: cloning a repository.
//! - **`CacheOperations`**: checking for and locating cached checkouts.
//!
//! `DefaultGitOperations` and `DefaultCacheOperations` wrap the `git` command
//! and the host filesystem. Tests swap in mocks to simulate cache hits,
//! misses and clone failures without touching the network.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::Result;

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Clones a repository at a specific Git reference (branch, tag, commit,
    /// or `HEAD` for the default branch).
    ///
    /// This is expected to be a shallow clone to optimize for speed and disk
    /// space.
    fn clone_shallow(&self, url: &str, ref_name: &str, target_dir: &Path) -> Result<()>;
}

/// A trait that defines the interface for cache operations.
pub trait CacheOperations: Send + Sync {
    /// Check if a cached checkout exists
    fn exists(&self, cache_path: &Path) -> bool;

    /// Get the cache path for a repository
    fn get_cache_path(&self, url: &str, ref_name: &str) -> PathBuf;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command.
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn clone_shallow(&self, url: &str, ref_name: &str, target_dir: &Path) -> Result<()> {
        crate::git::clone_shallow(url, ref_name, target_dir)
    }
}

/// The default implementation of `CacheOperations`, backed by a directory
/// on the host filesystem.
pub struct DefaultCacheOperations {
    cache_root: PathBuf,
}

impl DefaultCacheOperations {
    pub fn new(cache_root: PathBuf) -> Self {
        Self { cache_root }
    }
}

impl CacheOperations for DefaultCacheOperations {
    fn exists(&self, cache_path: &Path) -> bool {
        cache_path.exists() && cache_path.is_dir()
    }

    fn get_cache_path(&self, url: &str, ref_name: &str) -> PathBuf {
        crate::git::url_to_cache_path(&self.cache_root, url, ref_name)
    }
}

/// Orchestrates Git and cache operations to provide local checkouts of
/// remote repositories.
pub struct RepositoryManager {
    git_ops: Box<dyn GitOperations>,
    cache_ops: Box<dyn CacheOperations>,
}

impl RepositoryManager {
    /// Creates a new `RepositoryManager` with the default Git and cache
    /// operations, using the specified `cache_root` for the on-disk cache.
    pub fn new(cache_root: PathBuf) -> Self {
        Self {
            git_ops: Box::new(DefaultGitOperations),
            cache_ops: Box::new(DefaultCacheOperations::new(cache_root)),
        }
    }

    /// Creates a `RepositoryManager` with custom `GitOperations` and
    /// `CacheOperations` implementations.
    pub fn with_operations(
        git_ops: Box<dyn GitOperations>,
        cache_ops: Box<dyn CacheOperations>,
    ) -> Self {
        Self { git_ops, cache_ops }
    }

    /// Returns the checkout directory for `url@ref_name`, cloning it into the
    /// cache first if it is not there yet.
    pub fn fetch_repository(&self, url: &str, ref_name: &str) -> Result<PathBuf> {
        let cache_path = self.cache_ops.get_cache_path(url, ref_name);

        if self.cache_ops.exists(&cache_path) {
            debug!("Using cached checkout of {}@{}", url, ref_name);
        } else {
            debug!("Cloning {}@{} into {}", url, ref_name, cache_path.display());
            self.git_ops.clone_shallow(url, ref_name, &cache_path)?;
        }

        Ok(cache_path)
    }

    /// Clones `url@ref_name` again, replacing any cached checkout.
    pub fn fetch_repository_fresh(&self, url: &str, ref_name: &str) -> Result<PathBuf> {
        let cache_path = self.cache_ops.get_cache_path(url, ref_name);
        self.git_ops.clone_shallow(url, ref_name, &cache_path)?;
        Ok(cache_path)
    }
}
