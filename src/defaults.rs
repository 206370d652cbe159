//! Default values for h5p-deps configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// File name of a library manifest inside a library directory.
pub const MANIFEST_FILENAME: &str = "library.json";

/// File name of the optional semantics document inside a library directory.
pub const SEMANTICS_FILENAME: &str = "semantics.json";

/// Per-library file listing extra glob patterns to leave out of a package.
pub const IGNORE_FILENAME: &str = ".h5pignore";

/// File name of the registry document inside the registry repository.
pub const REGISTRY_FILENAME: &str = "libraries.json";

/// Git repository hosting the public registry.
pub const DEFAULT_REGISTRY_URL: &str = "https://github.com/h5p/h5p-registry.git";

/// Base URL used to build a repository URL when a registry entry has none.
pub const GITHUB_BASE_URL: &str = "https://github.com";

/// Git reference meaning "the remote's default branch".
pub const DEFAULT_REF: &str = "HEAD";

/// Paths never included in a package, relative to the library directory.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".git",
    ".git/**",
    ".github/**",
    ".gitignore",
    "node_modules/**",
    "**/.DS_Store",
    ".DS_Store",
    "*.zip",
    ".h5pignore",
];

/// Returns the default cache root directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/h5p-deps` (XDG Base Directory)
/// - macOS: `~/Library/Caches/h5p-deps`
/// - Windows: `{FOLDERID_LocalAppData}\h5p-deps`
///
/// Falls back to `.h5p-deps-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag or the
/// `H5P_DEPS_CACHE` environment variable.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".h5p-deps-cache"))
        .join("h5p-deps")
}
