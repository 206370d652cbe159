//! # Error Handling
//!
//! This module defines the centralized error type for `h5p-deps`. It uses the
//! `thiserror` library to build a single `Error` enum covering every failure
//! mode of the dependency graph engine and its collaborators.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Each variant carries enough context (machine
//!   name, repo name, offending option string, URL) to be reported directly.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! ## Propagation Policy
//!
//! Not every error aborts an operation. The engine distinguishes:
//!
//! - **Per-node failures**: `NotFoundInRegistry`, `LibraryNotFound` and
//!   `ManifestUnreadable` for a non-root library are attached to that node's
//!   result and traversal of its siblings continues.
//! - **Per-document failures**: `MalformedSemanticsOption` aborts extraction
//!   for one semantics document only; the library falls back to its manifest
//!   edges.
//! - **Fatal failures**: `RegistryUnavailable`, and a missing or unreadable
//!   manifest for the root of a resolution.

use thiserror::Error;

/// Main error type for h5p-deps operations
#[derive(Error, Debug)]
pub enum Error {
    /// A machine name has no entry in the registry.
    #[error("Library not found in registry: {machine_name}")]
    NotFoundInRegistry { machine_name: String },

    /// The manifest source has no library with this repository name.
    #[error("Library not found: {repo_name}")]
    LibraryNotFound { repo_name: String },

    /// A `library.json` exists but could not be read or parsed.
    #[error("Manifest unreadable for {repo_name}: {message}")]
    ManifestUnreadable { repo_name: String, message: String },

    /// A `library` semantics field contains an option that is not of the form
    /// `"Machine.Name major.minor"`.
    #[error("Malformed semantics option {option:?}: {message}")]
    MalformedSemanticsOption { option: String, message: String },

    /// The registry document could not be fetched or parsed.
    #[error("Registry unavailable: {message}")]
    RegistryUnavailable { message: String },

    /// An error occurred while cloning a Git repository.
    #[error("Git clone error for {url}@{r#ref}: {message}")]
    GitClone {
        url: String,
        r#ref: String,
        message: String,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A directory walk error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },
}

impl Error {
    /// Whether this error means "the library does not exist" as opposed to a
    /// transient failure while fetching it.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::LibraryNotFound { .. } | Error::NotFoundInRegistry { .. }
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
