//! # H5P Library Dependency Engine
//!
//! This library computes and maintains the dependency graph of a collection
//! of H5P content-type libraries. It backs the `h5p-deps` command-line tool
//! but can be embedded in any tool that needs to reason about library
//! dependencies.
//!
//! ## Quick Example
//!
//! ```
//! use h5p_deps::semantics;
//!
//! let fields = semantics::parse(r#"[
//!   { "name": "media", "type": "group", "fields": [
//!     { "name": "type", "type": "library", "options": ["H5P.Image 1.1", "H5P.Video 1.6"] }
//!   ]}
//! ]"#).unwrap();
//!
//! let refs = semantics::extract(&fields).unwrap();
//! assert_eq!(refs.len(), 2);
//! assert_eq!(refs[1].to_string(), "H5P.Video 1.6");
//! ```
//!
//! ## Core Concepts
//!
//! Libraries declare dependencies through two independent channels:
//!
//! - **Manifest (`library`)**: `library.json` with `preloadedDependencies`
//!   (runtime) and `editorDependencies` (editor only).
//! - **Semantics (`semantics`)**: the content schema; any `library` field
//!   embeds further, optional, library references at arbitrary nesting depth.
//!
//! A library is known by two names. Its **machine name** (`H5P.Foo`) is the
//! identity used in dependency declarations; its **repository name**
//! (`h5p-foo`) names the checkout directory and the git repository. The
//! **registry (`registry`)** maps one to the other.
//!
//! ## Components
//!
//! - **Sources (`source`, `cache`)**: where manifests come from; a local
//!   directory, git clones (`repository`, `git`) or a chain of both.
//! - **Inventory (`inventory`)**: all libraries of one local directory.
//! - **Engine (`engine`)**: resolution of one library's closure, cascading
//!   version bumps, diamond dependency audit and packaging closure.
//!
//! Registry and inventory are built once per operation and dropped after it.

pub mod cache;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod git;
pub mod inventory;
pub mod library;
pub mod output;
pub mod path;
pub mod registry;
pub mod repository;
pub mod semantics;
pub mod source;
pub mod suggestions;

#[cfg(test)]
mod engine_proptest;
