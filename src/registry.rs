//! # Registry Index
//!
//! The registry maps each library's canonical machine name (`H5P.Accordion`)
//! to the repository hosting it (`h5p-accordion`) and the organization that
//! owns that repository.
//!
//! The registry document comes in two shapes, both accepted:
//!
//! ```json
//! { "H5P.Accordion": { "id": "H5P.Accordion", "repo": { "url": "https://github.com/h5p/h5p-accordion" } } }
//! ```
//!
//! ```json
//! [ { "machineName": "H5P.Accordion", "repoName": "h5p-accordion", "organization": "h5p" } ]
//! ```
//!
//! When an entry omits its repository name or organization they are derived
//! from the last two path segments of its repository URL.
//!
//! `RegistryIndex` is built once per invocation and never mutated. Both of its
//! views share the same `Arc<RegistryEntry>` objects.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::defaults::{GITHUB_BASE_URL, REGISTRY_FILENAME};
use crate::error::{Error, Result};
use crate::repository::RepositoryManager;

/// One library as known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub machine_name: String,
    pub repo_name: String,
    pub organization: String,
    /// Repository URL, if the document gave one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl RegistryEntry {
    /// Clone URL for this library's repository.
    pub fn clone_url(&self) -> String {
        self.url.clone().unwrap_or_else(|| {
            format!(
                "{}/{}/{}",
                GITHUB_BASE_URL, self.organization, self.repo_name
            )
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RegistryDocument {
    Keyed(BTreeMap<String, RawEntry>),
    Listed(Vec<RawEntry>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    #[serde(default, alias = "id")]
    machine_name: Option<String>,
    #[serde(default)]
    repo_name: Option<String>,
    #[serde(default, alias = "org")]
    organization: Option<String>,
    #[serde(default)]
    repo: Option<RawRepo>,
}

#[derive(Debug, Deserialize)]
struct RawRepo {
    url: String,
}

/// Bidirectional lookup between machine names and repository names.
#[derive(Debug, Default)]
pub struct RegistryIndex {
    by_repo_name: HashMap<String, Arc<RegistryEntry>>,
    by_machine_name: HashMap<String, Arc<RegistryEntry>>,
}

impl RegistryIndex {
    /// Build an index from entries. Later duplicates of a machine or repo
    /// name are ignored with a warning.
    pub fn new(entries: impl IntoIterator<Item = RegistryEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            if index.by_machine_name.contains_key(&entry.machine_name)
                || index.by_repo_name.contains_key(&entry.repo_name)
            {
                warn!(
                    "Duplicate registry entry for {} ({}), keeping the first",
                    entry.machine_name, entry.repo_name
                );
                continue;
            }
            let entry = Arc::new(entry);
            index
                .by_repo_name
                .insert(entry.repo_name.clone(), Arc::clone(&entry));
            index
                .by_machine_name
                .insert(entry.machine_name.clone(), entry);
        }
        index
    }

    /// Parse a registry document.
    pub fn from_json(text: &str) -> Result<Self> {
        let document: RegistryDocument =
            serde_json::from_str(text).map_err(|e| Error::RegistryUnavailable {
                message: format!("invalid registry document: {}", e),
            })?;

        let raw_entries: Vec<(Option<String>, RawEntry)> = match document {
            RegistryDocument::Keyed(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
            RegistryDocument::Listed(list) => list.into_iter().map(|v| (None, v)).collect(),
        };

        let mut entries = Vec::with_capacity(raw_entries.len());
        for (key, raw) in raw_entries {
            match normalize_entry(key, raw) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping registry entry: {}", e),
            }
        }
        debug!("Loaded {} registry entries", entries.len());
        Ok(Self::new(entries))
    }

    /// Read a registry document from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::RegistryUnavailable {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_json(&text)
    }

    /// Fetch the registry repository and read its registry document.
    ///
    /// With `refresh`, any cached checkout is replaced by a fresh clone.
    pub fn fetch(
        repo_manager: &RepositoryManager,
        url: &str,
        ref_name: &str,
        refresh: bool,
    ) -> Result<Self> {
        let checkout = if refresh {
            repo_manager.fetch_repository_fresh(url, ref_name)
        } else {
            repo_manager.fetch_repository(url, ref_name)
        }
        .map_err(|e| Error::RegistryUnavailable {
            message: format!("cannot fetch {}: {}", url, e),
        })?;
        Self::from_file(&checkout.join(REGISTRY_FILENAME))
    }

    pub fn by_repo_name(&self, repo_name: &str) -> Option<&RegistryEntry> {
        self.by_repo_name.get(repo_name).map(Arc::as_ref)
    }

    pub fn by_machine_name(&self, machine_name: &str) -> Option<&RegistryEntry> {
        self.by_machine_name.get(machine_name).map(Arc::as_ref)
    }

    /// Look a library up by either of its names, repository name first.
    pub fn lookup(&self, name: &str) -> Option<&RegistryEntry> {
        self.by_repo_name(name)
            .or_else(|| self.by_machine_name(name))
    }

    /// Repository name for `machine_name`, if registered.
    pub fn repo_name_of(&self, machine_name: &str) -> Option<&str> {
        self.by_machine_name(machine_name)
            .map(|entry| entry.repo_name.as_str())
    }

    /// Every repository and machine name, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .by_repo_name
            .keys()
            .chain(self.by_machine_name.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.by_machine_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_machine_name.is_empty()
    }
}

fn normalize_entry(key: Option<String>, raw: RawEntry) -> Result<RegistryEntry> {
    let machine_name = raw
        .machine_name
        .or(key)
        .ok_or_else(|| Error::RegistryUnavailable {
            message: "entry without a machine name".to_string(),
        })?;

    let (url_org, url_repo) = match &raw.repo {
        Some(repo) => split_repo_url(&repo.url)?,
        None => (None, None),
    };

    let repo_name = raw
        .repo_name
        .or(url_repo)
        .ok_or_else(|| Error::RegistryUnavailable {
            message: format!("entry {} has no repository name or URL", machine_name),
        })?;
    let organization = raw.organization.or(url_org).unwrap_or_default();

    Ok(RegistryEntry {
        machine_name,
        repo_name,
        organization,
        url: raw.repo.map(|repo| repo.url),
    })
}

/// `https://github.com/h5p/h5p-accordion.git` -> (`h5p`, `h5p-accordion`)
fn split_repo_url(raw_url: &str) -> Result<(Option<String>, Option<String>)> {
    let url = Url::parse(raw_url)?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let repo = segments
        .last()
        .map(|s| s.trim_end_matches(".git").to_string());
    let org = segments
        .len()
        .checked_sub(2)
        .and_then(|i| segments.get(i))
        .map(|s| s.to_string());
    Ok((org, repo))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYED: &str = r#"{
  "H5P.Accordion": {
    "id": "H5P.Accordion",
    "title": "Accordion",
    "repo": { "type": "github", "url": "https://github.com/h5p/h5p-accordion" }
  },
  "H5P.Video": {
    "id": "H5P.Video",
    "repo": { "type": "github", "url": "https://github.com/h5p/h5p-video.git" }
  }
}"#;

    #[test]
    fn test_from_json_keyed_document() {
        let index = RegistryIndex::from_json(KEYED).unwrap();
        assert_eq!(index.len(), 2);

        let entry = index.by_machine_name("H5P.Accordion").unwrap();
        assert_eq!(entry.repo_name, "h5p-accordion");
        assert_eq!(entry.organization, "h5p");
        assert_eq!(index.repo_name_of("H5P.Video"), Some("h5p-video"));
        assert_eq!(
            index.by_repo_name("h5p-video").unwrap().machine_name,
            "H5P.Video"
        );
    }

    #[test]
    fn test_from_json_listed_document() {
        let index = RegistryIndex::from_json(
            r#"[{"machineName": "H5P.A", "repoName": "repoA", "organization": "acme"}]"#,
        )
        .unwrap();
        let entry = index.lookup("repoA").unwrap();
        assert_eq!(entry.machine_name, "H5P.A");
        assert_eq!(entry.clone_url(), "https://github.com/acme/repoA");
        assert_eq!(index.lookup("H5P.A"), Some(entry));
    }

    #[test]
    fn test_both_views_share_entries() {
        let index = RegistryIndex::from_json(KEYED).unwrap();
        let a = index.by_repo_name.get("h5p-accordion").unwrap();
        let b = index.by_machine_name.get("H5P.Accordion").unwrap();
        assert!(Arc::ptr_eq(a, b));
        assert_eq!(
            index.names(),
            vec!["H5P.Accordion", "H5P.Video", "h5p-accordion", "h5p-video"]
        );
    }

    #[test]
    fn test_entry_without_repo_is_skipped() {
        let index = RegistryIndex::from_json(
            r#"{"H5P.A": {"repoName": "repoA"}, "H5P.B": {"title": "no repo"}}"#,
        )
        .unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.by_machine_name("H5P.B").is_none());
    }

    #[test]
    fn test_duplicate_entries_keep_first() {
        let index = RegistryIndex::new(vec![
            RegistryEntry {
                machine_name: "H5P.A".to_string(),
                repo_name: "repoA".to_string(),
                organization: "h5p".to_string(),
                url: None,
            },
            RegistryEntry {
                machine_name: "H5P.A".to_string(),
                repo_name: "repoA-fork".to_string(),
                organization: "fork".to_string(),
                url: None,
            },
        ]);
        assert_eq!(index.len(), 1);
        assert!(index.by_repo_name("repoA-fork").is_none());
    }

    #[test]
    fn test_invalid_document_is_registry_unavailable() {
        let err = RegistryIndex::from_json("not json").unwrap_err();
        assert!(matches!(err, Error::RegistryUnavailable { .. }));
    }

    #[test]
    fn test_from_file_missing_is_registry_unavailable() {
        let err = RegistryIndex::from_file(Path::new("/nonexistent/libraries.json")).unwrap_err();
        assert!(matches!(err, Error::RegistryUnavailable { .. }));
    }
}
