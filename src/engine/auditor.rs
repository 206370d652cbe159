//! Diamond dependency detection over the local collection.
//!
//! The graph is built once from every local manifest and semantics document.
//! Nodes are `(machine_name, major, minor)` identities, so two checkouts of
//! the same library version collapse into one node. Each local library is then
//! flattened as a root, collecting every version of every dependency reachable
//! from it. A dependency reached at more than one `major.minor` is reported.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::debug;
use rayon::prelude::*;
use serde::Serialize;

use crate::inventory::LocalInventory;
use crate::library::DependencyRef;

/// One dependency reached at several versions from the same root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inconsistency {
    /// Machine name of the root library.
    pub root: String,
    /// `major.minor` of the root library.
    pub root_version: String,
    /// Machine name of the dependency.
    pub dependency: String,
    /// Every `major.minor` seen, in ascending order.
    pub versions: Vec<String>,
}

type Graph = HashMap<DependencyRef, BTreeSet<DependencyRef>>;

pub struct InconsistencyAuditor<'a> {
    inventory: &'a LocalInventory,
}

impl<'a> InconsistencyAuditor<'a> {
    pub fn new(inventory: &'a LocalInventory) -> Self {
        Self { inventory }
    }

    /// All inconsistencies, sorted by root then dependency.
    pub fn find_inconsistencies(&self) -> Vec<Inconsistency> {
        let graph = self.build_graph();
        let roots: BTreeSet<&DependencyRef> = graph.keys().collect();
        debug!("Auditing {} roots", roots.len());

        let mut found: Vec<Inconsistency> = roots
            .into_iter()
            .collect::<Vec<_>>()
            .par_iter()
            .flat_map_iter(|root| flatten(&graph, root))
            .collect();
        found.sort_by(|a, b| {
            (&a.root, &a.dependency, &a.root_version).cmp(&(&b.root, &b.dependency, &b.root_version))
        });
        found
    }

    fn build_graph(&self) -> Graph {
        let mut graph = Graph::new();
        for library in self.inventory.libraries() {
            let edges = graph.entry(library.identity().versioned_name()).or_default();
            edges.extend(library.manifest().all_dependencies().cloned());
            edges.extend(library.semantics_refs());
        }
        graph
    }
}

/// Versions seen per dependency machine name, reachable from `root`.
fn flatten(graph: &Graph, root: &DependencyRef) -> Vec<Inconsistency> {
    let mut versions: BTreeMap<&str, BTreeSet<(u32, u32)>> = BTreeMap::new();
    let mut flattened: HashSet<&DependencyRef> = HashSet::new();
    let mut stack: Vec<&DependencyRef> = vec![root];

    while let Some(node) = stack.pop() {
        let Some(edges) = graph.get(node) else {
            continue;
        };
        for dep in edges {
            if !flattened.insert(dep) {
                continue;
            }
            versions
                .entry(dep.machine_name.as_str())
                .or_default()
                .insert((dep.major_version, dep.minor_version));
            stack.push(dep);
        }
    }

    versions
        .into_iter()
        .filter(|(_, seen)| seen.len() > 1)
        .map(|(dependency, seen)| Inconsistency {
            root: root.machine_name.clone(),
            root_version: root.version(),
            dependency: dependency.to_string(),
            versions: seen
                .into_iter()
                .map(|(major, minor)| format!("{}.{}", major, minor))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{MANIFEST_FILENAME, SEMANTICS_FILENAME};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_library(root: &Path, name: &str, minor: u32, preloaded: &[(&str, u32, u32)]) {
        let deps: Vec<_> = preloaded
            .iter()
            .map(|(dep, major, minor)| {
                serde_json::json!({ "machineName": dep, "majorVersion": major, "minorVersion": minor })
            })
            .collect();
        let manifest = serde_json::json!({
            "machineName": name,
            "majorVersion": 1,
            "minorVersion": minor,
            "patchVersion": 0,
            "preloadedDependencies": deps,
        });
        let dir = root.join(format!("{}-{}", name, minor));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILENAME), manifest.to_string()).unwrap();
    }

    fn audit(root: &Path) -> Vec<Inconsistency> {
        let inventory = LocalInventory::load(root).unwrap();
        InconsistencyAuditor::new(&inventory).find_inconsistencies()
    }

    #[test]
    fn test_diamond_is_reported() {
        // R -> A -> D 1.0, R -> B -> D 1.2
        let temp = TempDir::new().unwrap();
        write_library(temp.path(), "R", 0, &[("A", 1, 0), ("B", 1, 0)]);
        write_library(temp.path(), "A", 0, &[("D", 1, 0)]);
        write_library(temp.path(), "B", 0, &[("D", 1, 2)]);

        let found = audit(temp.path());
        assert_eq!(
            found,
            vec![Inconsistency {
                root: "R".to_string(),
                root_version: "1.0".to_string(),
                dependency: "D".to_string(),
                versions: vec!["1.0".to_string(), "1.2".to_string()],
            }]
        );
    }

    #[test]
    fn test_agreeing_paths_report_nothing() {
        let temp = TempDir::new().unwrap();
        write_library(temp.path(), "R", 0, &[("A", 1, 0), ("B", 1, 0)]);
        write_library(temp.path(), "A", 0, &[("D", 1, 2)]);
        write_library(temp.path(), "B", 0, &[("D", 1, 2)]);

        assert!(audit(temp.path()).is_empty());
    }

    #[test]
    fn test_versions_sorted_numerically() {
        let temp = TempDir::new().unwrap();
        write_library(temp.path(), "R", 0, &[("D", 1, 10), ("A", 1, 0)]);
        write_library(temp.path(), "A", 0, &[("D", 1, 9)]);

        let found = audit(temp.path());
        assert_eq!(found[0].versions, vec!["1.9", "1.10"]);
    }

    #[test]
    fn test_semantics_references_count_and_cycles_terminate() {
        // R -> A -> R (cycle); A's semantics offer D 2.0 while R needs D 1.0
        let temp = TempDir::new().unwrap();
        write_library(temp.path(), "R", 0, &[("A", 1, 0), ("D", 1, 0)]);
        write_library(temp.path(), "A", 0, &[("R", 1, 0)]);
        fs::write(
            temp.path().join("A-0").join(SEMANTICS_FILENAME),
            r#"[{"type":"library","options":["D 2.0"]}]"#,
        )
        .unwrap();

        let found = audit(temp.path());
        let roots: Vec<&str> = found.iter().map(|i| i.root.as_str()).collect();
        assert_eq!(roots, vec!["A", "R"]);
        assert!(found.iter().all(|i| i.dependency == "D"));
        assert!(found.iter().all(|i| i.versions == vec!["1.0", "2.0"]));
    }

    #[test]
    fn test_missing_dependency_is_a_leaf() {
        let temp = TempDir::new().unwrap();
        write_library(temp.path(), "R", 0, &[("Gone", 1, 0)]);
        assert!(audit(temp.path()).is_empty());
    }
}
