//! Property-based tests for the dependency engine.
//!
//! Random graphs (cycles allowed) are resolved and checked against a plain
//! breadth-first search computed independently.

#[cfg(test)]
mod proptest_tests {
    use std::collections::{HashSet, VecDeque};

    use proptest::prelude::*;

    use crate::engine::resolver::tests::{registry, MockSource};
    use crate::engine::{DependencyResolver, EdgeKind, Mode};
    use crate::path::{compile_globs, encode_url_path, matches_any};
    use crate::semantics::parse_option;

    /// `edges[i]` lists `(target, optional)` for node `i`.
    type Edges = Vec<Vec<(usize, bool)>>;

    fn graph_strategy() -> impl Strategy<Value = Edges> {
        (2usize..10).prop_flat_map(|n| {
            prop::collection::vec(prop::collection::vec((0..n, any::<bool>()), 0..4), n)
        })
    }

    fn node(i: usize) -> String {
        format!("N{}", i)
    }

    fn build(edges: &Edges) -> MockSource {
        let mut source = MockSource::default();
        for (i, targets) in edges.iter().enumerate() {
            let machines: Vec<String> = targets
                .iter()
                .filter(|(_, optional)| !optional)
                .map(|(t, _)| format!("H5P.{}", node(*t)))
                .collect();
            let preloaded: Vec<(&str, u32, u32)> =
                machines.iter().map(|m| (m.as_str(), 1, 0)).collect();
            let options: Vec<String> = targets
                .iter()
                .filter(|(_, optional)| *optional)
                .map(|(t, _)| format!("H5P.{} 1.0", node(*t)))
                .collect();
            let options: Vec<&str> = options.iter().map(String::as_str).collect();

            let repo = format!("repo{}", node(i));
            let machine = format!("H5P.{}", node(i));
            source = source
                .library(&repo, &machine, &preloaded, &[])
                .semantics(&repo, &options);
        }
        source
    }

    fn shortest_paths(edges: &Edges) -> Vec<Option<usize>> {
        let mut dist = vec![None; edges.len()];
        dist[0] = Some(0);
        let mut queue = VecDeque::from([0]);
        while let Some(i) = queue.pop_front() {
            for (t, _) in &edges[i] {
                if dist[*t].is_none() {
                    dist[*t] = dist[i].map(|d| d + 1);
                    queue.push_back(*t);
                }
            }
        }
        dist
    }

    proptest! {
        /// Every reachable node appears once, at its shortest-path depth.
        #[test]
        fn resolve_depth_is_shortest_path(edges in graph_strategy()) {
            let names: Vec<String> = (0..edges.len()).map(node).collect();
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            let registry = registry(&names);
            let source = build(&edges);

            let resolution = DependencyResolver::new(&registry, &source)
                .resolve("repoN0", Mode::View)
                .unwrap();
            let dist = shortest_paths(&edges);

            let reachable: HashSet<String> = dist
                .iter()
                .enumerate()
                .filter(|(_, d)| d.is_some())
                .map(|(i, _)| format!("repo{}", node(i)))
                .collect();
            let keys: HashSet<String> = resolution.keys().cloned().collect();
            prop_assert_eq!(keys, reachable);

            for (i, d) in dist.iter().enumerate() {
                if let Some(d) = d {
                    prop_assert_eq!(resolution[&format!("repo{}", node(i))].depth, *d);
                }
            }
        }

        /// A node is optional iff no parent one level up requires it, and the
        /// recorded edge exists.
        #[test]
        fn resolve_optional_and_required_by_are_consistent(edges in graph_strategy()) {
            let names: Vec<String> = (0..edges.len()).map(node).collect();
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            let registry = registry(&names);
            let source = build(&edges);

            let resolution = DependencyResolver::new(&registry, &source)
                .resolve("repoN0", Mode::View)
                .unwrap();
            let dist = shortest_paths(&edges);

            for (x, dx) in dist.iter().enumerate().skip(1) {
                let Some(dx) = dx else { continue };
                let parents: Vec<(usize, bool)> = edges
                    .iter()
                    .enumerate()
                    .filter(|(p, _)| dist[*p] == Some(dx - 1))
                    .flat_map(|(p, targets)| {
                        targets.iter().filter(move |(t, _)| *t == x).map(move |(_, o)| (p, *o))
                    })
                    .collect();
                let required = parents.iter().any(|(_, optional)| !optional);

                let entry = &resolution[&format!("repo{}", node(x))];
                prop_assert_eq!(entry.optional, !required);

                let kind = if entry.optional { EdgeKind::Semantics } else { EdgeKind::Run };
                prop_assert_eq!(entry.required_by.kind, kind);
                let matched = parents.iter().any(|(p, optional)| {
                    entry.required_by.source_repo_name == format!("repo{}", node(*p))
                        && *optional == entry.optional
                });
                prop_assert!(matched);
            }
        }
    }

    proptest! {
        /// Well-formed options parse back into their parts.
        #[test]
        fn parse_option_accepts_well_formed(
            name in "[A-Za-z][A-Za-z0-9.]{0,15}",
            major in 0u32..100,
            minor in 0u32..100,
        ) {
            let dep = parse_option(&format!("{} {}.{}", name, major, minor)).unwrap();
            prop_assert_eq!(dep.machine_name, name);
            prop_assert_eq!(dep.major_version, major);
            prop_assert_eq!(dep.minor_version, minor);
        }

        /// Options without a space never parse.
        #[test]
        fn parse_option_rejects_missing_version(name in "[A-Za-z0-9.]{1,20}") {
            prop_assert!(parse_option(&name).is_err());
        }

        /// A slash-free pattern matches its file name at any depth.
        #[test]
        fn matches_any_applies_file_name_patterns_at_depth(
            dirs in prop::collection::vec("[a-z]{1,8}", 0..4),
            stem in "[a-z]{1,8}",
        ) {
            let patterns = compile_globs(["*.zip"]).unwrap();
            let mut path = dirs.join("/");
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(&stem);
            prop_assert!(!matches_any(&patterns, &path));
            path.push_str(".zip");
            prop_assert!(matches_any(&patterns, &path));
        }

        /// Cache directory names never contain path separators.
        #[test]
        fn encode_url_path_never_produces_unsafe_chars(input in ".*") {
            let result = encode_url_path(&input);
            for ch in ['/', '\\', ':', '*', '?', '"', '<', '>', '|'] {
                prop_assert!(!result.contains(ch));
            }
            prop_assert_eq!(result.chars().count(), input.chars().count());
        }
    }
}
