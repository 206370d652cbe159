//! # Error Suggestions
//!
//! Errors reported by the CLI say what went wrong AND how to fix it. Each
//! helper here builds an `anyhow::Error` carrying `hint:` lines.
//!
//! ```rust,ignore
//! // Instead of:
//! anyhow::bail!("Library not found: {}", name);
//!
//! // Use:
//! return Err(suggestions::library_not_found(name, &candidates));
//! ```

use std::path::Path;

/// A library named on the command line exists neither locally nor in the
/// registry.
///
/// `candidates` are known repository and machine names; a close one is
/// offered as a "did you mean".
pub fn library_not_found(name: &str, candidates: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(name, candidates)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Library not found: {name}{did_you_mean}\n\n\
         hint: Pass a repository name (h5p-foo) or a machine name (H5P.Foo)\n\
         hint: Use --libraries-dir to point at the directory holding your checkouts\n\
         hint: Run 'h5p-deps registry {name}' to check the registry entry"
    )
}

/// The registry could not be loaded.
pub fn registry_unavailable(error: impl std::fmt::Display) -> anyhow::Error {
    anyhow::anyhow!(
        "Cannot load the library registry\n\
         error: {error}\n\n\
         hint: Use --registry <FILE> to read a local libraries.json\n\
         hint: Use --registry-url <URL> to fetch a different registry repository\n\
         hint: Set H5P_DEPS_REGISTRY to make a local registry the default"
    )
}

/// The libraries directory does not exist or cannot be scanned.
pub fn libraries_dir_invalid(path: &Path, error: impl std::fmt::Display) -> anyhow::Error {
    anyhow::anyhow!(
        "Cannot read libraries directory: {path}\n\
         error: {error}\n\n\
         hint: Use --libraries-dir <DIR> or set H5P_DEPS_LIBRARIES",
        path = path.display()
    )
}

/// Required dependencies could not be resolved.
pub fn required_dependencies_missing(names: &[String]) -> anyhow::Error {
    anyhow::anyhow!(
        "{count} required dependencies missing: {list}\n\n\
         hint: Add the libraries to the registry, or fix the machine name in library.json",
        count = names.len(),
        list = names.join(", ")
    )
}

/// Libraries requested for packaging have no local checkout.
pub fn package_libraries_missing(names: &[String]) -> anyhow::Error {
    anyhow::anyhow!(
        "Cannot package, library not found: {list}\n\n\
         hint: Clone the missing libraries into the libraries directory\n\
         hint: Run 'h5p-deps missing <LIBRARY>' to list unresolved dependencies",
        list = names.join(", ")
    )
}

/// Nearest candidate by edit distance, if within 2 edits.
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(&input.to_lowercase(), &candidate.to_lowercase());
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        previous = current;
    }
    previous[b.len()]
}
