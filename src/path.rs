//! Path manipulation utilities for h5p-deps

use std::path::Path;

use glob::{MatchOptions, Pattern};

use crate::error::{Error, Result};

/// Compile glob patterns, failing on the first invalid one.
pub fn compile_globs<I, S>(patterns: I) -> Result<Vec<Pattern>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| Pattern::new(p.as_ref()).map_err(Error::from))
        .collect()
}

/// Whether `path` (relative, `/`-separated) matches any of `patterns`.
///
/// A pattern without a slash also matches the path's file name, so `*.zip`
/// excludes zips at any depth.
pub fn matches_any(patterns: &[Pattern], path: &str) -> bool {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let file_name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);

    patterns.iter().any(|pattern| {
        pattern.matches_with(path, options)
            || (!pattern.as_str().contains('/') && pattern.matches_with(file_name, options))
    })
}

/// Encode a URL path to be filesystem-safe
///
/// This converts URL characters that are problematic for filesystems
/// into safe alternatives.
pub fn encode_url_path(url: &str) -> String {
    url.chars()
        .map(|c| match c {
            '/' => '-',
            '\\' => '-',
            ':' => '_',
            '*' => '_',
            '?' => '_',
            '"' => '_',
            '<' => '_',
            '>' => '_',
            '|' => '_',
            // Keep alphanumeric, dots, dashes, underscores as-is
            c if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' => c,
            // Replace other characters with underscores
            _ => '_',
        })
        .collect()
}
