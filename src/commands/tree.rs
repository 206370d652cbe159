//! # Tree Command Implementation
//!
//! Displays the resolution of one library as a tree: every library hangs
//! under the library whose edge first discovered it, so each library appears
//! exactly once, at its shortest distance from the root.
//!
//! This command is read-only.

use std::borrow::Cow;
use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};

use h5p_deps::engine::Resolution;
use h5p_deps::output::OutputConfig;

use super::deps::entry_label;
use super::ResolveArgs;

/// Display the dependency tree of a library
#[derive(Args, Debug)]
pub struct TreeArgs {
    #[command(flatten)]
    pub resolve: ResolveArgs,

    /// Maximum depth to display.
    ///
    /// Use 0 to show only the root, 1 for its direct dependencies, etc.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

pub fn execute(args: TreeArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let (root, resolution) = args.resolve.resolve()?;

    let tree = build_tree(&out, &root, &resolution, args.depth.unwrap_or(usize::MAX));
    print_tree(&tree).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    Ok(())
}

/// Arrange a resolution under its root, following `required_by`.
fn build_tree(out: &OutputConfig, root: &str, resolution: &Resolution, max_depth: usize) -> TreeNode {
    let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, entry) in resolution {
        if key != root {
            children
                .entry(entry.required_by.source_repo_name.as_str())
                .or_default()
                .push(key.as_str());
        }
    }
    build_node(out, root, resolution, &children, max_depth, 0)
}

fn build_node(
    out: &OutputConfig,
    key: &str,
    resolution: &Resolution,
    children: &BTreeMap<&str, Vec<&str>>,
    max_depth: usize,
    current_depth: usize,
) -> TreeNode {
    let label = match resolution.get(key) {
        Some(entry) => entry_label(out, key, entry),
        None => key.to_string(),
    };

    let nodes = if current_depth >= max_depth {
        Vec::new()
    } else {
        children
            .get(key)
            .map(|keys| {
                keys.iter()
                    .map(|child| {
                        build_node(out, child, resolution, children, max_depth, current_depth + 1)
                    })
                    .collect()
            })
            .unwrap_or_default()
    };
    TreeNode {
        label,
        children: nodes,
    }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _style: &ptree::Style) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}
