//! # Deps Command Implementation
//!
//! Resolves the full dependency closure of one library and lists it level by
//! level. Optional (semantics-only), unregistered and unreadable libraries
//! are marked. With `--json` the resolution is printed as a JSON document.
//!
//! This command is read-only.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;

use h5p_deps::engine::{Mode, ResolutionEntry};
use h5p_deps::output::{self, status, OutputConfig, Status};

use super::ResolveArgs;

/// List the dependencies of a library
#[derive(Args, Debug)]
pub struct DepsArgs {
    #[command(flatten)]
    pub resolve: ResolveArgs,

    /// Print the resolution as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: DepsArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let mode: Mode = args.resolve.mode.into();
    let (root, resolution) = args.resolve.resolve()?;

    if args.json {
        let document = serde_json::json!({
            "root": root,
            "mode": mode,
            "libraries": resolution,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!(
        "{} Dependencies of {} ({})",
        status(&out, Status::Info),
        output::name(&out, &root),
        mode
    );

    let mut levels: BTreeMap<usize, Vec<(&String, &ResolutionEntry)>> = BTreeMap::new();
    for (key, entry) in &resolution {
        levels.entry(entry.depth).or_default().push((key, entry));
    }
    for (depth, entries) in levels {
        println!("Level {}:", depth);
        for (key, entry) in entries {
            println!("  {}", entry_label(&out, key, entry));
        }
    }
    println!("{} libraries", resolution.len());
    Ok(())
}

/// One-line description of a resolved library.
pub fn entry_label(out: &OutputConfig, key: &str, entry: &ResolutionEntry) -> String {
    let mut label = match &entry.identity {
        Some(identity) => format!(
            "{}  {} {}",
            output::name(out, key),
            identity.machine_name,
            identity.version_string()
        ),
        None => output::name(out, key),
    };
    if entry.depth > 0 {
        label.push_str(&format!(
            "  {}",
            output::tag(
                out,
                format!("{}: {}", entry.required_by.kind, entry.required_by.source_repo_name)
            )
        ));
    }
    if entry.optional {
        label.push_str(&format!(" {}", output::tag(out, "optional")));
    }
    if entry.is_unregistered() {
        label.push_str(&format!(" {}", output::tag(out, "unregistered")));
    }
    if let Some(error) = &entry.error {
        label.push_str(&format!(" {}", output::tag(out, format!("unreadable: {}", error))));
    }
    label
}
