//! # Registry Command Implementation
//!
//! Shows how the registry maps a library name: machine name, repository
//! name, organization and clone URL.

use anyhow::Result;
use clap::Args;

use h5p_deps::output::{self, OutputConfig};
use h5p_deps::suggestions;

use super::RegistryArgs;

/// Show the registry entry of a library
#[derive(Args, Debug)]
pub struct RegistryCmdArgs {
    /// Machine name (H5P.Foo) or repository name (h5p-foo).
    pub name: String,

    /// Print the entry as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub registry: RegistryArgs,
}

pub fn execute(args: RegistryCmdArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let registry = args.registry.load()?;
    let entry = registry
        .lookup(&args.name)
        .ok_or_else(|| suggestions::library_not_found(&args.name, &registry.names()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(entry)?);
        return Ok(());
    }
    println!("{}", output::name(&out, &entry.machine_name));
    println!("  repository:   {}", entry.repo_name);
    println!("  organization: {}", entry.organization);
    println!("  url:          {}", entry.clone_url());
    Ok(())
}
