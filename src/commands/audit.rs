//! # Audit Command Implementation
//!
//! Reports diamond dependencies in the libraries directory: a library from
//! which two dependency paths lead to different versions of the same
//! dependency. Findings are informational unless `--strict` is given.

use anyhow::Result;
use clap::Args;

use h5p_deps::engine::InconsistencyAuditor;
use h5p_deps::output::{self, status, OutputConfig, Status};

use super::InventoryArgs;

/// Find libraries reaching one dependency at several versions
#[derive(Args, Debug)]
pub struct AuditArgs {
    #[command(flatten)]
    pub inventory: InventoryArgs,

    /// Print findings as JSON.
    #[arg(long)]
    pub json: bool,

    /// Exit with an error when any inconsistency is found.
    #[arg(long)]
    pub strict: bool,
}

pub fn execute(args: AuditArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let inventory = args.inventory.load()?;
    let found = InconsistencyAuditor::new(&inventory).find_inconsistencies();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else if found.is_empty() {
        println!(
            "{} No inconsistencies among {} libraries",
            status(&out, Status::Ok),
            inventory.len()
        );
    } else {
        for inconsistency in &found {
            println!(
                "{} {} {} reaches {} at {}",
                status(&out, Status::Warn),
                output::name(&out, &inconsistency.root),
                inconsistency.root_version,
                output::name(&out, &inconsistency.dependency),
                inconsistency.versions.join(", ")
            );
        }
    }

    if args.strict && !found.is_empty() {
        anyhow::bail!("{} inconsistencies found", found.len());
    }
    Ok(())
}
