//! # Bump Command Implementation
//!
//! Increments the minor version of the given libraries and cascades the
//! change through every local library that references them. Manifests and
//! semantics files in the libraries directory are rewritten in place.

use std::collections::HashSet;

use anyhow::Result;
use clap::Args;

use h5p_deps::engine::{BumpOutcome, VersionPropagator};
use h5p_deps::output::{self, status, OutputConfig, Status};

use super::InventoryArgs;

/// Bump the minor version of libraries and everything depending on them
#[derive(Args, Debug)]
pub struct BumpArgs {
    /// Libraries to bump, by repository name or machine name.
    #[arg(required = true)]
    pub libraries: Vec<String>,

    #[command(flatten)]
    pub inventory: InventoryArgs,
}

pub fn execute(args: BumpArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let mut inventory = args.inventory.load()?;
    let targets = InventoryArgs::repo_names(&inventory, &args.libraries);

    let mut visited = HashSet::new();
    let results = VersionPropagator::new(&mut inventory).bump_minor(&targets, &mut visited);

    let mut failed = 0;
    for result in &results {
        match &result.outcome {
            BumpOutcome::Bumped { version } => println!(
                "{} {} -> {}",
                status(&out, Status::Ok),
                output::name(&out, &result.repo_name),
                version
            ),
            BumpOutcome::Skipped { reason } => println!(
                "{} {}: {}",
                status(&out, Status::Info),
                output::name(&out, &result.repo_name),
                reason
            ),
            BumpOutcome::Failed { reason } => {
                failed += 1;
                println!(
                    "{} {}: {}",
                    status(&out, Status::Error),
                    output::name(&out, &result.repo_name),
                    reason
                );
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} libraries could not be bumped", failed, results.len());
    }
    let bumped = results.iter().filter(|result| result.is_bumped()).count();
    println!("Bumped {} libraries", bumped);
    Ok(())
}
