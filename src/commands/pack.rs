//! # Pack Command Implementation
//!
//! Computes what goes into an archive of one or more libraries: with
//! `--recursive`, every local library they depend on (matched by exact
//! `major.minor`) is added. The file list, relative to the libraries
//! directory, is printed or written to `--output`. Archive writing itself is
//! left to external tools.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use log::info;

use h5p_deps::engine::{IgnoreRules, PackagingClosure};
use h5p_deps::suggestions;

use super::InventoryArgs;

/// List the files to package for libraries
#[derive(Args, Debug)]
pub struct PackArgs {
    /// Libraries to package, by repository name or machine name.
    #[arg(required = true)]
    pub libraries: Vec<String>,

    /// Include every local library the requested ones depend on.
    #[arg(short, long)]
    pub recursive: bool,

    /// Write the file list here instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub inventory: InventoryArgs,
}

pub fn execute(args: PackArgs) -> Result<()> {
    let inventory = args.inventory.load()?;
    let requested = InventoryArgs::repo_names(&inventory, &args.libraries);

    let packaging = PackagingClosure::new(&inventory);
    let libraries = if args.recursive {
        packaging.closure(&requested)
    } else {
        requested
    };
    info!("Packaging {}", libraries.join(", "));

    let plan = packaging.package_files(&libraries, &IgnoreRules::defaults()?)?;
    if !plan.missing.is_empty() {
        return Err(suggestions::package_libraries_missing(&plan.missing));
    }

    let mut listing = String::new();
    for file in &plan.files {
        listing.push_str(&file.to_string_lossy());
        listing.push('\n');
    }
    match &args.output {
        Some(path) => {
            fs::write(path, listing)?;
            eprintln!("Wrote {} paths to {}", plan.files.len(), path.display());
        }
        None => print!("{}", listing),
    }
    Ok(())
}
