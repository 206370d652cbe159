//! # Missing Command Implementation
//!
//! Reports the dependencies of a library that cannot be used: machine names
//! absent from the registry and registered libraries whose manifest could not
//! be read. Missing required dependencies fail the command; missing optional
//! (semantics-only) ones are warnings.

use anyhow::Result;
use clap::Args;

use h5p_deps::output::{status, OutputConfig, Status};
use h5p_deps::suggestions;

use super::ResolveArgs;

/// Report unregistered and unreadable dependencies
#[derive(Args, Debug)]
pub struct MissingArgs {
    #[command(flatten)]
    pub resolve: ResolveArgs,
}

pub fn execute(args: MissingArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let (root, resolution) = args.resolve.resolve()?;

    let mut required = Vec::new();
    let mut optional = 0;
    for (key, entry) in &resolution {
        let problem = if entry.is_unregistered() {
            "not in the registry".to_string()
        } else if let Some(error) = &entry.error {
            error.clone()
        } else {
            continue;
        };

        let via = format!(
            "{} via {}",
            entry.required_by.kind, entry.required_by.source_repo_name
        );
        if entry.optional {
            optional += 1;
            println!(
                "{} {} ({}): {} (optional)",
                status(&out, Status::Warn),
                key,
                via,
                problem
            );
        } else {
            required.push(key.clone());
            println!(
                "{} {} ({}): {}",
                status(&out, Status::Error),
                key,
                via,
                problem
            );
        }
    }

    if !required.is_empty() {
        return Err(suggestions::required_dependencies_missing(&required));
    }
    if optional == 0 {
        println!(
            "{} All dependencies of {} are available",
            status(&out, Status::Ok),
            root
        );
    }
    Ok(())
}
