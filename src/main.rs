//! # h5p-deps CLI
//!
//! Binary entry point for the `h5p-deps` command-line tool. It parses the
//! command line with `clap` and dispatches to the subcommand; all dependency
//! logic lives in the `h5p_deps` library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
