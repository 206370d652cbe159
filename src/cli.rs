//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::commands;

/// h5p-deps - Resolve, audit and maintain H5P library dependencies
#[derive(Parser, Debug)]
#[command(name = "h5p-deps")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(
        long,
        global = true,
        value_name = "WHEN",
        default_value = "auto",
        value_parser = ["always", "never", "auto"]
    )]
    color: String,

    /// Set log level (error, warn, info, debug, trace). RUST_LOG overrides it.
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        default_value = "warn",
        value_parser = ["error", "warn", "info", "debug", "trace"]
    )]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the resolved dependencies of a library
    Deps(commands::deps::DepsArgs),

    /// Display the dependency tree of a library
    Tree(commands::tree::TreeArgs),

    /// Report unregistered and unreadable dependencies of a library
    Missing(commands::missing::MissingArgs),

    /// Bump minor versions and cascade to dependent libraries
    Bump(commands::bump::BumpArgs),

    /// Report diamond dependencies in the libraries directory
    Audit(commands::audit::AuditArgs),

    /// List the files to package for libraries
    Pack(commands::pack::PackArgs),

    /// Show the registry entry of a library
    Registry(commands::registry::RegistryCmdArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let color = self.color.as_str();

        match self.command {
            Commands::Deps(args) => commands::deps::execute(args, color),
            Commands::Tree(args) => commands::tree::execute(args, color),
            Commands::Missing(args) => commands::missing::execute(args, color),
            Commands::Bump(args) => commands::bump::execute(args, color),
            Commands::Audit(args) => commands::audit::execute(args, color),
            Commands::Pack(args) => commands::pack::execute(args),
            Commands::Registry(args) => commands::registry::execute(args, color),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Logs go to stderr; `RUST_LOG`, when set, takes precedence over `level`.
fn init_logging(level: &str) {
    let filter = level.parse::<LevelFilter>().unwrap_or(LevelFilter::Warn);
    let _ = env_logger::Builder::new()
        .filter_level(filter)
        .format_timestamp(None)
        .parse_default_env()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "h5p-deps",
            "audit",
            "--libraries-dir",
            "libs",
            "--log-level",
            "debug",
            "--color",
            "never",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        assert_eq!(cli.color, "never");
        assert!(matches!(cli.command, Commands::Audit(_)));
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        assert!(Cli::try_parse_from(["h5p-deps", "--log-level", "loud", "audit"]).is_err());
    }
}
