//! CLI argument parsing using clap derive macros

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{
    bundle::BundleCommand, graph::GraphCommand, list::ListCommand, search::SearchCommand,
    show::ShowCommand, versions::VersionsCommand, CommandContext,
};
use crate::config::GemfamilyConfig;
use crate::utils::terminal::disable_colors;

/// GemFamily - Gem dependency graphs
///
/// Resolves the runtime dependencies of a gem, or of a Gemfile.lock, against
/// a local gem store and renders them as a tree, JSON, DOT or an image.
#[derive(Parser, Debug)]
#[command(name = "gemfamily")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to gemfamily.toml (default: ./gemfamily.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Gem store file or directory
    #[arg(long, global = true, env = "GEMFAMILY_STORE")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the dependency graph of a gem
    Graph(GraphCommand),

    /// Render the dependency graph of a Gemfile.lock
    Bundle(BundleCommand),

    /// Show versions, dependencies and dependents of a gem
    Show(ShowCommand),

    /// List all versions of a gem
    Versions(VersionsCommand),

    /// Search gems by name
    Search(SearchCommand),

    /// List gems starting with a letter
    List(ListCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        if self.no_color {
            disable_colors();
        }

        let ctx = CommandContext {
            config: GemfamilyConfig::load(self.config.as_deref())?,
            store: self.store,
            verbose: self.verbose,
        };

        match self.command {
            Commands::Graph(cmd) => cmd.execute(&ctx),
            Commands::Bundle(cmd) => cmd.execute(&ctx),
            Commands::Show(cmd) => cmd.execute(&ctx),
            Commands::Versions(cmd) => cmd.execute(&ctx),
            Commands::Search(cmd) => cmd.execute(&ctx),
            Commands::List(cmd) => cmd.execute(&ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::OutputFormat;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_graph_args() {
        let cli = Cli::try_parse_from([
            "gemfamily", "graph", "rails", "3.0.0", "--versions", "-f", "dot", "--store", "gems.json",
        ])
        .unwrap();
        assert_eq!(cli.store, Some(PathBuf::from("gems.json")));
        match cli.command {
            Commands::Graph(cmd) => {
                assert_eq!(cmd.name, "rails");
                assert_eq!(cmd.gem_version.as_deref(), Some("3.0.0"));
                assert!(cmd.versions);
                assert_eq!(cmd.format, Some(OutputFormat::Dot));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_show_with_version() {
        let cli = Cli::try_parse_from(["gemfamily", "show", "rack", "1.2.1"]).unwrap();
        match cli.command {
            Commands::Show(cmd) => {
                assert_eq!(cmd.name, "rack");
                assert_eq!(cmd.gem_version.as_deref(), Some("1.2.1"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_bundle_stdin() {
        let cli = Cli::try_parse_from(["gemfamily", "bundle", "-", "--no-versions"]).unwrap();
        match cli.command {
            Commands::Bundle(cmd) => {
                assert_eq!(cmd.lockfile, PathBuf::from("-"));
                assert!(cmd.no_versions);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
