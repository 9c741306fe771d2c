//! Graph command - Render the dependency graph of one gem
//!
//! Usage:
//!   gemfamily graph rails                      # Newest release, as a tree
//!   gemfamily graph rails 3.0.0                # A specific version
//!   gemfamily graph rails --versions           # Label nodes and edges with versions
//!   gemfamily graph rails --format dot         # Graphviz DOT source
//!   gemfamily graph rails -o rails.png         # Image, format from extension

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::{emit_graph, print_stats, resolve_format, CommandContext};
use crate::dependency::DependencyResolver;
use crate::export::OutputFormat;

/// Render the dependency graph of a gem
#[derive(Args, Debug)]
pub struct GraphCommand {
    /// Gem name
    pub name: String,

    /// Gem version (default: newest release)
    #[arg(value_name = "VERSION")]
    pub gem_version: Option<String>,

    /// Show versions on nodes and constraints on edges
    #[arg(long)]
    pub versions: bool,

    /// Output format (default: from --output extension, else text)
    #[arg(long, short = 'f', value_enum)]
    pub format: Option<OutputFormat>,

    /// Write to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Graph title
    #[arg(long)]
    pub title: Option<String>,

    /// Print node and edge counts to stderr
    #[arg(long)]
    pub stats: bool,
}

impl GraphCommand {
    /// Execute the graph command
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let options = ctx
            .config
            .build_options(self.title.as_deref(), self.versions);

        let graph = DependencyResolver::new(&store, options)
            .build_single_root(&self.name, self.gem_version.as_deref())?;

        if self.stats || ctx.verbose {
            print_stats(&graph.stats());
        }

        let format = resolve_format(self.format, self.output.as_deref());
        emit_graph(&graph, format, self.output.as_deref())
    }
}
