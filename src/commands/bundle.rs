//! Bundle command - Render the dependency graph of a Gemfile.lock
//!
//! Usage:
//!   gemfamily bundle Gemfile.lock                 # Tree under a "Root" node
//!   gemfamily bundle Gemfile.lock -o deps.svg     # Image
//!   cat Gemfile.lock | gemfamily bundle -         # Read from stdin
//!   gemfamily bundle Gemfile.lock --no-versions   # Names only

use anyhow::{Context, Result};
use clap::Args;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{emit_graph, print_stats, resolve_format, CommandContext};
use crate::dependency::{BuildOptions, DependencyResolver};
use crate::export::OutputFormat;
use crate::lockfile;
use crate::repository::PackageRepository;
use crate::utils::terminal::print_warning;

/// Render the dependency graph of a Gemfile.lock
#[derive(Args, Debug)]
pub struct BundleCommand {
    /// Path to Gemfile.lock, or '-' for stdin
    pub lockfile: PathBuf,

    /// Label of the root node
    #[arg(long)]
    pub title: Option<String>,

    /// Hide versions on nodes and constraints on edges
    #[arg(long)]
    pub no_versions: bool,

    /// Output format (default: from --output extension, else text)
    #[arg(long, short = 'f', value_enum)]
    pub format: Option<OutputFormat>,

    /// Write to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Print node and edge counts to stderr
    #[arg(long)]
    pub stats: bool,
}

impl BundleCommand {
    /// Execute the bundle command
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let content = read_lockfile(&self.lockfile)?;
        let entries = lockfile::parse_dependencies(&content)?;
        debug!(entries = entries.len(), "parsed Gemfile.lock");

        let store = ctx.open_store()?;

        let missing: Vec<&str> = entries
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| store.find_by_name(name).is_none())
            .collect();
        if !missing.is_empty() {
            print_warning(&format!(
                "{} gem(s) not in the store and left out: {}",
                missing.len(),
                missing.join(", ")
            ));
        }

        let graph_config = &ctx.config.graph;
        let options = BuildOptions {
            title: graph_config.title.clone(),
            include_versions: !self.no_versions,
            style: graph_config.style.clone(),
        };
        let root_label = self.title.as_deref().unwrap_or(&graph_config.virtual_title);

        let graph = DependencyResolver::new(&store, options).build_virtual_root(&entries, root_label);

        if self.stats || ctx.verbose {
            print_stats(&graph.stats());
        }

        let format = resolve_format(self.format, self.output.as_deref());
        emit_graph(&graph, format, self.output.as_deref())
    }
}

fn read_lockfile(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read Gemfile.lock from stdin")?;
        return Ok(content);
    }

    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
