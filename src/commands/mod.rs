//! Command implementations
//!
//! Each command module provides a clap-derived struct and execute method.

pub mod bundle;
pub mod graph;
pub mod list;
pub mod search;
pub mod show;
pub mod versions;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::config::GemfamilyConfig;
use crate::dependency::{Graph, GraphStats};
use crate::error::{hints, GemError};
use crate::export::{self, OutputFormat};
use crate::repository::PackageStore;
use crate::utils::terminal::{create_spinner, print_info, print_success, print_warning};

/// State shared by all commands
#[derive(Debug)]
pub struct CommandContext {
    pub config: GemfamilyConfig,
    /// Store path given on the command line or in `GEMFAMILY_STORE`
    pub store: Option<PathBuf>,
    pub verbose: bool,
}

impl CommandContext {
    /// Open the configured gem store
    pub fn open_store(&self) -> Result<PackageStore> {
        let path = self.config.store_path(self.store.as_deref()).ok_or_else(|| {
            GemError::store_with_hint(
                PathBuf::from("<unset>"),
                "no store path configured and no data directory available",
                hints::store_missing(),
            )
        })?;

        let store = PackageStore::open(&path)?;
        if store.is_empty() {
            print_warning(&format!("No gems found in {}", path.display()));
        } else if self.verbose {
            print_info(&format!("Loaded {} gem(s) from {}", store.len(), path.display()));
        }
        Ok(store)
    }
}

/// Pick the output format: explicit flag, then output file extension, then text
pub fn resolve_format(format: Option<OutputFormat>, output: Option<&Path>) -> OutputFormat {
    format
        .or_else(|| output.and_then(OutputFormat::from_path))
        .unwrap_or_default()
}

/// Render a graph and write it to `output` or stdout
pub fn emit_graph(graph: &Graph, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    if format.is_image() && output.is_none() && console::Term::stdout().is_term() {
        bail!(
            "Refusing to write {} image data to a terminal; use -o <file> or redirect stdout",
            format.name()
        );
    }

    let bytes = if format.is_image() {
        let spinner = create_spinner(&format!("Rendering {}...", format.name()));
        let rendered = export::render(graph, format);
        spinner.finish_and_clear();
        rendered?
    } else {
        export::render(graph, format)?
    };

    match output {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_success(&format!(
                "Wrote {} graph to {}",
                format.name(),
                path.display()
            ));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

/// Print graph statistics to stderr
pub fn print_stats(stats: &GraphStats) {
    print_info(&format!(
        "{} node(s), {} edge(s), {} shared, depth {}",
        stats.node_count, stats.edge_count, stats.shared_count, stats.max_depth
    ));
}
