//! Search command - Find gems in the store by name
//!
//! Usage:
//!   gemfamily search rack              # Exact match first, then substring hits
//!   gemfamily search rack --limit 50

use anyhow::Result;
use clap::Args;

use super::CommandContext;
use crate::repository::{PackageRecord, PackageRepository};

/// Search for gems by name
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Search keyword (case-insensitive substring)
    pub query: String,

    /// Limit number of results
    #[arg(long, default_value = "20")]
    pub limit: usize,
}

impl SearchCommand {
    /// Execute the search command
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let store = ctx.open_store()?;

        println!("\n🔍 Searching for '{}' in {} gem(s)...", self.query, store.len());

        let results = rank_results(&store, &self.query);
        if results.is_empty() {
            println!("\n✗ No gems found matching '{}'", self.query);
            println!("\n💡 Try:");
            println!("   - A shorter part of the name");
            println!("   - Browsing by letter: gemfamily list --letter <L>");
            return Ok(());
        }

        let total = results.len();
        let display_count = std::cmp::min(total, self.limit);

        println!("\nFound {} gem(s):\n", total);

        for (idx, package) in results.iter().take(display_count).enumerate() {
            let latest = package
                .latest()
                .map(|r| r.version.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("{}. {} v{}", idx + 1, package.name(), latest);
        }

        if total > display_count {
            println!(
                "\n... and {} more. Use --limit {} to see all results",
                total - display_count,
                total
            );
        }

        println!("\n💡 Draw a graph with:");
        println!("   gemfamily graph <name>");

        Ok(())
    }
}

/// Substring hits sorted by name, with an exact name match moved to the front
fn rank_results<'r, R: PackageRepository + ?Sized>(
    repository: &'r R,
    query: &str,
) -> Vec<&'r PackageRecord> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let mut results = repository.search(query);
    if let Some(pos) = results
        .iter()
        .position(|p| p.name().eq_ignore_ascii_case(query))
    {
        let exact = results.remove(pos);
        results.insert(0, exact);
    }
    results
}
