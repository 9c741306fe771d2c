//! List command - Browse gems by first letter
//!
//! Usage:
//!   gemfamily list                  # Gems starting with 'a'
//!   gemfamily list --letter r

use anyhow::Result;
use clap::Args;

use super::CommandContext;
use crate::repository::PackageRepository;

/// List gems starting with a letter
#[derive(Args, Debug)]
pub struct ListCommand {
    /// First letter (non-letters fall back to 'a')
    #[arg(long, short = 'l', default_value = "a")]
    pub letter: char,

    /// Limit number of results
    #[arg(long, default_value = "100")]
    pub limit: usize,
}

impl ListCommand {
    /// Execute the list command
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let packages = store.find_by_prefix(self.letter);

        let heading = if self.letter.is_ascii_alphabetic() {
            self.letter.to_ascii_uppercase()
        } else {
            'A'
        };
        println!("\nGems starting with '{}': {}\n", heading, packages.len());

        for package in packages.iter().take(self.limit) {
            let latest = package
                .latest()
                .map(|r| r.version.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("   {} ({})", package.name(), latest);
        }

        if packages.len() > self.limit {
            println!(
                "\n... and {} more. Use --limit {} to see all",
                packages.len() - self.limit,
                packages.len()
            );
        }

        Ok(())
    }
}
