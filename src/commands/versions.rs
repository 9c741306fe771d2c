//! Versions command - List every published version of a gem
//!
//! Usage:
//!   gemfamily versions rails

use anyhow::Result;
use clap::Args;

use super::CommandContext;
use crate::error::GemError;
use crate::repository::{PackageRecord, PackageRepository};

/// List all versions of a gem, newest first
#[derive(Args, Debug)]
pub struct VersionsCommand {
    /// Gem name
    pub name: String,
}

impl VersionsCommand {
    /// Execute the versions command
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let package = store
            .find_by_name(&self.name)
            .ok_or_else(|| GemError::not_found(&self.name))?;

        println!("{} ({} version(s))", package.name(), package.versions().len());
        for line in version_lines(package) {
            println!("   {}", line);
        }

        Ok(())
    }
}

fn version_lines(package: &PackageRecord) -> Vec<String> {
    let latest = package.latest().map(|r| (r.version.as_str(), r.platform.as_deref()));

    package
        .versions()
        .iter()
        .rev()
        .map(|record| {
            let mut line = record.version.to_string();
            if let Some(ref platform) = record.platform {
                line.push_str(&format!(" [{}]", platform));
            }
            if record.is_prerelease() {
                line.push_str(" (pre)");
            }
            if latest == Some((record.version.as_str(), record.platform.as_deref())) {
                line.push_str(" (latest)");
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::VersionRecord;
    use crate::version::Version;

    #[test]
    fn test_version_lines() {
        let v = |s: &str| Version::parse(s).unwrap();
        let package = PackageRecord::new(
            "nokogiri",
            vec![
                VersionRecord::new("nokogiri", v("1.4.0")),
                VersionRecord::new("nokogiri", v("1.4.1")).with_platform("x86-mingw32"),
                VersionRecord::new("nokogiri", v("1.4.1")),
                VersionRecord::new("nokogiri", v("1.5.0")).with_prerelease(true),
            ],
        );

        assert_eq!(
            version_lines(&package),
            vec![
                "1.5.0 (pre)",
                "1.4.1 [x86-mingw32]",
                "1.4.1 (latest)",
                "1.4.0",
            ]
        );
    }
}
