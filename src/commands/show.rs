//! Show command - Display details of one gem version
//!
//! Usage:
//!   gemfamily show rails           # Newest release
//!   gemfamily show rails 3.0.0     # A specific version

use anyhow::Result;
use clap::Args;
use console::style;

use super::CommandContext;
use crate::dependency::VersionResolver;
use crate::error::GemError;
use crate::repository::{
    DependencyKind, DependencyRecord, PackageRecord, PackageRepository, VersionRecord,
};
use crate::version::Version;

/// Number of versions listed under "Recent versions"
const RECENT_VERSIONS: usize = 6;

/// Show a gem's versions, dependencies and dependents
#[derive(Args, Debug)]
pub struct ShowCommand {
    /// Gem name
    pub name: String,

    /// Gem version (default: newest release)
    #[arg(value_name = "VERSION")]
    pub gem_version: Option<String>,
}

impl ShowCommand {
    /// Execute the show command
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let package = store
            .find_by_name(&self.name)
            .ok_or_else(|| GemError::not_found(&self.name))?;
        let record = select_record(package, self.gem_version.as_deref())?;

        let mut heading = format!("{} {}", record.name, record.version);
        if let Some(ref platform) = record.platform {
            heading.push_str(&format!(" ({})", platform));
        }
        println!("\n📦 {}", style(heading).bold());
        if record.is_prerelease() {
            println!("   prerelease");
        }

        println!("\nRecent versions:");
        for version in recent_versions(package, RECENT_VERSIONS) {
            let marker = if version == record.version.as_str() { " ←" } else { "" };
            println!("   {}{}", version, marker);
        }

        print_dependencies(&store, "Runtime dependencies", record.runtime());
        print_dependencies(&store, "Development dependencies", record.development());

        for kind in [DependencyKind::Runtime, DependencyKind::Development] {
            let dependents = store.find_reverse_dependents(&record.name, kind);
            println!("\nUsed by ({}): {}", kind, dependents.len());
            for dependent in dependents {
                println!("   {}", dependent.name());
            }
        }

        println!();
        Ok(())
    }
}

/// Pick the requested version record, or the newest release
fn select_record<'p>(
    package: &'p PackageRecord,
    version: Option<&str>,
) -> crate::error::Result<&'p VersionRecord> {
    match version.map(str::trim).filter(|v| !v.is_empty()) {
        Some(text) => {
            let requested = Version::parse(text)?;
            package
                .find_version(&requested)
                .ok_or_else(|| GemError::version_not_found(package.name(), text))
        }
        None => package
            .latest()
            .ok_or_else(|| GemError::not_found(package.name())),
    }
}

/// Newest distinct version strings, newest first
fn recent_versions(package: &PackageRecord, limit: usize) -> Vec<&str> {
    let mut versions: Vec<&str> = Vec::with_capacity(limit);
    for record in package.versions().iter().rev() {
        let text = record.version.as_str();
        if versions.last() != Some(&text) {
            versions.push(text);
        }
        if versions.len() == limit {
            break;
        }
    }
    versions
}

/// The version a dependency currently resolves to, if any
fn resolve_dependency<R: PackageRepository + ?Sized>(
    repository: &R,
    dependency: &DependencyRecord,
) -> Option<Version> {
    let constraint = dependency.parsed_constraint().ok()?;
    let package = repository.find_by_name(&dependency.name)?;
    VersionResolver::new(package.available_versions()).resolve(&constraint)
}

fn print_dependencies<'d, R: PackageRepository + ?Sized>(
    repository: &R,
    title: &str,
    dependencies: impl Iterator<Item = &'d DependencyRecord>,
) {
    let dependencies: Vec<&DependencyRecord> = dependencies.collect();
    println!("\n{}: {}", title, dependencies.len());

    for dep in dependencies {
        let constraint = if dep.constraint.trim().is_empty() {
            ">= 0"
        } else {
            dep.constraint.as_str()
        };
        let resolved = match resolve_dependency(repository, dep) {
            Some(version) => format!("→ {}", version),
            None => style("→ unresolved").dim().to_string(),
        };
        println!("   {} ({}) {}", dep.name, constraint, resolved);
    }
}
