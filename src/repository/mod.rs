//! Package records and the repository interface the graph builder reads from
//!
//! Records are read-only snapshots of what the ingestion step stored for a
//! gem: every published version, its platform, and its runtime and
//! development dependencies.
//!
//! # Overview
//!
//! The builder only needs [`PackageRepository::find_by_name`]. The listing,
//! search and reverse-dependency lookups back the `list`, `search` and
//! `show` commands.

mod store;

pub use store::PackageStore;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dependency::resolve_best;
use crate::error::Result;
use crate::version::{Constraint, Version};

/// Dependency kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Needed at run time; drives graph expansion
    Runtime,
    /// Needed only to build or test the gem
    Development,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyKind::Runtime => write!(f, "runtime"),
            DependencyKind::Development => write!(f, "development"),
        }
    }
}

/// A declared dependency of one gem version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    /// Name of the gem depended on
    pub name: String,
    /// Constraint text, e.g. "~> 1.0, >= 1.0.2"; empty means ">= 0"
    pub constraint: String,
    pub kind: DependencyKind,
}

impl DependencyRecord {
    /// Create a runtime dependency
    pub fn runtime(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: constraint.into(),
            kind: DependencyKind::Runtime,
        }
    }

    /// Create a development dependency
    pub fn development(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: constraint.into(),
            kind: DependencyKind::Development,
        }
    }

    /// Parse the constraint text
    pub fn parsed_constraint(&self) -> Result<Constraint> {
        Constraint::parse(&self.constraint)
    }

    pub fn is_runtime(&self) -> bool {
        self.kind == DependencyKind::Runtime
    }
}

/// One published version of a gem
#[derive(Debug, Clone)]
pub struct VersionRecord {
    pub name: String,
    pub version: Version,
    /// Native build platform; `None` for platform-independent gems
    pub platform: Option<String>,
    /// Prerelease flag recorded at ingestion time
    pub prerelease: bool,
    pub dependencies: Vec<DependencyRecord>,
}

impl VersionRecord {
    /// Create a platform-independent release with no dependencies
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            platform: None,
            prerelease: false,
            dependencies: Vec::new(),
        }
    }

    /// Set the platform
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Set the recorded prerelease flag
    pub fn with_prerelease(mut self, prerelease: bool) -> Self {
        self.prerelease = prerelease;
        self
    }

    /// Add a dependency
    pub fn with_dependency(mut self, dependency: DependencyRecord) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// The version as the resolver should rank it, carrying the recorded flag
    pub fn resolvable_version(&self) -> Version {
        self.version.clone().with_prerelease_flag(self.prerelease)
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease || self.version.is_prerelease()
    }

    /// Runtime dependencies in declaration order
    pub fn runtime(&self) -> impl Iterator<Item = &DependencyRecord> {
        self.dependencies.iter().filter(|d| d.is_runtime())
    }

    /// Development dependencies in declaration order
    pub fn development(&self) -> impl Iterator<Item = &DependencyRecord> {
        self.dependencies.iter().filter(|d| !d.is_runtime())
    }
}

/// Every known version of one gem, ordered by version (then platform)
#[derive(Debug, Clone)]
pub struct PackageRecord {
    name: String,
    versions: Vec<VersionRecord>,
}

impl PackageRecord {
    /// Create a package record
    ///
    /// Versions are sorted ascending. Records repeating an earlier
    /// (version, platform) pair are dropped.
    pub fn new(name: impl Into<String>, mut versions: Vec<VersionRecord>) -> Self {
        let name = name.into();
        versions.sort_by(|a, b| {
            a.resolvable_version()
                .cmp(&b.resolvable_version())
                .then_with(|| a.platform.cmp(&b.platform))
        });

        let before = versions.len();
        versions.dedup_by(|later, earlier| {
            later.resolvable_version() == earlier.resolvable_version()
                && later.platform == earlier.platform
        });
        if versions.len() != before {
            warn!(
                gem = %name,
                dropped = before - versions.len(),
                "discarded duplicate version records"
            );
        }

        Self { name, versions }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All version records, oldest first
    pub fn versions(&self) -> &[VersionRecord] {
        &self.versions
    }

    /// Versions offered to the resolver
    pub fn available_versions(&self) -> Vec<Version> {
        self.versions.iter().map(VersionRecord::resolvable_version).collect()
    }

    /// Find the record for a resolved version
    ///
    /// A record spelled exactly like `version` wins over one that only ranks
    /// equal, then the platform-independent build wins.
    pub fn version_record(&self, version: &Version) -> Option<&VersionRecord> {
        let matching = || {
            self.versions
                .iter()
                .filter(move |r| &r.resolvable_version() == version)
        };
        matching()
            .filter(|r| r.version.as_str() == version.as_str())
            .min_by_key(|r| r.platform.is_some())
            .or_else(|| matching().min_by_key(|r| r.platform.is_some()))
    }

    /// Find the record whose version text has the same precedence as `version`,
    /// ignoring the recorded prerelease flag
    pub fn find_version(&self, version: &Version) -> Option<&VersionRecord> {
        let exact = self
            .versions
            .iter()
            .filter(|r| &r.version == version)
            .min_by_key(|r| r.platform.is_some());
        exact.or_else(|| {
            self.versions
                .iter()
                .filter(|r| r.version.precedence(version).is_eq())
                .min_by_key(|r| r.platform.is_some())
        })
    }

    /// The newest release, or the newest prerelease if nothing else exists
    pub fn latest(&self) -> Option<&VersionRecord> {
        resolve_best(&self.available_versions(), &Constraint::default())
            .and_then(|v| self.version_record(&v))
            .or_else(|| self.versions.last())
    }

    /// Check if any version depends on `name` with the given kind
    pub fn depends_on(&self, name: &str, kind: DependencyKind) -> bool {
        self.versions
            .iter()
            .flat_map(|r| r.dependencies.iter())
            .any(|d| d.kind == kind && d.name == name)
    }
}

/// Read access to stored package records
pub trait PackageRepository {
    /// Look up a gem by exact name
    fn find_by_name(&self, name: &str) -> Option<&PackageRecord>;

    /// Gems whose name starts with `letter` (case-insensitive), sorted by name
    fn find_by_prefix(&self, letter: char) -> Vec<&PackageRecord>;

    /// Gems whose name contains `query` (case-insensitive), sorted by name
    fn search(&self, query: &str) -> Vec<&PackageRecord>;

    /// Gems with any version declaring a `kind` dependency on `name`
    fn find_reverse_dependents(&self, name: &str, kind: DependencyKind) -> Vec<&PackageRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_package_record_sorts_versions() {
        let pkg = PackageRecord::new(
            "rack",
            vec![
                VersionRecord::new("rack", v("1.2.0")),
                VersionRecord::new("rack", v("1.0.0")),
                VersionRecord::new("rack", v("1.10.0")),
            ],
        );
        let versions: Vec<&str> = pkg.versions().iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["1.0.0", "1.2.0", "1.10.0"]);
    }

    #[test]
    fn test_package_record_drops_duplicate_version_platform() {
        let pkg = PackageRecord::new(
            "nokogiri",
            vec![
                VersionRecord::new("nokogiri", v("1.4.0"))
                    .with_dependency(DependencyRecord::runtime("first", "")),
                VersionRecord::new("nokogiri", v("1.4.0"))
                    .with_dependency(DependencyRecord::runtime("second", "")),
                VersionRecord::new("nokogiri", v("1.4.0")).with_platform("x86-mswin32"),
            ],
        );
        assert_eq!(pkg.versions().len(), 2);
        let record = pkg.version_record(&v("1.4.0")).unwrap();
        assert!(record.platform.is_none());
        assert_eq!(record.dependencies[0].name, "first");
    }

    #[test]
    fn test_version_record_prefers_platform_independent() {
        let pkg = PackageRecord::new(
            "json",
            vec![
                VersionRecord::new("json", v("1.5.0")).with_platform("java"),
                VersionRecord::new("json", v("1.5.0")),
            ],
        );
        assert!(pkg.version_record(&v("1.5.0")).unwrap().platform.is_none());

        let only_native = PackageRecord::new(
            "win32",
            vec![VersionRecord::new("win32", v("0.1")).with_platform("x86-mingw32")],
        );
        assert_eq!(
            only_native.version_record(&v("0.1")).unwrap().platform.as_deref(),
            Some("x86-mingw32")
        );
    }

    #[test]
    fn test_version_record_keeps_resolved_spelling() {
        let pkg = PackageRecord::new(
            "jruby-openssl",
            vec![
                VersionRecord::new("jruby-openssl", v("1.0.0rc1")).with_platform("java"),
                VersionRecord::new("jruby-openssl", v("1.0.0.rc1")),
            ],
        );
        let constraint = Constraint::parse(">= 1.0.0.a").unwrap();
        let resolved = resolve_best(&pkg.available_versions(), &constraint).unwrap();

        let record = pkg.version_record(&resolved).unwrap();
        assert_eq!(record.version.as_str(), resolved.as_str());
        assert_eq!(record.platform.as_deref(), Some("java"));

        let record = pkg.version_record(&v("1.0.0.rc1")).unwrap();
        assert_eq!(record.version.as_str(), "1.0.0.rc1");
        assert!(record.platform.is_none());
    }

    #[test]
    fn test_latest_skips_prereleases() {
        let pkg = PackageRecord::new(
            "rails",
            vec![
                VersionRecord::new("rails", v("2.3.8")),
                VersionRecord::new("rails", v("3.0.0.beta4")),
                VersionRecord::new("rails", v("3.0.0")).with_prerelease(true),
            ],
        );
        assert_eq!(pkg.latest().unwrap().version, v("2.3.8"));

        let only_pre = PackageRecord::new(
            "edge",
            vec![VersionRecord::new("edge", v("0.1.0.pre"))],
        );
        assert_eq!(only_pre.latest().unwrap().version, v("0.1.0.pre"));

        assert!(PackageRecord::new("empty", vec![]).latest().is_none());
    }

    #[test]
    fn test_find_version_by_text() {
        let pkg = PackageRecord::new(
            "rake",
            vec![VersionRecord::new("rake", v("0.8.7")).with_prerelease(true)],
        );
        assert!(pkg.find_version(&v("0.8.7")).is_some());
        assert!(pkg.find_version(&v("0.8.7.0")).is_some());
        assert!(pkg.find_version(&v("0.9.0")).is_none());
    }

    #[test]
    fn test_runtime_and_development_split() {
        let record = VersionRecord::new("rspec", v("2.0.0"))
            .with_dependency(DependencyRecord::runtime("rspec-core", "~> 2.0.0"))
            .with_dependency(DependencyRecord::development("rake", ">= 0"));
        assert_eq!(record.runtime().count(), 1);
        assert_eq!(record.development().next().unwrap().name, "rake");
    }
}
