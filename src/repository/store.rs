//! JSON document store of ingested gems
//!
//! The ingestion step writes one document per gem:
//!
//! ```json
//! {
//!   "name": "rack-test",
//!   "version": "0.5.4",
//!   "deps": [
//!     {
//!       "version": "0.5.4",
//!       "platform": null,
//!       "pre": false,
//!       "deps": {
//!         "runtime": [{ "gem": "rack", "version": [">= 1.0"] }],
//!         "development": []
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! A store path may be a `.json` file holding one document or an array of
//! them, a `.jsonl`/`.ndjson` file with one document per line, or a
//! directory searched recursively for `.json` files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{hints, GemError, Result};
use crate::repository::{
    DependencyKind, DependencyRecord, PackageRecord, PackageRepository, VersionRecord,
};
use crate::version::Version;

/// Gem document as written by the ingestion step
#[derive(Debug, Deserialize)]
struct GemDocument {
    name: String,
    #[serde(default)]
    deps: Vec<VersionDocument>,
}

/// Version entry inside a gem document
#[derive(Debug, Deserialize)]
struct VersionDocument {
    version: String,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    pre: bool,
    #[serde(default)]
    deps: DependencySetDocument,
}

#[derive(Debug, Default, Deserialize)]
struct DependencySetDocument {
    #[serde(default)]
    runtime: Vec<DependencyDocument>,
    #[serde(default)]
    development: Vec<DependencyDocument>,
}

#[derive(Debug, Deserialize)]
struct DependencyDocument {
    gem: String,
    #[serde(default)]
    version: RequirementDocument,
}

/// Requirements are stored either as a list of clauses or as one string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RequirementDocument {
    Clauses(Vec<String>),
    Text(String),
}

impl Default for RequirementDocument {
    fn default() -> Self {
        RequirementDocument::Clauses(Vec::new())
    }
}

impl RequirementDocument {
    fn into_text(self) -> String {
        match self {
            RequirementDocument::Text(text) => text.trim().to_string(),
            RequirementDocument::Clauses(clauses) => clauses
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DocumentSet {
    Many(Vec<GemDocument>),
    One(GemDocument),
}

impl GemDocument {
    fn into_record(self) -> PackageRecord {
        let name = self.name;
        let versions = self
            .deps
            .into_iter()
            .filter_map(|doc| match Version::parse(&doc.version) {
                Ok(version) => Some(doc.into_record(&name, version)),
                Err(err) => {
                    warn!(gem = %name, error = %err, "skipping unparsable version record");
                    None
                }
            })
            .collect();
        PackageRecord::new(name, versions)
    }
}

impl VersionDocument {
    fn into_record(self, name: &str, version: Version) -> VersionRecord {
        let runtime = self
            .deps
            .runtime
            .into_iter()
            .map(|d| DependencyRecord::runtime(d.gem, d.version.into_text()));
        let development = self
            .deps
            .development
            .into_iter()
            .map(|d| DependencyRecord::development(d.gem, d.version.into_text()));

        let mut record = VersionRecord::new(name, version).with_prerelease(self.pre);
        // "ruby" is the platform-independent marker
        if let Some(platform) = self.platform.filter(|p| !p.is_empty() && p != "ruby") {
            record = record.with_platform(platform);
        }
        runtime
            .chain(development)
            .fold(record, VersionRecord::with_dependency)
    }
}

/// In-memory gem store, loaded once and shared read-only across builds
#[derive(Debug, Default)]
pub struct PackageStore {
    packages: BTreeMap<String, PackageRecord>,
}

impl PackageStore {
    /// Create a store from package records
    ///
    /// A record whose name was already seen is discarded.
    pub fn from_records(records: impl IntoIterator<Item = PackageRecord>) -> Self {
        let mut packages = BTreeMap::new();
        for record in records {
            if packages.contains_key(record.name()) {
                warn!(gem = %record.name(), "discarded duplicate gem document");
                continue;
            }
            packages.insert(record.name().to_string(), record);
        }
        Self { packages }
    }

    /// Load a store from a JSON file, a JSON Lines file, or a directory
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GemError::store_with_hint(
                path,
                "path does not exist",
                hints::store_missing(),
            ));
        }

        let documents = if path.is_dir() {
            Self::load_dir(path)?
        } else {
            Self::load_file(path)?
        };

        debug!(path = %path.display(), gems = documents.len(), "loaded gem store");

        Ok(Self::from_records(
            documents.into_iter().map(GemDocument::into_record),
        ))
    }

    fn load_dir(dir: &Path) -> Result<Vec<GemDocument>> {
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = entry.map_err(|e| GemError::store(dir, e.to_string()))?;
            let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
            if entry.file_type().is_file() && is_json {
                files.push(entry.into_path());
            }
        }
        files.sort();

        let mut documents = Vec::new();
        for file in files {
            documents.extend(Self::load_file(&file)?);
        }
        Ok(documents)
    }

    fn load_file(path: &Path) -> Result<Vec<GemDocument>> {
        let content =
            fs::read_to_string(path).map_err(|e| GemError::store(path, e.to_string()))?;

        let line_delimited = path
            .extension()
            .is_some_and(|ext| ext == "jsonl" || ext == "ndjson");

        if line_delimited {
            return Self::parse_lines(path, &content);
        }

        match serde_json::from_str::<DocumentSet>(&content) {
            Ok(DocumentSet::Many(docs)) => Ok(docs),
            Ok(DocumentSet::One(doc)) => Ok(vec![doc]),
            Err(e) => Err(GemError::store_with_hint(
                path,
                e.to_string(),
                hints::store_format(),
            )),
        }
    }

    fn parse_lines(path: &Path, content: &str) -> Result<Vec<GemDocument>> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str::<GemDocument>(line).map_err(|e| {
                    GemError::store_with_hint(
                        path,
                        format!("line {}: {}", idx + 1, e),
                        hints::store_format(),
                    )
                })
            })
            .collect()
    }

    /// Number of gems in the store
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl PackageRepository for PackageStore {
    fn find_by_name(&self, name: &str) -> Option<&PackageRecord> {
        self.packages.get(name)
    }

    fn find_by_prefix(&self, letter: char) -> Vec<&PackageRecord> {
        let letter = if letter.is_ascii_alphabetic() {
            letter.to_ascii_lowercase()
        } else {
            'a'
        };
        self.packages
            .values()
            .filter(|p| {
                p.name()
                    .chars()
                    .next()
                    .is_some_and(|c| c.to_ascii_lowercase() == letter)
            })
            .collect()
    }

    fn search(&self, query: &str) -> Vec<&PackageRecord> {
        let query = query.to_lowercase();
        let mut found: Vec<&PackageRecord> = self
            .packages
            .par_iter()
            .filter(|(name, _)| name.to_lowercase().contains(&query))
            .map(|(_, record)| record)
            .collect();
        found.sort_by(|a, b| a.name().cmp(b.name()));
        found
    }

    fn find_reverse_dependents(&self, name: &str, kind: DependencyKind) -> Vec<&PackageRecord> {
        let mut found: Vec<&PackageRecord> = self
            .packages
            .par_iter()
            .filter(|(_, record)| record.depends_on(name, kind))
            .map(|(_, record)| record)
            .collect();
        found.sort_by(|a, b| a.name().cmp(b.name()));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const RACK_TEST: &str = r#"{
        "name": "rack-test",
        "version": "0.5.4",
        "deps": [
            {
                "version": "0.5.4",
                "platform": null,
                "pre": false,
                "deps": {
                    "runtime": [{ "gem": "rack", "version": [">= 1.0"] }],
                    "development": [{ "gem": "rspec", "version": "~> 1.3" }]
                }
            },
            {
                "version": "0.6.0.rc1",
                "platform": "ruby",
                "pre": true,
                "deps": { "runtime": [{ "gem": "rack" }] }
            }
        ]
    }"#;

    const RACK: &str = r#"{ "name": "rack", "deps": [{ "version": "1.2.1" }] }"#;

    #[test]
    fn test_open_single_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rack-test.json");
        fs::write(&path, RACK_TEST).unwrap();

        let store = PackageStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);

        let pkg = store.find_by_name("rack-test").unwrap();
        assert_eq!(pkg.versions().len(), 2);

        let stable = &pkg.versions()[0];
        assert_eq!(stable.version.as_str(), "0.5.4");
        let runtime: Vec<_> = stable.runtime().collect();
        assert_eq!(runtime[0].name, "rack");
        assert_eq!(runtime[0].constraint, ">= 1.0");
        assert_eq!(stable.development().next().unwrap().constraint, "~> 1.3");

        let pre = &pkg.versions()[1];
        assert!(pre.prerelease);
        assert!(pre.platform.is_none());
        assert_eq!(pre.runtime().next().unwrap().constraint, "");
    }

    #[test]
    fn test_open_array_and_lines() {
        let dir = TempDir::new().unwrap();

        let array = dir.path().join("gems.json");
        fs::write(&array, format!("[{}, {}]", RACK_TEST, RACK)).unwrap();
        assert_eq!(PackageStore::open(&array).unwrap().len(), 2);

        let lines = dir.path().join("gems.jsonl");
        let rack_test_line = RACK_TEST.replace('\n', " ");
        fs::write(&lines, format!("{}\n\n{}\n", rack_test_line, RACK)).unwrap();
        assert_eq!(PackageStore::open(&lines).unwrap().len(), 2);

        let empty = dir.path().join("empty.json");
        fs::write(&empty, "[]").unwrap();
        let store = PackageStore::open(&empty).unwrap();
        assert!(store.is_empty());
        assert!(!PackageStore::open(&array).unwrap().is_empty());
    }

    #[test]
    fn test_open_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("r")).unwrap();
        fs::write(dir.path().join("r/rack.json"), RACK).unwrap();
        fs::write(dir.path().join("r/rack-test.json"), RACK_TEST).unwrap();
        fs::write(dir.path().join("README.md"), "not a gem").unwrap();

        let store = PackageStore::open(dir.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.find_by_name("rack").is_some());
    }

    #[test]
    fn test_open_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            PackageStore::open(&missing),
            Err(GemError::Store { hint: Some(_), .. })
        ));

        let broken = dir.path().join("broken.jsonl");
        fs::write(&broken, format!("{}\n{{ nope\n", RACK)).unwrap();
        let err = PackageStore::open(&broken).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_unparsable_versions_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("odd.json");
        fs::write(
            &path,
            r#"{ "name": "odd", "deps": [{ "version": "not a version" }, { "version": "1.0" }] }"#,
        )
        .unwrap();
        let store = PackageStore::open(&path).unwrap();
        assert_eq!(store.find_by_name("odd").unwrap().versions().len(), 1);
    }

    fn sample_store() -> PackageStore {
        let v = |s: &str| Version::parse(s).unwrap();
        PackageStore::from_records(vec![
            PackageRecord::new(
                "rack",
                vec![VersionRecord::new("rack", v("1.2.1"))],
            ),
            PackageRecord::new(
                "Rails",
                vec![VersionRecord::new("Rails", v("3.0.0"))
                    .with_dependency(DependencyRecord::runtime("rack", "~> 1.2"))],
            ),
            PackageRecord::new(
                "rack-test",
                vec![VersionRecord::new("rack-test", v("0.5.4"))
                    .with_dependency(DependencyRecord::runtime("rack", ">= 1.0"))
                    .with_dependency(DependencyRecord::development("rspec", ""))],
            ),
            PackageRecord::new("rack", vec![]),
        ])
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let store = sample_store();
        assert_eq!(store.len(), 3);
        assert_eq!(store.find_by_name("rack").unwrap().versions().len(), 1);
    }

    #[test]
    fn test_find_by_prefix() {
        let store = sample_store();
        let names: Vec<&str> = store.find_by_prefix('R').iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Rails", "rack", "rack-test"]);
        assert!(store.find_by_prefix('7').is_empty());
    }

    #[test]
    fn test_search() {
        let store = sample_store();
        let names: Vec<&str> = store.search("RACK").iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["rack", "rack-test"]);
        assert!(store.search("sinatra").is_empty());
    }

    #[test]
    fn test_find_reverse_dependents() {
        let store = sample_store();
        let runtime: Vec<&str> = store
            .find_reverse_dependents("rack", DependencyKind::Runtime)
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(runtime, vec!["Rails", "rack-test"]);

        let development: Vec<&str> = store
            .find_reverse_dependents("rspec", DependencyKind::Development)
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(development, vec!["rack-test"]);
        assert!(store
            .find_reverse_dependents("rspec", DependencyKind::Runtime)
            .is_empty());
    }
}
