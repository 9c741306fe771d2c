//! gemfamily.toml configuration parsing
//!
//! ```toml
//! [store]
//! path = "data/gems.jsonl"
//!
//! [graph]
//! title = "GemFamily"
//! virtual_title = "Root"
//! include_versions = false
//!
//! [graph.style]
//! concentrate = true
//! normalize = true
//! rankdir = "TB"
//! label_distance = 3
//! label_angle = -30
//! edge_font_size = 10
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::validation::validate_config;
use crate::dependency::{BuildOptions, GraphStyle};

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "gemfamily.toml";

/// Root configuration structure for gemfamily.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GemfamilyConfig {
    /// Document store location
    pub store: StoreConfig,

    /// Graph rendering defaults
    pub graph: GraphConfig,

    /// Directory of the file the config was read from
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// `[store]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to a gem store file or directory
    pub path: Option<PathBuf>,
}

/// `[graph]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Title of single-root graphs
    pub title: String,

    /// Label of the synthetic root of lockfile graphs
    pub virtual_title: String,

    /// Show versions on nodes and constraints on edges
    pub include_versions: bool,

    pub style: GraphStyle,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            title: "GemFamily".to_string(),
            virtual_title: "Root".to_string(),
            include_versions: false,
            style: GraphStyle::default(),
        }
    }
}

impl GemfamilyConfig {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, `gemfamily.toml` in the
    /// current directory is used if present, otherwise the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        let local = Path::new(CONFIG_FILE);
        if local.is_file() {
            return Self::load_from_path(local);
        }

        debug!("no {} found, using defaults", CONFIG_FILE);
        Ok(Self::default())
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        let mut config = Self::parse(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        config.base_dir = path.parent().map(Path::to_path_buf);

        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse gemfamily.toml")?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Resolve the store location
    ///
    /// `cli_path` (from `--store` or `GEMFAMILY_STORE`) wins over the
    /// configured path. A relative configured path is taken relative to the
    /// config file.
    pub fn store_path(&self, cli_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli_path {
            return Some(path.to_path_buf());
        }

        match (&self.store.path, &self.base_dir) {
            (Some(path), Some(base)) if path.is_relative() => Some(base.join(path)),
            (Some(path), _) => Some(path.clone()),
            (None, _) => default_store_path(),
        }
    }

    /// Graph build options for single-root graphs
    ///
    /// `title` overrides the configured title; `include_versions` is or-ed
    /// with the configured flag.
    pub fn build_options(&self, title: Option<&str>, include_versions: bool) -> BuildOptions {
        BuildOptions {
            title: title.unwrap_or(&self.graph.title).to_string(),
            include_versions: include_versions || self.graph.include_versions,
            style: self.graph.style.clone(),
        }
    }
}

/// Default store location in the platform data directory
pub fn default_store_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "gemfamily", "gemfamily")
        .map(|dirs| dirs.data_dir().join("gems.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = GemfamilyConfig::parse("").unwrap();
        assert!(config.store.path.is_none());
        assert_eq!(config.graph.title, "GemFamily");
        assert_eq!(config.graph.virtual_title, "Root");
        assert!(!config.graph.include_versions);
        assert_eq!(config.graph.style, GraphStyle::default());
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
[store]
path = "/var/lib/gems.jsonl"

[graph]
title = "Deps"
virtual_title = "Gemfile"
include_versions = true

[graph.style]
concentrate = false
rankdir = "LR"
label_distance = 2
label_angle = -45.5
edge_font_size = 8
"#;
        let config = GemfamilyConfig::parse(content).unwrap();
        assert_eq!(config.store.path, Some(PathBuf::from("/var/lib/gems.jsonl")));
        assert_eq!(config.graph.title, "Deps");
        assert_eq!(config.graph.virtual_title, "Gemfile");
        assert!(config.graph.include_versions);

        let style = &config.graph.style;
        assert!(!style.concentrate);
        assert!(style.normalize);
        assert_eq!(style.rankdir, "LR");
        assert_eq!(style.label_distance, 2.0);
        assert_eq!(style.label_angle, -45.5);
        assert_eq!(style.edge_font_size, 8);
    }

    #[test]
    fn test_parse_invalid_toml() {
        assert!(GemfamilyConfig::parse("[graph\ntitle =").is_err());
    }

    #[test]
    fn test_load_from_path_resolves_relative_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[store]\npath = \"gems.json\"\n").unwrap();

        let config = GemfamilyConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.store_path(None), Some(dir.path().join("gems.json")));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(GemfamilyConfig::load(Some(missing.as_path())).is_err());
    }

    #[test]
    fn test_cli_store_path_wins() {
        let config = GemfamilyConfig::parse("[store]\npath = \"/a.json\"\n").unwrap();
        assert_eq!(
            config.store_path(Some(Path::new("/b.json"))),
            Some(PathBuf::from("/b.json"))
        );
        assert_eq!(config.store_path(None), Some(PathBuf::from("/a.json")));
    }

    #[test]
    fn test_build_options() {
        let config = GemfamilyConfig::default();
        let options = config.build_options(None, false);
        assert_eq!(options.title, "GemFamily");
        assert!(!options.include_versions);

        let options = config.build_options(Some("Mine"), true);
        assert_eq!(options.title, "Mine");
        assert!(options.include_versions);
    }
}
