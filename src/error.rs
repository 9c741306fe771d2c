//! Error types and helpers for user-friendly error messages
//!
//! Version parsing, root lookup, store loading, configuration, lockfile
//! parsing and image rendering each fail with a dedicated variant. Variants that the user can
//! act on carry a hint that `display_with_hints` prints below the message.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for the library-level modules
pub type Result<T, E = GemError> = std::result::Result<T, E>;

/// Error types with helpful context and suggestions
#[derive(Error, Debug)]
pub enum GemError {
    /// Malformed version or constraint text
    #[error("Invalid version '{input}': {message}")]
    Parse { input: String, message: String },

    /// The root package (or the requested version of it) is not in the store
    #[error("{}", not_found_message(package, version.as_deref()))]
    NotFound {
        package: String,
        version: Option<String>,
    },

    /// Document store could not be read or decoded
    #[error("Failed to load gem store {}: {message}", path.display())]
    Store {
        path: PathBuf,
        message: String,
        hint: Option<String>,
    },

    /// Configuration file errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        hint: Option<String>,
    },

    /// Gemfile.lock content is invalid
    #[error("Lockfile error: {message}")]
    Lockfile { message: String, hint: String },

    /// External layout engine is missing or failed
    #[error("Failed to render {format}: {message}")]
    Render {
        format: String,
        message: String,
        hint: Option<String>,
    },
}

fn not_found_message(package: &str, version: Option<&str>) -> String {
    match version {
        Some(v) => format!("Gem '{}' has no version {}", package, v),
        None => format!("Gem '{}' was not found", package),
    }
}

impl GemError {
    /// Create a parse error
    pub fn parse(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Create a not-found error for a package
    pub fn not_found(package: impl Into<String>) -> Self {
        Self::NotFound {
            package: package.into(),
            version: None,
        }
    }

    /// Create a not-found error for a specific version of a package
    pub fn version_not_found(package: impl Into<String>, version: impl Into<String>) -> Self {
        Self::NotFound {
            package: package.into(),
            version: Some(version.into()),
        }
    }

    /// Create a store error
    pub fn store(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Store {
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    /// Create a store error with hint
    pub fn store_with_hint(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::Store {
            path: path.into(),
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            hint: None,
        }
    }

    /// Create a configuration error with hint
    pub fn config_error_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create a lockfile error
    pub fn lockfile(message: impl Into<String>) -> Self {
        Self::Lockfile {
            message: message.into(),
            hint: hints::lockfile().to_string(),
        }
    }

    /// Create a render error
    pub fn render(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            format: format.into(),
            message: message.into(),
            hint: None,
        }
    }

    /// Create a render error with hint
    pub fn render_with_hint(
        format: impl Into<String>,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::Render {
            format: format.into(),
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Get the hint for this error, if any
    pub fn hint(&self) -> Option<&str> {
        match self {
            GemError::Parse { .. } => Some(hints::version_syntax()),
            GemError::NotFound { version: None, .. } => Some(hints::gem_not_found()),
            GemError::NotFound { version: Some(_), .. } => Some(hints::version_not_found()),
            GemError::Store { hint, .. }
            | GemError::Config { hint, .. }
            | GemError::Render { hint, .. } => hint.as_deref(),
            GemError::Lockfile { hint, .. } => Some(hint),
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);

        if let Some(h) = self.hint() {
            eprintln!("\n{} {}", style("HINT:").yellow().bold(), h);
        }

        eprintln!();
    }
}

/// Common error hints
pub mod hints {
    /// Get hint for malformed version text
    pub fn version_syntax() -> &'static str {
        "Versions look like '1.2.3' or '2.0.0.rc1'. Constraints are comma-separated\n\
         clauses such as '~> 1.2', '>= 1.0, < 2.0' or '= 3.0.0'."
    }

    /// Get hint for an unknown root gem
    pub fn gem_not_found() -> &'static str {
        "Check the gem name spelling, or search the store:\n\
         • Run: gemfamily search <part-of-name>"
    }

    /// Get hint for an unknown root version
    pub fn version_not_found() -> &'static str {
        "List the published versions of the gem:\n\
         • Run: gemfamily versions <name>"
    }

    /// Get hint for a missing store file
    pub fn store_missing() -> &'static str {
        "Point gemfamily at an ingested gem store:\n\
         • Pass --store <path> or set GEMFAMILY_STORE\n\
         • Or set [store] path in gemfamily.toml"
    }

    /// Get hint for an undecodable store
    pub fn store_format() -> &'static str {
        "The store must be JSON: one gem document, an array of documents,\n\
         or one document per line in a .jsonl file."
    }

    /// Get hint for invalid Gemfile.lock content
    pub fn lockfile() -> &'static str {
        "Gemfile.lock seems to be invalid. It must contain a DEPENDENCIES section,\n\
         for example:\n\
         \n\
         DEPENDENCIES\n\
         \x20 rails (~> 3.0.0)\n\
         \x20 rake"
    }

    /// Get hint for missing Graphviz
    pub fn graphviz() -> &'static str {
        "Image output needs the Graphviz 'dot' binary:\n\
         • macOS: brew install graphviz\n\
         • Ubuntu: sudo apt install graphviz\n\
         • Windows: winget install Graphviz.Graphviz\n\
         \n\
         Or use --format dot and render the file yourself."
    }
}
