//! Gemfile.lock parsing
//!
//! Only the `DEPENDENCIES` section is read: it lists the gems the Gemfile
//! asks for, each with the constraint it was declared with. Those pairs
//! become the top-level edges of a virtual root graph.
//!
//! ```text
//! DEPENDENCIES
//!   rails (= 3.0.0)
//!   rake
//!   nokogiri (>= 1.4.0, < 1.5)
//!   my-fork!
//! ```

use regex::Regex;

use crate::error::{GemError, Result};

const SECTION: &str = "DEPENDENCIES";

/// Parse the top-level dependencies of a Gemfile.lock
///
/// Returns (gem name, constraint) pairs in file order. A gem listed without
/// a constraint gets ">= 0". A trailing `!` (gem from a git or path source)
/// is dropped.
pub fn parse_dependencies(content: &str) -> Result<Vec<(String, String)>> {
    let line_pattern = Regex::new(r"^  ([^\s!(]+)(?: \(([^)]*)\))?!?\s*$")
        .map_err(|e| GemError::lockfile(e.to_string()))?;

    let mut lines = content.lines().enumerate();
    if !lines.any(|(_, line)| line.trim_end() == SECTION) {
        return Err(GemError::lockfile("no DEPENDENCIES section found"));
    }

    let mut dependencies = Vec::new();
    for (idx, line) in lines {
        if line.trim().is_empty() || !line.starts_with(' ') {
            break;
        }

        let caps = line_pattern.captures(line).ok_or_else(|| {
            GemError::lockfile(format!(
                "malformed dependency on line {}: '{}'",
                idx + 1,
                line.trim()
            ))
        })?;

        let name = caps[1].to_string();
        let constraint = caps
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|c| !c.is_empty())
            .unwrap_or(">= 0")
            .to_string();
        dependencies.push((name, constraint));
    }

    Ok(dependencies)
}
