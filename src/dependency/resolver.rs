//! Dependency graph builder
//!
//! Walks runtime dependencies from a root gem (or from a list of top-level
//! constraints under a virtual root), resolving each constraint to one
//! concrete version and adding a node per (gem, version) pair.
//!
//! Every (gem, resolved version) pair is expanded at most once. Revisiting a
//! pair only adds the edge, so diamonds share a node and cycles in the
//! stored data terminate.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::dependency::graph::{Graph, GraphStyle, NodeId};
use crate::dependency::version_resolver::resolve_best;
use crate::error::{GemError, Result};
use crate::repository::{DependencyRecord, PackageRepository, VersionRecord};
use crate::version::Version;

/// Options for building a graph
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Graph title
    pub title: String,
    /// Show resolved versions on nodes and constraints on edges
    pub include_versions: bool,
    pub style: GraphStyle,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            title: "GemFamily".to_string(),
            include_versions: false,
            style: GraphStyle::default(),
        }
    }
}

/// Builds dependency graphs from a package repository
pub struct DependencyResolver<'r, R: PackageRepository + ?Sized> {
    repository: &'r R,
    options: BuildOptions,
}

impl<'r, R: PackageRepository + ?Sized> DependencyResolver<'r, R> {
    /// Create a new graph builder
    pub fn new(repository: &'r R, options: BuildOptions) -> Self {
        Self {
            repository,
            options,
        }
    }

    /// Build the graph of one gem
    ///
    /// Without `version` the newest release is used. Fails with
    /// [`GemError::NotFound`] if the gem or the requested version is unknown.
    pub fn build_single_root(&self, name: &str, version: Option<&str>) -> Result<Graph> {
        let package = self
            .repository
            .find_by_name(name)
            .ok_or_else(|| GemError::not_found(name))?;

        let record = match version.map(str::trim).filter(|v| !v.is_empty()) {
            Some(text) => {
                let requested = Version::parse(text)?;
                package
                    .find_version(&requested)
                    .ok_or_else(|| GemError::version_not_found(name, text))?
            }
            None => package
                .latest()
                .ok_or_else(|| GemError::not_found(name))?,
        };

        debug!(gem = %name, version = %record.version, "building dependency graph");

        let mut expansion = Expansion::new(self.repository, &self.options);
        let root = expansion.add_package_node(record, 0);
        expansion.graph.set_root(root);

        expansion.expand(root, record.runtime().collect());
        Ok(expansion.finish())
    }

    /// Build one graph for several independently constrained gems
    ///
    /// `entries` are (gem name, constraint text) pairs, e.g. the dependencies
    /// listed in a Gemfile.lock. They hang directly off a synthetic root
    /// labeled `title`. Unknown or unresolvable entries are left out.
    pub fn build_virtual_root(&self, entries: &[(String, String)], title: &str) -> Graph {
        debug!(title = %title, entries = entries.len(), "building virtual root graph");

        let top_level: Vec<DependencyRecord> = entries
            .iter()
            .map(|(name, constraint)| DependencyRecord::runtime(name.clone(), constraint.clone()))
            .collect();

        let mut expansion = Expansion::new(self.repository, &self.options);
        let root = expansion.graph.add_virtual_root(title);

        expansion.expand(root, top_level.iter().collect());
        expansion.finish()
    }
}

/// State of one graph build
struct Expansion<'a, R: PackageRepository + ?Sized> {
    repository: &'a R,
    options: &'a BuildOptions,
    graph: Graph,
    /// (gem, resolved version) -> node
    visited: HashMap<(String, Version), NodeId>,
}

/// Dependencies of a node still to be walked
struct Frame<'d> {
    parent: NodeId,
    depth: usize,
    pending: std::vec::IntoIter<&'d DependencyRecord>,
}

impl<'a, R: PackageRepository + ?Sized> Expansion<'a, R> {
    fn new(repository: &'a R, options: &'a BuildOptions) -> Self {
        Self {
            repository,
            options,
            graph: Graph::new(options.title.clone(), options.style.clone()),
            visited: HashMap::new(),
        }
    }

    fn node_label(&self, name: &str, version: &Version) -> String {
        if self.options.include_versions {
            format!("{}\n{}", name, version)
        } else {
            name.to_string()
        }
    }

    /// Add (or reuse) the node of a version record and mark it visited
    fn add_package_node(&mut self, record: &VersionRecord, depth: usize) -> NodeId {
        let version = record.resolvable_version();
        let label = self.node_label(&record.name, &version);
        let id = self
            .graph
            .add_node(label, &record.name, record.version.as_str(), depth);
        self.visited.insert((record.name.clone(), version), id);
        trace!(gem = %record.name, version = %record.version, node = id, "added node");
        id
    }

    /// Walk dependencies depth-first, in declaration order
    fn expand<'d>(&mut self, parent: NodeId, deps: Vec<&'d DependencyRecord>)
    where
        'a: 'd,
    {
        let mut stack = vec![Frame {
            parent,
            depth: 1,
            pending: deps.into_iter(),
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(dep) = frame.pending.next() else {
                stack.pop();
                continue;
            };
            let (parent, depth) = (frame.parent, frame.depth);

            let Some(record) = self.resolve(dep) else {
                continue;
            };

            let key = (record.name.clone(), record.resolvable_version());
            let edge_label = self.edge_label(dep);

            if let Some(&existing) = self.visited.get(&key) {
                self.graph.add_edge(parent, existing, edge_label);
                continue;
            }

            let child = self.add_package_node(record, depth);
            self.graph.add_edge(parent, child, edge_label);

            stack.push(Frame {
                parent: child,
                depth: depth + 1,
                pending: record.runtime().collect::<Vec<_>>().into_iter(),
            });
        }
    }

    /// Find the version record a dependency resolves to, or `None` to drop it
    fn resolve(&self, dep: &DependencyRecord) -> Option<&'a VersionRecord> {
        let Some(package) = self.repository.find_by_name(&dep.name) else {
            debug!(gem = %dep.name, "skipping dependency on unknown gem");
            return None;
        };

        let constraint = match dep.parsed_constraint() {
            Ok(constraint) => constraint,
            Err(err) => {
                warn!(gem = %dep.name, error = %err, "skipping dependency with invalid constraint");
                return None;
            }
        };

        let Some(version) = resolve_best(&package.available_versions(), &constraint) else {
            debug!(
                gem = %dep.name,
                constraint = %constraint,
                "skipping dependency with no matching version"
            );
            return None;
        };

        package.version_record(&version)
    }

    fn edge_label(&self, dep: &DependencyRecord) -> Option<String> {
        if !self.options.include_versions {
            return None;
        }
        let text = dep.constraint.trim();
        if text.is_empty() {
            Some(">= 0".to_string())
        } else {
            Some(text.to_string())
        }
    }

    fn finish(self) -> Graph {
        let stats = self.graph.stats();
        debug!(
            nodes = stats.node_count,
            edges = stats.edge_count,
            shared = stats.shared_count,
            "dependency graph built"
        );
        self.graph
    }
}
