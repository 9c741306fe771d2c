//! Dependency resolution and graph building
//!
//! This module resolves dependency constraints to concrete gem versions and
//! assembles the transitive runtime dependency graph of a gem or of a set of
//! top-level constraints.

pub mod graph;
pub mod resolver;
pub mod version_resolver;

pub use graph::{Graph, GraphStats, GraphStyle};
pub use resolver::{BuildOptions, DependencyResolver};
pub use version_resolver::{resolve_best, VersionResolver};
