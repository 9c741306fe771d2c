//! Gem dependency graph data structures
//!
//! Nodes are deduplicated by display label; edges are deduplicated by
//! (parent, child, label). A synthetic virtual root may be added once and
//! never merges with a package node of the same label.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Index of a node in the graph
pub type NodeId = usize;

/// Visual attributes carried through to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphStyle {
    /// Merge parallel edges
    pub concentrate: bool,
    pub normalize: bool,
    pub rankdir: String,
    /// Distance of head labels from the arrow head
    pub label_distance: f64,
    /// Angle of head labels relative to the edge
    pub label_angle: f64,
    pub edge_font_size: u32,
}

impl Default for GraphStyle {
    fn default() -> Self {
        Self {
            concentrate: true,
            normalize: true,
            rankdir: "TB".to_string(),
            label_distance: 3.0,
            label_angle: -30.0,
            edge_font_size: 10,
        }
    }
}

/// A node in the dependency graph
#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: NodeId,
    /// Display label: gem name, optionally followed by a line break and the version
    pub label: String,
    /// Gem name; `None` for the virtual root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Resolved version; `None` for the virtual root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Distance from the root along the path that created the node
    pub depth: usize,
}

impl GraphNode {
    pub fn is_virtual(&self) -> bool {
        self.package.is_none()
    }
}

/// A directed edge from a dependent to its dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GraphEdge {
    pub from: NodeId,
    pub to: NodeId,
    /// Constraint text shown at the head of the edge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Gem dependency graph
#[derive(Debug, Clone, Serialize)]
pub struct Graph {
    pub title: String,
    pub style: GraphStyle,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    root: Option<NodeId>,

    #[serde(skip)]
    by_label: HashMap<String, NodeId>,
    #[serde(skip)]
    edge_set: HashSet<GraphEdge>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(title: impl Into<String>, style: GraphStyle) -> Self {
        Self {
            title: title.into(),
            style,
            nodes: Vec::new(),
            edges: Vec::new(),
            root: None,
            by_label: HashMap::new(),
            edge_set: HashSet::new(),
        }
    }

    /// Add a package node, or return the existing node with the same label
    pub fn add_node(
        &mut self,
        label: impl Into<String>,
        package: &str,
        version: &str,
        depth: usize,
    ) -> NodeId {
        let label = label.into();
        if let Some(&id) = self.by_label.get(&label) {
            return id;
        }

        let id = self.nodes.len();
        self.nodes.push(GraphNode {
            id,
            label: label.clone(),
            package: Some(package.to_string()),
            version: Some(version.to_string()),
            depth,
        });
        self.by_label.insert(label, id);
        id
    }

    /// Add the synthetic root of a multi-root graph
    pub fn add_virtual_root(&mut self, label: impl Into<String>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(GraphNode {
            id,
            label: label.into(),
            package: None,
            version: None,
            depth: 0,
        });
        self.root = Some(id);
        id
    }

    /// Mark a node as the root of the graph
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Add an edge; returns false if the same edge already exists
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, label: Option<String>) -> bool {
        let edge = GraphEdge { from, to, label };
        if !self.edge_set.insert(edge.clone()) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Get a package node by label
    #[cfg(test)]
    pub fn find_node(&self, label: &str) -> Option<&GraphNode> {
        self.by_label.get(label).and_then(|&id| self.nodes.get(id))
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// All edges in insertion order
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn root(&self) -> Option<&GraphNode> {
        self.root.and_then(|id| self.node(id))
    }

    /// Edges leaving a node, in insertion order
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |e| e.from == id)
    }

    /// Get the graph as an indented tree for terminal display
    ///
    /// Each node is expanded once; later occurrences are marked.
    pub fn format_tree(&self) -> String {
        let mut output = String::new();
        let mut visited = HashSet::new();

        if let Some(root) = self.root() {
            self.format_node(root.id, None, &mut output, &mut visited, 0, true);
        }

        output
    }

    fn format_node(
        &self,
        id: NodeId,
        edge_label: Option<&str>,
        output: &mut String,
        visited: &mut HashSet<NodeId>,
        depth: usize,
        is_last: bool,
    ) {
        let Some(node) = self.node(id) else {
            return;
        };

        let prefix = if depth == 0 {
            String::new()
        } else {
            "    ".repeat(depth - 1) + if is_last { "└── " } else { "├── " }
        };

        let already_visited = visited.contains(&id);
        let marker = if already_visited { " (*)" } else { "" };

        output.push_str(&prefix);
        output.push_str(&node.label.replace('\n', " "));
        if let Some(label) = edge_label {
            output.push_str(&format!(" [{}]", label));
        }
        output.push_str(marker);
        output.push('\n');

        if already_visited {
            return;
        }
        visited.insert(id);

        let children: Vec<&GraphEdge> = self.children(id).collect();
        let count = children.len();
        for (i, edge) in children.into_iter().enumerate() {
            self.format_node(
                edge.to,
                edge.label.as_deref(),
                output,
                visited,
                depth + 1,
                i + 1 == count,
            );
        }
    }

    /// Get statistics about the graph
    pub fn stats(&self) -> GraphStats {
        let mut in_degree: HashMap<NodeId, usize> = HashMap::new();
        for edge in &self.edges {
            *in_degree.entry(edge.to).or_insert(0) += 1;
        }

        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            shared_count: in_degree.values().filter(|&&n| n > 1).count(),
            max_depth: self.nodes.iter().map(|n| n.depth).max().unwrap_or(0),
        }
    }
}

/// Statistics about a dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    /// Nodes reached by more than one edge
    pub shared_count: usize,
    /// Maximum depth in the graph
    pub max_depth: usize,
}
