//! Graph export
//!
//! Text, JSON and DOT are produced in-process. Images are rendered by piping
//! the DOT source through the Graphviz `dot` binary.

use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use clap::ValueEnum;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use crate::dependency::Graph;
use crate::error::{hints, GemError, Result};

/// Output format for graph commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Indented tree (default)
    #[default]
    Text,
    /// JSON document of nodes and edges
    Json,
    /// Graphviz DOT source
    Dot,
    /// PNG image (needs Graphviz)
    Png,
    /// SVG image (needs Graphviz)
    Svg,
    /// Gzipped SVG image (needs Graphviz)
    Svgz,
}

impl OutputFormat {
    /// Guess the format from an output file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "dot" | "gv" => Some(Self::Dot),
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            "svgz" => Some(Self::Svgz),
            _ => None,
        }
    }

    /// Whether the output is binary or produced by Graphviz
    pub fn is_image(self) -> bool {
        matches!(self, Self::Png | Self::Svg | Self::Svgz)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Dot => "dot",
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Svgz => "svgz",
        }
    }
}

/// Render a graph in the given format
pub fn render(graph: &Graph, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Text => Ok(graph.format_tree().into_bytes()),
        OutputFormat::Json => to_json(graph).map(String::into_bytes),
        OutputFormat::Dot => Ok(to_dot(graph).into_bytes()),
        OutputFormat::Png => run_dot(&to_dot(graph), "png"),
        OutputFormat::Svg => run_dot(&to_dot(graph), "svg"),
        OutputFormat::Svgz => gzip(&run_dot(&to_dot(graph), "svg")?),
    }
}

/// Serialize the graph as pretty JSON
pub fn to_json(graph: &Graph) -> Result<String> {
    serde_json::to_string_pretty(graph).map_err(|e| GemError::render("json", e.to_string()))
}

/// Generate Graphviz DOT source
///
/// Nodes are named `n<id>` and carry their display label, so labels may
/// repeat text or contain characters DOT identifiers cannot.
pub fn to_dot(graph: &Graph) -> String {
    let style = &graph.style;
    let mut out = String::new();

    out.push_str(&format!("digraph {} {{\n", quote(&graph.title)));
    out.push_str(&format!("    concentrate={};\n", style.concentrate));
    out.push_str(&format!("    normalize={};\n", style.normalize));
    out.push_str(&format!("    rankdir={};\n", style.rankdir));
    out.push_str(&format!(
        "    edge [labeldistance={}, labelangle={}];\n",
        style.label_distance, style.label_angle
    ));

    for node in graph.nodes() {
        if node.is_virtual() {
            out.push_str(&format!(
                "    n{} [label={}, shape=box];\n",
                node.id,
                quote(&node.label)
            ));
        } else {
            out.push_str(&format!("    n{} [label={}];\n", node.id, quote(&node.label)));
        }
    }

    for edge in graph.edges() {
        let mut attrs = Vec::new();
        if let Some(ref label) = edge.label {
            attrs.push(format!("headlabel={}", quote(label)));
        }
        attrs.push(format!("fontsize={}", style.edge_font_size));
        out.push_str(&format!(
            "    n{} -> n{} [{}];\n",
            edge.from,
            edge.to,
            attrs.join(", ")
        ));
    }

    out.push_str("}\n");
    out
}

/// Quote a DOT string literal
fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => {}
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Run `dot -T<format>` on the given source
fn run_dot(source: &str, format: &str) -> Result<Vec<u8>> {
    let dot = which::which("dot").map_err(|_| {
        GemError::render_with_hint(format, "Graphviz 'dot' not found in PATH", hints::graphviz())
    })?;

    debug!(dot = %dot.display(), format, "rendering with graphviz");

    let mut child = Command::new(&dot)
        .arg(format!("-T{}", format))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| GemError::render(format, format!("failed to start {}: {}", dot.display(), e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(source.as_bytes()) {
            drop(stdin);
            reap(&mut child);
            return Err(GemError::render(format, e.to_string()));
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| GemError::render(format, e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GemError::render(
            format,
            format!("dot exited with {}: {}", output.status, stderr.trim()),
        ));
    }

    Ok(output.stdout)
}

/// Stop a child that can no longer be fed and collect its exit status
fn reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "dot already exited");
    }
    if let Err(e) = child.wait() {
        debug!(error = %e, "failed to wait for dot");
    }
}

fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(|e| GemError::render("svgz", e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| GemError::render("svgz", e.to_string()))
}
