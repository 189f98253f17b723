//! Dependency graph to DOT (Graphviz) conversion.
//!
//! Every term becomes one node labelled with its name, complement marker
//! stripped. Every dependency `T -> D` becomes one directed edge, labelled with
//! its index in the graph's edge list.
//!
//! # Examples
//!
//! ```
//! use xbar_rs::function::{Function, Minterm};
//! use xbar_rs::graph::DependencyGraph;
//!
//! let mut f = Function::default();
//! f.add_inputs(["a", "b", "not_a", "not_b"]);
//! f.add_output("z");
//! f.add_minterm("z", Minterm::new(["a", "not_b"]));
//!
//! let graph = DependencyGraph::build(&f).unwrap();
//! let dot = graph.to_dot().unwrap();
//! assert!(dot.starts_with("digraph dependency_graph {"));
//! // Render with: dot -Tpng dependency_graph.dot -o dependency_graph.png
//! ```

use std::fmt::Write as _;

use crate::function::COMPLEMENT_PREFIX;
use crate::graph::DependencyGraph;

/// Configuration options for DOT output generation.
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Graph name (default: "dependency_graph")
    pub name: &'static str,
    /// Shape for term nodes (default: "ellipse")
    pub node_shape: &'static str,
    /// Font for node and edge labels (default: "Helvetica")
    pub font_name: &'static str,
    /// Font size for node and edge labels (default: 10)
    pub font_size: u32,
    /// Whether to label edges with their index (default: true)
    pub edge_labels: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            name: "dependency_graph",
            node_shape: "ellipse",
            font_name: "Helvetica",
            font_size: 10,
            edge_labels: true,
        }
    }
}

/// Display label of a term: the name without complement markers, quoted.
fn label(name: &str) -> String {
    let stripped = name.replace(COMPLEMENT_PREFIX, "");
    format!("\"{}\"", stripped.replace('"', "\\\""))
}

impl DependencyGraph {
    /// Converts the graph to DOT format with the default configuration.
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(&DotConfig::default())
    }

    /// Converts the graph to DOT format.
    ///
    /// Nodes are emitted in creation order as `n<index>`, edges in insertion order.
    pub fn to_dot_with_config(&self, config: &DotConfig) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "digraph {} {{", config.name)?;
        writeln!(
            dot,
            "  node [ shape={}, fontname={}, fontsize={} ];",
            config.node_shape, config.font_name, config.font_size
        )?;
        for id in self.nodes() {
            writeln!(dot, "  n{} [ label={} ];", id.index(), label(self.name(id)))?;
        }

        writeln!(dot, "  edge [ fontname={}, fontsize={} ];", config.font_name, config.font_size)?;
        for (i, edge) in self.edges().iter().enumerate() {
            if config.edge_labels {
                writeln!(
                    dot,
                    "  n{} -> n{} [ label=\"{}\" ];",
                    edge.source.index(),
                    edge.target.index(),
                    i
                )?;
            } else {
                writeln!(dot, "  n{} -> n{};", edge.source.index(), edge.target.index())?;
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::function::{Function, Minterm};

    fn two_level() -> Function {
        let mut f = Function::default();
        f.add_inputs(["a", "b", "c", "not_a", "not_b", "not_c"]);
        f.add_outputs(["x", "y"]);
        f.add_minterm("x", Minterm::new(["a", "b"]));
        f.add_minterm("y", Minterm::new(["x", "c"]));
        f.add_minterm("y", Minterm::new(["not_x", "not_c"]));
        f
    }

    #[test]
    fn test_to_dot_basic() {
        let graph = DependencyGraph::build(&two_level()).unwrap();
        let dot = graph.to_dot().unwrap();

        assert!(dot.starts_with("digraph dependency_graph {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("shape=ellipse, fontname=Helvetica, fontsize=10"));
    }

    #[test]
    fn test_nodes_and_edges() {
        let graph = DependencyGraph::build(&two_level()).unwrap();
        let dot = graph.to_dot().unwrap();

        // Nodes in creation order: x, a, b, y, c.
        assert!(dot.contains("n0 [ label=\"x\" ];"));
        assert!(dot.contains("n3 [ label=\"y\" ];"));
        assert_eq!(dot.matches(" -> ").count(), graph.num_edges());
        assert!(dot.contains("n0 -> n1 [ label=\"0\" ];"));
        assert!(dot.contains("n3 -> n0"));
    }

    #[test]
    fn test_complement_stripped() {
        let graph = DependencyGraph::build(&two_level()).unwrap();
        let dot = graph.to_dot().unwrap();
        assert!(!dot.contains(COMPLEMENT_PREFIX));
    }

    #[test]
    fn test_to_dot_with_config() {
        let graph = DependencyGraph::build(&two_level()).unwrap();
        let config = DotConfig {
            name: "level_1",
            node_shape: "box",
            edge_labels: false,
            ..DotConfig::default()
        };
        let dot = graph.to_dot_with_config(&config).unwrap();
        assert!(dot.starts_with("digraph level_1 {"));
        assert!(dot.contains("shape=box"));
        assert!(dot.contains("n0 -> n1;"));
        assert!(!dot.contains("label=\"0\""));
    }
}
