//! Term-dependency graph and levelization.
//!
//! The graph has one node per function term (outputs and every term they reach)
//! and an edge `T -> D` whenever a minterm of `T` references `D`, complemented or
//! not. Nodes live in an arena addressed by [`NodeId`]; a name map makes lookup
//! O(1), and adjacency is stored in both directions.
//!
//! Levelization seeds every primary input with depth 0 and pushes `depth + 1` up
//! to each referencing term, keeping the maximum. The result is a partition of
//! all nodes by depth: level 0 holds the inputs, level `d` holds the terms whose
//! longest dependency chain down to an input has length `d`.
//!
//! Both traversals use explicit work stacks, so arbitrarily long dependency chains
//! do not grow the call stack.
//!
//! ```
//! use xbar_rs::function::{Function, Minterm};
//! use xbar_rs::graph::DependencyGraph;
//! use xbar_rs::types::Level;
//!
//! let mut f = Function::default();
//! f.add_inputs(["a", "b", "not_a", "not_b"]);
//! f.add_outputs(["x", "y"]);
//! f.add_minterm("x", Minterm::new(["a", "b"]));
//! f.add_minterm("y", Minterm::new(["not_x", "b"]));
//!
//! let graph = DependencyGraph::build(&f).unwrap();
//! let levels = graph.levelize(&f).unwrap();
//! assert_eq!(levels.names(&graph, Level::new(1)), vec!["x"]);
//! assert_eq!(levels.names(&graph, Level::new(2)), vec!["y"]);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;

use crate::error::{Result, SynthError};
use crate::function::{strip_complement, Function};
use crate::types::Level;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    names: Vec<String>,
    index: HashMap<String, NodeId>,
    successors: Vec<Vec<NodeId>>,
    predecessors: Vec<Vec<NodeId>>,
    edges: Vec<Edge>,
}

/// Pending resolution of one term: its dependency names and a cursor.
struct Frame {
    node: NodeId,
    dependencies: Vec<String>,
    pos: usize,
}

/// Names referenced by the minterms of `term`, complement markers stripped.
fn dependencies(func: &Function, term: &str) -> Vec<String> {
    func.minterms_of(term)
        .iter()
        .flat_map(|m| m.literals())
        .map(|literal| strip_complement(literal).to_string())
        .collect()
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph by resolving every output of `func`, in declaration order.
    pub fn build(func: &Function) -> Result<Self> {
        let mut graph = Self::new();
        for output in func.outputs() {
            graph.resolve(func, output)?;
        }
        debug!("graph: {} nodes, {} edges", graph.num_nodes(), graph.num_edges());
        Ok(graph)
    }

    /// Inserts `term` and everything it transitively references.
    ///
    /// Idempotent: an already present term is returned as is. Nodes are created in
    /// depth-first preorder, and the out-edges of each node follow the literal
    /// order of its minterms, without duplicates.
    pub fn resolve(&mut self, func: &Function, term: &str) -> Result<NodeId> {
        if let Some(id) = self.node(term) {
            return Ok(id);
        }

        let root = self.add_node(term);
        let mut on_stack = HashSet::from([root]);
        let mut stack = vec![Frame {
            node: root,
            dependencies: dependencies(func, term),
            pos: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            if frame.pos == frame.dependencies.len() {
                on_stack.remove(&frame.node);
                stack.pop();
                continue;
            }
            let source = frame.node;
            let name = std::mem::take(&mut frame.dependencies[frame.pos]);
            frame.pos += 1;

            match self.node(&name) {
                Some(target) => {
                    if on_stack.contains(&target) {
                        return Err(SynthError::CyclicDependency { term: name });
                    }
                    self.add_edge(source, target);
                }
                None => {
                    let target = self.add_node(&name);
                    self.add_edge(source, target);
                    on_stack.insert(target);
                    let dependencies = dependencies(func, &name);
                    stack.push(Frame {
                        node: target,
                        dependencies,
                        pos: 0,
                    });
                }
            }
        }

        Ok(root)
    }

    fn add_node(&mut self, name: &str) -> NodeId {
        let id = NodeId(self.names.len());
        debug!("resolve: new node {} = '{}'", id.0, name);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        self.successors.push(Vec::new());
        self.predecessors.push(Vec::new());
        id
    }

    fn add_edge(&mut self, source: NodeId, target: NodeId) {
        if self.successors[source.0].contains(&target) {
            return;
        }
        self.successors[source.0].push(target);
        self.predecessors[target.0].push(source);
        self.edges.push(Edge { source, target });
    }
}

// Getters
impl DependencyGraph {
    pub fn num_nodes(&self) -> usize {
        self.names.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.names[id.0]
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        (0..self.names.len()).map(NodeId)
    }

    /// All edges in creation order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Terms directly referenced by `id`.
    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        &self.successors[id.0]
    }

    /// Terms directly referencing `id`.
    pub fn predecessors(&self, id: NodeId) -> &[NodeId] {
        &self.predecessors[id.0]
    }
}

/// Partition of graph nodes by dependency depth.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Levels {
    depth: Vec<Level>,
    buckets: BTreeMap<Level, Vec<NodeId>>,
}

impl DependencyGraph {
    /// Computes the depth of every node and buckets the nodes by depth.
    ///
    /// Seeds are the base (non-complement) inputs of `func` present in the graph.
    /// A node is re-propagated only when its depth strictly increases, so each
    /// node is processed at most `num_nodes` times.
    ///
    /// Fails with [`SynthError::UnreachableTerm`] if some term has no path to a
    /// primary input.
    pub fn levelize(&self, func: &Function) -> Result<Levels> {
        let mut depth: Vec<Option<usize>> = vec![None; self.num_nodes()];
        let mut work: Vec<(NodeId, usize)> = func
            .base_inputs()
            .filter_map(|input| self.node(input))
            .map(|id| (id, 0))
            .collect();

        while let Some((id, d)) = work.pop() {
            if matches!(depth[id.0], Some(current) if current >= d) {
                continue;
            }
            depth[id.0] = Some(d);
            for &parent in self.predecessors(id) {
                work.push((parent, d + 1));
            }
        }

        let mut levels = Vec::with_capacity(self.num_nodes());
        let mut buckets: BTreeMap<Level, Vec<NodeId>> = BTreeMap::new();
        for id in self.nodes() {
            let level = match depth[id.0] {
                Some(d) => Level::new(d),
                None if func.is_input(self.name(id)) => Level::INPUTS,
                None => {
                    return Err(SynthError::UnreachableTerm {
                        term: self.name(id).to_string(),
                    })
                }
            };
            levels.push(level);
            buckets.entry(level).or_default().push(id);
        }

        for (level, nodes) in buckets.iter() {
            let names: Vec<&str> = nodes.iter().map(|&id| self.name(id)).collect();
            debug!("level {} -> {:?}", level, names);
        }

        Ok(Levels { depth: levels, buckets })
    }
}

impl Levels {
    pub fn depth(&self, id: NodeId) -> Level {
        self.depth[id.0]
    }

    pub fn num_levels(&self) -> usize {
        self.buckets.len()
    }

    /// The deepest level, or level 0 for an empty graph.
    pub fn max_level(&self) -> Level {
        self.buckets.keys().next_back().copied().unwrap_or(Level::INPUTS)
    }

    pub fn get(&self, level: Level) -> &[NodeId] {
        self.buckets.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All levels in ascending order, including level 0.
    pub fn iter(&self) -> impl Iterator<Item = (Level, &[NodeId])> {
        self.buckets.iter().map(|(&level, nodes)| (level, nodes.as_slice()))
    }

    /// Levels above the inputs, in ascending order.
    pub fn synthesizable(&self) -> impl Iterator<Item = (Level, &[NodeId])> {
        self.iter().filter(|(level, _)| !level.is_inputs())
    }

    /// Node names at `level`, in node creation order.
    pub fn names<'g>(&self, graph: &'g DependencyGraph, level: Level) -> Vec<&'g str> {
        self.get(level).iter().map(|&id| graph.name(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::function::Minterm;

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
    fn test_build_nodes_and_edges() {
        let f = two_level();
        let graph = DependencyGraph::build(&f).unwrap();

        let names: Vec<&str> = graph.nodes().map(|id| graph.name(id)).collect();
        assert_eq!(names, vec!["x", "a", "b", "y", "c"]);

        let y = graph.node("y").unwrap();
        let succ: Vec<&str> = graph.successors(y).iter().map(|&id| graph.name(id)).collect();
        assert_eq!(succ, vec!["x", "c"]);
        assert_eq!(graph.num_edges(), 4);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let f = two_level();
        let mut graph = DependencyGraph::build(&f).unwrap();
        let before = graph.num_nodes();
        let y = graph.resolve(&f, "y").unwrap();
        assert_eq!(graph.node("y"), Some(y));
        assert_eq!(graph.num_nodes(), before);
        assert_eq!(graph.num_edges(), 4);
    }

    #[test]
    fn test_complement_reference_resolves_to_base() {
        let f = two_level();
        let graph = DependencyGraph::build(&f).unwrap();
        assert!(graph.node("not_x").is_none());
        assert!(graph.node("not_c").is_none());
        let x = graph.node("x").unwrap();
        let parents: Vec<&str> = graph.predecessors(x).iter().map(|&id| graph.name(id)).collect();
        assert_eq!(parents, vec!["y"]);
    }

    #[test]
    fn test_levelize_two_levels() {
        let f = two_level();
        let graph = DependencyGraph::build(&f).unwrap();
        let levels = graph.levelize(&f).unwrap();

        assert_eq!(levels.num_levels(), 3);
        assert_eq!(levels.names(&graph, Level::new(0)), vec!["a", "b", "c"]);
        assert_eq!(levels.names(&graph, Level::new(1)), vec!["x"]);
        assert_eq!(levels.names(&graph, Level::new(2)), vec!["y"]);
        assert_eq!(levels.max_level(), Level::new(2));
    }

    #[test]
    fn test_levelize_takes_longest_chain() {
        // y depends on input c directly (depth 1) and on x (depth 2).
        let f = two_level();
        let graph = DependencyGraph::build(&f).unwrap();
        let levels = graph.levelize(&f).unwrap();
        assert_eq!(levels.depth(graph.node("y").unwrap()), Level::new(2));
    }

    #[test]
    fn test_partition_covers_every_node_once() {
        let f = two_level();
        let graph = DependencyGraph::build(&f).unwrap();
        let levels = graph.levelize(&f).unwrap();

        let mut seen: Vec<NodeId> = levels.iter().flat_map(|(_, nodes)| nodes.iter().copied()).collect();
        seen.sort();
        let all: Vec<NodeId> = graph.nodes().collect();
        assert_eq!(seen, all);
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let n = 20_000;
        let mut f = Function::default();
        f.add_inputs(["a", "not_a"]);
        f.add_minterm("t0", Minterm::new(["a"]));
        f.add_output("t0");
        for i in 1..n {
            let name = format!("t{}", i);
            f.add_output(name.clone());
            f.add_minterm(name, Minterm::new([format!("not_t{}", i - 1)]));
        }
        // Resolve from the deepest term first.
        let mut graph = DependencyGraph::new();
        graph.resolve(&f, &format!("t{}", n - 1)).unwrap();
        assert_eq!(graph.num_nodes(), n + 1);

        let levels = graph.levelize(&f).unwrap();
        assert_eq!(levels.max_level(), Level::new(n));
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut f = Function::default();
        f.add_inputs(["a", "not_a"]);
        f.add_outputs(["x", "y"]);
        f.add_minterm("x", Minterm::new(["a", "y"]));
        f.add_minterm("y", Minterm::new(["not_x"]));
        let err = DependencyGraph::build(&f).unwrap_err();
        assert_eq!(err, SynthError::CyclicDependency { term: "x".to_string() });
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut f = Function::default();
        f.add_inputs(["a", "not_a"]);
        f.add_output("x");
        f.add_minterm("x", Minterm::new(["a", "not_x"]));
        let err = DependencyGraph::build(&f).unwrap_err();
        assert_eq!(err, SynthError::CyclicDependency { term: "x".to_string() });
    }

    #[test]
    fn test_unreachable_output() {
        let mut f = Function::default();
        f.add_inputs(["a", "not_a"]);
        f.add_outputs(["x", "k"]);
        f.add_minterm("x", Minterm::new(["a"]));
        // `k` has no minterms, hence no path to an input.
        let graph = DependencyGraph::build(&f).unwrap();
        let err = graph.levelize(&f).unwrap_err();
        assert_eq!(err, SynthError::UnreachableTerm { term: "k".to_string() });
    }

    #[test]
    fn test_shared_dependency_creates_one_edge() {
        let mut f = Function::default();
        f.add_inputs(["a", "not_a"]);
        f.add_output("x");
        f.add_minterm("x", Minterm::new(["a"]));
        f.add_minterm("x", Minterm::new(["not_a"]));
        let graph = DependencyGraph::build(&f).unwrap();
        assert_eq!(graph.num_nodes(), 2);
        assert_eq!(graph.num_edges(), 1);
    }
}
