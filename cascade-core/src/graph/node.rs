//! Graph Nodes
//!
//! This module defines the dependency graph built over a parameter set.
//!
//! Nodes are keyed by parameter name. A directed edge `A -> B` means "B
//! depends on A": A must refresh before B. The graph is built fresh from the
//! current parameter slice on every sort and never mutated afterwards; the
//! sorter keeps its own working copy of the in-degree table.
//!
//! Node order is significant: nodes are stored in an `IndexMap` in first-seen
//! order (declared parameters first, then names discovered inside reference
//! lists), which is what makes the topological order deterministic.

use indexmap::IndexMap;

use crate::cascade::Parameter;

/// A single node in the dependency graph.
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// The parameter this node stands for. Synthetic for names only ever
    /// seen inside a reference list.
    param: Parameter,

    /// Number of parameters this node depends on.
    in_degree: usize,

    /// Names of parameters that depend on this node (edge targets).
    successors: Vec<String>,
}

impl GraphNode {
    fn new(param: Parameter) -> Self {
        Self {
            param,
            in_degree: 0,
            successors: Vec::new(),
        }
    }

    /// The parameter object behind this node.
    pub fn param(&self) -> &Parameter {
        &self.param
    }

    /// Number of incoming edges (dependencies).
    pub fn in_degree(&self) -> usize {
        self.in_degree
    }

    /// Names of nodes that depend on this one, in edge-insertion order.
    pub fn successors(&self) -> &[String] {
        &self.successors
    }
}

/// The dependency graph over a parameter set.
///
/// Derived, not persisted: callers build one per sort invocation.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: IndexMap<String, GraphNode>,
}

impl DependencyGraph {
    /// Build the graph from the current parameter set.
    ///
    /// Every distinct name becomes a node, including names that only appear
    /// inside a `referenced_parameters` list: those get a synthetic
    /// zero-dependency node so they still show up in the order. Duplicate
    /// parameter names keep the first declaration.
    pub fn build(params: &[Parameter]) -> Self {
        let mut nodes: IndexMap<String, GraphNode> = IndexMap::new();

        // Declared parameters first, in input order.
        for param in params {
            nodes
                .entry(param.name().to_string())
                .or_insert_with(|| GraphNode::new(param.clone()));
        }

        // Then the edges, synthesizing nodes for unknown referenced names.
        for param in params {
            for reference in param.referenced_parameters() {
                nodes
                    .entry(reference.clone())
                    .or_insert_with(|| GraphNode::new(Parameter::new(reference.clone())));

                if let Some(node) = nodes.get_mut(reference.as_str()) {
                    node.successors.push(param.name().to_string());
                }
                if let Some(node) = nodes.get_mut(param.name()) {
                    node.in_degree += 1;
                }
            }
        }

        Self { nodes }
    }

    /// Look up a node by parameter name.
    pub fn get(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.get(name)
    }

    /// Iterate nodes in first-seen order.
    pub fn nodes(&self) -> impl Iterator<Item = (&String, &GraphNode)> {
        self.nodes.iter()
    }

    /// Total number of distinct nodes, including synthetic ones.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
