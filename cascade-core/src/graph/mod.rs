//! Dependency Graph
//!
//! This module implements the dependency graph over a cascade's parameters
//! and the topological sorter that turns it into an evaluation order.
//!
//! # Overview
//!
//! The graph is a DAG (in the well-formed case) where:
//!
//! - Nodes are parameter names, including names only ever seen inside a
//!   reference list (those become synthetic zero-dependency nodes)
//! - An edge from A to B means B depends on A: A must refresh before B
//!
//! # Design Decisions
//!
//! 1. The graph is rebuilt from the parameter slice on every sort rather
//!    than maintained incrementally. Cascades are small (tens of nodes) and
//!    rebuilding keeps the sorter a pure function of its input.
//!
//! 2. `IndexMap` everywhere order matters: node discovery order is the
//!    deterministic tie-break for the topological order.
//!
//! 3. A cycle is a diagnostic, not an error. The sorter returns the partial
//!    order it could resolve and callers must tolerate the shorter result.

mod node;
mod sorter;

pub use node::{DependencyGraph, GraphNode};
pub use sorter::{direct_dependents, tail_from, GraphSorter, SortOutcome};
