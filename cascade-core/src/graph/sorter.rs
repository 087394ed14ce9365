//! Topological Sorter
//!
//! The sorter produces the evaluation order for a cascade: independent
//! parameters first, every dependent strictly after everything it reads from.
//!
//! # Algorithm
//!
//! Kahn's algorithm over the [`DependencyGraph`]:
//!
//! 1. Build the graph (in-degrees + adjacency) for every distinct name,
//!    synthesizing zero-dependency nodes for referenced-but-unknown names.
//! 2. Seed a FIFO queue with all in-degree-0 names, in first-seen order.
//! 3. Dequeue, append the parameter to the result, decrement each
//!    successor's in-degree, enqueue successors that reach zero.
//! 4. When the queue drains, any node missing from the result sits on a
//!    cycle (or behind one). That is not an error: the partial order is
//!    returned as-is and a diagnostic is published.
//!
//! The FIFO queue plus first-seen seeding makes the order deterministic for
//! identical input; ties break by discovery order.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::node::DependencyGraph;
use crate::cascade::{CascadeEvent, Parameter, UpdateBus};
use crate::error::Diagnostic;

/// The result of a sort: always total, sometimes incomplete.
#[derive(Debug, Clone)]
pub struct SortOutcome {
    /// Parameters in evaluation order. Shorter than the node count when the
    /// graph contains a cycle.
    pub order: Vec<Parameter>,

    /// Names that could not be placed (cycle members and everything that
    /// depends on them).
    pub unresolved: Vec<String>,
}

impl SortOutcome {
    /// Whether every node made it into the order.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Produces a deterministic topological ordering of a parameter set.
///
/// Holds no state between calls; the bus handle is only used to publish an
/// [`UnresolvedDependency`](Diagnostic::UnresolvedDependency) diagnostic when
/// a sort comes back incomplete.
pub struct GraphSorter {
    bus: UpdateBus,
}

impl GraphSorter {
    /// Create a sorter that reports diagnostics on the given bus.
    pub fn new(bus: UpdateBus) -> Self {
        Self { bus }
    }

    /// Sort the parameter set into evaluation order.
    ///
    /// Total function: never panics, never loops, never returns an error.
    /// On a cycle the returned order omits the unresolvable parameters and
    /// the caller must tolerate the shorter result.
    pub fn sort(&self, params: &[Parameter]) -> SortOutcome {
        let graph = DependencyGraph::build(params);

        let mut in_degree: IndexMap<&str, usize> = graph
            .nodes()
            .map(|(name, node)| (name.as_str(), node.in_degree()))
            .collect();

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| *name)
            .collect();

        let mut order = Vec::with_capacity(graph.node_count());

        while let Some(name) = queue.pop_front() {
            if let Some(node) = graph.get(name) {
                order.push(node.param().clone());

                for successor in node.successors() {
                    if let Some(degree) = in_degree.get_mut(successor.as_str()) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            queue.push_back(successor.as_str());
                        }
                    }
                }
            }
        }

        let unresolved = if order.len() == graph.node_count() {
            Vec::new()
        } else {
            let placed: HashSet<&str> = order.iter().map(|p| p.name()).collect();
            let missing: Vec<String> = in_degree
                .keys()
                .filter(|name| !placed.contains(**name))
                .map(|name| name.to_string())
                .collect();

            warn!(
                target: "cascade::sorter",
                unsorted = ?missing,
                "cycle or unresolved dependencies in parameter graph"
            );
            self.bus
                .publish(CascadeEvent::Diagnostic(Diagnostic::UnresolvedDependency {
                    missing: missing.clone(),
                }));

            missing
        };

        debug!(
            target: "cascade::sorter",
            placed = order.len(),
            nodes = graph.node_count(),
            "topological sort finished"
        );

        SortOutcome { order, unresolved }
    }
}

/// The suffix of `order` strictly after the named parameter.
///
/// These are the parameters that may need re-sequencing when the named
/// parameter changes. Returns an empty slice when the name is absent (e.g.
/// it was left unresolved by a cyclic sort).
pub fn tail_from<'a>(name: &str, order: &'a [Parameter]) -> &'a [Parameter] {
    match order.iter().position(|p| p.name() == name) {
        Some(index) => &order[index + 1..],
        None => &[],
    }
}

/// Parameters whose reference lists contain `name`, in `params` order.
///
/// These are the dependents whose completion an update wave waits on.
pub fn direct_dependents<'a>(name: &str, params: &'a [Parameter]) -> Vec<&'a Parameter> {
    params
        .iter()
        .filter(|p| p.referenced_parameters().iter().any(|r| r == name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(params: &[Parameter]) -> Vec<&str> {
        params.iter().map(|p| p.name()).collect()
    }

    #[test]
    fn sorts_reversed_chain() {
        let params = vec![
            Parameter::new("C").references("A").references("B"),
            Parameter::new("B").references("A"),
            Parameter::new("A"),
        ];

        let outcome = GraphSorter::new(UpdateBus::new()).sort(&params);

        assert!(outcome.is_complete());
        assert_eq!(names(&outcome.order), ["A", "B", "C"]);
    }

    #[test]
    fn independent_parameters_keep_first_seen_order() {
        let params = vec![
            Parameter::new("Z"),
            Parameter::new("A"),
            Parameter::new("M"),
        ];

        let outcome = GraphSorter::new(UpdateBus::new()).sort(&params);
        assert_eq!(names(&outcome.order), ["Z", "A", "M"]);
    }

    #[test]
    fn sort_is_deterministic() {
        let build = || {
            vec![
                Parameter::new("D").references("B").references("C"),
                Parameter::new("B").references("A"),
                Parameter::new("C").references("A"),
                Parameter::new("A"),
            ]
        };

        let sorter = GraphSorter::new(UpdateBus::new());
        let first = sorter.sort(&build());
        let second = sorter.sort(&build());

        assert_eq!(names(&first.order), names(&second.order));
        // A first, D last, B/C tie broken by discovery order.
        assert_eq!(names(&first.order), ["A", "B", "C", "D"]);
    }

    #[test]
    fn every_parameter_follows_its_references() {
        let params = vec![
            Parameter::new("E").references("D"),
            Parameter::new("D").references("B").references("C"),
            Parameter::new("C").references("A"),
            Parameter::new("B").references("A"),
            Parameter::new("A"),
        ];

        let outcome = GraphSorter::new(UpdateBus::new()).sort(&params);
        assert!(outcome.is_complete());

        let position = |name: &str| {
            outcome
                .order
                .iter()
                .position(|p| p.name() == name)
                .unwrap()
        };
        for param in &outcome.order {
            for reference in param.referenced_parameters() {
                assert!(position(reference) < position(param.name()));
            }
        }
    }

    #[tokio::test]
    async fn two_node_cycle_yields_empty_order_and_diagnostic() {
        let bus = UpdateBus::new();
        let mut sub = bus.subscribe();

        let params = vec![
            Parameter::new("A").references("B"),
            Parameter::new("B").references("A"),
        ];

        let outcome = GraphSorter::new(bus).sort(&params);

        assert_eq!(outcome.order.len(), 0);
        assert_eq!(outcome.unresolved, ["A", "B"]);

        match sub.recv().await {
            Some(CascadeEvent::Diagnostic(Diagnostic::UnresolvedDependency { missing })) => {
                assert_eq!(missing, ["A", "B"]);
            }
            other => panic!("expected unresolved-dependency diagnostic, got {other:?}"),
        }
    }

    #[test]
    fn cycle_leaves_acyclic_part_sorted() {
        let params = vec![
            Parameter::new("A"),
            Parameter::new("B").references("A").references("C"),
            Parameter::new("C").references("B"),
        ];

        let outcome = GraphSorter::new(UpdateBus::new()).sort(&params);

        assert_eq!(names(&outcome.order), ["A"]);
        assert_eq!(outcome.unresolved, ["B", "C"]);
    }

    #[test]
    fn unknown_reference_sorts_before_its_dependent() {
        let params = vec![Parameter::new("B").references("GHOST")];

        let outcome = GraphSorter::new(UpdateBus::new()).sort(&params);

        assert!(outcome.is_complete());
        assert_eq!(names(&outcome.order), ["GHOST", "B"]);
    }

    #[test]
    fn tail_from_returns_exact_suffix() {
        let order = vec![
            Parameter::new("A"),
            Parameter::new("B"),
            Parameter::new("C"),
        ];

        assert_eq!(names(tail_from("A", &order)), ["B", "C"]);
        assert_eq!(names(tail_from("B", &order)), ["C"]);
        assert!(tail_from("C", &order).is_empty());
        assert!(tail_from("MISSING", &order).is_empty());
    }

    #[test]
    fn direct_dependents_match_reference_lists() {
        let params = vec![
            Parameter::new("A"),
            Parameter::new("B").references("A"),
            Parameter::new("C").references("A").references("B"),
        ];

        let of_a: Vec<&str> = direct_dependents("A", &params)
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(of_a, ["B", "C"]);

        assert!(direct_dependents("C", &params).is_empty());
    }
}
