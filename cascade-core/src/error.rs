//! Diagnostic Taxonomy
//!
//! Failures in the cascade engine are observability events, not control
//! flow. Nothing here is ever returned as `Err` from an operation: a cycle
//! degrades the sort to a partial order, and a slow dependent degrades a wait
//! to its timeout bound. Each degradation is reported as a [`Diagnostic`] on
//! the update bus and logged, and execution always continues with the full
//! pass.
//!
//! A missing refresh capability is deliberately not represented here: a
//! parameter with nothing to refresh is an immediate success, not a failure.

use serde::Serialize;
use thiserror::Error;

/// A non-fatal degradation observed during sorting or sequencing.
///
/// Published as [`CascadeEvent::Diagnostic`](crate::cascade::CascadeEvent)
/// on the update bus. The `Display` form (via `thiserror`) is what gets
/// logged.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum Diagnostic {
    /// The dependency graph contains a cycle or could not be fully resolved;
    /// the produced order omits the named parameters.
    #[error("cycle or unresolved dependencies; parameters left unsorted: {missing:?}")]
    UnresolvedDependency {
        /// Names that did not make it into the topological order.
        missing: Vec<String>,
    },

    /// One or more dependents were never observed as satisfied within the
    /// update timeout. The wave proceeded regardless.
    #[error("update timeout exceeded for parameter {parameter}; dependents: {dependents:?}")]
    UpdateTimeout {
        /// The parameter whose refresh was being awaited.
        parameter: String,
        /// Its direct dependents at the time of the wave.
        dependents: Vec<String>,
        /// Last known per-dependent status (`true` = satisfied).
        statuses: Vec<(String, bool)>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_parameter() {
        let diag = Diagnostic::UpdateTimeout {
            parameter: "CITY".to_string(),
            dependents: vec!["DISTRICT".to_string()],
            statuses: vec![("DISTRICT".to_string(), false)],
        };

        let message = diag.to_string();
        assert!(message.contains("CITY"));
        assert!(message.contains("DISTRICT"));
    }

    #[test]
    fn statuses_serialize_as_json() {
        let diag = Diagnostic::UpdateTimeout {
            parameter: "A".to_string(),
            dependents: vec!["B".to_string()],
            statuses: vec![("B".to_string(), false)],
        };

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"statuses\""));
        assert!(json.contains("false"));
    }
}
