//! Cascade Session
//!
//! The session is the driving glue for one page session: it sorts the
//! parameter set once, runs the forced initial pass so every dependent
//! renders against correctly-ordered inputs, and then installs change
//! observers on the interactive controls.
//!
//! # Sequencing Discipline
//!
//! All sequences, the initial pass and every observer-triggered one alike,
//! run behind a single async mutex. Rapid repeated user changes therefore
//! queue: a second trigger waits for the in-flight sequence to finish
//! rather than racing it for the shared event channel and corrupting its
//! wave state.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::bus::UpdateBus;
use super::param::Parameter;
use super::updater::{SequencedUpdater, UpdaterConfig};
use crate::graph::{direct_dependents, tail_from, GraphSorter, SortOutcome};

/// One page session's cascade driver.
///
/// Construct it, call [`initialize`](CascadeSession::initialize) once when
/// the host is ready, and drop it (or call
/// [`shutdown`](CascadeSession::shutdown)) to tear the observers down.
/// There is no other driving API.
pub struct CascadeSession {
    order: Arc<Vec<Parameter>>,
    updater: Arc<SequencedUpdater>,
    sequence_lock: Arc<Mutex<()>>,
    observers: Vec<JoinHandle<()>>,
}

impl CascadeSession {
    /// Sort the parameter set and prepare a session over it.
    ///
    /// A cyclic parameter set degrades to the partial order the sorter
    /// could resolve (with a diagnostic on the bus); the session drives
    /// whatever order it was given.
    pub fn new(params: &[Parameter], bus: UpdateBus, config: UpdaterConfig) -> Self {
        let SortOutcome { order, unresolved } = GraphSorter::new(bus.clone()).sort(params);
        if !unresolved.is_empty() {
            debug!(
                target: "cascade::session",
                unresolved = ?unresolved,
                "driving a partial order"
            );
        }

        Self {
            order: Arc::new(order),
            updater: Arc::new(SequencedUpdater::new(bus, config)),
            sequence_lock: Arc::new(Mutex::new(())),
            observers: Vec::new(),
        }
    }

    /// The evaluation order this session drives.
    pub fn order(&self) -> &[Parameter] {
        &self.order
    }

    /// Run the forced initial pass, then install change observers.
    ///
    /// The initial pass drives the whole sorted list in evaluation order,
    /// forcing a correct initial render. Synthetic nodes carry no refresh
    /// capability, so they resolve as no-ops. Afterwards, each parameter
    /// with a discrete selection control and at least one dependent gets an
    /// observer task: on every user-driven change it re-sequences that
    /// parameter's tail.
    pub async fn initialize(&mut self) {
        info!(
            target: "cascade::session",
            parameters = self.order.len(),
            "initial pass starting"
        );

        {
            let _guard = self.sequence_lock.lock().await;
            self.updater.run_sequence(&self.order, &self.order).await;
        }

        for param in self.order.iter() {
            let Some(control) = param.input_control() else {
                continue;
            };
            if !control.is_selection() {
                continue;
            }
            if direct_dependents(param.name(), &self.order).is_empty() {
                // Nothing downstream to re-sequence.
                continue;
            }

            let mut changes = control.changes();
            let name = param.name().to_string();
            let order = Arc::clone(&self.order);
            let updater = Arc::clone(&self.updater);
            let lock = Arc::clone(&self.sequence_lock);

            debug!(target: "cascade::session", parameter = %name, "observer installed");
            self.observers.push(tokio::spawn(async move {
                while changes.recv().await.is_some() {
                    let _guard = lock.lock().await;
                    info!(
                        target: "cascade::session",
                        trigger = %name,
                        "change observed; re-sequencing tail"
                    );
                    let tail = tail_from(&name, &order);
                    updater.run_sequence(tail, &order).await;
                }
            }));
        }

        info!(
            target: "cascade::session",
            observers = self.observers.len(),
            "session initialized"
        );
    }

    /// Stop all change observers.
    pub fn shutdown(&mut self) {
        for observer in self.observers.drain(..) {
            observer.abort();
        }
    }
}

impl Drop for CascadeSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
