//! Sequenced Updater
//!
//! The updater drives refreshes through a cascade in evaluation order,
//! waiting after each refresh until the parameter's direct dependents are
//! observed on the update bus to have received their fresh values.
//!
//! # Completion Inference
//!
//! The host never tells us directly that a refresh finished. What it does
//! emit, per dependent, is an ordered pair of events:
//!
//! 1. `UpdateStarted { dependent, source }` establishes the pending pair
//! 2. `ValuesReceived` consumes the pending pair; when the pair's source
//!    is the parameter currently refreshing and the dependent is one we
//!    track, that dependent becomes satisfied for this wave
//!
//! This is a three-state machine per wave: Idle -> Pending -> Satisfied.
//! A `ValuesReceived` while idle is a no-op, a new `UpdateStarted`
//! overwrites an unconsumed pending pair (last start wins), and unrelated
//! events (diagnostics) leave the pending pair untouched.
//!
//! # Liveness Over Correctness
//!
//! Each wave is bounded by `update_timeout`. If a dependent is never
//! observed as satisfied, the updater publishes a timeout diagnostic naming
//! the last known statuses and moves on. The engine never hangs, at the cost
//! of possibly proceeding before a slow dependent truly finished.
//!
//! Waiting is event-driven: the wave subscribes before invoking the refresh
//! (so no event can be missed) and wakes on each bus event, with a short
//! re-check tick as a guard against missed wakeups. The timeout contract is
//! the same as a 100ms polling loop would give, without the churn.

use std::time::Duration;

use indexmap::IndexMap;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::bus::{CascadeEvent, UpdateBus};
use super::param::Parameter;
use crate::error::Diagnostic;
use crate::graph::direct_dependents;

/// Default bound on one update wave.
pub const DEFAULT_UPDATE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default re-check cadence while a wave is waiting.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Tuning knobs for the updater.
#[derive(Debug, Clone, Copy)]
pub struct UpdaterConfig {
    /// Longest a single [`update_one`](SequencedUpdater::update_one) wave
    /// may wait for its dependents. Default 5000ms.
    pub update_timeout: Duration,

    /// Upper bound between satisfaction re-checks while waiting.
    /// Default 100ms.
    pub poll_interval: Duration,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            update_timeout: DEFAULT_UPDATE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Per-wave completion tracker.
///
/// Tracks the satisfaction status of each direct dependent of the parameter
/// currently refreshing, plus the single pending (dependent, source) pair
/// established by the most recent `UpdateStarted` event.
struct WaveTracker {
    /// The parameter whose refresh this wave is waiting out.
    source: String,

    /// Dependent name -> satisfied this wave. Insertion order preserved so
    /// diagnostics list dependents in evaluation order.
    statuses: IndexMap<String, bool>,

    /// The unconsumed (dependent, source) pair, if any.
    pending: Option<(String, String)>,
}

impl WaveTracker {
    fn new(source: &str, dependents: Vec<String>) -> Self {
        Self {
            source: source.to_string(),
            statuses: dependents.into_iter().map(|name| (name, false)).collect(),
            pending: None,
        }
    }

    /// Feed one bus event through the state machine.
    fn observe(&mut self, event: &CascadeEvent) {
        match event {
            CascadeEvent::UpdateStarted { dependent, source } => {
                // Last start wins: overwrite any unconsumed pair.
                self.pending = Some((dependent.clone(), source.clone()));
            }
            CascadeEvent::ValuesReceived => {
                // While idle this is a no-op.
                if let Some((dependent, source)) = self.pending.take() {
                    if source == self.source {
                        if let Some(satisfied) = self.statuses.get_mut(&dependent) {
                            *satisfied = true;
                            debug!(
                                target: "cascade::updater",
                                %dependent,
                                source = %self.source,
                                "dependent satisfied"
                            );
                        }
                    }
                }
            }
            CascadeEvent::Diagnostic(_) => {
                // Unrelated traffic does not reset the pending pair.
            }
        }
    }

    fn all_satisfied(&self) -> bool {
        self.statuses.values().all(|satisfied| *satisfied)
    }

    fn dependents(&self) -> Vec<String> {
        self.statuses.keys().cloned().collect()
    }

    fn statuses(&self) -> Vec<(String, bool)> {
        self.statuses
            .iter()
            .map(|(name, satisfied)| (name.clone(), *satisfied))
            .collect()
    }
}

/// Drives refreshes through a cascade strictly in evaluation order.
///
/// Stateless between calls; all per-wave state lives in the wave itself.
pub struct SequencedUpdater {
    bus: UpdateBus,
    config: UpdaterConfig,
}

impl SequencedUpdater {
    /// Create an updater observing (and reporting on) the given bus.
    pub fn new(bus: UpdateBus, config: UpdaterConfig) -> Self {
        Self { bus, config }
    }

    /// The bus this updater observes.
    pub fn bus(&self) -> &UpdateBus {
        &self.bus
    }

    /// Request a refresh of `param` and wait until every direct dependent
    /// (per `order`) is observed as satisfied, or the update timeout
    /// elapses, whichever comes first.
    ///
    /// A parameter without a refresh capability resolves immediately:
    /// nothing was requested, so there is nothing to wait for.
    pub async fn update_one(&self, param: &Parameter, order: &[Parameter]) {
        let Some(refresh) = param.refresh_handle() else {
            debug!(
                target: "cascade::updater",
                parameter = param.name(),
                "no refresh capability; skipping"
            );
            return;
        };

        let dependents: Vec<String> = direct_dependents(param.name(), order)
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        let mut tracker = WaveTracker::new(param.name(), dependents);

        // Subscribe before requesting the refresh so no event can slip
        // between the request and the first recv.
        let mut sub = self.bus.subscribe();

        debug!(
            target: "cascade::updater",
            parameter = param.name(),
            dependents = ?tracker.dependents(),
            "refresh requested"
        );
        refresh.refresh();

        if tracker.all_satisfied() {
            // No dependents to wait for.
            return;
        }

        let deadline = Instant::now() + self.config.update_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                self.report_timeout(param, &tracker);
                return;
            }

            let tick = remaining.min(self.config.poll_interval);
            match tokio::time::timeout(tick, sub.recv()).await {
                Ok(Some(event)) => {
                    tracker.observe(&event);
                    if tracker.all_satisfied() {
                        return;
                    }
                }
                Ok(None) => {
                    // Bus gone; no further events can arrive.
                    self.report_timeout(param, &tracker);
                    return;
                }
                Err(_) => {
                    // Tick elapsed; loop re-checks the deadline.
                    if tracker.all_satisfied() {
                        return;
                    }
                }
            }
        }
    }

    /// Update each parameter in `params`, strictly in the given order,
    /// awaiting each wave fully before starting the next.
    ///
    /// This strict sequencing is what gives the whole cascade a total order
    /// even though each pairwise wait is itself only inferred.
    pub async fn run_sequence(&self, params: &[Parameter], order: &[Parameter]) {
        info!(
            target: "cascade::updater",
            count = params.len(),
            "sequence started"
        );
        for param in params {
            self.update_one(param, order).await;
        }
        info!(
            target: "cascade::updater",
            count = params.len(),
            "sequence finished"
        );
    }

    fn report_timeout(&self, param: &Parameter, tracker: &WaveTracker) {
        let statuses = tracker.statuses();
        warn!(
            target: "cascade::updater",
            parameter = param.name(),
            statuses = %serde_json::to_string(&statuses).unwrap_or_default(),
            "update timeout exceeded"
        );
        self.bus
            .publish(CascadeEvent::Diagnostic(Diagnostic::UpdateTimeout {
                parameter: param.name().to_string(),
                dependents: tracker.dependents(),
                statuses,
            }));
    }
}
