//! Update Bus
//!
//! The bus is the single shared event channel the whole cascade observes.
//! It carries two kinds of traffic:
//!
//! - genuine diagnostics (cycle reports, timeout reports), and
//! - the update-progress events the sequencer uses to infer that a
//!   dependent finished refreshing, since the host's refresh mechanism
//!   exposes no direct completion callback.
//!
//! # Subscriptions
//!
//! `UpdateBus` wraps a broadcast channel. Each [`subscribe`](UpdateBus::subscribe)
//! call returns an independent [`Subscription`] that sees every event
//! published after the call; dropping it releases the lease. This replaces
//! the aliasing-prone alternative of intercepting a single global log sink:
//! concurrent observers each get their own cursor.
//!
//! # Log-text fallback
//!
//! Hosts that cannot publish typed events can pipe their log lines through
//! [`UpdateBus::publish_log_line`]. Exactly two textual patterns are
//! recognized (`"Updating {dependent} from {source}"` and the
//! `"Values retrieved from Referenced Parameters:"` marker); every other
//! line is inert. This adapter is the documented fallback; prefer typed
//! events wherever the host can emit them.

use tokio::sync::broadcast;
use tracing::{trace, warn};

use crate::error::Diagnostic;

/// Capacity of the broadcast channel backing the bus. A lagging subscriber
/// loses the oldest events once this many are buffered.
const BUS_CAPACITY: usize = 256;

/// Prefix of the start-of-update log pattern.
const UPDATING_PREFIX: &str = "Updating ";
/// Separator inside the start-of-update log pattern.
const UPDATING_SEPARATOR: &str = " from ";
/// Marker line logged by the host once fresh values arrived.
const VALUES_RECEIVED_MARKER: &str = "Values retrieved from Referenced Parameters:";

/// An event observable on the update bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeEvent {
    /// The host began pushing fresh values from `source` into `dependent`.
    UpdateStarted {
        /// The parameter being updated.
        dependent: String,
        /// The parameter whose new value triggered the update.
        source: String,
    },

    /// The host finished retrieving values for whichever update most
    /// recently started. Carries no names; pairing with the preceding
    /// [`UpdateStarted`](CascadeEvent::UpdateStarted) is the sequencer's job.
    ValuesReceived,

    /// A non-fatal degradation report.
    Diagnostic(Diagnostic),
}

/// The shared, append-only event channel for one cascade session.
///
/// Cheap to clone; all clones publish into the same channel.
#[derive(Clone)]
pub struct UpdateBus {
    tx: broadcast::Sender<CascadeEvent>,
}

impl UpdateBus {
    /// Create a new bus with no subscribers.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Publish an event to every live subscription.
    ///
    /// Publishing with no subscribers is fine; the event is simply dropped.
    pub fn publish(&self, event: CascadeEvent) {
        trace!(target: "cascade::bus", ?event, "publish");
        let _ = self.tx.send(event);
    }

    /// Acquire a scoped subscription seeing all events published from now on.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Feed one host log line through the fallback text adapter.
    ///
    /// Returns `true` when the line matched a recognized pattern and was
    /// published as a typed event.
    pub fn publish_log_line(&self, line: &str) -> bool {
        match parse_log_line(line) {
            Some(event) => {
                self.publish(event);
                true
            }
            None => false,
        }
    }
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A scoped lease on the bus: an independent cursor over events published
/// after [`UpdateBus::subscribe`]. Dropping it releases the lease.
pub struct Subscription {
    rx: broadcast::Receiver<CascadeEvent>,
}

impl Subscription {
    /// Wait for the next event.
    ///
    /// Returns `None` once the bus is gone and all buffered events are
    /// consumed. A lagged subscription skips the lost events and keeps
    /// going; losing progress events only ever delays a wave into its
    /// timeout bound, it cannot wedge it.
    pub async fn recv(&mut self) -> Option<CascadeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        target: "cascade::bus",
                        skipped,
                        "subscription lagged; events lost"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Parse one free-text log line into a typed event.
///
/// Mirrors the host's two recognized patterns exactly: the start pattern
/// requires a single whitespace-free token on each side of `" from "`, and
/// the values-received marker matches by prefix. Anything else is `None`.
pub fn parse_log_line(line: &str) -> Option<CascadeEvent> {
    if let Some(rest) = line.strip_prefix(UPDATING_PREFIX) {
        let (dependent, source) = rest.split_once(UPDATING_SEPARATOR)?;
        let well_formed = !dependent.is_empty()
            && !source.is_empty()
            && !dependent.contains(char::is_whitespace)
            && !source.contains(char::is_whitespace);
        if !well_formed {
            return None;
        }
        return Some(CascadeEvent::UpdateStarted {
            dependent: dependent.to_string(),
            source: source.to_string(),
        });
    }

    if line.starts_with(VALUES_RECEIVED_MARKER) {
        return Some(CascadeEvent::ValuesReceived);
    }

    None
}
