//! Cascade Engine
//!
//! This module implements the update-sequencing half of the crate: the
//! parameter model, the shared event bus, the bounded-wait sequenced
//! updater, and the session glue that drives a whole page session.
//!
//! # Concepts
//!
//! ## Parameters
//!
//! A [`Parameter`] names a unit of user-configurable state and lists the
//! parameters it reads from. Its refresh handle and input control are opaque
//! host capabilities; the core never looks inside them.
//!
//! ## The Update Bus
//!
//! The host exposes no completion callback for a refresh, so completion is
//! inferred from events on a shared [`UpdateBus`]. Hosts publish typed
//! [`CascadeEvent`]s directly, or pipe raw log lines through the fallback
//! text adapter.
//!
//! ## Sequencing
//!
//! The [`SequencedUpdater`] refreshes one parameter at a time, waiting
//! (bounded by a timeout) until that parameter's direct dependents are
//! observed as satisfied before moving on. The [`CascadeSession`] runs the
//! forced initial pass and wires selection-control changes to tail
//! re-sequencing, with all sequences serialized behind one lock.

mod bus;
mod param;
mod session;
mod updater;

pub use bus::{parse_log_line, CascadeEvent, Subscription, UpdateBus};
pub use param::{InputControl, Parameter, RefreshHandle, SelectControl};
pub use session::CascadeSession;
pub use updater::{
    SequencedUpdater, UpdaterConfig, DEFAULT_POLL_INTERVAL, DEFAULT_UPDATE_TIMEOUT,
};
