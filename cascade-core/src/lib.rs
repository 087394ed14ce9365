//! Cascade Core
//!
//! This crate orchestrates the correct-order, asynchronous refresh of a set
//! of interdependent parameters (a cascade). It implements:
//!
//! - A dependency graph and deterministic topological sorter (Kahn's
//!   algorithm) over the parameter set
//! - A sequenced updater that drives refreshes in evaluation order,
//!   inferring each refresh's completion from a shared event stream under a
//!   timeout bound
//! - Session glue: a forced initial pass plus change observers on the
//!   interactive controls
//!
//! The host page, the refresh mechanism, and the value transport stay
//! outside the crate; they appear only as opaque capabilities on
//! [`Parameter`](cascade::Parameter) and as events on the
//! [`UpdateBus`](cascade::UpdateBus).
//!
//! # Architecture
//!
//! - `graph`: dependency graph construction and topological sorting
//! - `cascade`: parameters, the update bus, the sequenced updater, and the
//!   driving session
//! - `error`: the diagnostic taxonomy (degradations, never control flow)
//!
//! # Example
//!
//! ```rust,ignore
//! use cascade_core::cascade::{CascadeSession, Parameter, UpdateBus, UpdaterConfig};
//!
//! let bus = UpdateBus::new();
//! let params = vec![
//!     Parameter::new("CITY").with_refresh(city_refresh).with_control(city_select),
//!     Parameter::new("DISTRICT").references("CITY").with_refresh(district_refresh),
//! ];
//!
//! let mut session = CascadeSession::new(&params, bus, UpdaterConfig::default());
//! session.initialize().await;
//! // DISTRICT now rendered against CITY's current value; further CITY
//! // changes re-sequence DISTRICT automatically.
//! ```

pub mod cascade;
pub mod error;
pub mod graph;
