//! Parameter Model
//!
//! A Parameter is the unit of user-configurable state in a cascade. It knows
//! its own name, which other parameters it reads from, and carries two opaque
//! host capabilities:
//!
//! - a refresh handle, invoked to ask the host to recompute the parameter's
//!   value (the host renders the result; we never see it), and
//! - an input control, the interactive element whose change events trigger
//!   re-sequencing of everything downstream.
//!
//! The core never creates, mutates, or destroys the host's parameter state.
//! It only reads the name and references, invokes the refresh handle, and
//! listens to the control's change stream.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;
use tokio::sync::mpsc;

/// Capability to request a recomputation of a parameter's value.
///
/// The request is fire-and-forget: completion is not reported here but
/// inferred from events on the [`UpdateBus`](crate::cascade::UpdateBus).
///
/// Any `Fn() + Send + Sync` closure is a refresh handle:
///
/// ```rust,ignore
/// let handle: Arc<dyn RefreshHandle> = Arc::new(|| host.request_refresh("CITY"));
/// ```
pub trait RefreshHandle: Send + Sync {
    /// Ask the host to recompute this parameter's value.
    fn refresh(&self);
}

impl<F> RefreshHandle for F
where
    F: Fn() + Send + Sync,
{
    fn refresh(&self) {
        self()
    }
}

/// Capability representing the interactive element bound to a parameter.
///
/// Only discrete-choice controls (the host's equivalent of a `<select>`)
/// participate in change-driven re-sequencing; free-text inputs do not.
pub trait InputControl: Send + Sync {
    /// Whether this control is a discrete selection control.
    fn is_selection(&self) -> bool;

    /// Open a stream of user-driven change events.
    ///
    /// Each `()` received means the user picked a new value.
    fn changes(&self) -> mpsc::UnboundedReceiver<()>;
}

/// A named unit of user-configurable state in the cascade.
///
/// The referenced-parameter list is an ordered set: duplicates are dropped,
/// first occurrence wins. Order matters because it drives the deterministic
/// tie-break in the topological sort.
#[derive(Clone)]
pub struct Parameter {
    /// Unique name, stable for the page session.
    name: String,

    /// Names of parameters this parameter's value computation reads from.
    referenced: SmallVec<[String; 4]>,

    /// Refresh capability. Absent for parameters the host cannot refresh.
    refresh: Option<Arc<dyn RefreshHandle>>,

    /// Interactive control. Absent for non-interactive parameters.
    control: Option<Arc<dyn InputControl>>,
}

impl Parameter {
    /// Create a parameter with no references and no capabilities.
    ///
    /// This is also the shape of a synthetic node: a name seen only inside
    /// another parameter's reference list.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            referenced: SmallVec::new(),
            refresh: None,
            control: None,
        }
    }

    /// Add a referenced parameter, preserving first-seen order.
    pub fn references(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.referenced.iter().any(|r| *r == name) {
            self.referenced.push(name);
        }
        self
    }

    /// Attach a refresh capability.
    pub fn with_refresh(mut self, handle: Arc<dyn RefreshHandle>) -> Self {
        self.refresh = Some(handle);
        self
    }

    /// Attach an input control.
    pub fn with_control(mut self, control: Arc<dyn InputControl>) -> Self {
        self.control = Some(control);
        self
    }

    /// The parameter's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of parameters this parameter depends on, in declaration order.
    pub fn referenced_parameters(&self) -> &[String] {
        &self.referenced
    }

    /// The refresh capability, if any.
    pub fn refresh_handle(&self) -> Option<&Arc<dyn RefreshHandle>> {
        self.refresh.as_ref()
    }

    /// The input control, if any.
    pub fn input_control(&self) -> Option<&Arc<dyn InputControl>> {
        self.control.as_ref()
    }
}

impl Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("referenced", &self.referenced)
            .field("has_refresh", &self.refresh.is_some())
            .field("has_control", &self.control.is_some())
            .finish()
    }
}

/// A host-side selection control backed by an in-process change channel.
///
/// Hosts (and tests) call [`SelectControl::trigger`] whenever the user picks
/// a new value; every observer opened through [`InputControl::changes`]
/// receives the event.
pub struct SelectControl {
    selection: bool,
    senders: Mutex<Vec<mpsc::UnboundedSender<()>>>,
}

impl SelectControl {
    /// A discrete-choice control (participates in change observation).
    pub fn new() -> Self {
        Self {
            selection: true,
            senders: Mutex::new(Vec::new()),
        }
    }

    /// A free-form control (never observed).
    pub fn free_text() -> Self {
        Self {
            selection: false,
            senders: Mutex::new(Vec::new()),
        }
    }

    /// Emit a user-driven change event to all observers.
    pub fn trigger(&self) {
        // Drop observers whose receiver side is gone.
        self.senders.lock().retain(|tx| tx.send(()).is_ok());
    }
}

impl Default for SelectControl {
    fn default() -> Self {
        Self::new()
    }
}

impl InputControl for SelectControl {
    fn is_selection(&self) -> bool {
        self.selection
    }

    fn changes(&self) -> mpsc::UnboundedReceiver<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().push(tx);
        rx
    }
}
